//! The actor that fans a single document's committed operations out to every
//! connected client (§4.H and §5).
//!
//! `DocumentServer` owns the client registry and multiplexes two input sources with
//! `tokio::select!`: incoming client messages, which it hands to the `StateStore`,
//! and the resulting commits, which get broadcast. This is the same dual-channel
//! actor-loop shape as the teacher's `DaemonActor::run`, generalized from a CRDT
//! document to this crate's own operation algebra. Grounded on `server/document.go`
//! for the client-registry/broadcast semantics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use crate::message::{ClientMessage, ErrorMessage, InitMessage, OpMessage, ServerMessage};
use crate::server::StateStore;
use crate::token::TokenArray;

/// The channel capacity used for both the inbound client-message channel and every
/// per-client outbound channel.
const CHANNEL_CAPACITY: usize = 128;

struct Registry<A: TokenArray> {
    senders: HashMap<u64, mpsc::Sender<ServerMessage<A>>>,
}

/// Serves a single document to any number of clients, performing the necessary
/// transformations and broadcasting the result to everyone.
pub struct DocumentServer<A: TokenArray> {
    state: Arc<StateStore<A>>,
    registry: RwLock<Registry<A>>,
    next_client_id: AtomicU64,
    receiver: RwLock<Option<mpsc::Receiver<ClientMessage<A>>>>,
    sender: mpsc::Sender<ClientMessage<A>>,
    commits: RwLock<Option<mpsc::UnboundedReceiver<OpMessage<A>>>>,
}

impl<A: TokenArray + Serialize + DeserializeOwned + Send + Sync + 'static> DocumentServer<A> {
    pub fn new(state: Arc<StateStore<A>>) -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let commits = state.operation_stream();
        Self {
            state,
            registry: RwLock::new(Registry {
                senders: HashMap::new(),
            }),
            next_client_id: AtomicU64::new(0),
            receiver: RwLock::new(Some(receiver)),
            sender,
            commits: RwLock::new(Some(commits)),
        }
    }

    /// The channel clients submit their edits on.
    pub fn client_sender(&self) -> mpsc::Sender<ClientMessage<A>> {
        self.sender.clone()
    }

    /// Registers a new client, returning its id and the channel it should read
    /// server messages from. The channel's first item is always an `InitMessage`
    /// snapshotting the document at the moment of joining.
    pub async fn new_client(&self) -> (u64, mpsc::Receiver<ServerMessage<A>>) {
        let client_id = self.next_client_id.fetch_add(1, Ordering::SeqCst);
        let (to_client, from_server) = mpsc::channel(CHANNEL_CAPACITY);

        let (document, revision) = self.state.current();
        // Best-effort: a client that disconnects between creation and this send
        // simply never receives its init message, which is fine since it has
        // nothing else registered yet either.
        let _ = to_client
            .send(ServerMessage::Init(InitMessage { document, revision }))
            .await;

        self.registry.write().await.senders.insert(client_id, to_client);
        info!(client_id, revision, "client connected");

        (client_id, from_server)
    }

    pub async fn remove_client(&self, client_id: u64) {
        self.registry.write().await.senders.remove(&client_id);
        info!(client_id, "client disconnected");
    }

    /// Runs the actor loop until the inbound channel is closed. Only one caller may
    /// run this at a time; it takes both the client-message receiver and the store's
    /// `OperationStream` out of their slots for the duration, multiplexing them with
    /// `tokio::select!` (§4.H): a `ClientMessage` is handed to `StateStore::
    /// apply_client`, and every commit that produces — on success — is read back off
    /// `operation_stream()` and broadcast, which is also how the linearisation point
    /// (§4.H's fan-out-order guarantee) is enforced: broadcast order is commit order.
    pub async fn run(&self) {
        let mut client_messages = self
            .receiver
            .write()
            .await
            .take()
            .expect("DocumentServer::run called twice concurrently");
        let mut commits = self
            .commits
            .write()
            .await
            .take()
            .expect("DocumentServer::run called twice concurrently");

        loop {
            tokio::select! {
                client_msg = client_messages.recv() => match client_msg {
                    Some(ClientMessage { client_id, author_id, revision, op }) => {
                        if let Err(err) = self.state.apply_client(author_id, revision, op) {
                            warn!(client_id, %err, "dropping client after invalid operation");
                            self.send_to(
                                client_id,
                                ServerMessage::Error(ErrorMessage {
                                    error: err.to_string(),
                                }),
                            )
                            .await;
                            self.remove_client(client_id).await;
                        }
                    }
                    None => break,
                },
                commit = commits.recv() => match commit {
                    Some(committed) => self.broadcast(ServerMessage::Op(committed)).await,
                    None => break,
                },
            }
        }

        self.receiver.write().await.replace(client_messages);
        self.commits.write().await.replace(commits);
    }

    async fn broadcast(&self, message: ServerMessage<A>) {
        let registry = self.registry.read().await;
        for sender in registry.senders.values() {
            let _ = sender.send(message.clone()).await;
        }
    }

    async fn send_to(&self, client_id: u64, message: ServerMessage<A>) {
        let registry = self.registry.read().await;
        if let Some(sender) = registry.senders.get(&client_id) {
            let _ = sender.send(message).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use crate::primitive::Primitive;
    use crate::token::CharArray;
    use tracing_test::traced_test;

    fn retain(n: usize) -> Primitive<CharArray> {
        Primitive::Retain(n)
    }

    fn insert(s: &str) -> Primitive<CharArray> {
        Primitive::Insert(s.into())
    }

    #[tokio::test]
    async fn new_client_receives_an_init_message_with_the_current_document() {
        let store = Arc::new(StateStore::new(CharArray::from("hi")));
        let server = DocumentServer::new(store);

        let (_id, mut from_server) = server.new_client().await;
        let msg = from_server.recv().await.unwrap();
        match msg {
            ServerMessage::Init(init) => {
                assert_eq!(String::from(init.document), "hi");
                assert_eq!(init.revision, 0);
            }
            _ => panic!("expected an Init message first"),
        }
    }

    #[tokio::test]
    async fn a_committed_op_is_broadcast_to_every_client() {
        let store = Arc::new(StateStore::new(CharArray::from("hi")));
        let server = Arc::new(DocumentServer::new(store));

        let (_id_a, mut from_a) = server.new_client().await;
        let (_id_b, mut from_b) = server.new_client().await;
        from_a.recv().await.unwrap(); // drain Init
        from_b.recv().await.unwrap();

        let run_server = Arc::clone(&server);
        let handle = tokio::spawn(async move { run_server.run().await });

        let op = Operation::<CharArray>::new(vec![retain(2), insert("!")]);
        server
            .client_sender()
            .send(ClientMessage {
                client_id: 0,
                author_id: "alice".into(),
                revision: 0,
                op,
            })
            .await
            .unwrap();

        let msg_a = from_a.recv().await.unwrap();
        let msg_b = from_b.recv().await.unwrap();
        for msg in [msg_a, msg_b] {
            match msg {
                ServerMessage::Op(op_msg) => assert_eq!(op_msg.revision, 1),
                _ => panic!("expected a broadcast Op message"),
            }
        }

        handle.abort();
    }

    #[traced_test]
    #[tokio::test]
    async fn an_invalid_operation_gets_an_error_message_and_the_client_is_dropped() {
        let store = Arc::new(StateStore::new(CharArray::from("hi")));
        let server = Arc::new(DocumentServer::new(store));

        let (client_id, mut from_client) = server.new_client().await;
        from_client.recv().await.unwrap(); // drain Init

        let run_server = Arc::clone(&server);
        let handle = tokio::spawn(async move { run_server.run().await });

        // A revision far ahead of the log: rejected as UnknownRevision.
        let op = Operation::<CharArray>::new(vec![retain(2)]);
        server
            .client_sender()
            .send(ClientMessage {
                client_id,
                author_id: "alice".into(),
                revision: 7,
                op,
            })
            .await
            .unwrap();

        let msg = from_client.recv().await.unwrap();
        assert!(matches!(msg, ServerMessage::Error(_)));
        assert!(from_client.recv().await.is_none(), "channel should be closed after the client is dropped");

        handle.abort();
    }
}
