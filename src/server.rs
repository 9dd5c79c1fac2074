//! The server-side revision log and the `ApplyClient` rebase operation (§4.G).
//!
//! `StateStore` owns the authoritative document and its append-only history of
//! committed operations. A client submits an operation against a revision it has
//! seen; `apply_client` rebases that operation forward through every op committed
//! since, then applies the result and appends it to the log, and publishes it on
//! `operation_stream()` — the channel `DocumentServer::run` (§4.H) multiplexes
//! against incoming client messages. Grounded on `server/state_store.go` and
//! `server/apply.go`; the `RwLock` mirrors the Go implementation's `sync.RWMutex`
//! (shared reads for `current`, exclusive writes for `apply_client`).

use std::sync::{Mutex, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::ServerError;
use crate::message::OpMessage;
use crate::operation::Operation;
use crate::token::{ArrayReader, TokenArray, TokenArrayType, TokenArrayBuilder};

struct Inner<A> {
    document: A,
    log: Vec<Operation<A>>,
}

/// An in-memory document and its revision log, behind a single `RwLock`. The
/// analogue of the source's `MemoryStateStore`; a database-backed `StateStore` would
/// follow the same shape against persistent storage.
pub struct StateStore<A> {
    inner: RwLock<Inner<A>>,
    commits_tx: mpsc::UnboundedSender<OpMessage<A>>,
    commits_rx: Mutex<Option<mpsc::UnboundedReceiver<OpMessage<A>>>>,
}

impl<A: TokenArray> StateStore<A> {
    pub fn new(document: A) -> Self {
        let (commits_tx, commits_rx) = mpsc::unbounded_channel();
        Self {
            inner: RwLock::new(Inner {
                document,
                log: Vec::new(),
            }),
            commits_tx,
            commits_rx: Mutex::new(Some(commits_rx)),
        }
    }

    /// The current document and the revision it's at (the length of the committed
    /// log).
    pub fn current(&self) -> (A, u64) {
        let inner = self.inner.read().expect("state store lock poisoned");
        (inner.document.clone(), inner.log.len() as u64)
    }

    /// The stream of operations committed to the log, delivered in commit order
    /// (§4.G). Only one caller may hold this stream; it is taken out of the store's
    /// slot the first time this is called.
    pub fn operation_stream(&self) -> mpsc::UnboundedReceiver<OpMessage<A>> {
        self.commits_rx
            .lock()
            .expect("state store lock poisoned")
            .take()
            .expect("StateStore::operation_stream called more than once")
    }

    /// Rebases `op` (submitted against `base_revision`) through every operation
    /// committed since, applies the result to the document, appends it to the log,
    /// and returns the committed `OpMessage` — ready to broadcast to every client,
    /// including the one that sent it (the echo is that client's ack).
    pub fn apply_client(
        &self,
        author_id: String,
        base_revision: u64,
        op: Operation<A>,
    ) -> Result<OpMessage<A>, ServerError> {
        let mut inner = self.inner.write().expect("state store lock poisoned");

        let log_len = inner.log.len() as u64;
        if base_revision > log_len {
            let err = ServerError::UnknownRevision {
                requested: base_revision,
                earliest: log_len,
            };
            log_rejected_operation(&author_id, &err);
            return Err(err);
        }

        let mut rebased = op;
        for committed in &inner.log[base_revision as usize..] {
            if rebased.input_length() != committed.input_length() {
                let err = ServerError::InvalidOperation {
                    expected: committed.input_length(),
                    actual: rebased.input_length(),
                };
                log_rejected_operation(&author_id, &err);
                return Err(err);
            }
            let (rebased_prime, _) = rebased
                .transform(committed)
                .expect("lengths were just checked to match");
            rebased = rebased_prime;
        }

        if rebased.input_length() != inner.document.len() {
            let err = ServerError::InvalidOperation {
                expected: inner.document.len(),
                actual: rebased.input_length(),
            };
            log_rejected_operation(&author_id, &err);
            return Err(err);
        }

        let mut reader = ArrayReader::new(inner.document.clone());
        let mut writer = inner.document.array_type().new_builder();
        rebased
            .apply(&mut reader, &mut writer)
            .map_err(|_| {
                let err = ServerError::InvalidOperation {
                    expected: inner.document.len(),
                    actual: rebased.input_length(),
                };
                log_rejected_operation(&author_id, &err);
                err
            })?;

        inner.document = writer.into_token_array();
        inner.log.push(rebased.clone());
        let revision = inner.log.len() as u64;

        debug!(author_id = %author_id, revision, "committed client operation");

        let message = OpMessage {
            author_id,
            op: rebased,
            revision,
        };
        // The receiving end outlives every sender for as long as the store does; a
        // send failure here would mean nothing is left to read the stream, which
        // only happens once the whole server is shutting down.
        let _ = self.commits_tx.send(message.clone());

        Ok(message)
    }
}

impl<A: TokenArray> std::fmt::Debug for StateStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().map_err(|_| std::fmt::Error)?;
        f.debug_struct("StateStore")
            .field("revision", &inner.log.len())
            .finish_non_exhaustive()
    }
}

fn log_rejected_operation(author_id: &str, err: &ServerError) {
    warn!(author_id = %author_id, %err, "rejected client operation");
}
