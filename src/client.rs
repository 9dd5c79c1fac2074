//! The client-side state machine (§4.F).
//!
//! A client tracks the last revision it has heard from the server plus up to two
//! pending operations: `awaiting` (sent to the server, not yet acked) and `buffer`
//! (composed locally while `awaiting` is still in flight). `ClientState` is an
//! immutable value — every transition consumes the old state and returns a new one,
//! mirroring `client/state.go` rather than mutating a struct in place.

use crate::operation::Operation;
use crate::token::TokenArray;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientState<A> {
    revision: u64,
    awaiting: Option<Operation<A>>,
    buffer: Option<Operation<A>>,
}

impl<A: TokenArray> ClientState<A> {
    pub fn new(revision: u64) -> Self {
        Self {
            revision,
            awaiting: None,
            buffer: None,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn awaiting(&self) -> Option<&Operation<A>> {
        self.awaiting.as_ref()
    }

    pub fn buffer(&self) -> Option<&Operation<A>> {
        self.buffer.as_ref()
    }

    /// Registers a locally made edit. Returns the new state and, if nothing was
    /// already in flight, the operation to send to the server immediately (the
    /// embedder does the sending; this only decides whether to).
    ///
    /// Per an explicit decision on the local-op-length open question, this trusts the
    /// caller to pass an operation whose input length matches the client's current
    /// view of the document — it is not defensively re-checked here.
    pub fn apply_client_op(&self, op: Operation<A>) -> (Self, Option<Operation<A>>) {
        match (&self.awaiting, &self.buffer) {
            (None, None) => (
                Self {
                    revision: self.revision,
                    awaiting: Some(op.clone()),
                    buffer: None,
                },
                Some(op),
            ),
            (Some(awaiting), None) => (
                Self {
                    revision: self.revision,
                    awaiting: Some(awaiting.clone()),
                    buffer: Some(op),
                },
                None,
            ),
            (Some(awaiting), Some(buffer)) => {
                let composed = buffer
                    .compose(&op)
                    .expect("buffered op and new local op should have matching lengths");
                (
                    Self {
                        revision: self.revision,
                        awaiting: Some(awaiting.clone()),
                        buffer: Some(composed),
                    },
                    None,
                )
            }
            (None, Some(_)) => {
                unreachable!("a non-empty buffer implies something is awaiting")
            }
        }
    }

    /// Applies an operation broadcast by the server (one that did not originate from
    /// this client). Returns the new state and the operation to apply to the client's
    /// own document view.
    pub fn apply_server_op(&self, op: Operation<A>) -> (Self, Operation<A>) {
        let revision = self.revision + 1;

        match (&self.awaiting, &self.buffer) {
            (None, None) => (
                Self {
                    revision,
                    awaiting: None,
                    buffer: None,
                },
                op,
            ),
            (Some(awaiting), None) => {
                let (awaiting_prime, document_op) = awaiting
                    .transform(&op)
                    .expect("awaiting op and incoming server op should share input length");
                (
                    Self {
                        revision,
                        awaiting: Some(awaiting_prime),
                        buffer: None,
                    },
                    document_op,
                )
            }
            (Some(awaiting), Some(buffer)) => {
                let (awaiting_prime, op_prime) = awaiting
                    .transform(&op)
                    .expect("awaiting op and incoming server op should share input length");
                let (buffer_prime, document_op) = buffer
                    .transform(&op_prime)
                    .expect("buffer and transformed server op should share input length");
                (
                    Self {
                        revision,
                        awaiting: Some(awaiting_prime),
                        buffer: Some(buffer_prime),
                    },
                    document_op,
                )
            }
            (None, Some(_)) => {
                unreachable!("a non-empty buffer implies something is awaiting")
            }
        }
    }

    /// Registers the server's acknowledgment of the operation this client sent, i.e.
    /// the server committing our `awaiting` op as revision `acked_revision`. Returns
    /// the new state and, if `buffer` had anything queued, the operation now occupying
    /// `awaiting` that needs sending.
    ///
    /// Panics if nothing was awaiting acknowledgment — the echo-as-ack contract (§4.F)
    /// guarantees a client only ever receives an ack for an operation it sent.
    pub fn apply_server_ack(&self, acked_revision: u64) -> (Self, Option<Operation<A>>) {
        let revision = self.revision + 1;
        debug_assert_eq!(
            acked_revision, revision,
            "server acked revision {acked_revision} but client expected {revision}"
        );

        match (&self.awaiting, &self.buffer) {
            (None, None) => panic!("received ack while not awaiting anything"),
            (Some(_), None) => (
                Self {
                    revision,
                    awaiting: None,
                    buffer: None,
                },
                None,
            ),
            (Some(_), Some(buffer)) => (
                Self {
                    revision,
                    awaiting: Some(buffer.clone()),
                    buffer: None,
                },
                Some(buffer.clone()),
            ),
            (None, Some(_)) => {
                unreachable!("a non-empty buffer implies something is awaiting")
            }
        }
    }
}
