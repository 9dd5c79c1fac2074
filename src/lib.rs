//! Operational-transform core and client/server state machines for real-time
//! collaborative editing.
//!
//! The algebra ([`primitive`], [`slice`], [`normalize`], [`operation`]) is generic
//! over any token type implementing [`token::TokenArray`]; [`client`] and [`server`]
//! build the editing protocol's two state machines on top of it. [`document`] and
//! [`token`]'s stock `CharArray` make the crate directly usable against plain text
//! without an embedder supplying their own token type.

pub mod client;
pub mod document;
pub mod document_server;
pub mod error;
pub mod logging;
pub mod message;
pub mod normalize;
pub mod operation;
pub mod primitive;
pub mod server;
pub mod slice;
pub mod token;
