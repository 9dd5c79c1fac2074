//! Wire types and the JSON codec for composite operations (§6).
//!
//! A composite operation is serialized as a JSON array of tagged objects, one per
//! primitive: `{"type": "noop"}`, `{"type": "retain", "count": N}`,
//! `{"type": "delete", "count": N}`, `{"type": "insert", "tokens": ...}`, with
//! `count`/`tokens` omitted rather than written as zero/empty. `tokens` is serialized
//! however the embedder's `TokenArray` implementation serializes itself — for the
//! stock `CharArray` that's a plain JSON string. Grounded on `json.go`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodecError;
use crate::operation::Operation;
use crate::primitive::Primitive;
use crate::token::TokenArray;

#[derive(Serialize, Deserialize)]
struct WirePrimitive<T> {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tokens: Option<T>,
}

fn to_wire<A: TokenArray>(primitive: &Primitive<A>) -> WirePrimitive<A> {
    match primitive {
        Primitive::NoOp => WirePrimitive {
            kind: "noop".to_string(),
            count: None,
            tokens: None,
        },
        Primitive::Retain(n) => WirePrimitive {
            kind: "retain".to_string(),
            count: (*n != 0).then_some(*n),
            tokens: None,
        },
        Primitive::Delete(n) => WirePrimitive {
            kind: "delete".to_string(),
            count: (*n != 0).then_some(*n),
            tokens: None,
        },
        Primitive::Insert(tokens) => WirePrimitive {
            kind: "insert".to_string(),
            count: None,
            tokens: (!tokens.is_empty()).then(|| tokens.clone()),
        },
    }
}

fn from_wire<A: TokenArray>(wire: WirePrimitive<A>) -> Result<Primitive<A>, CodecError> {
    match wire.kind.as_str() {
        "noop" => Ok(Primitive::NoOp),
        "retain" => Ok(Primitive::Retain(wire.count.unwrap_or(0))),
        "delete" => Ok(Primitive::Delete(wire.count.unwrap_or(0))),
        "insert" => Ok(Primitive::Insert(wire.tokens.unwrap_or_default())),
        other => Err(CodecError::UnknownOp(other.to_string())),
    }
}

impl<A: TokenArray + Serialize> Serialize for Operation<A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wires: Vec<WirePrimitive<A>> = self.primitives().iter().map(to_wire).collect();
        wires.serialize(serializer)
    }
}

impl<'de, A: TokenArray + DeserializeOwned> Deserialize<'de> for Operation<A> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wires = Vec::<WirePrimitive<A>>::deserialize(deserializer)?;
        let primitives = wires
            .into_iter()
            .map(from_wire)
            .collect::<Result<Vec<_>, CodecError>>()
            .map_err(serde::de::Error::custom)?;
        Ok(Operation::new(primitives))
    }
}

/// Decodes a composite operation from its JSON text form.
pub fn decode_operation<A: TokenArray + DeserializeOwned>(
    json: &str,
) -> Result<Operation<A>, CodecError> {
    Ok(serde_json::from_str(json)?)
}

/// Encodes a composite operation to its JSON text form.
pub fn encode_operation<A: TokenArray + Serialize>(
    op: &Operation<A>,
) -> Result<String, CodecError> {
    Ok(serde_json::to_string(op)?)
}

/// Sent once by the server to a newly connected client: the document as it stands,
/// and the revision that snapshot corresponds to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "A: Serialize + DeserializeOwned")]
pub struct InitMessage<A> {
    pub document: A,
    pub revision: u64,
}

/// An operation the server has committed, broadcast to every connected client
/// (including, as an ack, the one that sent it — §4.H's echo-as-ack contract).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "A: TokenArray + Serialize + DeserializeOwned")]
pub struct OpMessage<A: TokenArray> {
    pub author_id: String,
    pub op: Operation<A>,
    pub revision: u64,
}

/// What a client sends the server: an edit based on a revision it has seen, paired
/// with which client sent it.
#[derive(Debug, Clone)]
pub struct ClientMessage<A: TokenArray> {
    pub client_id: u64,
    pub author_id: String,
    pub revision: u64,
    pub op: Operation<A>,
}

/// What a client sends over the wire: an edit based on a revision it has seen, not
/// yet carrying the client id the transport layer assigns on connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "A: TokenArray + Serialize + DeserializeOwned")]
pub struct ClientRequest<A: TokenArray> {
    pub author_id: String,
    pub revision: u64,
    pub op: Operation<A>,
}

/// Sent to a single client when its submitted operation was rejected; the server then
/// closes that client's channel (§4.H).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

/// Everything a server can push down a single client's send channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[serde(bound = "A: TokenArray + Serialize + DeserializeOwned")]
pub enum ServerMessage<A: TokenArray> {
    Init(InitMessage<A>),
    Op(OpMessage<A>),
    Error(ErrorMessage),
}
