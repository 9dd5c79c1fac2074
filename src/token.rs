//! The abstract token interface the rest of the crate is generic over (§4.A / §6).
//!
//! The core never inspects a token's contents; it only moves, counts and slices them.
//! Everything here is synchronous and fallible, matching the source's `TokenReader`/
//! `TokenWriter`/`TokenArray` interfaces (`token.go`).

use std::convert::Infallible;
use std::fmt::Debug;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A source of tokens, consumed one at a time.
///
/// `read_token` returns `Ok(None)` on end of input, mirroring `io.EOF` in the source
/// without forcing embedders to manufacture a sentinel error value for it.
pub trait TokenReader {
    type Token;
    type Error: Debug;

    fn read_token(&mut self) -> Result<Option<Self::Token>, Self::Error>;
}

/// A sink that accepts tokens one at a time.
pub trait TokenWriter {
    type Token;
    type Error: Debug;

    fn write_token(&mut self, token: Self::Token) -> Result<(), Self::Error>;
}

/// An immutable, random-access, sliceable sequence of tokens with a known length.
///
/// `Default` is required so the wire codec (§6) can reconstruct an empty `Insert`'s
/// tokens when its `tokens` field is omitted (the empty case of "`tokens` is omitted
/// if empty").
pub trait TokenArray: Clone + PartialEq + Debug + Default {
    type Token: Clone;
    type Type: TokenArrayType<Token = Self::Token, Array = Self>;

    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn at(&self, idx: usize) -> Self::Token;
    fn slice(&self, start: usize, end: usize) -> Self;
    fn array_type(&self) -> Self::Type;
}

/// The "static" methods attached to a token array's type: how to build one, and how to
/// concatenate two of them. Kept off `TokenArray` itself because neither needs an
/// instance to make sense of (matching `TokenArrayType` in `token.go`).
pub trait TokenArrayType: Clone {
    type Token: Clone;
    type Array: TokenArray<Token = Self::Token, Type = Self>;
    type Builder: TokenArrayBuilder<Token = Self::Token, Array = Self::Array>;

    fn new_builder(&self) -> Self::Builder;
    fn concat(&self, a: &Self::Array, b: &Self::Array) -> Self::Array;
}

/// A `TokenWriter` that can be sealed into a `TokenArray` once writing is done.
pub trait TokenArrayBuilder: TokenWriter<Error = Infallible> {
    type Array;

    fn into_token_array(self) -> Self::Array;
}

/// A `TokenReader` over an in-memory `TokenArray`, used by the server to apply an
/// operation to its current document, and by tests. Equivalent to the source's
/// `TokenArrayReader`.
#[derive(Debug, Clone)]
pub struct ArrayReader<A> {
    array: A,
    idx: usize,
}

impl<A: TokenArray> ArrayReader<A> {
    pub fn new(array: A) -> Self {
        Self { array, idx: 0 }
    }
}

impl<A: TokenArray> TokenReader for ArrayReader<A> {
    type Token = A::Token;
    type Error = Infallible;

    fn read_token(&mut self) -> Result<Option<Self::Token>, Self::Error> {
        if self.idx < self.array.len() {
            let token = self.array.at(self.idx);
            self.idx += 1;
            Ok(Some(token))
        } else {
            Ok(None)
        }
    }
}

/// The stock token type: a token is a `char`, and a `TokenArray` is a `Vec<char>` built
/// from a Rust `String`. This is the "stock Unicode code-point tokenisation" §6 refers
/// to, and mirrors the source's `runetoken` package.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharArray(pub Vec<char>);

#[derive(Debug, Clone, Copy, Default)]
pub struct CharArrayType;

#[derive(Debug, Default)]
pub struct CharArrayBuilder(Vec<char>);

impl TokenArray for CharArray {
    type Token = char;
    type Type = CharArrayType;

    fn len(&self) -> usize {
        self.0.len()
    }

    fn at(&self, idx: usize) -> char {
        self.0[idx]
    }

    fn slice(&self, start: usize, end: usize) -> Self {
        assert!(start <= end, "invalid slice: end < start");
        Self(self.0[start..end].to_vec())
    }

    fn array_type(&self) -> CharArrayType {
        CharArrayType
    }
}

impl TokenArrayType for CharArrayType {
    type Token = char;
    type Array = CharArray;
    type Builder = CharArrayBuilder;

    fn new_builder(&self) -> CharArrayBuilder {
        CharArrayBuilder::default()
    }

    fn concat(&self, a: &CharArray, b: &CharArray) -> CharArray {
        let mut tokens = Vec::with_capacity(a.len() + b.len());
        tokens.extend_from_slice(&a.0);
        tokens.extend_from_slice(&b.0);
        CharArray(tokens)
    }
}

impl TokenWriter for CharArrayBuilder {
    type Token = char;
    type Error = Infallible;

    fn write_token(&mut self, token: char) -> Result<(), Infallible> {
        self.0.push(token);
        Ok(())
    }
}

impl TokenArrayBuilder for CharArrayBuilder {
    type Array = CharArray;

    fn into_token_array(self) -> CharArray {
        CharArray(self.0)
    }
}

impl From<&str> for CharArray {
    fn from(s: &str) -> Self {
        Self(s.chars().collect())
    }
}

impl From<String> for CharArray {
    fn from(s: String) -> Self {
        Self(s.chars().collect())
    }
}

impl From<CharArray> for String {
    fn from(array: CharArray) -> Self {
        array.0.into_iter().collect()
    }
}

/// Serializes as a plain JSON string, matching `runetoken.Array`'s `MarshalJSON`.
impl Serialize for CharArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s: String = self.0.iter().collect();
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for CharArray {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s.chars().collect()))
    }
}
