//! A convenience facade over [`Operation`] for the common case where the document is
//! just a Rust `String`, so embedders don't have to hand-roll reader/writer plumbing
//! for the stock token type. Mirrors the package-level helpers in `doc.go`
//! (`NewDocument`, applying a raw operation to a plain string) — a thin wrapper over
//! [E], not a new core concept.

use crate::operation::Operation;
use crate::primitive::ApplyError;
use crate::token::{ArrayReader, CharArray, CharArrayBuilder, TokenArrayBuilder};

/// A plain-text document, backed by the stock Unicode-code-point token type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document(CharArray);

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into().into())
    }

    pub fn text(&self) -> String {
        self.0.clone().into()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies an operation, returning the resulting document.
    pub fn apply(
        &self,
        op: &Operation<CharArray>,
    ) -> Result<Self, ApplyError<ArrayReader<CharArray>, CharArrayBuilder>> {
        let mut reader = ArrayReader::new(self.0.clone());
        let mut writer = CharArrayBuilder::default();
        op.apply(&mut reader, &mut writer)?;
        Ok(Self(writer.into_token_array()))
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::Primitive;

    #[test]
    fn applies_an_operation_to_a_plain_string_document() {
        let doc = Document::new("hello");
        let op = Operation::new(vec![
            Primitive::Insert("H".into()),
            Primitive::Delete(1),
            Primitive::Retain(4),
        ]);
        let result = doc.apply(&op).unwrap();
        assert_eq!(result.text(), "Hello");
    }

    #[test]
    fn len_counts_unicode_code_points_not_bytes() {
        let doc = Document::new("héllo");
        assert_eq!(doc.len(), 5);
    }
}
