//! Composite operations: ordered sequences of primitives kept in normal form (§4.E).
//!
//! This is the unit everything else in the crate trades in — a client edit, a
//! server-committed revision, and a wire message are all an `Operation<A>`. Grounded
//! on `composite_op.go`.

use crate::error::OpError;
use crate::normalize::normalize;
use crate::primitive::{compose_primitive, transform_primitive, ApplyError, Primitive};
use crate::slice::{align, ByInputLength, ByOutputLength};
use crate::token::{TokenArray, TokenReader, TokenWriter};

#[derive(Debug, Clone, PartialEq)]
pub struct Operation<A> {
    primitives: Vec<Primitive<A>>,
}

impl<A: TokenArray> Operation<A> {
    /// Builds an operation from primitives, normalizing them to canonical form.
    pub fn new(primitives: Vec<Primitive<A>>) -> Self {
        Self {
            primitives: normalize(primitives),
        }
    }

    pub fn empty() -> Self {
        Self { primitives: Vec::new() }
    }

    pub fn primitives(&self) -> &[Primitive<A>] {
        &self.primitives
    }

    pub fn is_identity(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn input_length(&self) -> usize {
        self.primitives.iter().map(Primitive::input_length).sum()
    }

    pub fn output_length(&self) -> usize {
        self.primitives.iter().map(Primitive::output_length).sum()
    }

    pub fn apply<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<(), ApplyError<R, W>>
    where
        R: TokenReader<Token = A::Token>,
        W: TokenWriter<Token = A::Token>,
    {
        for primitive in &self.primitives {
            primitive.apply(reader, writer)?;
        }
        Ok(())
    }

    /// Composes `self` followed by `other` into one operation equivalent to applying
    /// both in sequence. Requires `self.output_length() == other.input_length()`.
    pub fn compose(&self, other: &Self) -> Result<Self, OpError> {
        if self.output_length() != other.input_length() {
            return Err(OpError::LengthMismatch {
                left: self.output_length(),
                right: other.input_length(),
            });
        }

        let (sliced_self, sliced_other) =
            align::<A, ByOutputLength>(&self.primitives, &other.primitives);

        let composed = sliced_self
            .into_iter()
            .zip(sliced_other)
            .map(|(a, b)| compose_primitive(a, b))
            .collect();

        Ok(Self::new(composed))
    }

    /// Transforms two concurrent operations `self` and `other` (both based on the same
    /// document) into `(self', other')` such that applying `self` then `other'` yields
    /// the same result as applying `other` then `self'` (TP1). Requires
    /// `self.input_length() == other.input_length()`.
    pub fn transform(&self, other: &Self) -> Result<(Self, Self), OpError> {
        if self.input_length() != other.input_length() {
            return Err(OpError::LengthMismatch {
                left: self.input_length(),
                right: other.input_length(),
            });
        }

        let (sliced_self, sliced_other) =
            align::<A, ByInputLength>(&self.primitives, &other.primitives);

        let mut self_prime = Vec::with_capacity(sliced_self.len());
        let mut other_prime = Vec::with_capacity(sliced_other.len());
        for (a, b) in sliced_self.into_iter().zip(sliced_other) {
            let (a_prime, b_prime) = transform_primitive(a, b);
            self_prime.push(a_prime);
            other_prime.push(b_prime);
        }

        Ok((Self::new(self_prime), Self::new(other_prime)))
    }
}

/// Left-folds `compose` over a sequence of operations applied in order. Empty input
/// yields the identity operation; a single operation is returned in its own normal
/// form.
pub fn compose_many<A: TokenArray>(ops: &[Operation<A>]) -> Result<Operation<A>, OpError> {
    let mut iter = ops.iter();
    let Some(first) = iter.next() else {
        return Ok(Operation::empty());
    };

    let mut acc = first.clone();
    for op in iter {
        acc = acc.compose(op)?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{ArrayReader, CharArray, CharArrayBuilder, TokenArrayBuilder};

    type Op = Operation<CharArray>;

    fn retain(n: usize) -> Primitive<CharArray> {
        Primitive::Retain(n)
    }

    fn delete(n: usize) -> Primitive<CharArray> {
        Primitive::Delete(n)
    }

    fn insert(s: &str) -> Primitive<CharArray> {
        Primitive::Insert(s.into())
    }

    fn apply_to_str(op: &Op, input: &str) -> String {
        let mut reader = ArrayReader::new(CharArray::from(input));
        let mut writer = CharArrayBuilder::default();
        op.apply(&mut reader, &mut writer)
            .expect("well-formed test operation should apply cleanly");
        writer.into_token_array().into()
    }

    #[test]
    fn apply_retain_delete_insert_round_trips_the_worked_example() {
        // "hello" -> "Hello, World" via Insert("H"), Delete(1), Retain(4), Insert(", World")
        let op = Op::new(vec![
            insert("H"),
            delete(1),
            retain(4),
            insert(", World"),
        ]);
        assert_eq!(apply_to_str(&op, "hello"), "Hello, World");
    }

    #[test]
    fn compose_chains_two_edits() {
        let a = Op::new(vec![retain(5), insert("!")]);
        let b = Op::new(vec![retain(6), insert("?")]);
        let composed = a.compose(&b).unwrap();
        assert_eq!(apply_to_str(&composed, "hello"), "hello!?");
    }

    #[test]
    fn compose_rejects_length_mismatch() {
        let a = Op::new(vec![retain(5)]);
        let b = Op::new(vec![retain(3)]);
        assert_eq!(
            a.compose(&b),
            Err(OpError::LengthMismatch { left: 5, right: 3 })
        );
    }

    #[test]
    fn transform_reproduces_the_worked_example() {
        // a := Insert("H"), Delete(1), Retain(4)   (capitalize "h")
        // b := Retain(5), Insert("!")              (append "!")
        let a = Op::new(vec![insert("H"), delete(1), retain(4)]);
        let b = Op::new(vec![retain(5), insert("!")]);

        let (a_prime, b_prime) = a.transform(&b).unwrap();

        let via_a_then_b_prime = a.compose(&b_prime).unwrap();
        let via_b_then_a_prime = b.compose(&a_prime).unwrap();

        assert_eq!(
            apply_to_str(&via_a_then_b_prime, "hello"),
            apply_to_str(&via_b_then_a_prime, "hello")
        );
    }

    #[test]
    fn transform_rejects_length_mismatch() {
        let a = Op::new(vec![retain(5)]);
        let b = Op::new(vec![retain(3)]);
        assert_eq!(
            a.transform(&b),
            Err(OpError::LengthMismatch { left: 5, right: 3 })
        );
    }

    #[test]
    fn compose_many_of_empty_is_identity() {
        let composed = compose_many::<CharArray>(&[]).unwrap();
        assert!(composed.is_identity());
    }

    #[test]
    fn compose_many_chains_three_edits() {
        let a = Op::new(vec![retain(5), insert("a")]);
        let b = Op::new(vec![retain(6), insert("b")]);
        let c = Op::new(vec![retain(7), insert("c")]);
        let composed = compose_many(&[a, b, c]).unwrap();
        assert_eq!(apply_to_str(&composed, "hello"), "helloabc");
    }

    #[test]
    fn retain_only_operation_round_trips_unchanged() {
        let op = Op::new(vec![retain(5)]);
        assert_eq!(apply_to_str(&op, "hello"), "hello");
    }
}
