//! The four primitive operations and their pairwise `Compose`/`Transform` (§4.B).
//!
//! Both operators are total on the legal domain (the length preconditions the
//! composite layer checks before delegating here) and a contract violation past that
//! point is a programming error, not a recoverable condition (§7). We lean on an
//! exhaustive match over a tagged enum rather than runtime interface probing, per the
//! redesign flag in spec.md §9: every cell of the two tables in the source
//! (`noop.go`, `retain.go`, `delete.go`, `insert.go`) becomes one match arm, and the
//! cells marked `—` become `unreachable!()` arms the compiler can see are exhaustive.

use crate::token::{TokenArray, TokenReader, TokenWriter};

/// One of the four primitive operations, generic over a token array type.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive<A> {
    NoOp,
    Retain(usize),
    Delete(usize),
    Insert(A),
}

impl<A: TokenArray> Primitive<A> {
    pub fn input_length(&self) -> usize {
        match self {
            Self::NoOp | Self::Insert(_) => 0,
            Self::Retain(n) | Self::Delete(n) => *n,
        }
    }

    pub fn output_length(&self) -> usize {
        match self {
            Self::NoOp | Self::Delete(_) => 0,
            Self::Retain(n) => *n,
            Self::Insert(tokens) => tokens.len(),
        }
    }

    /// Slices a primitive to the half-open range `[start, end)` of whichever of its
    /// input/output it carries content for. Preconditions: `0 <= start <= end`.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        assert!(start <= end, "invalid slice: end ({end}) < start ({start})");
        match self {
            Self::NoOp => Self::NoOp,
            Self::Retain(_) => Self::Retain(end - start),
            Self::Delete(_) => Self::Delete(end - start),
            Self::Insert(tokens) => Self::Insert(tokens.slice(start, end)),
        }
    }

    /// Applies the primitive, reading from `reader` and writing to `writer` as needed.
    pub fn apply<R, W>(&self, reader: &mut R, writer: &mut W) -> Result<(), ApplyError<R, W>>
    where
        R: TokenReader<Token = A::Token>,
        W: TokenWriter<Token = A::Token>,
    {
        match self {
            Self::NoOp => Ok(()),
            Self::Retain(n) => {
                for _ in 0..*n {
                    let token = reader
                        .read_token()
                        .map_err(ApplyError::Read)?
                        .expect("reader ran out of tokens before a Retain was satisfied");
                    writer.write_token(token).map_err(ApplyError::Write)?;
                }
                Ok(())
            }
            Self::Delete(n) => {
                for _ in 0..*n {
                    reader
                        .read_token()
                        .map_err(ApplyError::Read)?
                        .expect("reader ran out of tokens before a Delete was satisfied");
                }
                Ok(())
            }
            Self::Insert(tokens) => {
                for idx in 0..tokens.len() {
                    writer
                        .write_token(tokens.at(idx))
                        .map_err(ApplyError::Write)?;
                }
                Ok(())
            }
        }
    }
}

/// Either side of `apply` failing. Propagated to the caller unchanged (§7).
#[derive(Debug)]
pub enum ApplyError<R: TokenReader, W: TokenWriter> {
    Read(R::Error),
    Write(W::Error),
}

/// Compose table (§4.B). Precondition: `a.output_length() == b.input_length()`.
pub fn compose_primitive<A: TokenArray>(a: Primitive<A>, b: Primitive<A>) -> Primitive<A> {
    debug_assert_eq!(
        a.output_length(),
        b.input_length(),
        "compose_primitive: length mismatch"
    );
    match (a, b) {
        (Primitive::NoOp, Primitive::Insert(tokens)) => Primitive::Insert(tokens),
        (Primitive::Retain(_), b @ Primitive::Retain(_)) => b,
        (Primitive::Retain(_), b @ Primitive::Delete(_)) => b,
        (a @ Primitive::Delete(_), Primitive::NoOp) => a,
        (a @ Primitive::Insert(_), Primitive::Retain(_)) => a,
        (Primitive::Insert(_), Primitive::Delete(_)) => Primitive::NoOp,
        (a, b) => unreachable!(
            "compose_primitive: illegal primitive pairing {:?} / {:?} — \
             the length precondition should have excluded this",
            a, b
        ),
    }
}

/// Transform table (§4.B). Precondition: `a.input_length() == b.input_length()`.
/// Returns `(a', b')` satisfying TP1.
pub fn transform_primitive<A: TokenArray>(
    a: Primitive<A>,
    b: Primitive<A>,
) -> (Primitive<A>, Primitive<A>) {
    debug_assert_eq!(
        a.input_length(),
        b.input_length(),
        "transform_primitive: length mismatch"
    );
    match (a, b) {
        (Primitive::NoOp, Primitive::Insert(tokens)) => {
            let retain = Primitive::Retain(tokens.len());
            (retain, Primitive::Insert(tokens))
        }
        (Primitive::Retain(_), b @ Primitive::Retain(_)) => (b.clone(), b),
        (Primitive::Retain(_), b @ Primitive::Delete(_)) => (Primitive::NoOp, b),
        (a @ Primitive::Delete(_), Primitive::Retain(_)) => (a, Primitive::NoOp),
        (Primitive::Delete(_), Primitive::Delete(_)) => (Primitive::NoOp, Primitive::NoOp),
        (a @ Primitive::Insert(_), Primitive::NoOp) => {
            let retain = Primitive::Retain(a.output_length());
            (a, retain)
        }
        (a, b) => unreachable!(
            "transform_primitive: illegal primitive pairing {:?} / {:?} — \
             the length precondition should have excluded this",
            a, b
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::CharArray;

    type P = Primitive<CharArray>;

    fn ins(s: &str) -> P {
        P::Insert(s.into())
    }

    #[test]
    fn compose_retain_retain_is_retain() {
        assert_eq!(
            compose_primitive(P::Retain(3), P::Retain(3)),
            P::Retain(3)
        );
    }

    #[test]
    fn compose_retain_delete_is_delete() {
        assert_eq!(compose_primitive(P::Retain(2), P::Delete(2)), P::Delete(2));
    }

    #[test]
    fn compose_insert_delete_cancels_to_noop() {
        assert_eq!(compose_primitive(ins("hi"), P::Delete(2)), P::NoOp);
    }

    #[test]
    fn compose_insert_retain_is_insert() {
        assert_eq!(compose_primitive(ins("hi"), P::Retain(2)), ins("hi"));
    }

    #[test]
    fn compose_noop_insert_is_insert() {
        assert_eq!(compose_primitive(P::NoOp, ins("x")), ins("x"));
    }

    #[test]
    fn compose_delete_noop_is_delete() {
        assert_eq!(compose_primitive(P::Delete(4), P::NoOp), P::Delete(4));
    }

    #[test]
    fn transform_retain_retain_keeps_both() {
        assert_eq!(
            transform_primitive(P::Retain(5), P::Retain(5)),
            (P::Retain(5), P::Retain(5))
        );
    }

    #[test]
    fn transform_retain_delete_drops_retain() {
        assert_eq!(
            transform_primitive(P::Retain(3), P::Delete(3)),
            (P::NoOp, P::Delete(3))
        );
    }

    #[test]
    fn transform_delete_retain_keeps_delete() {
        assert_eq!(
            transform_primitive(P::Delete(3), P::Retain(3)),
            (P::Delete(3), P::NoOp)
        );
    }

    #[test]
    fn transform_delete_delete_cancels() {
        assert_eq!(
            transform_primitive(P::Delete(2), P::Delete(2)),
            (P::NoOp, P::NoOp)
        );
    }

    #[test]
    fn transform_insert_noop_retains_for_the_other_side() {
        assert_eq!(
            transform_primitive(ins("x"), P::NoOp),
            (ins("x"), P::Retain(1))
        );
    }

    #[test]
    fn transform_noop_insert_retains_for_us() {
        assert_eq!(
            transform_primitive(P::NoOp, ins("x")),
            (P::Retain(1), ins("x"))
        );
    }

    #[test]
    fn slice_retain() {
        assert_eq!(P::Retain(10).slice(2, 5), P::Retain(3));
    }

    #[test]
    fn slice_insert() {
        assert_eq!(ins("hello").slice(1, 4), ins("ell"));
    }

    #[test]
    #[should_panic(expected = "invalid slice")]
    fn slice_rejects_end_before_start() {
        P::Retain(10).slice(5, 2);
    }
}
