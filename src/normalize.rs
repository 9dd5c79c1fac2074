//! Canonicalizes a primitive sequence to its normal form (§4.D).
//!
//! A normal form has no `NoOp`s, no two adjacent primitives of the same variant, and
//! never a `Delete` immediately followed by an `Insert` (that pair is swapped so
//! `Insert` always precedes `Delete`, giving every composite operation built from the
//! same edit a single canonical representation). Grounded on `normalization.go`'s
//! `removeNoOps`/`joinOps`/`swapOps`, run to a fixed point.

use crate::primitive::Primitive;
use crate::token::TokenArray;

pub fn normalize<A: TokenArray>(ops: Vec<Primitive<A>>) -> Vec<Primitive<A>> {
    let mut ops: Vec<_> = ops.into_iter().filter(|op| !matches!(op, Primitive::NoOp)).collect();

    loop {
        if let Some(joined) = join_pass(&ops) {
            ops = joined;
            continue;
        }
        if let Some(swapped) = swap_pass(&ops) {
            ops = swapped;
            continue;
        }
        break;
    }

    ops
}

/// Merges every adjacent pair of the same variant in one left-to-right pass. Returns
/// `None` if no pair was joinable, so the caller can tell "no more joining to do" from
/// "here's the joined result" without an extra length comparison.
fn join_pass<A: TokenArray>(ops: &[Primitive<A>]) -> Option<Vec<Primitive<A>>> {
    let mut out: Vec<Primitive<A>> = Vec::with_capacity(ops.len());
    let mut joined_any = false;

    for op in ops {
        match (out.last(), op) {
            (Some(Primitive::Retain(a)), Primitive::Retain(b)) => {
                let a = *a;
                *out.last_mut().unwrap() = Primitive::Retain(a + b);
                joined_any = true;
            }
            (Some(Primitive::Delete(a)), Primitive::Delete(b)) => {
                let a = *a;
                *out.last_mut().unwrap() = Primitive::Delete(a + b);
                joined_any = true;
            }
            (Some(Primitive::Insert(a)), Primitive::Insert(b)) => {
                let concatenated = a.array_type().concat(a, b);
                *out.last_mut().unwrap() = Primitive::Insert(concatenated);
                joined_any = true;
            }
            _ => out.push(op.clone()),
        }
    }

    joined_any.then_some(out)
}

/// Swaps every adjacent `Delete`-then-`Insert` pair into `Insert`-then-`Delete`, in one
/// left-to-right pass, skipping past a pair just swapped so it isn't immediately
/// swapped back.
fn swap_pass<A: TokenArray>(ops: &[Primitive<A>]) -> Option<Vec<Primitive<A>>> {
    let mut out = ops.to_vec();
    let mut swapped_any = false;
    let mut i = 0;
    while i + 1 < out.len() {
        if matches!(out[i], Primitive::Delete(_)) && matches!(out[i + 1], Primitive::Insert(_)) {
            out.swap(i, i + 1);
            swapped_any = true;
            i += 2;
        } else {
            i += 1;
        }
    }
    swapped_any.then_some(out)
}
