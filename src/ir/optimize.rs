//! # IR Optimizer
//!
//! Receipt components reset every style they set, so a formatted order is
//! full of `bold off, bold on` pairs that never reach the paper. Stripping
//! them keeps jobs short on slow Bluetooth links.
//!
//! Passes, in order:
//!
//! 1. Keep only the first `Init`
//! 2. Drop style ops overridden before any text is printed
//! 3. Drop style ops that set what is already set
//! 4. Join consecutive `Text` ops
//!
//! None of them changes what the printed receipt looks like.

use std::mem::{Discriminant, discriminant};

use super::ops::{Op, Program, StyleState};

impl Program {
    /// Apply every pass.
    pub fn optimize(self) -> Self {
        let ops = drop_repeated_init(self.ops);
        let ops = drop_overridden_styles(ops);
        let ops = drop_unchanged_styles(ops);
        Program {
            ops: join_text(ops),
        }
    }
}

fn drop_repeated_init(ops: Vec<Op>) -> Vec<Op> {
    let mut seen = false;
    ops.into_iter()
        .filter(|op| !matches!(op, Op::Init) || !std::mem::replace(&mut seen, true))
        .collect()
}

/// A style op is dead when the same attribute is set again before anything
/// is printed. Walks backwards, remembering which attributes are set later
/// in the current run of style ops.
fn drop_overridden_styles(ops: Vec<Op>) -> Vec<Op> {
    let mut kept = Vec::with_capacity(ops.len());
    let mut set_later: Vec<Discriminant<Op>> = Vec::new();

    for op in ops.into_iter().rev() {
        if op.is_style() {
            let kind = discriminant(&op);
            if set_later.contains(&kind) {
                continue;
            }
            set_later.push(kind);
        } else {
            set_later.clear();
        }
        kept.push(op);
    }

    kept.reverse();
    kept
}

fn drop_unchanged_styles(ops: Vec<Op>) -> Vec<Op> {
    let mut state = StyleState::default();
    ops.into_iter()
        .filter(|op| {
            let changed = state.apply(op);
            changed || !op.is_style()
        })
        .collect()
}

fn join_text(ops: Vec<Op>) -> Vec<Op> {
    let mut joined: Vec<Op> = Vec::with_capacity(ops.len());
    for op in ops {
        if let (Op::Text(next), Some(Op::Text(prev))) = (&op, joined.last_mut()) {
            prev.push_str(next);
            continue;
        }
        joined.push(op);
    }
    joined
}
