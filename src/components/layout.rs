//! Dividers and paper feed.

use super::Component;
use crate::ir::Op;

/// A dashed rule across the ticket.
///
/// Defaults to 42 columns, a full line of Font A on 80mm paper.
pub struct Divider {
    width: usize,
}

impl Divider {
    pub fn dashed() -> Self {
        Self { width: 42 }
    }

    /// Columns to fill.
    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }
}

impl Component for Divider {
    fn emit(&self, ops: &mut Vec<Op>) {
        ops.push(Op::Text("-".repeat(self.width)));
        ops.push(Op::Newline);
    }
}

/// Blank paper: prints whatever is buffered, then feeds `n` lines.
pub struct Spacer(u8);

impl Spacer {
    pub fn lines(n: u8) -> Self {
        Self(n)
    }
}

impl Component for Spacer {
    fn emit(&self, ops: &mut Vec<Op>) {
        if self.0 > 0 {
            ops.push(Op::FeedLines(self.0));
        }
    }
}
