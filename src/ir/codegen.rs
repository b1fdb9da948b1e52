//! # Code Generation
//!
//! Converts IR programs to printer bytes in either dialect.

use super::ops::{Op, Program};
use crate::protocol::{Dialect, LF, encode_ascii, escpos, init, starprnt};

impl Program {
    /// Compile the IR program to bytes for the given command language.
    pub fn to_bytes(&self, dialect: Dialect) -> Vec<u8> {
        let style: fn(&Op) -> Vec<u8> = match dialect {
            Dialect::StarPrnt => star_op,
            Dialect::EscPos => escpos_op,
        };

        let mut out = Vec::new();
        for op in &self.ops {
            match op {
                Op::Init => out.extend(init()),
                Op::Text(s) => out.extend(encode_ascii(s)),
                Op::Newline => out.push(LF),
                other => out.extend(style(other)),
            }
        }
        out
    }
}

/// Bytes for the ops whose encoding differs between dialects.
fn star_op(op: &Op) -> Vec<u8> {
    match op {
        Op::Cut { partial } => starprnt::cut_feed(*partial),
        Op::FeedLines(n) => starprnt::feed_lines(*n),
        Op::SetAlign(align) => starprnt::align(*align),
        Op::SetBold(enabled) => starprnt::bold(*enabled),
        Op::SetInvert(enabled) => starprnt::invert(*enabled),
        Op::SetSize { height, width } => starprnt::size(*height, *width),
        Op::Init | Op::Text(_) | Op::Newline => Vec::new(),
    }
}

fn escpos_op(op: &Op) -> Vec<u8> {
    match op {
        Op::Cut { partial } => escpos::cut_feed(*partial),
        Op::FeedLines(n) => escpos::feed_lines(*n),
        Op::SetAlign(align) => escpos::align(*align),
        Op::SetBold(enabled) => escpos::bold(*enabled),
        Op::SetInvert(enabled) => escpos::reverse(*enabled),
        Op::SetSize { height, width } => escpos::size(*height, *width),
        Op::Init | Op::Text(_) | Op::Newline => Vec::new(),
    }
}
