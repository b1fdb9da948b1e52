//! # IR Opcodes
//!
//! A receipt as a flat list of printer operations. Nothing here knows about
//! orders or dialects: receipt components emit ops, codegen turns them into
//! bytes, and the preview turns them into text.
//!
//! Styles are separate ops rather than attributes on text, so a program can
//! be scanned once with a [`StyleState`] to know how any line will look.

use crate::protocol::Alignment;

/// Text style in effect at some point of a program.
///
/// Matches the printer's state after `ESC @`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleState {
    pub alignment: Alignment,
    pub bold: bool,
    pub invert: bool,
    /// 0 = 1x, 1 = 2x, ...
    pub height_mult: u8,
    pub width_mult: u8,
}

impl StyleState {
    /// Fold one op into the state. Returns whether anything changed.
    ///
    /// Content ops and paper movement never change the style; `Init` resets it.
    ///
    /// ```
    /// use raivo::ir::{Op, StyleState};
    ///
    /// let mut state = StyleState::default();
    /// assert!(state.apply(&Op::SetBold(true)));
    /// assert!(!state.apply(&Op::SetBold(true)));
    /// assert!(state.apply(&Op::Init));
    /// ```
    pub fn apply(&mut self, op: &Op) -> bool {
        let before = *self;
        match op {
            Op::Init => *self = StyleState::default(),
            Op::SetAlign(alignment) => self.alignment = *alignment,
            Op::SetBold(bold) => self.bold = *bold,
            Op::SetInvert(invert) => self.invert = *invert,
            Op::SetSize { height, width } => {
                self.height_mult = *height;
                self.width_mult = *width;
            }
            Op::Text(_) | Op::Newline | Op::FeedLines(_) | Op::Cut { .. } => {}
        }
        *self != before
    }
}

/// One printer operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Reset the printer (`ESC @`)
    Init,
    /// Feed past the cutter and cut; `partial` leaves a hinge
    Cut { partial: bool },
    /// Print the buffered line, then feed this many lines
    FeedLines(u8),

    SetAlign(Alignment),
    SetBold(bool),
    /// White on black
    SetInvert(bool),
    /// Zero-based multipliers: 0 = 1x ... 7 = 8x
    SetSize { height: u8, width: u8 },

    /// Text without a line break
    Text(String),
    Newline,
}

impl Op {
    /// True for ops that only change how later text looks.
    pub fn is_style(&self) -> bool {
        matches!(
            self,
            Op::SetAlign(_) | Op::SetBold(_) | Op::SetInvert(_) | Op::SetSize { .. }
        )
    }
}

/// A receipt ready to optimize, compile, or preview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    /// A program that starts by resetting the printer.
    pub fn with_init() -> Self {
        Self {
            ops: vec![Op::Init],
        }
    }

    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// The printed words in order, styles ignored.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl FromIterator<Op> for Program {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}
