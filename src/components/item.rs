//! Ordered items and their modifiers.

use super::{Component, Text};
use crate::ir::Op;

/// An item as the kitchen reads it: quantity and name in large bold type,
/// then one indented line per modifier (spice level, notes).
///
/// ```text
/// 2 Pad Thai
///   > Hot
///   > no peanuts
/// ```
pub struct ItemLine {
    quantity: u32,
    name: String,
    modifiers: Vec<String>,
}

impl ItemLine {
    pub fn new(quantity: u32, name: impl Into<String>) -> Self {
        Self {
            quantity,
            name: name.into(),
            modifiers: Vec::new(),
        }
    }

    /// Add a modifier line. Blank modifiers are skipped.
    pub fn modifier(mut self, modifier: impl Into<String>) -> Self {
        let modifier = modifier.into();
        if !modifier.trim().is_empty() {
            self.modifiers.push(modifier);
        }
        self
    }
}

impl Component for ItemLine {
    fn emit(&self, ops: &mut Vec<Op>) {
        Text::new(format!("{} {}", self.quantity, self.name))
            .size(1, 1)
            .bold()
            .emit(ops);
        for modifier in &self.modifiers {
            Text::new(format!("  > {}", modifier)).emit(ops);
        }
    }
}
