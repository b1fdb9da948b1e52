//! # Text Preview
//!
//! Renders a program as plain text so a receipt can be checked on screen
//! before it reaches paper. Alignment is applied per line, inverted text is
//! wrapped in brackets, and a cut shows as a row of `~`.

use super::ops::{Op, Program, StyleState};
use crate::protocol::Alignment;

/// Line being assembled, plus the style it will be laid out with.
#[derive(Default)]
struct LineBuffer {
    text: String,
    width_mult: u8,
    alignment: Alignment,
}

impl LineBuffer {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn layout(&mut self, columns: usize) -> String {
        let text = std::mem::take(&mut self.text);
        // Wide characters take more than one column on paper
        let columns = columns / (self.width_mult as usize + 1);
        let len = text.chars().count();
        if len >= columns {
            return text;
        }
        let pad = columns - len;
        match self.alignment {
            Alignment::Left => text,
            Alignment::Center => format!("{}{}", " ".repeat(pad / 2), text),
            Alignment::Right => format!("{}{}", " ".repeat(pad), text),
        }
    }
}

impl Program {
    /// Render the program as plain text, `width` columns wide.
    pub fn to_text_preview(&self, width: usize) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut state = StyleState::default();
        let mut line = LineBuffer::default();

        for op in &self.ops {
            state.apply(op);
            match op {
                Op::Text(s) => {
                    if line.is_empty() {
                        line.alignment = state.alignment;
                        line.width_mult = state.width_mult;
                    }
                    if state.invert {
                        line.text.push('[');
                        line.text.push_str(s);
                        line.text.push(']');
                    } else {
                        line.text.push_str(s);
                    }
                }
                Op::Newline => lines.push(line.layout(width)),
                Op::FeedLines(n) => {
                    let mut blanks = *n as usize;
                    if !line.is_empty() {
                        lines.push(line.layout(width));
                        blanks = blanks.saturating_sub(1);
                    }
                    lines.extend(std::iter::repeat_n(String::new(), blanks));
                }
                Op::Cut { .. } => {
                    if !line.is_empty() {
                        lines.push(line.layout(width));
                    }
                    lines.push("~".repeat(width));
                }
                _ => {}
            }
        }

        if !line.is_empty() {
            lines.push(line.layout(width));
        }

        lines.join("\n")
    }
}
