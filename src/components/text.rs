//! Text lines, the ticket header, and the money total.

use super::Component;
use crate::ir::Op;
use crate::protocol::Alignment;

/// One line of text.
///
/// Size, bold, and invert are switched off again after the line, in reverse
/// order. Alignment stays until something else sets it.
///
/// ```
/// use raivo::components::Text;
///
/// let name = Text::new("Name: Ana").left().size(1, 1).blank_after();
/// let pickup = Text::new("PICKUP: 6:30 PM").bold().size(0, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Text {
    content: String,
    alignment: Option<Alignment>,
    bold: bool,
    invert: bool,
    height_mult: u8,
    width_mult: u8,
    blank_after: bool,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn left(mut self) -> Self {
        self.alignment = Some(Alignment::Left);
        self
    }

    pub fn center(mut self) -> Self {
        self.alignment = Some(Alignment::Center);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// White on black.
    pub fn invert(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Zero-based multipliers, capped at 7 (8x).
    pub fn size(mut self, height: u8, width: u8) -> Self {
        self.height_mult = height.min(7);
        self.width_mult = width.min(7);
        self
    }

    /// Add an empty line after the text, printed in the same style so the
    /// gap matches the text height.
    pub fn blank_after(mut self) -> Self {
        self.blank_after = true;
        self
    }
}

impl Component for Text {
    fn emit(&self, ops: &mut Vec<Op>) {
        let mut resets = Vec::new();

        if let Some(alignment) = self.alignment {
            ops.push(Op::SetAlign(alignment));
        }
        if self.height_mult > 0 || self.width_mult > 0 {
            ops.push(Op::SetSize {
                height: self.height_mult,
                width: self.width_mult,
            });
            resets.push(Op::SetSize {
                height: 0,
                width: 0,
            });
        }
        if self.bold {
            ops.push(Op::SetBold(true));
            resets.push(Op::SetBold(false));
        }
        if self.invert {
            ops.push(Op::SetInvert(true));
            resets.push(Op::SetInvert(false));
        }

        ops.push(Op::Text(self.content.clone()));
        ops.push(Op::Newline);
        if self.blank_after {
            ops.push(Op::Newline);
        }

        ops.extend(resets.into_iter().rev());
    }
}

/// Ticket title: centered, bold, double size.
pub struct Header(Text);

impl Header {
    pub fn new(content: impl Into<String>) -> Self {
        Self(Text::new(content).center().size(1, 1).bold())
    }
}

impl Component for Header {
    fn emit(&self, ops: &mut Vec<Op>) {
        self.0.emit(ops);
    }
}

/// `TOTAL: $24.50`, bold and double size.
///
/// ```
/// use raivo::components::{ComponentExt, Total};
///
/// let program = Total::new(1234.5).compile();
/// assert_eq!(program.texts(), vec!["TOTAL: $1,234.50"]);
/// ```
pub struct Total {
    amount: f64,
}

impl Total {
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }
}

impl Component for Total {
    fn emit(&self, ops: &mut Vec<Op>) {
        Text::new(format!("TOTAL: {}", format_usd(self.amount)))
            .bold()
            .size(1, 1)
            .emit(ops);
    }
}

/// Ten trillion dollars: the cents stay below 2^53, where f64 is exact.
const MAX_AMOUNT: f64 = 1e13;

/// Format an amount as US dollars with thousands separators: `$1,234.50`.
///
/// Negative amounts keep their sign in front of the symbol (`-$3.00`).
/// Non-finite values, and amounts too large to count in exact cents, print
/// as `$0.00`.
///
/// ```
/// use raivo::components::format_usd;
///
/// assert_eq!(format_usd(1234.5), "$1,234.50");
/// assert_eq!(format_usd(0.0), "$0.00");
/// ```
pub fn format_usd(amount: f64) -> String {
    let amount = if amount.is_finite() && amount.abs() < MAX_AMOUNT {
        amount
    } else {
        0.0
    };
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}
