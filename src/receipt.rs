//! # Order Receipts
//!
//! Turns an [`Order`] into the kitchen ticket handed over the counter.
//!
//! Formatting is pure: [`format_order`] returns an inspectable IR
//! [`Program`] and never touches a printer. The session controller compiles
//! it to the target's dialect right before sending.
//!
//! ## Layout
//!
//! ```text
//!              TAKEAWAY              (2x2 bold, centered)
//!             Order #042
//!       Mon 10/06/24 06:13:20 PM
//! ------------------------------------------
//!
//! Name: Ana                          (2x2)
//!
//! 2 Pad Thai                         (2x2 bold)
//!   > Hot
//!   > no peanuts
//!
//! [Extra napkins ]                   (2x2 inverted)
//!
//! PICKUP: 6:30 PM                    (2x wide, bold)
//!
//! TOTAL: $24.50                      (2x2 bold)
//! ```

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::components::{ComponentExt, Divider, Header, ItemLine, Receipt, Spacer, Text, Total};
use crate::ir::Program;
use crate::order::{Order, OrderItem, OrderStatus, TotalCost};
use crate::protocol::Dialect;

/// Paper and clock settings for receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptLayout {
    /// Characters per line at normal size (42 on 80mm paper).
    pub line_width: usize,
    /// Timezone the order time is printed in.
    pub offset: FixedOffset,
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        Self {
            line_width: 42,
            offset: Utc.fix(),
        }
    }
}

impl ReceiptLayout {
    /// Default layout, printing times in the machine's local timezone.
    pub fn local() -> Self {
        Self {
            offset: chrono::Local::now().offset().fix(),
            ..Self::default()
        }
    }
}

/// Values that mean "nothing here" in free-text fields.
fn is_present(value: Option<&str>, sentinel: &str) -> bool {
    value.is_some_and(|v| !v.trim().is_empty() && v != sentinel)
}

/// Format the order time, e.g. `Mon 10/06/24 06:13:20 PM`.
fn format_time(timestamp: Option<i64>, offset: FixedOffset) -> String {
    DateTime::from_timestamp_millis(timestamp.unwrap_or(0))
        .unwrap_or_default()
        .with_timezone(&offset)
        .format("%a %d/%m/%y %I:%M:%S %p")
        .to_string()
}

/// Spice level and notes become modifier lines; blank ones are skipped.
fn item_line(item: &OrderItem) -> ItemLine {
    let details = item
        .details
        .as_deref()
        .filter(|d| is_present(Some(*d), "None"));
    ItemLine::new(
        item.quantity.unwrap_or(0),
        item.name.as_deref().unwrap_or("Item"),
    )
    .modifier(item.spice_level.as_deref().unwrap_or_default())
    .modifier(details.unwrap_or_default())
}

/// Build the receipt program for an order.
///
/// ```
/// use raivo::order::Order;
/// use raivo::receipt::{format_order, ReceiptLayout};
///
/// let order = Order { id: "xyz042".into(), ..Default::default() };
/// let program = format_order(&order, &ReceiptLayout::default());
/// assert!(program.texts().contains(&"Order #042"));
/// assert!(program.texts().contains(&"TOTAL: $0.00"));
/// ```
pub fn format_order(order: &Order, layout: &ReceiptLayout) -> Program {
    let special = order.special_requests.as_deref();
    let pickup = order.pickup_time.as_deref();

    let receipt = Receipt::new()
        .child(Header::new("TAKEAWAY"))
        .child(Text::new(format!("Order #{}", order.order_number())))
        .child(Text::new(format_time(order.timestamp, layout.offset)))
        .child(Divider::dashed().width(layout.line_width))
        .child(Spacer::lines(1))
        .child(
            Text::new(format!(
                "Name: {}",
                order.customer_name.as_deref().unwrap_or("N/A")
            ))
            .left()
            .size(1, 1)
            .blank_after(),
        )
        .children(order.items.iter().map(item_line))
        .child(Spacer::lines(1))
        .child_if(
            is_present(special, "None"),
            Text::new(format!("{} ", special.unwrap_or_default()))
                .invert()
                .size(1, 1),
        )
        .child_if(is_present(special, "None"), Spacer::lines(1))
        .child_if(
            is_present(pickup, "N/A"),
            Text::new(format!("PICKUP: {}", pickup.unwrap_or_default()))
                .bold()
                .size(0, 1)
                .blank_after(),
        )
        .child(Total::new(order.total()))
        .child(Spacer::lines(5))
        .cut();

    receipt.compile()
}

/// Format, optimize, and compile an order for a printer dialect.
pub fn receipt_bytes(order: &Order, layout: &ReceiptLayout, dialect: Dialect) -> Vec<u8> {
    format_order(order, layout).optimize().to_bytes(dialect)
}

/// Plain-text rendering of the receipt, as shown on the dashboard.
pub fn receipt_preview(order: &Order, layout: &ReceiptLayout) -> String {
    format_order(order, layout)
        .optimize()
        .to_text_preview(layout.line_width)
}

/// A realistic order for test prints and previews.
pub fn sample_order() -> Order {
    Order {
        id: "sample-order-042".into(),
        customer_name: Some("Ana".into()),
        items: vec![
            OrderItem {
                name: Some("Pad Thai".into()),
                quantity: Some(2),
                details: Some("no peanuts".into()),
                spice_level: Some("Hot".into()),
                price: Some(9.5),
            },
            OrderItem {
                name: Some("Spring Rolls".into()),
                quantity: Some(1),
                details: Some("None".into()),
                spice_level: None,
                price: Some(5.5),
            },
        ],
        status: Some(OrderStatus::New),
        timestamp: Some(1_718_043_200_000),
        pickup_time: Some("6:30 PM".into()),
        special_requests: Some("Extra napkins".into()),
        total_cost: Some(TotalCost::Text("$24.50".into())),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Op;
    use crate::protocol::Alignment;
    use pretty_assertions::assert_eq;

    fn size(height: u8, width: u8) -> Op {
        Op::SetSize { height, width }
    }

    fn text(s: &str) -> Op {
        Op::Text(s.into())
    }

    #[test]
    fn test_sample_order_sequence() {
        let program = format_order(&sample_order(), &ReceiptLayout::default());

        assert_eq!(
            program.ops,
            vec![
                Op::Init,
                // Header
                Op::SetAlign(Alignment::Center),
                size(1, 1),
                Op::SetBold(true),
                text("TAKEAWAY"),
                Op::Newline,
                Op::SetBold(false),
                size(0, 0),
                text("Order #042"),
                Op::Newline,
                text("Mon 10/06/24 06:13:20 PM"),
                Op::Newline,
                text(&"-".repeat(42)),
                Op::Newline,
                Op::FeedLines(1),
                // Customer
                Op::SetAlign(Alignment::Left),
                size(1, 1),
                text("Name: Ana"),
                Op::Newline,
                Op::Newline,
                size(0, 0),
                // Items
                size(1, 1),
                Op::SetBold(true),
                text("2 Pad Thai"),
                Op::Newline,
                Op::SetBold(false),
                size(0, 0),
                text("  > Hot"),
                Op::Newline,
                text("  > no peanuts"),
                Op::Newline,
                size(1, 1),
                Op::SetBold(true),
                text("1 Spring Rolls"),
                Op::Newline,
                Op::SetBold(false),
                size(0, 0),
                Op::FeedLines(1),
                // Special requests
                size(1, 1),
                Op::SetInvert(true),
                text("Extra napkins "),
                Op::Newline,
                Op::SetInvert(false),
                size(0, 0),
                Op::FeedLines(1),
                // Pickup
                size(0, 1),
                Op::SetBold(true),
                text("PICKUP: 6:30 PM"),
                Op::Newline,
                Op::Newline,
                Op::SetBold(false),
                size(0, 0),
                // Total
                size(1, 1),
                Op::SetBold(true),
                text("TOTAL: $24.50"),
                Op::Newline,
                Op::SetBold(false),
                size(0, 0),
                Op::FeedLines(5),
                Op::Cut { partial: false },
            ]
        );
    }

    #[test]
    fn test_null_total_renders_zero() {
        let order = Order {
            id: "abc".into(),
            ..Default::default()
        };
        let program = format_order(&order, &ReceiptLayout::default());
        assert!(program.texts().contains(&"TOTAL: $0.00"));
    }

    #[test]
    fn test_non_numeric_total_renders_zero() {
        let order = Order {
            id: "abc".into(),
            total_cost: Some(TotalCost::Text("ask at counter".into())),
            ..Default::default()
        };
        let program = format_order(&order, &ReceiptLayout::default());
        assert!(program.texts().contains(&"TOTAL: $0.00"));
    }

    #[test]
    fn test_absurd_total_renders_zero() {
        let order = Order {
            id: "abc".into(),
            total_cost: Some(TotalCost::Text(format!("${}", "9".repeat(200)))),
            ..Default::default()
        };
        let program = format_order(&order, &ReceiptLayout::default());
        assert!(program.texts().contains(&"TOTAL: $0.00"));
    }

    #[test]
    fn test_sentinels_are_skipped() {
        let order = Order {
            id: "abcdef".into(),
            pickup_time: Some("N/A".into()),
            special_requests: Some("None".into()),
            items: vec![OrderItem {
                details: Some("None".into()),
                spice_level: Some("  ".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let program = format_order(&order, &ReceiptLayout::default());
        let texts = program.texts();

        assert!(texts.contains(&"0 Item"));
        assert!(!texts.iter().any(|t| t.starts_with("  >")));
        assert!(!texts.iter().any(|t| t.starts_with("PICKUP")));
        assert!(!texts.contains(&"None "));
        assert!(!program.ops.contains(&Op::SetInvert(true)));
    }

    #[test]
    fn test_short_id_and_missing_name() {
        let order = Order {
            id: "7".into(),
            ..Default::default()
        };
        let texts_program = format_order(&order, &ReceiptLayout::default());
        let texts = texts_program.texts();
        assert!(texts.contains(&"Order #7"));
        assert!(texts.contains(&"Name: N/A"));
        assert!(texts.contains(&"Thu 01/01/70 12:00:00 AM"));
    }

    #[test]
    fn test_time_uses_layout_offset() {
        let layout = ReceiptLayout {
            offset: FixedOffset::east_opt(10 * 3600).unwrap(),
            ..ReceiptLayout::default()
        };
        assert_eq!(
            format_time(Some(1_718_043_200_000), layout.offset),
            "Tue 11/06/24 04:13:20 AM"
        );
    }

    #[test]
    fn test_line_width_controls_divider() {
        let layout = ReceiptLayout {
            line_width: 32,
            ..ReceiptLayout::default()
        };
        let program = format_order(&sample_order(), &layout);
        assert!(program.texts().contains(&"-".repeat(32).as_str()));
    }

    #[test]
    fn test_receipt_bytes_start_and_end() {
        let bytes = receipt_bytes(&sample_order(), &ReceiptLayout::default(), Dialect::EscPos);
        assert_eq!(&bytes[..2], &[0x1Bu8, 0x40]);
        assert_eq!(&bytes[bytes.len() - 4..], &[0x1Du8, 0x56, 0x41, 0x00]);

        let bytes = receipt_bytes(&sample_order(), &ReceiptLayout::default(), Dialect::StarPrnt);
        assert_eq!(&bytes[bytes.len() - 3..], &[0x1Bu8, 0x64, 0x02]);
    }

    #[test]
    fn test_preview_mentions_everything() {
        let preview = receipt_preview(&sample_order(), &ReceiptLayout::default());
        assert!(preview.contains("TAKEAWAY"));
        assert!(preview.contains("[Extra napkins ]"));
        assert!(preview.contains("TOTAL: $24.50"));
    }
}
