//! # Receipt Components
//!
//! Building blocks for kitchen tickets. Each one knows which ops it prints
//! and cleans up the styles it sets, so they can be stacked in any order.
//!
//! ```
//! use raivo::components::*;
//! use raivo::protocol::Dialect;
//!
//! let ticket = Receipt::new()
//!     .child(Header::new("TAKEAWAY"))
//!     .child(Text::new("Order #042"))
//!     .child(Divider::dashed())
//!     .child(ItemLine::new(2, "Pad Thai").modifier("Hot"))
//!     .child(Total::new(18.5))
//!     .cut();
//!
//! let program = ticket.compile();
//! assert!(program.texts().contains(&"  > Hot"));
//!
//! let bytes = ticket.build(Dialect::StarPrnt);
//! assert!(!bytes.is_empty());
//! ```

mod item;
mod layout;
mod receipt;
mod text;

pub use item::ItemLine;
pub use layout::{Divider, Spacer};
pub use receipt::Receipt;
pub use text::{Header, Text, Total, format_usd};

use crate::ir::{Op, Program};
use crate::protocol::Dialect;

/// Something that prints.
pub trait Component {
    /// Append this component's ops.
    fn emit(&self, ops: &mut Vec<Op>);
}

/// Compiling helpers, available on every component.
pub trait ComponentExt: Component {
    /// The component on its own, after a printer reset.
    fn compile(&self) -> Program {
        let mut program = Program::with_init();
        self.emit(&mut program.ops);
        program
    }

    /// Compile, optimize, and encode for a dialect.
    fn build(&self, dialect: Dialect) -> Vec<u8> {
        self.compile().optimize().to_bytes(dialect)
    }
}

impl<T: Component + ?Sized> ComponentExt for T {}
