//! # Intermediate Representation (IR)
//!
//! The IR is a "bytecode" representation that sits between declarative
//! receipt components and the raw bytes of a printer dialect.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌───────────┐     ┌──────────────────┐
//! │ Components  │ ──► │     IR      │ ──► │ Optimizer │ ──► │ Codegen          │
//! │(declarative)│     │  (Vec<Op>)  │     │           │     │ StarPRNT/ESC/POS │
//! └─────────────┘     └─────────────┘     └───────────┘     └──────────────────┘
//!                            │
//!                            └──► text preview
//! ```
//!
//! ## Example
//!
//! ```
//! use raivo::ir::{Op, Program};
//! use raivo::protocol::{Alignment, Dialect};
//!
//! let mut program = Program::with_init();
//! program.push(Op::SetAlign(Alignment::Center));
//! program.push(Op::SetBold(true));
//! program.push(Op::Text("TAKEAWAY".into()));
//! program.push(Op::Newline);
//! program.push(Op::Cut { partial: false });
//!
//! let bytes = program.optimize().to_bytes(Dialect::EscPos);
//! assert_eq!(&bytes[..2], &[0x1Bu8, 0x40]);
//! ```

mod codegen;
mod ops;
mod optimize;
mod preview;

pub use ops::*;
