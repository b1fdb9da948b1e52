//! HTTP request handlers.

pub mod orders;
pub mod printer;
