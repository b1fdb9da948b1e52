//! # ESC/POS Commands
//!
//! Command builders for Epson TM-series printers (TM-T88, TM-m30, ...) and
//! the many clones that speak ESC/POS.
//!
//! ## Differences from StarPRNT
//!
//! | Effect | StarPRNT | ESC/POS |
//! |--------|----------|---------|
//! | Alignment | ESC GS a n | ESC a n |
//! | Bold | ESC E / ESC F | ESC E 1 / ESC E 0 |
//! | Invert | ESC 4 / ESC 5 | GS B 1 / GS B 0 |
//! | Size | ESC i h w | GS ! n (width in high nibble) |
//! | Feed lines | ESC a n | ESC d n |
//! | Feed + cut | ESC d 2 | GS V 65 0 |
//!
//! ## Real-Time Status
//!
//! `DLE EOT n` is answered immediately with one status byte, even while the
//! printer is busy. The session controller uses it on persistent network
//! connections to tell "offline" apart from "out of paper".
//!
//! `GS r n` waits its turn in the receive buffer instead, so its reply means
//! everything sent before it has been processed. Appending it to a job is
//! how the network transport knows the ticket is done.

use super::{Alignment, DLE, EOT, ESC, GS};

/// # Select Justification (ESC a n)
///
/// ```
/// use raivo::protocol::{Alignment, escpos};
///
/// assert_eq!(escpos::align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

/// # Emphasized Mode (ESC E n)
///
/// `n = 1` turns emphasis on, `n = 0` turns it off.
pub fn bold(enabled: bool) -> Vec<u8> {
    vec![ESC, b'E', enabled as u8]
}

/// # White/Black Reverse Mode (GS B n)
pub fn reverse(enabled: bool) -> Vec<u8> {
    vec![GS, b'B', enabled as u8]
}

/// # Select Character Size (GS ! n)
///
/// Takes the same zero-based multipliers as [`super::starprnt::size`]
/// (0 = 1x ... 7 = 8x). Width goes in the high nibble, height in the low one.
///
/// ```
/// use raivo::protocol::escpos;
///
/// // Double width, normal height
/// assert_eq!(escpos::size(0, 1), vec![0x1D, 0x21, 0x10]);
/// ```
pub fn size(height_mult: u8, width_mult: u8) -> Vec<u8> {
    let h = height_mult.min(7);
    let w = width_mult.min(7);
    vec![GS, b'!', (w << 4) | h]
}

/// # Print and Feed N Lines (ESC d n)
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

/// # Feed and Cut (GS V m n)
///
/// Function B: feeds to the cutting position plus `n` dots, then cuts.
/// `m = 65` is a full cut, `m = 66` a partial cut. Printers without a
/// full-cut blade treat both as partial.
pub fn cut_feed(partial: bool) -> Vec<u8> {
    vec![GS, b'V', if partial { 66 } else { 65 }, 0]
}

// ============================================================================
// REAL-TIME STATUS
// ============================================================================

/// Which status byte `DLE EOT n` asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// n = 1: printer status (bit 3 = offline)
    Printer = 1,
    /// n = 2: offline cause (cover open, paper feed button, ...)
    Offline = 2,
    /// n = 4: roll paper sensor (bits 5 and 6 = paper end)
    Paper = 4,
}

/// # Transmit Real-Time Status (DLE EOT n)
///
/// ```
/// use raivo::protocol::escpos::{status_request, StatusKind};
///
/// assert_eq!(status_request(StatusKind::Paper), vec![0x10, 0x04, 0x04]);
/// ```
pub fn status_request(kind: StatusKind) -> Vec<u8> {
    vec![DLE, EOT, kind as u8]
}

/// Bit 3 of the `DLE EOT 1` response.
pub const STATUS_OFFLINE_BIT: u8 = 0x08;

/// Bits 5 and 6 of the `DLE EOT 4` response.
pub const STATUS_PAPER_END_BITS: u8 = 0x60;

/// Decode a `DLE EOT 1` response byte.
pub fn is_offline(status: u8) -> bool {
    status & STATUS_OFFLINE_BIT != 0
}

/// Decode a `DLE EOT 4` response byte.
pub fn is_paper_end(status: u8) -> bool {
    status & STATUS_PAPER_END_BITS == STATUS_PAPER_END_BITS
}

// ============================================================================
// BUFFERED STATUS
// ============================================================================

/// # Transmit Paper Sensor Status (GS r 1)
///
/// Processed in order with the print data around it.
///
/// ```
/// use raivo::protocol::escpos;
///
/// assert_eq!(escpos::paper_sensor_request(), vec![0x1D, 0x72, 0x01]);
/// ```
pub fn paper_sensor_request() -> Vec<u8> {
    vec![GS, b'r', 1]
}

/// Bits 2 and 3 of the `GS r 1` response.
pub const PAPER_SENSOR_END_BITS: u8 = 0x0C;

/// Decode a `GS r 1` response byte.
pub fn is_paper_sensor_end(status: u8) -> bool {
    status & PAPER_SENSOR_END_BITS != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align(Alignment::Left), vec![0x1B, 0x61, 0x00]);
        assert_eq!(align(Alignment::Right), vec![0x1B, 0x61, 0x02]);
    }

    #[test]
    fn test_bold_and_reverse() {
        assert_eq!(bold(true), vec![0x1B, 0x45, 0x01]);
        assert_eq!(bold(false), vec![0x1B, 0x45, 0x00]);
        assert_eq!(reverse(true), vec![0x1D, 0x42, 0x01]);
        assert_eq!(reverse(false), vec![0x1D, 0x42, 0x00]);
    }

    #[test]
    fn test_size_nibbles() {
        assert_eq!(size(0, 0), vec![0x1D, 0x21, 0x00]);
        assert_eq!(size(1, 1), vec![0x1D, 0x21, 0x11]);
        assert_eq!(size(1, 0), vec![0x1D, 0x21, 0x01]);
        assert_eq!(size(9, 9), vec![0x1D, 0x21, 0x77]);
    }

    #[test]
    fn test_feed_and_cut() {
        assert_eq!(feed_lines(5), vec![0x1B, 0x64, 0x05]);
        assert_eq!(cut_feed(false), vec![0x1D, 0x56, 0x41, 0x00]);
        assert_eq!(cut_feed(true), vec![0x1D, 0x56, 0x42, 0x00]);
    }

    #[test]
    fn test_status_bits() {
        assert!(is_offline(0x16 | 0x08));
        assert!(!is_offline(0x16));
        assert!(is_paper_end(0x12 | 0x60));
        assert!(!is_paper_end(0x12 | 0x0C)); // near-end only
        assert!(is_paper_sensor_end(0x0C));
        assert!(!is_paper_sensor_end(0x03)); // near-end only
    }
}
