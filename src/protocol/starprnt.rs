//! # StarPRNT Commands
//!
//! Command builders for Star Micronics printers (TSP100, TSP650II, mC-Print).
//! Signatures mirror [`super::escpos`] so codegen treats both dialects alike.
//!
//! Careful: `ESC a n` feeds lines here, but selects the alignment in ESC/POS.
//! Never mix the two dialects in one job.
//!
//! Reference: StarPRNT Command Specifications Rev. 4.10.

use super::{Alignment, ESC, GS};

/// # Set Alignment (ESC GS a n)
///
/// ```
/// use raivo::protocol::{Alignment, starprnt};
///
/// assert_eq!(starprnt::align(Alignment::Center), vec![0x1B, 0x1D, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, GS, b'a', alignment as u8]
}

/// # Emphasis (ESC E on, ESC F off)
pub fn bold(enabled: bool) -> Vec<u8> {
    vec![ESC, if enabled { b'E' } else { b'F' }]
}

/// # White/Black Inversion (ESC 4 on, ESC 5 off)
pub fn invert(enabled: bool) -> Vec<u8> {
    vec![ESC, if enabled { b'4' } else { b'5' }]
}

/// # Character Expansion (ESC i n1 n2)
///
/// Zero-based multipliers, height first, each capped at 7 (8x).
///
/// ```
/// use raivo::protocol::starprnt;
///
/// assert_eq!(starprnt::size(1, 1), vec![0x1B, 0x69, 0x01, 0x01]);
/// ```
pub fn size(height_mult: u8, width_mult: u8) -> Vec<u8> {
    vec![ESC, b'i', height_mult.min(7), width_mult.min(7)]
}

/// # Feed N Lines (ESC a n)
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'a', n]
}

/// # Feed to Cutter and Cut (ESC d n)
///
/// `n = 2` is a full cut, `n = 3` a partial cut leaving a hinge.
pub fn cut_feed(partial: bool) -> Vec<u8> {
    vec![ESC, b'd', if partial { 3 } else { 2 }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align(Alignment::Left), vec![0x1B, 0x1D, 0x61, 0x00]);
        assert_eq!(align(Alignment::Right), vec![0x1B, 0x1D, 0x61, 0x02]);
    }

    #[test]
    fn test_bold_and_invert() {
        assert_eq!(bold(true), vec![0x1B, 0x45]);
        assert_eq!(bold(false), vec![0x1B, 0x46]);
        assert_eq!(invert(true), vec![0x1B, 0x34]);
        assert_eq!(invert(false), vec![0x1B, 0x35]);
    }

    #[test]
    fn test_size_clamps() {
        assert_eq!(size(1, 0), vec![0x1B, 0x69, 0x01, 0x00]);
        assert_eq!(size(9, 12), vec![0x1B, 0x69, 0x07, 0x07]);
    }

    #[test]
    fn test_feed_and_cut() {
        assert_eq!(feed_lines(5), vec![0x1B, 0x61, 0x05]);
        assert_eq!(cut_feed(false), vec![0x1B, 0x64, 0x02]);
        assert_eq!(cut_feed(true), vec![0x1B, 0x64, 0x03]);
    }
}
