//! Shared helpers for the encoder and decoder.
//!
//! - [`BitSet`] - packed presence bitmap as stored in table headers
//! - [`to_usize`], [`bitmap_bytes`], [`checked_add`], [`round_up`] - checked layout arithmetic

mod bitset;
mod math;

pub use bitset::BitSet;
pub use math::{bitmap_bytes, checked_add, round_up, to_usize};
