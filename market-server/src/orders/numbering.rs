//! Order numbers: `ORD` + 2-digit year + 2-digit month + zero-padded sequence
//!
//! The sequence comes from the `sequence_counter` table and is bumped inside
//! the creation transaction, so numbers never repeat.

use chrono::Datelike;

/// Minimum width of the sequence part
const SEQUENCE_WIDTH: usize = 6;

/// `ORD2405000042` for May 2024, sequence 42. Sequences beyond six digits widen.
pub fn format_order_number<D: Datelike>(date: &D, sequence: i64) -> String {
    format!(
        "ORD{:02}{:02}{:0width$}",
        date.year().rem_euclid(100),
        date.month(),
        sequence,
        width = SEQUENCE_WIDTH
    )
}
