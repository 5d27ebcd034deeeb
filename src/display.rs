//! Display helpers
//!
//! Number formatting for statistics shown on the site.

/// Format a counter for display
///
/// Millions are abbreviated with one decimal (`2.5M`). Thousands are
/// separated from the remainder by a space (`12 045`). Smaller and negative
/// values are printed as is.
pub fn format_number(number: i64) -> String {
    if number >= 1_000_000 {
        format!("{:.1}M", number as f64 / 1_000_000.0)
    } else if number >= 1_000 {
        format!("{} {:03}", number / 1_000, number % 1_000)
    } else {
        number.to_string()
    }
}
