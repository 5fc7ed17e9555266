use std::sync::LazyLock;

use regex::Regex;

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());
static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]*)\.([0-9]*)$").unwrap());

/// A table cell that is either already an integer or still raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Int(i64),
    Text(String),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

/// Turn a digit string into an integer, truncate a non-negative decimal
/// with a single point, and hand anything else back untouched.
pub fn normalize(value: Cell) -> Cell {
    match value {
        Cell::Text(text) => match parse_numeric(&text) {
            Some(n) => Cell::Int(n),
            None => Cell::Text(text),
        },
        int => int,
    }
}

fn parse_numeric(text: &str) -> Option<i64> {
    if DIGITS_RE.is_match(text) {
        return text.parse().ok();
    }
    let caps = DECIMAL_RE.captures(text)?;
    match (&caps[1], &caps[2]) {
        ("", "") => None,
        ("", _) => Some(0),
        (whole, _) => whole.parse().ok(),
    }
}

/// Shorthand for normalizing a scraped text cell.
pub fn normalize_str(s: &str) -> Cell {
    normalize(Cell::from(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_become_integers() {
        assert_eq!(normalize_str("123"), Cell::Int(123));
        assert_eq!(normalize_str("0"), Cell::Int(0));
        assert_eq!(normalize_str("007"), Cell::Int(7));
    }

    #[test]
    fn decimals_truncate() {
        assert_eq!(normalize_str("123.45"), Cell::Int(123));
        assert_eq!(normalize_str("9.99"), Cell::Int(9));
        assert_eq!(normalize_str("5."), Cell::Int(5));
        assert_eq!(normalize_str(".5"), Cell::Int(0));
    }

    #[test]
    fn non_numeric_text_is_unchanged() {
        assert_eq!(normalize_str("abc"), Cell::Text("abc".into()));
        assert_eq!(normalize_str(""), Cell::Text(String::new()));
        assert_eq!(normalize_str("."), Cell::Text(".".into()));
        assert_eq!(normalize_str("1.2.3"), Cell::Text("1.2.3".into()));
        assert_eq!(normalize_str("-4"), Cell::Text("-4".into()));
        assert_eq!(normalize_str("1927/28"), Cell::Text("1927/28".into()));
        assert_eq!(normalize_str(" 12"), Cell::Text(" 12".into()));
    }

    #[test]
    fn integers_pass_through() {
        assert_eq!(normalize(Cell::Int(456)), Cell::Int(456));
        assert_eq!(normalize(Cell::Int(-3)), Cell::Int(-3));
    }

    #[test]
    fn overflow_is_left_as_text() {
        let huge = "99999999999999999999999";
        assert_eq!(normalize_str(huge), Cell::Text(huge.into()));
    }
}
