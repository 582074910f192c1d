//! Strain indicator cell classification.

use crate::models::{is_na_token, Cell};

/// Text tokens that mark an indicator cell as negative (compared case-insensitively).
const NEGATIVE_TOKENS: [&str; 3] = ["false", "no", ""];

/// What a single indicator cell says about its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Positive,
    Negative,
    Missing,
}

impl Indicator {
    /// Classify a raw cell.
    ///
    /// - `Missing`: empty cell, NaN, or an NA placeholder such as `N/A`
    /// - `Negative`: numeric zero (including text such as `"0"` or `"0.0"`),
    ///   boolean false, or one of `false` / `no` / blank
    /// - `Positive`: anything else
    pub fn classify(cell: &Cell) -> Self {
        match cell {
            Cell::Empty => Indicator::Missing,
            Cell::Number(n) if n.is_nan() => Indicator::Missing,
            Cell::Text(s) if is_na_token(s) => Indicator::Missing,
            Cell::Bool(false) => Indicator::Negative,
            Cell::Bool(true) => Indicator::Positive,
            Cell::Number(n) if *n == 0.0 => Indicator::Negative,
            Cell::Number(_) => Indicator::Positive,
            Cell::Text(s) => {
                let token = s.trim().to_lowercase();
                if NEGATIVE_TOKENS.contains(&token.as_str()) || is_numeric_zero(&token) {
                    Indicator::Negative
                } else {
                    Indicator::Positive
                }
            }
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Indicator::Positive)
    }
}

fn is_numeric_zero(token: &str) -> bool {
    token.parse::<f64>().map(|n| n == 0.0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing() {
        for cell in [
            Cell::Empty,
            Cell::Number(f64::NAN),
            Cell::Text("N/A".into()),
            Cell::Text("NaN".into()),
            Cell::Text("null".into()),
            Cell::Text("None".into()),
        ] {
            assert_eq!(Indicator::classify(&cell), Indicator::Missing, "{:?}", cell);
        }
    }

    #[test]
    fn test_negative_values() {
        for cell in [
            Cell::Number(0.0),
            Cell::Number(-0.0),
            Cell::Bool(false),
            Cell::Text("0".into()),
            Cell::Text("0.0".into()),
            Cell::Text("FALSE".into()),
            Cell::Text("No".into()),
            Cell::Text("   ".into()),
        ] {
            assert_eq!(Indicator::classify(&cell), Indicator::Negative, "{:?}", cell);
        }
    }

    #[test]
    fn test_positive_values() {
        for cell in [
            Cell::Number(1.0),
            Cell::Number(-2.5),
            Cell::Bool(true),
            Cell::Text("1".into()),
            Cell::Text("yes".into()),
            Cell::Text("阳性".into()),
            Cell::Text("+".into()),
        ] {
            assert!(Indicator::classify(&cell).is_positive(), "{:?}", cell);
        }
    }
}
