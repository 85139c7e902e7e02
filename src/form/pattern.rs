use std::fmt;

use crate::error::FormError;

const WILDCARD: &str = "*";

/// A dotted field path, optionally with one `*` segment standing for a row
/// index, e.g. `items.*.amount`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPattern {
    segments: Vec<String>,
    wildcard: Option<usize>,
}

impl FieldPattern {
    pub fn parse(raw: &str) -> Result<Self, FormError> {
        let invalid = || FormError::InvalidPattern(raw.to_string());
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.trim().is_empty() || s.trim() != s) {
            return Err(invalid());
        }
        let stars: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_str() == WILDCARD)
            .map(|(i, _)| i)
            .collect();
        match stars.as_slice() {
            [] => Ok(Self {
                segments,
                wildcard: None,
            }),
            [0] => Err(invalid()),
            [i] => Ok(Self {
                segments,
                wildcard: Some(*i),
            }),
            _ => Err(invalid()),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard.is_some()
    }

    /// Path before the wildcard segment (`items` for `items.*.amount`).
    pub fn row_prefix(&self) -> Option<String> {
        self.wildcard.map(|i| self.segments[..i].join("."))
    }

    /// Match a concrete field name. `Some(None)` for a literal match,
    /// `Some(Some(i))` when the wildcard bound row `i`.
    pub fn capture(&self, name: &str) -> Option<Option<usize>> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut index = None;
        for (position, (segment, part)) in self.segments.iter().zip(&parts).enumerate() {
            if Some(position) == self.wildcard {
                index = Some(part.parse::<usize>().ok()?);
            } else if segment != part {
                return None;
            }
        }
        Some(index)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.capture(name).is_some()
    }

    /// Concrete field name for a row. Literal patterns ignore `index`;
    /// wildcard patterns need one.
    pub fn resolve(&self, index: Option<usize>) -> Option<String> {
        match (self.wildcard, index) {
            (None, _) => Some(self.segments.join(".")),
            (Some(star), Some(row)) => Some(
                self.segments
                    .iter()
                    .enumerate()
                    .map(|(i, s)| if i == star { row.to_string() } else { s.clone() })
                    .collect::<Vec<_>>()
                    .join("."),
            ),
            (Some(_), None) => None,
        }
    }

    /// Whether some concrete field name matches both patterns.
    pub fn overlaps(&self, other: &FieldPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .enumerate()
                .all(|(i, (a, b))| {
                    let a_star = Some(i) == self.wildcard;
                    let b_star = Some(i) == other.wildcard;
                    match (a_star, b_star) {
                        (true, true) => true,
                        (true, false) => b.parse::<usize>().is_ok(),
                        (false, true) => a.parse::<usize>().is_ok(),
                        (false, false) => a == b,
                    }
                })
    }
}

impl fmt::Display for FieldPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::FieldPattern;
    use crate::error::FormError;

    fn pattern(raw: &str) -> FieldPattern {
        FieldPattern::parse(raw).expect("valid pattern")
    }

    #[test]
    fn literal_patterns_match_exactly() {
        let p = pattern("due_date");
        assert_eq!(p.capture("due_date"), Some(None));
        assert_eq!(p.capture("due_date.x"), None);
        assert_eq!(p.resolve(Some(3)).as_deref(), Some("due_date"));
        assert!(!p.is_wildcard());
    }

    #[test]
    fn wildcard_binds_a_row_index() {
        let p = pattern("items.*.amount");
        assert_eq!(p.capture("items.2.amount"), Some(Some(2)));
        assert_eq!(p.capture("items.x.amount"), None);
        assert_eq!(p.capture("items.2.rate"), None);
        assert_eq!(p.resolve(Some(4)).as_deref(), Some("items.4.amount"));
        assert_eq!(p.resolve(None), None);
        assert_eq!(p.row_prefix().as_deref(), Some("items"));
    }

    #[test]
    fn overlap_considers_wildcards() {
        assert!(pattern("items.*.amount").overlaps(&pattern("items.0.amount")));
        assert!(pattern("items.*.amount").overlaps(&pattern("items.*.amount")));
        assert!(!pattern("items.*.amount").overlaps(&pattern("items.*.rate")));
        assert!(!pattern("subtotal").overlaps(&pattern("items.*.amount")));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        for raw in ["", "items..amount", "items.*.*", "*.amount", " total"] {
            assert_eq!(
                FieldPattern::parse(raw),
                Err(FormError::InvalidPattern(raw.to_string())),
                "{raw:?}"
            );
        }
    }
}
