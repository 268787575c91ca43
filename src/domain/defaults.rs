//! Named fallback rules applied when inputs are missing or unusable.

use super::entities::Category;

/// Marketing and profit percentages pre-filled when a category is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PercentDefaults {
    pub marketing: f64,
    pub profit: f64,
}

impl PercentDefaults {
    /// Used for category labels outside the known set.
    pub const FALLBACK: PercentDefaults = PercentDefaults {
        marketing: 10.0,
        profit: 25.0,
    };

    pub fn for_category(category: Category) -> Self {
        let (marketing, profit) = match category {
            Category::Food => (12.0, 25.0),
            Category::Goods => (10.0, 30.0),
            Category::Handicraft => (15.0, 35.0),
            Category::Herb => (12.0, 30.0),
            Category::Other => (10.0, 25.0),
        };
        Self { marketing, profit }
    }

    pub fn lookup(category: Option<Category>) -> Self {
        category.map(Self::for_category).unwrap_or(Self::FALLBACK)
    }
}

/// Yield used for per-unit division. Unset, zero, negative or non-finite
/// yields count as a single unit.
pub fn resolve_yield(yield_quantity: Option<f64>) -> f64 {
    match yield_quantity {
        Some(value) if value.is_finite() && value > 0.0 => value,
        _ => 1.0,
    }
}

/// Money and quantity inputs are never negative; NaN, infinities and
/// negatives collapse to zero.
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parses a user-typed amount. Blank or non-numeric text yields `None`.
pub fn parse_optional_amount(input: &str) -> Option<f64> {
    let cleaned: String = input.trim().chars().filter(|ch| *ch != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses a user-typed amount, treating anything unusable as zero.
pub fn parse_amount(input: &str) -> f64 {
    parse_optional_amount(input)
        .map(sanitize_amount)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn food_defaults_match_table() {
        let defaults = PercentDefaults::for_category(Category::Food);
        assert_eq!(defaults.marketing, 12.0);
        assert_eq!(defaults.profit, 25.0);
    }

    #[test]
    fn unknown_category_falls_back() {
        assert_eq!(PercentDefaults::lookup(None), PercentDefaults::FALLBACK);
        assert_eq!(
            PercentDefaults::lookup(Some(Category::Handicraft)),
            PercentDefaults {
                marketing: 15.0,
                profit: 35.0
            }
        );
    }

    #[test]
    fn yield_floors_to_one() {
        assert_eq!(resolve_yield(None), 1.0);
        assert_eq!(resolve_yield(Some(0.0)), 1.0);
        assert_eq!(resolve_yield(Some(-4.0)), 1.0);
        assert_eq!(resolve_yield(Some(f64::NAN)), 1.0);
        assert_eq!(resolve_yield(Some(12.0)), 12.0);
    }

    #[test]
    fn amounts_parse_leniently() {
        assert_eq!(parse_amount("20"), 20.0);
        assert_eq!(parse_amount(" 1,250.5 "), 1250.5);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("-3"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert_eq!(parse_optional_amount("  "), None);
        assert_eq!(parse_optional_amount("0"), Some(0.0));
    }
}
