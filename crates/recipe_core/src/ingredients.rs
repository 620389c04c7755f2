//! crates/recipe_core/src/ingredients.rs
//!
//! Splits a free-text ingredient line ("2 cups flour") into amount, unit and name.
//!
//! The token directly after the amount is always taken as the unit and the rest
//! of the line as the name, so a multi-word unit such as "fluid ounces" ends up
//! as unit "fluid" with "ounces ..." leading the name.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{IngredientEntry, ParsedIngredient};

pub const DEFAULT_AMOUNT: &str = "1";
pub const DEFAULT_UNIT: &str = "unit";

static INGREDIENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\d./]+)\s+(\S+)\s+(.+)$").expect("ingredient pattern is valid")
});

/// Parses one ingredient line. Lines that don't look like `<amount> <unit> <name>`
/// keep their full text as the name with a default amount and unit.
pub fn parse_ingredient(line: &str) -> ParsedIngredient {
    let trimmed = line.trim();

    match INGREDIENT_LINE.captures(trimmed) {
        Some(caps) => ParsedIngredient {
            amount: caps[1].to_string(),
            unit: caps[2].to_string(),
            name: caps[3].trim().to_string(),
        },
        None => ParsedIngredient {
            name: trimmed.to_string(),
            amount: DEFAULT_AMOUNT.to_string(),
            unit: DEFAULT_UNIT.to_string(),
        },
    }
}

/// Turns a line or a structured entry into a `ParsedIngredient`, filling in the
/// default amount and unit where a structured entry leaves them out.
pub fn normalize_entry(entry: &IngredientEntry) -> ParsedIngredient {
    match entry {
        IngredientEntry::Line(line) => parse_ingredient(line),
        IngredientEntry::Structured { name, amount, unit } => ParsedIngredient {
            name: name.trim().to_string(),
            amount: or_default(amount.as_deref(), DEFAULT_AMOUNT),
            unit: or_default(unit.as_deref(), DEFAULT_UNIT),
        },
    }
}

fn or_default(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(amount: &str, unit: &str, name: &str) -> ParsedIngredient {
        ParsedIngredient {
            amount: amount.to_string(),
            unit: unit.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_amount_unit_name() {
        assert_eq!(parse_ingredient("2 cups flour"), parsed("2", "cups", "flour"));
    }

    #[test]
    fn test_fraction_and_decimal_amounts_kept_as_written() {
        assert_eq!(
            parse_ingredient("1/2 tsp baking soda"),
            parsed("1/2", "tsp", "baking soda")
        );
        assert_eq!(
            parse_ingredient("1.5 lbs chicken thighs"),
            parsed("1.5", "lbs", "chicken thighs")
        );
    }

    #[test]
    fn test_multi_word_unit_splits_after_first_token() {
        assert_eq!(
            parse_ingredient("8 fluid ounces whole milk"),
            parsed("8", "fluid", "ounces whole milk")
        );
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert_eq!(parse_ingredient("  3 cloves garlic  "), parsed("3", "cloves", "garlic"));
    }

    #[test]
    fn test_unmatched_line_falls_back() {
        assert_eq!(
            parse_ingredient("salt to taste"),
            parsed("1", "unit", "salt to taste")
        );
        // amount and unit but no name
        assert_eq!(parse_ingredient("2 eggs"), parsed("1", "unit", "2 eggs"));
        assert_eq!(parse_ingredient("  salt  "), parsed("1", "unit", "salt"));
    }

    #[test]
    fn test_structured_entry_defaults() {
        let entry = IngredientEntry::Structured {
            name: " basil ".to_string(),
            amount: None,
            unit: Some("".to_string()),
        };
        assert_eq!(normalize_entry(&entry), parsed("1", "unit", "basil"));
    }
}
