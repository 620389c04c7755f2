//! crates/recipe_core/src/categories.rs
//!
//! The fixed set of categories a recipe can be filed under.

use crate::validation::ValidationError;

pub const PREDEFINED_CATEGORIES: &[&str] = &[
    "Breakfast",
    "Lunch",
    "Dinner",
    "Dessert",
    "Appetizer",
    "Snack",
    "Vegetarian",
    "Vegan",
    "Gluten-Free",
    "Low-Carb",
    "Mediterranean",
    "Asian",
    "Mexican",
    "Italian",
    "Quick & Easy",
    "Slow Cooker",
    "Meal Prep",
    "Holiday",
];

/// Looks up a category ignoring case and returns its canonical spelling.
pub fn canonical_category(name: &str) -> Option<&'static str> {
    let name = name.trim();
    PREDEFINED_CATEGORIES
        .iter()
        .copied()
        .find(|c| c.eq_ignore_ascii_case(name))
}

/// Resolves every name to its canonical spelling, dropping duplicates.
/// Fails on the first unknown name so nothing is written for a bad request.
pub fn resolve_categories(names: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut resolved: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let canonical = canonical_category(name)
            .ok_or_else(|| ValidationError::InvalidCategory(name.clone()))?;
        if !resolved.iter().any(|c| c == canonical) {
            resolved.push(canonical.to_string());
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(canonical_category("quick & easy"), Some("Quick & Easy"));
        assert_eq!(canonical_category("DINNER"), Some("Dinner"));
        assert_eq!(canonical_category("Brunch"), None);
    }

    #[test]
    fn resolve_dedupes_and_rejects_unknown() {
        let names = vec!["vegan".to_string(), "Vegan".to_string(), "Asian".to_string()];
        assert_eq!(
            resolve_categories(&names),
            Ok(vec!["Vegan".to_string(), "Asian".to_string()])
        );

        let names = vec!["Dinner".to_string(), "Brunch".to_string()];
        assert_eq!(
            resolve_categories(&names),
            Err(ValidationError::InvalidCategory("Brunch".to_string()))
        );
    }
}
