//! crates/recipe_core/src/validation.rs
//!
//! Input checks shared by the auth and recipe handlers. Each failure carries
//! the message shown to the client.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{NewRecipe, RecipeChanges};

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Password must be at least 8 characters long and contain uppercase, lowercase, and numbers")]
    WeakPassword,
    #[error("Title is required")]
    MissingTitle,
    #[error("Ingredients must be a non-empty array")]
    MissingIngredients,
    #[error("Instructions must be a non-empty array")]
    MissingInstructions,
    #[error("Invalid category provided")]
    InvalidCategory(String),
}

pub fn validate_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// At least eight ASCII letters or digits, with an uppercase letter, a
/// lowercase letter and a digit among them.
pub fn validate_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LEN
        && password.chars().all(|c| c.is_ascii_alphanumeric())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Checks done before registration touches the database.
pub fn validate_registration(email: &str, password: &str) -> Result<(), ValidationError> {
    validate_login(email, password)?;
    if !validate_password(password) {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

/// Login only checks presence and shape; the password rules may have changed
/// since the account was created.
pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    if !validate_email(email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_new_recipe(recipe: &NewRecipe) -> Result<(), ValidationError> {
    if recipe.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if recipe.instructions.is_empty() {
        return Err(ValidationError::MissingInstructions);
    }
    if recipe.ingredients.is_empty() {
        return Err(ValidationError::MissingIngredients);
    }
    Ok(())
}

/// Fields that are present in an update must still satisfy the create rules.
pub fn validate_changes(changes: &RecipeChanges) -> Result<(), ValidationError> {
    if matches!(&changes.title, Some(t) if t.trim().is_empty()) {
        return Err(ValidationError::MissingTitle);
    }
    if matches!(&changes.instructions, Some(i) if i.is_empty()) {
        return Err(ValidationError::MissingInstructions);
    }
    if matches!(&changes.ingredients, Some(i) if i.is_empty()) {
        return Err(ValidationError::MissingIngredients);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParsedIngredient;

    fn recipe() -> NewRecipe {
        NewRecipe {
            title: "Pancakes".to_string(),
            instructions: vec!["Mix".to_string()],
            ingredients: vec![ParsedIngredient {
                name: "flour".to_string(),
                amount: "2".to_string(),
                unit: "cups".to_string(),
            }],
            tags: vec![],
            categories: vec![],
            prep_time: "0".to_string(),
            cook_time: "0".to_string(),
            servings: "1".to_string(),
            difficulty: "EASY".to_string(),
        }
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("user@example.com"));
        assert!(!validate_email("user@example"));
        assert!(!validate_email("user example@x.com"));
        assert!(!validate_email("@example.com"));
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password("Password123"));
        assert!(!validate_password("weak"));
        assert!(!validate_password("password123"));
        assert!(!validate_password("PASSWORD123"));
        assert!(!validate_password("Passwordabc"));
        assert!(!validate_password("Password 123"));
    }

    #[test]
    fn test_registration_checks_in_order() {
        assert_eq!(
            validate_registration("", "Password123"),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            validate_registration("nope", "weak"),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_registration("a@b.co", "weak"),
            Err(ValidationError::WeakPassword)
        );
        assert_eq!(validate_registration("a@b.co", "Password123"), Ok(()));
    }

    #[test]
    fn test_weak_password_message() {
        assert_eq!(
            ValidationError::WeakPassword.to_string(),
            "Password must be at least 8 characters long and contain uppercase, lowercase, and numbers"
        );
    }

    #[test]
    fn test_new_recipe_rules() {
        assert_eq!(validate_new_recipe(&recipe()), Ok(()));

        let mut r = recipe();
        r.title = "  ".to_string();
        assert_eq!(validate_new_recipe(&r), Err(ValidationError::MissingTitle));

        let mut r = recipe();
        r.instructions.clear();
        assert_eq!(validate_new_recipe(&r), Err(ValidationError::MissingInstructions));

        let mut r = recipe();
        r.ingredients.clear();
        assert_eq!(validate_new_recipe(&r), Err(ValidationError::MissingIngredients));
    }

    #[test]
    fn test_changes_only_check_present_fields() {
        assert_eq!(validate_changes(&RecipeChanges::default()), Ok(()));
        let changes = RecipeChanges {
            instructions: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            validate_changes(&changes),
            Err(ValidationError::MissingInstructions)
        );
    }
}
