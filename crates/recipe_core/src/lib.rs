pub mod categories;
pub mod domain;
pub mod generation;
pub mod ingredients;
pub mod ports;
pub mod validation;

pub use domain::{
    Difficulty, GeneratedRecipe, IngredientEntry, NewRecipe, ParsedIngredient, Recipe,
    RecipeChanges, RecipePreview, RecipePrompt, Servings, User, UserCredentials,
};
pub use generation::{GenerationError, RecipeGenerator, SAMPLING};
pub use ports::{DatabaseService, PortError, PortResult, RecipeGenerationService};
pub use validation::ValidationError;
