//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the recipe endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    auth::{
        __path_login_handler, __path_profile_handler, __path_register_handler, AuthResponse,
        LoginRequest, ProfileResponse, RegisterRequest, UserResponse,
    },
    error::HttpError,
    protocol::{
        ErrorBody, GenerateRecipeResponse, IngredientResponse, PreviewResponse, RecipePromptRequest,
        RecipeRequest, RecipeResponse, UpdateCategoriesRequest, UpdateRecipeRequest,
    },
    state::{AppState, AuthUser},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use recipe_core::{
    categories::{canonical_category, resolve_categories, PREDEFINED_CATEGORIES},
    GenerationError, PortError, RecipePrompt,
};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use uuid::Uuid;

const GENERATION_FAILED: &str = "Failed to generate recipe";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        register_handler,
        login_handler,
        profile_handler,
        generate_recipe_handler,
        save_recipe_handler,
        create_recipe_handler,
        list_recipes_handler,
        get_recipe_handler,
        update_recipe_handler,
        delete_recipe_handler,
        update_categories_handler,
        list_categories_handler,
        recipes_by_category_handler,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, UserResponse, AuthResponse, ProfileResponse,
            RecipePromptRequest, RecipeRequest, UpdateRecipeRequest, UpdateCategoriesRequest,
            IngredientResponse, RecipeResponse, PreviewResponse, GenerateRecipeResponse, ErrorBody
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Recipe Assistant API", description = "Generate recipes from what is in the kitchen and keep the ones worth cooking again.")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Ids that do not parse cannot name a recipe, so they are simply not found.
fn parse_recipe_id(raw: &str) -> Result<Uuid, HttpError> {
    Uuid::parse_str(raw).map_err(|_| HttpError::recipe_not_found())
}

fn read_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| HttpError::BadRequest(rejection.body_text()))
}

/// Builds the 409 for a title the caller already uses.
async fn title_conflict(state: &AppState, user_id: Uuid, title: &str) -> HttpError {
    match state.db.find_recipe_by_title(user_id, title).await {
        Ok(Some(existing)) => HttpError::Conflict {
            existing: Box::new(existing.into()),
            preview: None,
        },
        Ok(None) => HttpError::internal("Failed to save recipe", "title conflict with no matching recipe"),
        Err(e) => HttpError::internal("Failed to save recipe", e),
    }
}

async fn store_recipe(
    state: &AppState,
    auth: &AuthUser,
    request: RecipeRequest,
) -> Result<(StatusCode, Json<RecipeResponse>), HttpError> {
    let recipe = request.into_new_recipe()?;

    match state.db.create_recipe(auth.id, &recipe).await {
        Ok(saved) => {
            info!(recipe_id = %saved.id, user_id = %auth.id, "Saved recipe");
            Ok((StatusCode::CREATED, Json(saved.into())))
        }
        Err(PortError::Conflict(_)) => Err(title_conflict(state, auth.id, &recipe.title).await),
        Err(e) => Err(HttpError::internal("Failed to save recipe", e)),
    }
}

//=========================================================================================
// Generation
//=========================================================================================

/// Generate a recipe preview. Nothing is stored.
///
/// If the caller already has a recipe with the generated title, the preview is
/// returned alongside it with a 409.
#[utoipa::path(
    post,
    path = "/api/recipes/generate",
    request_body = RecipePromptRequest,
    responses(
        (status = 200, description = "A recipe preview", body = GenerateRecipeResponse),
        (status = 400, description = "Recipe prompt is required", body = ErrorBody),
        (status = 409, description = "A recipe with this title already exists", body = ErrorBody),
        (status = 500, description = "Failed to generate recipe", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn generate_recipe_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<RecipePromptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let prompt: RecipePrompt = match payload {
        Ok(Json(body)) => body.into(),
        Err(_) => return Err(HttpError::BadRequest(GenerationError::EmptyPrompt.to_string())),
    };

    let preview = state.generator.generate(&prompt).await.map_err(|e| match e {
        GenerationError::EmptyPrompt => HttpError::BadRequest(e.to_string()),
        other => {
            error!(user_id = %auth.id, "Recipe generation failed: {}", other);
            HttpError::Internal(GENERATION_FAILED.to_string())
        }
    })?;
    let preview = PreviewResponse::from(preview);

    match state.db.find_recipe_by_title(auth.id, &preview.title).await {
        Ok(Some(existing)) => Err(HttpError::Conflict {
            existing: Box::new(existing.into()),
            preview: Some(Box::new(preview)),
        }),
        Ok(None) => Ok(Json(GenerateRecipeResponse { preview })),
        Err(e) => Err(HttpError::internal(GENERATION_FAILED, e)),
    }
}

//=========================================================================================
// Recipe CRUD
//=========================================================================================

/// Save a (possibly edited) preview.
#[utoipa::path(
    post,
    path = "/api/recipes/save",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe saved", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = ErrorBody),
        (status = 409, description = "A recipe with this title already exists", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_recipe_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    store_recipe(&state, &auth, read_body(payload)?).await
}

/// Create a recipe from scratch.
#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = ErrorBody),
        (status = 409, description = "A recipe with this title already exists", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_recipe_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    store_recipe(&state, &auth, read_body(payload)?).await
}

/// List the caller's recipes, newest first.
#[utoipa::path(
    get,
    path = "/api/recipes",
    responses(
        (status = 200, description = "The caller's recipes", body = [RecipeResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_recipes_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, HttpError> {
    let recipes = state
        .db
        .list_recipes(auth.id)
        .await
        .map_err(|e| HttpError::internal("Failed to fetch recipes", e))?;

    Ok(Json(
        recipes.into_iter().map(RecipeResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(("id" = String, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "The recipe", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_recipe_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let recipe_id = parse_recipe_id(&id)?;
    let recipe = state
        .db
        .get_recipe(auth.id, recipe_id)
        .await
        .map_err(|e| HttpError::from_recipe_lookup(e, "Failed to fetch recipe"))?;

    Ok(Json(RecipeResponse::from(recipe)))
}

/// Change some fields of a recipe. Lists that are sent replace the stored ones.
#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    params(("id" = String, Path, description = "Recipe id")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "The updated recipe", body = RecipeResponse),
        (status = 400, description = "Invalid changes", body = ErrorBody),
        (status = 404, description = "Recipe not found", body = ErrorBody),
        (status = 409, description = "Another recipe already has this title", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_recipe_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateRecipeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let recipe_id = parse_recipe_id(&id)?;
    let changes = read_body(payload)?.into_changes()?;

    match state.db.update_recipe(auth.id, recipe_id, &changes).await {
        Ok(recipe) => Ok(Json(RecipeResponse::from(recipe))),
        Err(PortError::Conflict(_)) => {
            let title = changes.title.as_deref().unwrap_or_default();
            Err(title_conflict(&state, auth.id, title).await)
        }
        Err(e) => Err(HttpError::from_recipe_lookup(e, "Failed to update recipe")),
    }
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(("id" = String, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 404, description = "Recipe not found", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_recipe_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let recipe_id = parse_recipe_id(&id)?;
    state
        .db
        .delete_recipe(auth.id, recipe_id)
        .await
        .map_err(|e| HttpError::from_recipe_lookup(e, "Failed to delete recipe"))?;

    info!(%recipe_id, user_id = %auth.id, "Deleted recipe");
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Categories
//=========================================================================================

/// Replace a recipe's categories.
#[utoipa::path(
    patch,
    path = "/api/recipes/{id}/categories",
    params(("id" = String, Path, description = "Recipe id")),
    request_body = UpdateCategoriesRequest,
    responses(
        (status = 200, description = "The updated recipe", body = RecipeResponse),
        (status = 400, description = "Invalid category provided", body = ErrorBody),
        (status = 404, description = "Recipe not found", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_categories_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCategoriesRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let recipe_id = parse_recipe_id(&id)?;
    let names = read_body(payload)?
        .categories
        .ok_or_else(|| HttpError::BadRequest("Categories must be an array".to_string()))?;
    let categories = resolve_categories(&names)?;

    let recipe = state
        .db
        .set_recipe_categories(auth.id, recipe_id, &categories)
        .await
        .map_err(|e| HttpError::from_recipe_lookup(e, "Failed to update categories"))?;

    Ok(Json(RecipeResponse::from(recipe)))
}

/// The fixed set of categories a recipe may be filed under.
#[utoipa::path(
    get,
    path = "/api/recipes/categories/all",
    responses(
        (status = 200, description = "All categories", body = [String])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_categories_handler() -> impl IntoResponse {
    Json(PREDEFINED_CATEGORIES.to_vec())
}

#[utoipa::path(
    get,
    path = "/api/recipes/category/{name}",
    params(("name" = String, Path, description = "Category name, any case")),
    responses(
        (status = 200, description = "The caller's recipes in the category", body = [RecipeResponse]),
        (status = 400, description = "Invalid category", body = ErrorBody)
    ),
    security(("bearer_auth" = []))
)]
pub async fn recipes_by_category_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let category = canonical_category(&name)
        .ok_or_else(|| HttpError::BadRequest("Invalid category".to_string()))?;

    let recipes = state
        .db
        .list_recipes_in_category(auth.id, category)
        .await
        .map_err(|e| HttpError::internal("Failed to fetch recipes", e))?;

    Ok(Json(
        recipes.into_iter().map(RecipeResponse::from).collect::<Vec<_>>(),
    ))
}
