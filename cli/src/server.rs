use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use prep_core::models::{
    ExportData, ImportSummary, Ingredient, PurchaseItem, PurchaseList, Recipe, RecipeDetail,
    RecipeIngredient, new_id, validate_export, validate_ingredient, validate_recipe,
    validate_table_count,
};
use prep_core::service::Kitchen;

const BODY_LIMIT: usize = 5 * 1024 * 1024; // 5 MB

#[derive(Clone)]
struct AppState {
    kitchen: Arc<Mutex<Kitchen>>,
    api_key: Option<String>,
}

impl AppState {
    fn kitchen(&self) -> MutexGuard<'_, Kitchen> {
        self.kitchen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct IngredientRequest {
    id: Option<String>,
    name: String,
    unit: String,
    description: Option<String>,
}

#[derive(Deserialize)]
struct RecipeRequest {
    id: Option<String>,
    name: String,
    #[serde(default)]
    ingredients: Vec<RecipeIngredient>,
    description: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

fn bad_request(err: &anyhow::Error) -> ApiError {
    ApiError::BadRequest(format!("{err:#}"))
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Ingredient handlers ---

async fn list_ingredients(State(state): State<AppState>) -> Json<Vec<Ingredient>> {
    Json(state.kitchen().ingredients().to_vec())
}

async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ingredient>, ApiError> {
    state
        .kitchen()
        .get_ingredient(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Ingredient '{id}' not found")))
}

async fn create_ingredient(
    State(state): State<AppState>,
    Json(req): Json<IngredientRequest>,
) -> Result<(StatusCode, Json<Ingredient>), ApiError> {
    let ingredient = validate_ingredient(&Ingredient {
        id: req.id.unwrap_or_else(new_id),
        name: req.name,
        unit: req.unit,
        description: req.description,
    })
    .map_err(|e| bad_request(&e))?;

    state.kitchen().add_ingredient(ingredient.clone())?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<IngredientRequest>,
) -> Result<Json<Ingredient>, ApiError> {
    let ingredient = validate_ingredient(&Ingredient {
        id: id.clone(),
        name: req.name,
        unit: req.unit,
        description: req.description,
    })
    .map_err(|e| bad_request(&e))?;

    if state.kitchen().update_ingredient(ingredient.clone())? {
        Ok(Json(ingredient))
    } else {
        Err(ApiError::NotFound(format!("Ingredient '{id}' not found")))
    }
}

async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.kitchen().delete_ingredient(&id)? > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Ingredient '{id}' not found")))
    }
}

// --- Recipe handlers ---

async fn list_recipes(State(state): State<AppState>) -> Json<Vec<Recipe>> {
    Json(state.kitchen().recipes().to_vec())
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecipeDetail>, ApiError> {
    state
        .kitchen()
        .recipe_detail(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Recipe '{id}' not found")))
}

async fn create_recipe(
    State(state): State<AppState>,
    Json(req): Json<RecipeRequest>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let recipe = validate_recipe(&Recipe {
        id: req.id.unwrap_or_else(new_id),
        name: req.name,
        ingredients: req.ingredients,
        description: req.description,
    })
    .map_err(|e| bad_request(&e))?;

    state.kitchen().add_recipe(recipe.clone())?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RecipeRequest>,
) -> Result<Json<Recipe>, ApiError> {
    let recipe = validate_recipe(&Recipe {
        id: id.clone(),
        name: req.name,
        ingredients: req.ingredients,
        description: req.description,
    })
    .map_err(|e| bad_request(&e))?;

    if state.kitchen().update_recipe(recipe.clone())? {
        Ok(Json(recipe))
    } else {
        Err(ApiError::NotFound(format!("Recipe '{id}' not found")))
    }
}

async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.kitchen().delete_recipe(&id)? > 0 {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Recipe '{id}' not found")))
    }
}

// --- Purchase handlers ---

async fn list_purchase_items(State(state): State<AppState>) -> Json<Vec<PurchaseItem>> {
    Json(state.kitchen().purchase_items().to_vec())
}

async fn select_recipe(
    State(state): State<AppState>,
    Json(item): Json<PurchaseItem>,
) -> Result<Json<Vec<PurchaseItem>>, ApiError> {
    validate_table_count(item.table_count).map_err(|e| bad_request(&e))?;
    let mut kitchen = state.kitchen();
    kitchen.select(item);
    Ok(Json(kitchen.purchase_items().to_vec()))
}

async fn clear_purchase(State(state): State<AppState>) -> StatusCode {
    state.kitchen().clear_selection();
    StatusCode::NO_CONTENT
}

async fn deselect_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.kitchen().deselect(&recipe_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "Recipe '{recipe_id}' is not selected"
        )))
    }
}

async fn purchase_list(State(state): State<AppState>) -> Json<PurchaseList> {
    Json(state.kitchen().purchase_list())
}

// --- Export / Import ---

async fn export_data(State(state): State<AppState>) -> Json<ExportData> {
    Json(state.kitchen().export())
}

async fn import_data(
    State(state): State<AppState>,
    Json(data): Json<ExportData>,
) -> Result<Json<ImportSummary>, ApiError> {
    let data = validate_export(&data).map_err(|e| bad_request(&e))?;
    let summary = state.kitchen().import(data)?;
    Ok(Json(summary))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/ingredients",
            get(list_ingredients).post(create_ingredient),
        )
        .route(
            "/api/ingredients/{id}",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
        .route("/api/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/api/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route(
            "/api/purchase",
            get(list_purchase_items)
                .post(select_recipe)
                .delete(clear_purchase),
        )
        .route("/api/purchase/list", get(purchase_list))
        .route("/api/purchase/{recipe_id}", delete(deselect_recipe))
        .route("/api/export", get(export_data))
        .route("/api/import", post(import_data))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    kitchen: Kitchen,
    port: u16,
    bind: &str,
    api_key: Option<String>,
    new_api_key: bool,
) -> anyhow::Result<()> {
    let state = AppState {
        kitchen: Arc::new(Mutex::new(kitchen)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    match api_key.as_deref() {
        Some(key) if key.len() >= 8 && key.is_ascii() => eprintln!(
            "API key: {}...{} (see api_key file in data directory)",
            &key[..4],
            &key[key.len() - 4..],
        ),
        Some(_) => eprintln!("API key: see api_key file in data directory"),
        None => {
            eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
        }
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    if new_api_key {
        if let Some(ref key) = api_key {
            eprintln!("{}", connect_hint(key));
        }
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    eprintln!("Listening on http://{bind}:{port}");
    tracing::info!(bind, port, auth = api_key.is_some(), "server started");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Printed once, when the key was just generated.
fn connect_hint(key: &str) -> String {
    format!("New API key generated. Send it with every request:\n  Authorization: Bearer {key}")
}
