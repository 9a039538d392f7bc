//! Product API: catalog CRUD, search, bulk updates, duplication.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use meridian_core::validation::{validate_name, validate_price_cents, validate_sku};
use meridian_core::Product;
use meridian_db::{BulkProductChanges, ProductFeatureInput, ProductFilter, ProductImageInput};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/products", product_routes())
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/search", get(search))
        .route("/low-stock", get(low_stock))
        .route("/filter-options", get(filter_options))
        .route("/bulk-update", post(bulk_update))
        .route(
            "/{id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route("/{id}/full", get(get_full))
        .route("/{id}/duplicate", post(duplicate))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    include_images: bool,
    #[serde(default)]
    include_features: bool,
}

/// GET /api/products - active catalog, optionally with side tables
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let products = state.db.products().list().await?;

    if query.include_images || query.include_features {
        let details = state
            .db
            .products()
            .attach_detail(products, query.include_images, query.include_features)
            .await?;
        return Ok(Json(details).into_response());
    }

    Ok(Json(products).into_response())
}

/// GET /api/products/search - conjunctive filter (see ProductFilter)
async fn search(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.db.products().search(&filter).await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
struct LowStockQuery {
    threshold: Option<i64>,
}

/// GET /api/products/low-stock
async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let threshold = query
        .threshold
        .unwrap_or(meridian_core::DEFAULT_LOW_STOCK_THRESHOLD);
    let products = state.db.products().low_stock(threshold).await?;
    Ok(Json(products))
}

/// GET /api/products/filter-options - distinct dropdown values
async fn filter_options(
    State(state): State<AppState>,
) -> Result<Json<meridian_db::FilterOptions>, ApiError> {
    let options = state.db.products().filter_options().await?;
    Ok(Json(options))
}

/// Create/update payload. Optional `images`/`features` replace the
/// side tables when present; omitting them touches nothing. There is
/// no reduced "basic" fallback shape.
#[derive(Debug, Deserialize)]
struct ProductRequest {
    sku: String,
    name: String,
    category: Option<String>,
    product_type: Option<String>,
    brand: Option<String>,
    collection: Option<String>,
    material: Option<String>,
    color: Option<String>,
    gender: Option<String>,
    laptop_size: Option<String>,
    description: Option<String>,
    dimensions: Option<String>,
    weight: Option<String>,
    care_instructions: Option<String>,
    warranty_info: Option<String>,
    price_cents: i64,
    #[serde(default)]
    stock_quantity: i64,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    is_featured: bool,
    image_url: Option<String>,
    images: Option<Vec<ProductImageInput>>,
    features: Option<Vec<ProductFeatureInput>>,
}

fn default_true() -> bool {
    true
}

impl ProductRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_sku(&self.sku)?;
        validate_name("name", &self.name)?;
        validate_price_cents(self.price_cents)?;
        Ok(())
    }

    /// Builds the domain struct, keeping identity and creation time
    /// from an existing row when updating.
    fn into_product(self, id: String, created_at: chrono::DateTime<chrono::Utc>) -> Product {
        Product {
            id,
            sku: self.sku,
            name: self.name,
            category: self.category,
            product_type: self.product_type,
            brand: self.brand,
            collection: self.collection,
            material: self.material,
            color: self.color,
            gender: self.gender,
            laptop_size: self.laptop_size,
            description: self.description,
            dimensions: self.dimensions,
            weight: self.weight,
            care_instructions: self.care_instructions,
            warranty_info: self.warranty_info,
            price_cents: self.price_cents,
            stock_quantity: self.stock_quantity,
            is_active: self.is_active,
            is_featured: self.is_featured,
            image_url: self.image_url,
            created_at,
            updated_at: Utc::now(),
        }
    }
}

/// POST /api/products
async fn create(
    State(state): State<AppState>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<Product>, ApiError> {
    request.validate()?;

    let images = request.images.clone().unwrap_or_default();
    let features = request.features.clone().unwrap_or_default();
    let now = Utc::now();
    let product = request.into_product(Uuid::new_v4().to_string(), now);

    state.db.products().insert(&product, &images, &features).await?;

    Ok(Json(product))
}

/// GET /api/products/{id}
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    Ok(Json(product))
}

/// GET /api/products/{id}/full - product joined with images/features
async fn get_full(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<meridian_core::ProductDetail>, ApiError> {
    let detail = state
        .db
        .products()
        .get_detail(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    Ok(Json(detail))
}

/// PUT /api/products/{id}
async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<Product>, ApiError> {
    request.validate()?;

    let existing = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    let images = request.images.clone();
    let features = request.features.clone();
    let product = request.into_product(existing.id, existing.created_at);

    state
        .db
        .products()
        .update(&product, images.as_deref(), features.as_deref())
        .await?;

    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    hard: bool,
}

/// DELETE /api/products/{id} - soft by default, hard with ?hard=true
async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if query.hard {
        state.db.products().hard_delete(&id).await?;
    } else {
        state.db.products().soft_delete(&id).await?;
    }

    Ok(Json(serde_json::json!({ "deleted": id, "hard": query.hard })))
}

#[derive(Debug, Deserialize)]
struct BulkUpdateRequest {
    ids: Vec<String>,
    changes: BulkProductChanges,
}

/// POST /api/products/bulk-update - closed field set over an id list
async fn bulk_update(
    State(state): State<AppState>,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.ids.is_empty() {
        return Err(ApiError::validation("ids must not be empty"));
    }
    if request.changes.is_empty() {
        return Err(ApiError::validation("no fields to update"));
    }
    if let Some(price) = request.changes.price_cents {
        validate_price_cents(price)?;
    }

    let updated = state
        .db
        .products()
        .bulk_update(&request.ids, &request.changes)
        .await?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}

/// POST /api/products/{id}/duplicate
async fn duplicate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let copy = state.db.products().duplicate(&id).await?;
    Ok(Json(copy))
}
