//! # Product Repository
//!
//! Database operations for the catalog: CRUD, dynamic search, bulk
//! updates, duplication, and the low-stock listing.
//!
//! ## Dynamic Filters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 How the Search Filter Works                             │
//! │                                                                         │
//! │  ProductFilter { q: Some("tote"), brand: Some("Kestrel"), .. }         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  QueryBuilder appends one AND clause per present field:                │
//! │                                                                         │
//! │    SELECT * FROM products WHERE is_active = 1                          │
//! │      AND (name LIKE ? OR description LIKE ? OR sku LIKE ?)             │
//! │      AND brand = ?                                                     │
//! │                                                                         │
//! │  An absent field adds no clause: absence means "no constraint",        │
//! │  never "match empty".                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use meridian_core::{Product, ProductDetail, ProductFeature, ProductImage};

/// A new side-table image, as sent by the admin form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImageInput {
    pub url: String,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// A new name/value feature pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFeatureInput {
    pub name: String,
    pub value: String,
}

/// Conjunctive search predicate. Every field is optional; absent
/// fields constrain nothing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Free text, matched against name, description, and SKU.
    pub q: Option<String>,
    pub brand: Option<String>,
    pub collection: Option<String>,
    pub material: Option<String>,
    pub product_type: Option<String>,
    pub color: Option<String>,
    pub gender: Option<String>,
    pub laptop_size: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
}

/// The closed set of fields a bulk update may touch.
///
/// Unknown keys are rejected at deserialization time rather than
/// being reflectively mapped onto columns.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkProductChanges {
    pub price_cents: Option<i64>,
    pub stock_quantity: Option<i64>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub collection: Option<String>,
}

impl BulkProductChanges {
    /// True when no field is set - such a request is rejected.
    pub fn is_empty(&self) -> bool {
        self.price_cents.is_none()
            && self.stock_quantity.is_none()
            && self.is_active.is_none()
            && self.is_featured.is_none()
            && self.category.is_none()
            && self.brand.is_none()
            && self.collection.is_none()
    }
}

/// Distinct values available for the storefront filter dropdowns.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub brands: Vec<String>,
    pub collections: Vec<String>,
    pub materials: Vec<String>,
    pub product_types: Vec<String>,
    pub colors: Vec<String>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = ?1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product joined with its images and features.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<ProductDetail>> {
        let Some(product) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let images = sqlx::query_as::<_, ProductImage>(
            "SELECT * FROM product_images WHERE product_id = ?1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let features = sqlx::query_as::<_, ProductFeature>(
            "SELECT * FROM product_features WHERE product_id = ?1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ProductDetail {
            product,
            images,
            features,
        }))
    }

    /// Attaches side tables to a product list in two batched queries.
    ///
    /// Used by the list endpoint's include flags; avoids a query per
    /// product.
    pub async fn attach_detail(
        &self,
        products: Vec<Product>,
        include_images: bool,
        include_features: bool,
    ) -> DbResult<Vec<ProductDetail>> {
        let ids: Vec<String> = products.iter().map(|p| p.id.clone()).collect();

        let mut images_by_product: HashMap<String, Vec<ProductImage>> = HashMap::new();
        if include_images && !ids.is_empty() {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "SELECT * FROM product_images WHERE product_id IN (",
            );
            let mut sep = qb.separated(", ");
            for id in &ids {
                sep.push_bind(id);
            }
            qb.push(") ORDER BY position");

            let images = qb
                .build_query_as::<ProductImage>()
                .fetch_all(&self.pool)
                .await?;
            for image in images {
                images_by_product
                    .entry(image.product_id.clone())
                    .or_default()
                    .push(image);
            }
        }

        let mut features_by_product: HashMap<String, Vec<ProductFeature>> = HashMap::new();
        if include_features && !ids.is_empty() {
            let mut qb = QueryBuilder::<Sqlite>::new(
                "SELECT * FROM product_features WHERE product_id IN (",
            );
            let mut sep = qb.separated(", ");
            for id in &ids {
                sep.push_bind(id);
            }
            qb.push(") ORDER BY position");

            let features = qb
                .build_query_as::<ProductFeature>()
                .fetch_all(&self.pool)
                .await?;
            for feature in features {
                features_by_product
                    .entry(feature.product_id.clone())
                    .or_default()
                    .push(feature);
            }
        }

        Ok(products
            .into_iter()
            .map(|product| {
                let images = images_by_product.remove(&product.id).unwrap_or_default();
                let features = features_by_product.remove(&product.id).unwrap_or_default();
                ProductDetail {
                    product,
                    images,
                    features,
                }
            })
            .collect())
    }

    /// Searches active products with a conjunctive filter.
    pub async fn search(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        debug!(?filter, "Searching products");

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM products WHERE is_active = 1");

        if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
            let pattern = format!("%{}%", q.trim());
            qb.push(" AND (name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR description LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR sku LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        let exact_fields: [(&str, &Option<String>); 7] = [
            ("brand", &filter.brand),
            ("collection", &filter.collection),
            ("material", &filter.material),
            ("product_type", &filter.product_type),
            ("color", &filter.color),
            ("gender", &filter.gender),
            ("laptop_size", &filter.laptop_size),
        ];
        for (column, value) in exact_fields {
            if let Some(value) = value {
                qb.push(format!(" AND {column} = "));
                qb.push_bind(value.clone());
            }
        }

        if let Some(min) = filter.min_price_cents {
            qb.push(" AND price_cents >= ");
            qb.push_bind(min);
        }
        if let Some(max) = filter.max_price_cents {
            qb.push(" AND price_cents <= ");
            qb.push_bind(max);
        }
        if let Some(in_stock) = filter.in_stock {
            if in_stock {
                qb.push(" AND stock_quantity > 0");
            } else {
                qb.push(" AND stock_quantity <= 0");
            }
        }
        if let Some(featured) = filter.featured {
            qb.push(" AND is_featured = ");
            qb.push_bind(featured);
        }

        qb.push(" ORDER BY name");

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Inserts a new product with its side tables in one transaction.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - SKU already exists
    pub async fn insert(
        &self,
        product: &Product,
        images: &[ProductImageInput],
        features: &[ProductFeatureInput],
    ) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, category, product_type, brand, collection,
                material, color, gender, laptop_size, description, dimensions,
                weight, care_instructions, warranty_info, price_cents,
                stock_quantity, is_active, is_featured, image_url,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21,
                ?22, ?23
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.product_type)
        .bind(&product.brand)
        .bind(&product.collection)
        .bind(&product.material)
        .bind(&product.color)
        .bind(&product.gender)
        .bind(&product.laptop_size)
        .bind(&product.description)
        .bind(&product.dimensions)
        .bind(&product.weight)
        .bind(&product.care_instructions)
        .bind(&product.warranty_info)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.is_active)
        .bind(product.is_featured)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_side_tables(&mut tx, &product.id, images, features).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Updates a product; when `images`/`features` are provided the
    /// corresponding side table is replaced wholesale.
    ///
    /// One endpoint with optional sub-arrays - there is no separate
    /// "basic" save path to fall back to.
    pub async fn update(
        &self,
        product: &Product,
        images: Option<&[ProductImageInput]>,
        features: Option<&[ProductFeatureInput]>,
    ) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2, name = ?3, category = ?4, product_type = ?5,
                brand = ?6, collection = ?7, material = ?8, color = ?9,
                gender = ?10, laptop_size = ?11, description = ?12,
                dimensions = ?13, weight = ?14, care_instructions = ?15,
                warranty_info = ?16, price_cents = ?17, stock_quantity = ?18,
                is_active = ?19, is_featured = ?20, image_url = ?21,
                updated_at = ?22
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.product_type)
        .bind(&product.brand)
        .bind(&product.collection)
        .bind(&product.material)
        .bind(&product.color)
        .bind(&product.gender)
        .bind(&product.laptop_size)
        .bind(&product.description)
        .bind(&product.dimensions)
        .bind(&product.weight)
        .bind(&product.care_instructions)
        .bind(&product.warranty_info)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.is_active)
        .bind(product.is_featured)
        .bind(&product.image_url)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        if let Some(images) = images {
            sqlx::query("DELETE FROM product_images WHERE product_id = ?1")
                .bind(&product.id)
                .execute(&mut *tx)
                .await?;
            insert_side_tables(&mut tx, &product.id, images, &[]).await?;
        }

        if let Some(features) = features {
            sqlx::query("DELETE FROM product_features WHERE product_id = ?1")
                .bind(&product.id)
                .execute(&mut *tx)
                .await?;
            insert_side_tables(&mut tx, &product.id, &[], features).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical transactions still reference the product, and a
    /// mistaken delete can be reversed from the admin screen.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();
        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Hard-deletes a product row (side tables cascade).
    ///
    /// Fails with a foreign-key violation when committed transactions
    /// reference the product - those rows are append-only.
    pub async fn hard_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Hard-deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Applies a bulk change to a set of product ids.
    ///
    /// ## Returns
    /// The number of rows updated (only the given ids are touched).
    pub async fn bulk_update(&self, ids: &[String], changes: &BulkProductChanges) -> DbResult<u64> {
        debug!(count = ids.len(), "Bulk-updating products");

        if ids.is_empty() || changes.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE products SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(price) = changes.price_cents {
            qb.push(", price_cents = ");
            qb.push_bind(price);
        }
        if let Some(stock) = changes.stock_quantity {
            qb.push(", stock_quantity = ");
            qb.push_bind(stock);
        }
        if let Some(active) = changes.is_active {
            qb.push(", is_active = ");
            qb.push_bind(active);
        }
        if let Some(featured) = changes.is_featured {
            qb.push(", is_featured = ");
            qb.push_bind(featured);
        }
        if let Some(category) = &changes.category {
            qb.push(", category = ");
            qb.push_bind(category.clone());
        }
        if let Some(brand) = &changes.brand {
            qb.push(", brand = ");
            qb.push_bind(brand.clone());
        }
        if let Some(collection) = &changes.collection {
            qb.push(", collection = ");
            qb.push_bind(collection.clone());
        }

        qb.push(" WHERE id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(id);
        }
        qb.push(")");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Duplicates a product: descriptive fields and side tables are
    /// copied, stock resets to zero, the name gains a "(Copy)" suffix
    /// and the SKU a random one to stay unique.
    pub async fn duplicate(&self, id: &str) -> DbResult<Product> {
        let detail = self
            .get_detail(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();

        let mut copy = detail.product.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.sku = format!("{}-{}", detail.product.sku, suffix);
        copy.name = format!("{} (Copy)", detail.product.name);
        copy.stock_quantity = 0;
        copy.created_at = now;
        copy.updated_at = now;

        let images: Vec<ProductImageInput> = detail
            .images
            .iter()
            .map(|i| ProductImageInput {
                url: i.url.clone(),
                alt_text: i.alt_text.clone(),
                is_primary: i.is_primary,
            })
            .collect();
        let features: Vec<ProductFeatureInput> = detail
            .features
            .iter()
            .map(|f| ProductFeatureInput {
                name: f.name.clone(),
                value: f.value.clone(),
            })
            .collect();

        self.insert(&copy, &images, &features).await?;

        debug!(source = %id, copy = %copy.id, "Product duplicated");
        Ok(copy)
    }

    /// Lists active products at or below the stock threshold.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1 AND stock_quantity <= ?1
            ORDER BY stock_quantity, name
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Distinct filter values for the search dropdowns.
    pub async fn filter_options(&self) -> DbResult<FilterOptions> {
        Ok(FilterOptions {
            brands: self.distinct_values("brand").await?,
            collections: self.distinct_values("collection").await?,
            materials: self.distinct_values("material").await?,
            product_types: self.distinct_values("product_type").await?,
            colors: self.distinct_values("color").await?,
        })
    }

    async fn distinct_values(&self, column: &str) -> DbResult<Vec<String>> {
        // column comes from the fixed call sites above, never from input
        let sql = format!(
            "SELECT DISTINCT {column} FROM products \
             WHERE {column} IS NOT NULL AND is_active = 1 ORDER BY {column}"
        );
        let values = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(values)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Inserts image and feature rows for a product inside a transaction.
async fn insert_side_tables(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    product_id: &str,
    images: &[ProductImageInput],
    features: &[ProductFeatureInput],
) -> DbResult<()> {
    for (position, image) in images.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO product_images (id, product_id, url, alt_text, is_primary, position)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(product_id)
        .bind(&image.url)
        .bind(&image.alt_text)
        .bind(image.is_primary)
        .bind(position as i64)
        .execute(&mut **tx)
        .await?;
    }

    for (position, feature) in features.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO product_features (id, product_id, name, value, position)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(product_id)
        .bind(&feature.name)
        .bind(&feature.value)
        .bind(position as i64)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
