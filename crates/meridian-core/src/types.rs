//! # Domain Types
//!
//! Core domain types used throughout Meridian POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │  Transaction    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  loyalty_number │   │  location_id    │       │
//! │  │  price_cents    │   │  points_balance │   │  total_cents    │       │
//! │  │  stock_quantity │   │  tier           │   │  items (snap)   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Location     │   │  UserSettings   │   │ SystemSetting   │       │
//! │  │  store_code     │   │  user_id        │   │  key/value      │       │
//! │  │  tax_rate_bps   │   │  theme          │   │  category       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, loyalty_number, store_code) - human-readable, unique

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 800 bps = 8% (the fallback rate for locations with no rate set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a decimal fraction in `[0, 1]`.
    ///
    /// Location admin accepts rates the way the web client sends them
    /// (0.08 for 8%); storage and arithmetic stay integer.
    pub fn from_decimal(rate: f64) -> Self {
        TaxRate((rate * 10000.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a decimal fraction (for display only).
    #[inline]
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 10000.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Enums
// =============================================================================

/// How a manual checkout discount is interpreted.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is a percentage of the subtotal (10 = 10% off).
    Percentage,
    /// `value` is an absolute amount in cents.
    Fixed,
}

/// Tender used to settle a transaction.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment (change is computed and returned).
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Mobile wallet (QR / NFC).
    Mobile,
}

/// Loyalty account standing.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Inactive,
    UnderFraudInvestigation,
    Merged,
    Fraudulent,
}

impl Default for MembershipStatus {
    fn default() -> Self {
        MembershipStatus::Active
    }
}

/// Customer segment derived from lifetime spend (or pinned manually).
///
/// Threshold rules live in [`crate::loyalty`].
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Default for LoyaltyTier {
    fn default() -> Self {
        LoyaltyTier::Bronze
    }
}

/// UI theme stored per user.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}

/// Declared type of a system setting value.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    Text,
    Number,
    Boolean,
    Json,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Descriptive attributes mirror the retail catalog (bags and travel
/// gear): brand, collection, material, laptop size, care text.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Display name shown on the POS grid and receipts.
    pub name: String,

    /// Catalog category (e.g. "Backpacks").
    pub category: Option<String>,

    /// Finer-grained product type within the category.
    pub product_type: Option<String>,

    pub brand: Option<String>,
    pub collection: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub gender: Option<String>,

    /// Largest laptop the product fits (e.g. "15\"").
    pub laptop_size: Option<String>,

    pub description: Option<String>,
    pub dimensions: Option<String>,
    pub weight: Option<String>,
    pub care_instructions: Option<String>,
    pub warranty_info: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// On-hand stock. May go negative under concurrent checkouts;
    /// the checkout workflow decrements without a floor check.
    pub stock_quantity: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// Featured on the storefront.
    pub is_featured: bool,

    /// Main image URL; ordered extras live in `product_images`.
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// True when stock is at or below the given threshold.
    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock_quantity <= threshold
    }
}

/// An additional product image with alt text and ordering.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: String,
    pub product_id: String,
    pub url: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub position: i64,
}

/// A name/value feature pair shown on the product detail page.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFeature {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub value: String,
    pub position: i64,
}

/// A product joined with its side tables ("full detail" reads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
    pub features: Vec<ProductFeature>,
}

// =============================================================================
// Customer
// =============================================================================

/// A loyalty program member.
///
/// ## Invariants
/// - `loyalty_number` is unique and immutable after enrollment
///   (format: 3 uppercase letters + 3 digits, e.g. "ABC123")
/// - `tier` is recalculated from lifetime spend on every accrual
///   unless `tier_override` pins it
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub loyalty_number: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,

    /// Current redeemable points.
    pub points_balance: i64,

    /// Total spend across all transactions, in cents.
    pub lifetime_spend_cents: i64,

    pub visit_count: i64,
    pub last_visit_at: Option<DateTime<Utc>>,

    pub status: MembershipStatus,
    pub tier: LoyaltyTier,

    /// True when an admin pinned the tier manually.
    pub tier_override: bool,

    pub enrolled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns lifetime spend as Money.
    #[inline]
    pub fn lifetime_spend(&self) -> Money {
        Money::from_cents(self.lifetime_spend_cents)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A committed sale. Immutable once written - there is no update or
/// delete path for transactions.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,

    /// Nullable: walk-in sales have no loyalty account.
    pub customer_id: Option<String>,

    pub location_id: String,

    pub subtotal_cents: i64,
    pub discount_type: Option<DiscountType>,
    /// The operator-entered discount input (percent or cents,
    /// depending on `discount_type`).
    pub discount_value: Option<i64>,
    /// The computed, clamped discount amount in cents.
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,

    pub payment_method: PaymentMethod,
    /// Cash tendered; equals total for non-cash tenders.
    pub amount_received_cents: i64,
    pub change_cents: i64,

    pub points_earned: i64,
    pub points_redeemed: i64,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a transaction.
/// Uses snapshot pattern to freeze product data at time of sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// Line total before tax (unit_price × quantity).
    pub line_total_cents: i64,
}

/// A transaction joined with customer display fields and line items,
/// the shape the receipt view renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub customer_name: Option<String>,
    pub loyalty_number: Option<String>,
    pub items: Vec<TransactionItem>,
}

// =============================================================================
// Location
// =============================================================================

/// A retail store.
///
/// ## Invariants
/// - `store_code` is unique, uppercase alphanumeric, 3-10 chars,
///   validated at creation
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub store_code: String,
    pub name: String,
    pub brand: Option<String>,
    pub address: Option<String>,
    pub manager: Option<String>,
    pub logo_url: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,

    /// Sales tax in basis points; NULL means "use the default".
    pub tax_rate_bps: Option<u32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// Effective tax rate, falling back to the system default (8%)
    /// when the location has none configured.
    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate_bps
            .map(TaxRate::from_bps)
            .unwrap_or(TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS))
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Per-user UI preferences, keyed by a client-generated opaque id.
///
/// Identity here is intentionally weak - the id is minted in the
/// browser and persisted in local storage. Last write wins.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: String,
    pub theme: Theme,
    pub location_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A key/value configuration row managed from the admin screen.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSetting {
    pub id: String,
    pub key: String,
    pub value: String,
    pub category: Option<String>,
    pub value_type: SettingType,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(800);
        assert_eq!(rate.bps(), 800);
        assert!((rate.as_decimal() - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_tax_rate_from_decimal() {
        assert_eq!(TaxRate::from_decimal(0.08).bps(), 800);
        assert_eq!(TaxRate::from_decimal(0.0825).bps(), 825);
        assert_eq!(TaxRate::from_decimal(0.0).bps(), 0);
        assert_eq!(TaxRate::from_decimal(1.0).bps(), 10000);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(LoyaltyTier::Bronze < LoyaltyTier::Silver);
        assert!(LoyaltyTier::Gold < LoyaltyTier::Platinum);
        assert_eq!(LoyaltyTier::default(), LoyaltyTier::Bronze);
    }

    #[test]
    fn test_location_tax_rate_fallback() {
        let now = Utc::now();
        let mut location = Location {
            id: "l1".into(),
            store_code: "NYC01".into(),
            name: "Downtown".into(),
            brand: None,
            address: None,
            manager: None,
            logo_url: None,
            phone: None,
            email: None,
            tax_rate_bps: None,
            created_at: now,
            updated_at: now,
        };

        // Unset rate falls back to the 8% default
        assert_eq!(location.tax_rate().bps(), 800);

        location.tax_rate_bps = Some(650);
        assert_eq!(location.tax_rate().bps(), 650);
    }

    #[test]
    fn test_product_low_stock() {
        let now = Utc::now();
        let product = Product {
            id: "p1".into(),
            sku: "BAG-001".into(),
            name: "Metro Backpack".into(),
            category: None,
            product_type: None,
            brand: None,
            collection: None,
            material: None,
            color: None,
            gender: None,
            laptop_size: None,
            description: None,
            dimensions: None,
            weight: None,
            care_instructions: None,
            warranty_info: None,
            price_cents: 7999,
            stock_quantity: 3,
            is_active: true,
            is_featured: false,
            image_url: None,
            created_at: now,
            updated_at: now,
        };

        assert!(product.is_low_stock(5));
        assert!(product.is_low_stock(3));
        assert!(!product.is_low_stock(2));
    }
}
