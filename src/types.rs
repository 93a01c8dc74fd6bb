//! Common types used throughout Catalog Harvest
//!
//! This module contains the catalog record types, shared type aliases,
//! and small utility traits used across multiple modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Product
// ============================================================================

/// A product entity as returned by the catalog `Products` endpoint
///
/// Every field defaults when absent. Fields that are not modelled here are
/// kept verbatim in [`Product::extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Product {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "ProfileID")]
    pub profile_id: i64,
    pub create_date_utc: Option<DateTime<Utc>>,
    pub update_date_utc: Option<DateTime<Utc>>,
    pub received_date_utc: Option<DateTime<Utc>>,
    pub is_in_relationship: bool,
    pub is_parent: bool,
    pub relationship_name: Option<String>,
    #[serde(rename = "ParentProductID")]
    pub parent_product_id: Option<i64>,
    pub is_blocked: bool,
    pub sku: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
    pub condition: Option<String>,
    pub classification: Option<String>,
    #[serde(rename = "UPC")]
    pub upc: Option<String>,
    #[serde(rename = "EAN")]
    pub ean: Option<String>,
    #[serde(rename = "MPN")]
    pub mpn: Option<String>,
    #[serde(rename = "ASIN")]
    pub asin: Option<String>,
    pub height: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub weight: Option<f64>,
    pub cost: Option<f64>,
    pub retail_price: Option<f64>,
    pub buy_it_now_price: Option<f64>,
    pub store_price: Option<f64>,
    pub supplier_name: Option<String>,
    pub total_available_quantity: i64,
    pub total_quantity: i64,
    pub attributes: Vec<AttributeValue>,
    pub labels: Vec<ProductLabel>,
    pub images: Vec<Image>,
    #[serde(rename = "DCQuantities")]
    pub dc_quantities: Vec<DcQuantity>,
    pub bundle_components: Vec<BundleComponent>,
    pub children: Vec<ChildRelationship>,
    /// Fields not modelled above
    #[serde(flatten)]
    pub extra: JsonObject,
}

/// A named attribute value attached to a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AttributeValue {
    pub name: String,
    pub value: Option<String>,
}

/// A label attached to a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProductLabel {
    pub name: String,
}

/// A product image placement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Image {
    pub abbreviation: Option<String>,
    pub placement_name: Option<String>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
}

/// Available quantity per distribution center
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DcQuantity {
    #[serde(rename = "DistributionCenterID")]
    pub distribution_center_id: i64,
    pub available_quantity: i64,
}

/// A component of a bundle product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BundleComponent {
    #[serde(rename = "ComponentID")]
    pub component_id: i64,
    pub component_sku: Option<String>,
    pub quantity: i64,
}

/// A parent/child relationship edge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ChildRelationship {
    #[serde(rename = "ParentProductID")]
    pub parent_product_id: i64,
    #[serde(rename = "ChildProductID")]
    pub child_product_id: i64,
}

impl Product {
    /// Label names joined with commas
    pub fn label_names(&self) -> String {
        self.labels
            .iter()
            .map(|l| l.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Image URLs joined with commas
    pub fn picture_urls(&self) -> String {
        self.images
            .iter()
            .filter_map(|i| i.url.as_deref())
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
