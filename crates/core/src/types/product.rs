//! Catalog product record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A catalog entry as stored in the `products` collection.
///
/// Read-only from the shopper's side; only the admin surface writes these.
/// Field names follow the document layout (`camelCase`, `dateAdded` in epoch
/// milliseconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned document id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Lower-cased name, kept alongside `name` for prefix search.
    #[serde(default)]
    pub name_lower: String,
    /// Brand name.
    pub brand: String,
    /// Unit price.
    pub price: Price,
    /// Long-form description.
    #[serde(default)]
    pub description: String,
    /// Primary image reference.
    #[serde(default)]
    pub image: String,
    /// Optional gallery.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_collection: Vec<String>,
    /// Category label (e.g., "Footwear").
    #[serde(default)]
    pub category: String,
    /// Shown in the featured listing.
    #[serde(default)]
    pub is_featured: bool,
    /// Shown in the recommended listing.
    #[serde(default)]
    pub is_recommended: bool,
    /// Color tokens the shopper can pick from.
    #[serde(default)]
    pub available_colors: Vec<String>,
    /// Size tokens the shopper can pick from.
    #[serde(default)]
    pub available_sizes: Vec<String>,
    /// Stock ceiling.
    #[serde(default)]
    pub max_quantity: u32,
    /// Search keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Creation timestamp.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_added: DateTime<Utc>,
}

impl Product {
    /// First listed color, used when the shopper has not picked one.
    #[must_use]
    pub fn default_color(&self) -> Option<&str> {
        self.available_colors.first().map(String::as_str)
    }

    /// First listed size, used when the shopper has not picked one.
    #[must_use]
    pub fn default_size(&self) -> Option<&str> {
        self.available_sizes.first().map(String::as_str)
    }

    /// Whether any stock remains.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.max_quantity > 0
    }

    /// The lower-cased name used for prefix search.
    ///
    /// Falls back to lower-casing `name` for records written without it.
    #[must_use]
    pub fn search_name(&self) -> String {
        if self.name_lower.is_empty() {
            self.name.to_lowercase()
        } else {
            self.name_lower.clone()
        }
    }

    /// Whether the lower-cased name starts with `lower_key`.
    #[must_use]
    pub fn matches_name_prefix(&self, lower_key: &str) -> bool {
        self.search_name().starts_with(lower_key)
    }

    /// Whether any keyword equals one of `tokens` exactly.
    #[must_use]
    pub fn matches_any_keyword(&self, tokens: &[&str]) -> bool {
        self.keywords
            .iter()
            .any(|keyword| tokens.iter().any(|token| keyword == token))
    }
}
