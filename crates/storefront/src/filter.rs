//! Shop filter store and the pure filtering step it drives.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use lumina_core::{Price, Product};
use serde::{Deserialize, Serialize};

use crate::config::FilterDefaults;

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    /// Name, ascending.
    Name,
    /// Price, lowest first.
    PriceAsc,
    /// Price, highest first.
    PriceDesc,
    /// Newest first.
    #[default]
    Date,
}

impl SortBy {
    /// Token used in URLs and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Date => "date",
        }
    }

    /// Parse a sort token. Unknown tokens mean newest first.
    #[must_use]
    pub fn parse_lenient(token: &str) -> Self {
        match token.trim() {
            "name" => Self::Name,
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            _ => Self::Date,
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
            Self::Date => b.date_added.cmp(&a.date_added),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

/// Price range, brand and sort selection for the shop listing.
///
/// `min_price <= max_price` is not enforced; an inverted range simply
/// matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub min_price: Price,
    pub max_price: Price,
    pub sort_by: SortBy,
    pub brand: Option<String>,
}

impl FilterState {
    /// The full range, newest first, any brand.
    #[must_use]
    pub const fn from_defaults(defaults: FilterDefaults) -> Self {
        Self {
            min_price: defaults.min_price,
            max_price: defaults.max_price,
            sort_by: SortBy::Date,
            brand: None,
        }
    }

    /// Whether nothing differs from `defaults`.
    #[must_use]
    pub fn is_default(&self, defaults: FilterDefaults) -> bool {
        *self == Self::from_defaults(defaults)
    }

    /// Whether `product` passes the price and brand predicates.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let in_range = product.price >= self.min_price && product.price <= self.max_price;
        let brand_ok = self
            .brand
            .as_deref()
            .is_none_or(|brand| product.brand == brand);
        in_range && brand_ok
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self::from_defaults(FilterDefaults::default())
    }
}

/// Filter `products` by `state` and sort the survivors.
///
/// Pure: the same inputs always give the same order. The sort is stable, so
/// ties keep their fetched order.
#[must_use]
pub fn apply_filters(products: &[Product], state: &FilterState) -> Vec<Product> {
    let mut filtered: Vec<Product> = products
        .iter()
        .filter(|product| state.matches(product))
        .cloned()
        .collect();
    filtered.sort_by(|a, b| state.sort_by.compare(a, b));
    filtered
}

/// Distinct brands in `products`, sorted, for the brand picker.
#[must_use]
pub fn available_brands(products: &[Product]) -> Vec<String> {
    let mut brands: Vec<String> = products
        .iter()
        .map(|product| product.brand.clone())
        .filter(|brand| !brand.is_empty())
        .collect();
    brands.sort();
    brands.dedup();
    brands
}

/// The filter state container. Not persisted across sessions.
#[derive(Debug, Clone)]
pub struct FilterStore {
    state: FilterState,
    defaults: FilterDefaults,
    is_open: bool,
}

impl FilterStore {
    /// A store reset to `defaults`.
    #[must_use]
    pub const fn new(defaults: FilterDefaults) -> Self {
        Self {
            state: FilterState::from_defaults(defaults),
            defaults,
            is_open: false,
        }
    }

    /// Read-only view of the current selection.
    #[must_use]
    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    pub const fn set_min_price(&mut self, min_price: Price) {
        self.state.min_price = min_price;
    }

    pub const fn set_max_price(&mut self, max_price: Price) {
        self.state.max_price = max_price;
    }

    pub const fn set_price_range(&mut self, min_price: Price, max_price: Price) {
        self.state.min_price = min_price;
        self.state.max_price = max_price;
    }

    pub const fn set_sort_by(&mut self, sort_by: SortBy) {
        self.state.sort_by = sort_by;
    }

    /// Restrict to one brand, or clear the restriction with `None`.
    pub fn set_brand(&mut self, brand: Option<String>) {
        self.state.brand = brand.filter(|b| !b.trim().is_empty());
    }

    /// Restore the defaults. Leaves the panel open or closed as it was.
    pub fn reset_filters(&mut self) {
        self.state = FilterState::from_defaults(self.defaults);
    }

    /// Whether the selection differs from the defaults.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        !self.state.is_default(self.defaults)
    }

    /// Apply the current selection to `products`.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        apply_filters(products, &self.state)
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    pub const fn toggle_filter(&mut self) {
        self.is_open = !self.is_open;
    }

    pub const fn open_filter(&mut self) {
        self.is_open = true;
    }

    pub const fn close_filter(&mut self) {
        self.is_open = false;
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(FilterDefaults::default())
    }
}
