//! Shopping cart store.
//!
//! Lines are keyed by [`VariantKey`] (product id, color, size). Every
//! mutation writes the line list to local storage under [`CART_KEY`]; the
//! panel visibility flag is session-only.
//!
//! Derived reads ([`item_count`], [`subtotal`]) are free functions over a
//! line slice so they can be used without a store.

use std::sync::Arc;

use lumina_core::{Price, Product, ProductId, ValidationErrors};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::add_breadcrumb;
use crate::storage::{CART_KEY, LocalStorage, load_snapshot, persist};

/// One distinct product + color + size entry in the cart.
///
/// Name, brand, price and image are captured when the line is added and are
/// not re-synced with later catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub price: Price,
    pub image: String,
    pub quantity: u32,
    pub selected_color: Option<String>,
    pub selected_size: Option<String>,
    /// Stock ceiling at add time.
    pub max_quantity: u32,
}

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl VariantKey {
    /// Build a key from borrowed parts.
    #[must_use]
    pub fn new(product_id: ProductId, color: Option<&str>, size: Option<&str>) -> Self {
        Self {
            product_id,
            color: color.map(str::to_string),
            size: size.map(str::to_string),
        }
    }
}

impl CartLine {
    /// Snapshot `product` into a line.
    ///
    /// A missing color or size falls back to the product's first listed
    /// option, matching what the product page preselects.
    #[must_use]
    pub fn from_product(
        product: &Product,
        quantity: u32,
        color: Option<&str>,
        size: Option<&str>,
    ) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity,
            selected_color: color.or_else(|| product.default_color()).map(str::to_string),
            selected_size: size.or_else(|| product.default_size()).map(str::to_string),
            max_quantity: product.max_quantity,
        }
    }

    /// This line's variant key.
    #[must_use]
    pub fn key(&self) -> VariantKey {
        VariantKey {
            product_id: self.id.clone(),
            color: self.selected_color.clone(),
            size: self.selected_size.clone(),
        }
    }

    fn matches(&self, key: &VariantKey) -> bool {
        self.id == key.product_id
            && self.selected_color == key.color
            && self.selected_size == key.size
    }

    /// Price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Sum of quantities across all lines.
///
/// Widened to `u64`: each line may hold up to `u32::MAX`.
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity)).sum()
}

/// Sum of price × quantity across all lines.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Price {
    lines.iter().map(CartLine::line_total).sum()
}

/// Clamp a requested quantity to a stored one; `None` means remove.
fn positive_quantity(quantity: i64) -> Option<u32> {
    if quantity <= 0 {
        None
    } else {
        Some(u32::try_from(quantity).unwrap_or(u32::MAX))
    }
}

/// The cart state container.
pub struct CartStore {
    lines: Vec<CartLine>,
    is_open: bool,
    storage: Arc<dyn LocalStorage>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .field("is_open", &self.is_open)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restore the cart from `storage`, starting empty if nothing usable is
    /// stored.
    #[must_use]
    pub fn restore(storage: Arc<dyn LocalStorage>) -> Self {
        let lines: Vec<CartLine> = load_snapshot(storage.as_ref(), CART_KEY).unwrap_or_default();
        // A hand-edited snapshot could carry zero quantities.
        let lines = lines.into_iter().filter(|line| line.quantity > 0).collect();
        Self {
            lines,
            is_open: false,
            storage,
        }
    }

    /// Current lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line, merging into an existing line with the same variant key.
    ///
    /// No check is made against the product's stock ceiling.
    ///
    /// # Errors
    ///
    /// Returns `ValidationErrors` when `line.quantity` is zero.
    pub fn add_item(&mut self, line: CartLine) -> Result<(), ValidationErrors> {
        if line.quantity == 0 {
            let mut errors = ValidationErrors::new();
            errors.add("quantity", "Quantity must be at least 1");
            return Err(errors);
        }

        add_breadcrumb("cart", "Added item", Some(&[("product_id", line.id.as_str())]));

        let key = line.key();
        if let Some(existing) = self.lines.iter_mut().find(|l| l.matches(&key)) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
            debug!(product_id = %key.product_id, quantity = existing.quantity, "Merged cart line");
        } else {
            debug!(product_id = %key.product_id, quantity = line.quantity, "Appended cart line");
            self.lines.push(line);
        }
        self.persist();
        Ok(())
    }

    /// Remove every line for `id`, across all colors and sizes.
    pub fn remove_item(&mut self, id: &ProductId) {
        add_breadcrumb("cart", "Removed item", Some(&[("product_id", id.as_str())]));
        self.lines.retain(|line| &line.id != id);
        self.persist();
    }

    /// Remove the single line identified by `key`.
    pub fn remove_line(&mut self, key: &VariantKey) {
        self.lines.retain(|line| !line.matches(key));
        self.persist();
    }

    /// Overwrite the quantity of every line for `id`; `quantity <= 0` removes
    /// them.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) {
        let Some(quantity) = positive_quantity(quantity) else {
            self.remove_item(id);
            return;
        };
        for line in self.lines.iter_mut().filter(|line| &line.id == id) {
            line.quantity = quantity;
        }
        self.persist();
    }

    /// Overwrite the quantity of the line identified by `key`;
    /// `quantity <= 0` removes it.
    pub fn set_line_quantity(&mut self, key: &VariantKey, quantity: i64) {
        let Some(quantity) = positive_quantity(quantity) else {
            self.remove_line(key);
            return;
        };
        if let Some(line) = self.lines.iter_mut().find(|line| line.matches(key)) {
            line.quantity = quantity;
        }
        self.persist();
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.lines.clear();
        self.persist();
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        item_count(&self.lines)
    }

    /// Sum of price × quantity across all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        subtotal(&self.lines)
    }

    /// Whether any line holds product `id`.
    #[must_use]
    pub fn is_item_in_cart(&self, id: &ProductId) -> bool {
        self.lines.iter().any(|line| &line.id == id)
    }

    /// Total quantity of product `id` across its variants.
    #[must_use]
    pub fn quantity_in_cart(&self, id: &ProductId) -> u64 {
        self.lines
            .iter()
            .filter(|line| &line.id == id)
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    /// Whether the cart panel is showing.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    pub const fn toggle_cart(&mut self) {
        self.is_open = !self.is_open;
    }

    pub const fn open_cart(&mut self) {
        self.is_open = true;
    }

    pub const fn close_cart(&mut self) {
        self.is_open = false;
    }

    fn persist(&self) {
        persist(self.storage.as_ref(), CART_KEY, &self.lines);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::DateTime;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn product(id: &str, dollars: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            name_lower: String::new(),
            brand: "Acme".to_string(),
            price: Price::from_dollars(dollars),
            description: "A fine product".to_string(),
            image: format!("{id}.jpg"),
            image_collection: vec![],
            category: "Tops".to_string(),
            is_featured: false,
            is_recommended: false,
            available_colors: vec!["red".to_string(), "blue".to_string()],
            available_sizes: vec!["M".to_string(), "L".to_string()],
            max_quantity: 10,
            keywords: vec![id.to_string()],
            date_added: DateTime::from_timestamp_millis(0).unwrap(),
        }
    }

    fn store() -> CartStore {
        CartStore::restore(Arc::new(MemoryStorage::new()))
    }

    fn line(id: &str, dollars: u32, quantity: u32, color: &str, size: &str) -> CartLine {
        CartLine::from_product(&product(id, dollars), quantity, Some(color), Some(size))
    }

    #[test]
    fn test_add_single_line() {
        let mut cart = store();
        cart.add_item(line("p1", 20, 1, "red", "M")).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total(), Price::from_dollars(20));
    }

    #[test]
    fn test_same_variant_merges() {
        let mut cart = store();
        cart.add_item(line("p1", 20, 1, "red", "M")).unwrap();
        cart.add_item(line("p1", 20, 2, "red", "M")).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_different_variant_is_new_line() {
        let mut cart = store();
        cart.add_item(line("p1", 20, 1, "red", "M")).unwrap();
        cart.add_item(line("p1", 20, 1, "blue", "M")).unwrap();
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.quantity_in_cart(&ProductId::new("p1")), 2);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut cart = store();
        let err = cart.add_item(line("p1", 20, 0, "red", "M")).unwrap_err();
        assert!(err.has("quantity"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_missing_selection_defaults_to_first_option() {
        let line = CartLine::from_product(&product("p1", 20), 1, None, Some("L"));
        assert_eq!(line.selected_color.as_deref(), Some("red"));
        assert_eq!(line.selected_size.as_deref(), Some("L"));
    }

    #[test]
    fn test_remove_item_removes_all_variants() {
        let mut cart = store();
        cart.add_item(line("p1", 20, 1, "red", "M")).unwrap();
        cart.add_item(line("p1", 20, 1, "blue", "L")).unwrap();
        cart.add_item(line("p2", 15, 1, "red", "M")).unwrap();

        cart.remove_item(&ProductId::new("p1"));
        assert_eq!(cart.lines().len(), 1);
        assert!(!cart.is_item_in_cart(&ProductId::new("p1")));
    }

    #[test]
    fn test_remove_line_keeps_other_variants() {
        let mut cart = store();
        let red = line("p1", 20, 1, "red", "M");
        cart.add_item(red.clone()).unwrap();
        cart.add_item(line("p1", 20, 1, "blue", "L")).unwrap();

        cart.remove_line(&red.key());
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].selected_color.as_deref(), Some("blue"));
    }

    #[test]
    fn test_update_quantity_overwrites_and_removes() {
        let mut cart = store();
        cart.add_item(line("p1", 20, 1, "red", "M")).unwrap();
        cart.update_quantity(&ProductId::new("p1"), 4);
        assert_eq!(cart.item_count(), 4);

        cart.update_quantity(&ProductId::new("p1"), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_line_quantity_negative_removes_line() {
        let mut cart = store();
        let red = line("p1", 20, 2, "red", "M");
        cart.add_item(red.clone()).unwrap();
        cart.set_line_quantity(&red.key(), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_item_count_holds_lines_at_max_quantity() {
        let mut cart = store();
        cart.add_item(line("p1", 20, 1, "red", "M")).unwrap();
        cart.add_item(line("p1", 20, 1, "blue", "L")).unwrap();

        cart.update_quantity(&ProductId::new("p1"), i64::from(u32::MAX));

        let expected = u64::from(u32::MAX) * 2;
        assert_eq!(cart.item_count(), expected);
        assert_eq!(cart.quantity_in_cart(&ProductId::new("p1")), expected);
    }

    #[test]
    fn test_total_saturates_for_huge_prices() {
        let mut cart = store();
        let mut huge = line("p1", 20, 1, "red", "M");
        huge.price = Price::new(Decimal::from(10_u128.pow(20))).unwrap();
        cart.add_item(huge).unwrap();
        cart.add_item(line("p1", 20, 1, "blue", "L")).unwrap();

        cart.update_quantity(&ProductId::new("p1"), 1_000_000_000);

        assert_eq!(cart.total().amount(), Decimal::MAX);
    }

    #[test]
    fn test_visibility_toggles() {
        let mut cart = store();
        assert!(!cart.is_open());
        cart.toggle_cart();
        assert!(cart.is_open());
        cart.close_cart();
        assert!(!cart.is_open());
        cart.open_cart();
        assert!(cart.is_open());
    }

    #[test]
    fn test_lines_survive_restore() {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
        let mut cart = CartStore::restore(Arc::clone(&storage));
        cart.add_item(line("p1", 20, 2, "red", "M")).unwrap();
        cart.open_cart();

        let restored = CartStore::restore(storage);
        assert_eq!(restored.lines(), cart.lines());
        assert!(!restored.is_open());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add { product: u8, color: u8, quantity: u32 },
        Remove { product: u8 },
        Update { product: u8, quantity: i64 },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, 0u8..2, 1u32..5).prop_map(|(product, color, quantity)| Op::Add {
                product,
                color,
                quantity
            }),
            (0u8..4).prop_map(|product| Op::Remove { product }),
            (0u8..4, -2i64..6).prop_map(|(product, quantity)| Op::Update { product, quantity }),
        ]
    }

    fn apply(cart: &mut CartStore, op: &Op) {
        let colors = ["red", "blue"];
        match op {
            Op::Add {
                product,
                color,
                quantity,
            } => {
                let id = format!("p{product}");
                let dollars = u32::from(*product) * 5 + 10;
                cart.add_item(line(&id, dollars, *quantity, colors[usize::from(*color)], "M"))
                    .unwrap();
            }
            Op::Remove { product } => cart.remove_item(&ProductId::new(format!("p{product}"))),
            Op::Update { product, quantity } => {
                cart.update_quantity(&ProductId::new(format!("p{product}")), *quantity);
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        #[test]
        fn prop_same_key_adds_sum(quantities in proptest::collection::vec(1u32..20, 1..10)) {
            let mut cart = store();
            for q in &quantities {
                cart.add_item(line("p1", 20, *q, "red", "M")).unwrap();
            }
            prop_assert_eq!(cart.lines().len(), 1);
            prop_assert_eq!(cart.lines()[0].quantity, quantities.iter().sum::<u32>());
        }

        #[test]
        fn prop_derived_reads_match_lines(ops in proptest::collection::vec(op_strategy(), 0..30)) {
            let mut cart = store();
            for op in &ops {
                apply(&mut cart, op);
            }
            let expected_count: u64 = cart.lines().iter().map(|l| u64::from(l.quantity)).sum();
            let expected_total: Price = cart.lines().iter().map(|l| l.price.times(l.quantity)).sum();
            prop_assert_eq!(cart.item_count(), expected_count);
            prop_assert_eq!(cart.total(), expected_total);
            prop_assert!(cart.lines().iter().all(|l| l.quantity > 0));
        }

        #[test]
        fn prop_non_positive_update_equals_remove(
            ops in proptest::collection::vec(op_strategy(), 0..15),
            product in 0u8..4,
            quantity in -5i64..=0,
        ) {
            let mut updated = store();
            let mut removed = store();
            for op in &ops {
                apply(&mut updated, op);
                apply(&mut removed, op);
            }
            let id = ProductId::new(format!("p{product}"));
            updated.update_quantity(&id, quantity);
            removed.remove_item(&id);
            prop_assert_eq!(updated.lines(), removed.lines());
        }
    }
}
