//! Firestore catalog backend.

use async_trait::async_trait;
use lumina_core::{Product, ProductId};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value, json};
use tracing::instrument;

use super::{CatalogBackend, CatalogError, Highlight, PageCursor, ProductPage};
use crate::firestore::{Direction, Document, FirestoreClient, FirestoreError, StructuredQuery};

const PRODUCTS: &str = "products";

/// Firestore limits `array-contains-any` to this many values.
const MAX_ANY_VALUES: usize = 10;

/// The `products` collection in Firestore.
#[derive(Debug, Clone)]
pub struct FirestoreCatalog {
    client: FirestoreClient,
}

impl FirestoreCatalog {
    #[must_use]
    pub const fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    async fn query(&self, query: &StructuredQuery) -> Result<Vec<Product>, CatalogError> {
        let documents = self.client.run_query(query).await?;
        documents
            .into_iter()
            .map(|doc| decode_product(doc).map_err(CatalogError::from))
            .collect()
    }
}

fn decode_product(doc: Document) -> Result<Product, FirestoreError> {
    doc.into_record()
}

/// Document fields for `product`.
///
/// Prices are stored as numbers so range queries and the console show real
/// values; everything else uses the record's serde layout.
fn encode_product(product: &Product) -> Result<Map<String, Value>, FirestoreError> {
    let Value::Object(mut fields) = serde_json::to_value(product)? else {
        return Err(FirestoreError::Decode("product did not serialize to a map".to_string()));
    };
    fields.remove("id");
    let price = product
        .price
        .amount()
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| FirestoreError::Decode(format!("price out of range: {}", product.price)))?;
    fields.insert("price".to_string(), Value::Number(price));
    Ok(fields)
}

#[async_trait]
impl CatalogBackend for FirestoreCatalog {
    #[instrument(skip(self))]
    async fn list_page(
        &self,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> Result<ProductPage, CatalogError> {
        let mut query = StructuredQuery::collection(PRODUCTS)
            .order_by("dateAdded", Direction::Descending)
            .order_by("__name__", Direction::Descending)
            .limit(limit);
        if let Some(cursor) = after {
            query = query.start_after(vec![
                json!({ "integerValue": cursor.date_added.timestamp_millis().to_string() }),
                json!({ "referenceValue": self.client.document_name(PRODUCTS, cursor.id.as_str()) }),
            ]);
        }

        let (products, total) = tokio::try_join!(
            self.query(&query),
            async {
                self.client
                    .count(&StructuredQuery::collection(PRODUCTS))
                    .await
                    .map_err(CatalogError::from)
            }
        )?;

        // A full page may be followed by more; a short page is the last.
        let next_cursor = if products.len() == limit {
            products.last().map(PageCursor::after)
        } else {
            None
        };

        Ok(ProductPage {
            products,
            next_cursor,
            total,
        })
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        match self.client.get_document(PRODUCTS, id.as_str()).await? {
            Some(doc) => Ok(Some(decode_product(doc)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn flagged(&self, flag: Highlight, limit: usize) -> Result<Vec<Product>, CatalogError> {
        let query = StructuredQuery::collection(PRODUCTS)
            .where_eq(flag.field(), &Value::Bool(true))
            .limit(limit);
        self.query(&query).await
    }

    #[instrument(skip(self))]
    async fn name_prefix(
        &self,
        lower_key: &str,
        limit: usize,
    ) -> Result<Vec<Product>, CatalogError> {
        let query = StructuredQuery::collection(PRODUCTS)
            .where_gte("nameLower", &Value::from(lower_key))
            .where_lte("nameLower", &Value::from(format!("{lower_key}\u{f8ff}")))
            .limit(limit);
        self.query(&query).await
    }

    #[instrument(skip(self))]
    async fn keywords_any(
        &self,
        tokens: &[String],
        limit: usize,
    ) -> Result<Vec<Product>, CatalogError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let tokens = tokens.get(..MAX_ANY_VALUES).unwrap_or(tokens);
        let query = StructuredQuery::collection(PRODUCTS)
            .where_array_contains_any("keywords", tokens)
            .limit(limit);
        self.query(&query).await
    }

    #[instrument(skip(self, product), fields(id = %product.id))]
    async fn insert(&self, product: &Product) -> Result<(), CatalogError> {
        let fields = encode_product(product)?;
        self.client
            .create_document(PRODUCTS, product.id.as_str(), &fields)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(id = %product.id))]
    async fn update(&self, product: &Product) -> Result<(), CatalogError> {
        let fields = encode_product(product)?;
        match self
            .client
            .patch_document(PRODUCTS, product.id.as_str(), &fields, None)
            .await
        {
            Err(FirestoreError::Status { status: 404, .. }) => {
                Err(CatalogError::NotFound(product.id.clone()))
            }
            other => other.map_err(CatalogError::from),
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &ProductId) -> Result<(), CatalogError> {
        self.client.delete_document(PRODUCTS, id.as_str()).await?;
        Ok(())
    }
}
