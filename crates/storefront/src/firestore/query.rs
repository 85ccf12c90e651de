//! Firestore structured query builder.
//!
//! Covers the subset the catalog needs: one collection, an optional single
//! or composite filter, ordering, a start-after cursor and a limit.

use serde::Serialize;
use serde_json::Value;

use super::value::encode;

/// A `structuredQuery` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    from: Vec<CollectionSelector>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    order_by: Vec<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_at: Option<Cursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector {
    collection_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
enum Filter {
    FieldFilter(FieldFilter),
    CompositeFilter(CompositeFilter),
}

#[derive(Debug, Clone, Serialize)]
struct FieldFilter {
    field: FieldReference,
    op: &'static str,
    value: Value,
}

#[derive(Debug, Clone, Serialize)]
struct CompositeFilter {
    op: &'static str,
    filters: Vec<Filter>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference {
    field_path: String,
}

#[derive(Debug, Clone, Serialize)]
struct Order {
    field: FieldReference,
    direction: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct Cursor {
    values: Vec<Value>,
    before: bool,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ASCENDING",
            Self::Descending => "DESCENDING",
        }
    }
}

impl StructuredQuery {
    /// Query every document in `collection`.
    #[must_use]
    pub fn collection(collection: &str) -> Self {
        Self {
            from: vec![CollectionSelector {
                collection_id: collection.to_string(),
            }],
            filter: None,
            order_by: Vec::new(),
            start_at: None,
            limit: None,
        }
    }

    fn push_filter(mut self, field: &str, op: &'static str, value: &Value) -> Self {
        let next = Filter::FieldFilter(FieldFilter {
            field: FieldReference {
                field_path: field.to_string(),
            },
            op,
            value: encode(value),
        });
        self.filter = Some(match self.filter.take() {
            None => next,
            Some(Filter::CompositeFilter(mut composite)) => {
                composite.filters.push(next);
                Filter::CompositeFilter(composite)
            }
            Some(existing) => Filter::CompositeFilter(CompositeFilter {
                op: "AND",
                filters: vec![existing, next],
            }),
        });
        self
    }

    /// `field == value`
    #[must_use]
    pub fn where_eq(self, field: &str, value: &Value) -> Self {
        self.push_filter(field, "EQUAL", value)
    }

    /// `field >= value`
    #[must_use]
    pub fn where_gte(self, field: &str, value: &Value) -> Self {
        self.push_filter(field, "GREATER_THAN_OR_EQUAL", value)
    }

    /// `field <= value`
    #[must_use]
    pub fn where_lte(self, field: &str, value: &Value) -> Self {
        self.push_filter(field, "LESS_THAN_OR_EQUAL", value)
    }

    /// Array `field` contains any of `values`.
    #[must_use]
    pub fn where_array_contains_any(self, field: &str, values: &[String]) -> Self {
        self.push_filter(field, "ARRAY_CONTAINS_ANY", &Value::from(values.to_vec()))
    }

    /// Append an ordering clause.
    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(Order {
            field: FieldReference {
                field_path: field.to_string(),
            },
            direction: direction.as_str(),
        });
        self
    }

    /// Start strictly after the document whose ordered fields equal
    /// `values`. Values are already Firestore-encoded.
    #[must_use]
    pub fn start_after(mut self, values: Vec<Value>) -> Self {
        self.start_at = Some(Cursor {
            values,
            before: false,
        });
        self
    }

    /// Cap the result count.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_equality_filter() {
        let query = StructuredQuery::collection("products")
            .where_eq("isFeatured", &json!(true))
            .limit(12);
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "from": [{ "collectionId": "products" }],
                "where": { "fieldFilter": {
                    "field": { "fieldPath": "isFeatured" },
                    "op": "EQUAL",
                    "value": { "booleanValue": true }
                }},
                "limit": 12
            })
        );
    }

    #[test]
    fn test_range_filters_become_composite() {
        let query = StructuredQuery::collection("products")
            .where_gte("nameLower", &json!("lin"))
            .where_lte("nameLower", &json!("lin\u{f8ff}"));
        let value = serde_json::to_value(&query).unwrap();
        let composite = &value["where"]["compositeFilter"];
        assert_eq!(composite["op"], "AND");
        assert_eq!(composite["filters"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_ordering_and_cursor() {
        let query = StructuredQuery::collection("products")
            .order_by("dateAdded", Direction::Descending)
            .start_after(vec![json!({ "integerValue": "5" })])
            .limit(2);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["orderBy"][0]["direction"], "DESCENDING");
        assert_eq!(value["startAt"]["before"], false);
    }
}
