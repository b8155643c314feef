//! Coffee item storage module for `DynamoDB` operations
//!
//! The catalog lives in a single table keyed by `id`. Handlers talk to it through
//! the [`CoffeeItemStore`] trait so the backing store can be swapped out.

mod error;
#[cfg(feature = "test-utils")]
mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoDbClient;
pub use error::{CoffeeItemStorageError, CoffeeItemStorageResult};
#[cfg(feature = "test-utils")]
pub use memory::InMemoryCoffeeItemStorage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_dynamo::{from_item, from_items, to_attribute_value, to_item};
use serde_json::{Map, Value};
use strum::Display;

/// A coffee shop catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CoffeeItem {
    /// Primary key - unique item ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Non-negative price
    pub price: f64,
    /// Whether the item can currently be ordered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<bool>,
    /// Free-form attributes passed through as-is
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Partial set of fields to merge into a stored coffee item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoffeeItemPatch {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// New availability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<bool>,
    /// Free-form attributes to set or overwrite
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl CoffeeItemPatch {
    /// Returns true when the patch carries no field to change
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.availability.is_none()
            && self.attributes.is_empty()
    }

    /// Merges the patch into `item`, leaving `id` and every absent field untouched
    pub fn apply_to(&self, item: &mut CoffeeItem) {
        if let Some(name) = &self.name {
            item.name.clone_from(name);
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(availability) = self.availability {
            item.availability = Some(availability);
        }
        for (key, value) in &self.attributes {
            if key != CoffeeItemAttribute::Id.to_string().as_str() {
                item.attributes.insert(key.clone(), value.clone());
            }
        }
    }
}

/// `DynamoDB` attribute names for the coffee item table
#[derive(Debug, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CoffeeItemAttribute {
    /// Primary key - unique item ID
    Id,
    /// Display name
    Name,
    /// Price
    Price,
    /// Availability flag
    Availability,
}

/// Store operations the HTTP layer depends on
///
/// Absence is reported as `Ok(None)` so callers can map it to a not-found response
/// without treating it as a failure.
#[async_trait]
pub trait CoffeeItemStore: Send + Sync {
    /// Get a single coffee item by ID
    async fn get(&self, id: &str) -> CoffeeItemStorageResult<Option<CoffeeItem>>;

    /// List every coffee item in the table, in no particular order
    async fn list(&self) -> CoffeeItemStorageResult<Vec<CoffeeItem>>;

    /// Insert a new coffee item
    ///
    /// Fails with [`CoffeeItemStorageError::ItemExists`] instead of overwriting an
    /// item with the same ID.
    async fn put(&self, item: CoffeeItem) -> CoffeeItemStorageResult<CoffeeItem>;

    /// Merge `patch` into an existing coffee item and return the updated item
    async fn update(
        &self,
        id: &str,
        patch: &CoffeeItemPatch,
    ) -> CoffeeItemStorageResult<Option<CoffeeItem>>;

    /// Delete a coffee item and return what was removed
    async fn delete(&self, id: &str) -> CoffeeItemStorageResult<Option<CoffeeItem>>;
}

/// Storage client for coffee item operations
pub struct CoffeeItemStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl CoffeeItemStorage {
    /// Creates a new storage instance
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for coffee items
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }

    fn key(id: &str) -> (String, AttributeValue) {
        (
            CoffeeItemAttribute::Id.to_string(),
            AttributeValue::S(id.to_string()),
        )
    }
}

#[async_trait]
impl CoffeeItemStore for CoffeeItemStorage {
    async fn get(&self, id: &str) -> CoffeeItemStorageResult<Option<CoffeeItem>> {
        let (key_name, key_value) = Self::key(id);
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .send()
            .await?;

        response
            .item()
            .map(|item| {
                from_item(item.clone())
                    .map_err(|e| CoffeeItemStorageError::SerializationError(e.to_string()))
            })
            .transpose()
    }

    async fn list(&self) -> CoffeeItemStorageResult<Vec<CoffeeItem>> {
        let mut coffee_items = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let response = self
                .dynamodb_client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await?;

            let items = response.items.unwrap_or_default();
            coffee_items.extend(from_items::<_, CoffeeItem>(items)?);

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        tracing::debug!("Scanned {} coffee items", coffee_items.len());

        Ok(coffee_items)
    }

    async fn put(&self, item: CoffeeItem) -> CoffeeItemStorageResult<CoffeeItem> {
        let dynamo_item = to_item(&item)?;

        // Create only if *no item with this id* exists.
        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(dynamo_item))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", CoffeeItemAttribute::Id.to_string())
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    CoffeeItemStorageError::ItemExists(item.id.clone())
                } else {
                    err.into()
                }
            })?;

        Ok(item)
    }

    async fn update(
        &self,
        id: &str,
        patch: &CoffeeItemPatch,
    ) -> CoffeeItemStorageResult<Option<CoffeeItem>> {
        let Some(update) = UpdateExpression::from_patch(patch)? else {
            return self.get(id).await;
        };

        let (key_name, key_value) = Self::key(id);
        let result = self
            .dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .update_expression(update.expression)
            .condition_expression("attribute_exists(#pk)")
            .set_expression_attribute_names(Some(update.names))
            .set_expression_attribute_values(Some(update.values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output
                .attributes
                .map(from_item::<_, CoffeeItem>)
                .transpose()?),
            Err(SdkError::ServiceError(ref svc))
                if svc.err().is_conditional_check_failed_exception() =>
            {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, id: &str) -> CoffeeItemStorageResult<Option<CoffeeItem>> {
        let (key_name, key_value) = Self::key(id);
        let result = self
            .dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .key(key_name, key_value)
            .condition_expression("attribute_exists(#pk)")
            .expression_attribute_names("#pk", CoffeeItemAttribute::Id.to_string())
            .return_values(ReturnValue::AllOld)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output
                .attributes
                .map(from_item::<_, CoffeeItem>)
                .transpose()?),
            Err(SdkError::ServiceError(ref svc))
                if svc.err().is_conditional_check_failed_exception() =>
            {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// `SET` expression with placeholder names and values for an item update
#[derive(Debug)]
struct UpdateExpression {
    expression: String,
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl UpdateExpression {
    /// Builds the expression for `patch`, or `None` when there is nothing to set
    ///
    /// Every attribute name goes through a `#fN` placeholder so free-form
    /// attributes never collide with `DynamoDB` reserved words. `#pk` is always
    /// bound to the key attribute for the existence condition.
    fn from_patch(patch: &CoffeeItemPatch) -> CoffeeItemStorageResult<Option<Self>> {
        let mut assignments: Vec<(String, AttributeValue)> = Vec::new();

        if let Some(name) = &patch.name {
            assignments.push((
                CoffeeItemAttribute::Name.to_string(),
                AttributeValue::S(name.clone()),
            ));
        }
        if let Some(price) = patch.price {
            assignments.push((
                CoffeeItemAttribute::Price.to_string(),
                to_attribute_value(price)?,
            ));
        }
        if let Some(availability) = patch.availability {
            assignments.push((
                CoffeeItemAttribute::Availability.to_string(),
                AttributeValue::Bool(availability),
            ));
        }
        let key_attribute = CoffeeItemAttribute::Id.to_string();
        for (attribute, value) in &patch.attributes {
            if *attribute != key_attribute {
                assignments.push((attribute.clone(), to_attribute_value(value)?));
            }
        }

        if assignments.is_empty() {
            return Ok(None);
        }

        let mut names = HashMap::from([("#pk".to_string(), key_attribute)]);
        let mut values = HashMap::new();
        let mut clauses = Vec::with_capacity(assignments.len());
        for (index, (attribute, value)) in assignments.into_iter().enumerate() {
            let name_placeholder = format!("#f{index}");
            let value_placeholder = format!(":v{index}");
            clauses.push(format!("{name_placeholder} = {value_placeholder}"));
            names.insert(name_placeholder, attribute);
            values.insert(value_placeholder, value);
        }

        Ok(Some(Self {
            expression: format!("SET {}", clauses.join(", ")),
            names,
            values,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn latte() -> CoffeeItem {
        CoffeeItem {
            id: "c001".to_string(),
            name: "Latte".to_string(),
            price: 4.5,
            availability: Some(true),
            attributes: Map::new(),
        }
    }

    #[test]
    fn test_coffee_item_json_shape() {
        let mut item = latte();
        item.attributes
            .insert("origin".to_string(), json!("Ethiopia"));

        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(
            json,
            json!({
                "id": "c001",
                "name": "Latte",
                "price": 4.5,
                "availability": true,
                "origin": "Ethiopia"
            })
        );
    }

    #[test]
    fn test_coffee_item_optional_availability() {
        let item = CoffeeItem {
            availability: None,
            ..latte()
        };

        let json = serde_json::to_value(&item).unwrap();

        assert!(json.get("availability").is_none());
    }

    #[test]
    fn test_coffee_item_dynamo_roundtrip() {
        let mut item = latte();
        item.attributes.insert("size_oz".to_string(), json!(12));
        item.attributes
            .insert("tags".to_string(), json!(["hot", "milk"]));

        let dynamo_item: HashMap<String, AttributeValue> = to_item(&item).unwrap();
        assert_eq!(
            dynamo_item.get("id"),
            Some(&AttributeValue::S("c001".to_string()))
        );
        assert_eq!(
            dynamo_item.get("availability"),
            Some(&AttributeValue::Bool(true))
        );

        let restored: CoffeeItem = from_item(dynamo_item).unwrap();
        assert_eq!(restored.id, item.id);
        assert_eq!(restored.name, item.name);
        assert!((restored.price - item.price).abs() < f64::EPSILON);
        assert_eq!(restored.availability, item.availability);
        assert_eq!(restored.attributes.get("tags"), Some(&json!(["hot", "milk"])));
    }

    #[test]
    fn test_patch_apply_keeps_untouched_fields() {
        let mut item = latte();
        let patch = CoffeeItemPatch {
            price: Some(5.0),
            ..CoffeeItemPatch::default()
        };

        patch.apply_to(&mut item);

        assert_eq!(item.id, "c001");
        assert_eq!(item.name, "Latte");
        assert!((item.price - 5.0).abs() < f64::EPSILON);
        assert_eq!(item.availability, Some(true));
    }

    #[test]
    fn test_patch_apply_never_touches_id() {
        let mut item = latte();
        let mut attributes = Map::new();
        attributes.insert("id".to_string(), json!("hijacked"));
        let patch = CoffeeItemPatch {
            attributes,
            ..CoffeeItemPatch::default()
        };

        patch.apply_to(&mut item);

        assert_eq!(item.id, "c001");
        assert!(item.attributes.get("id").is_none());
    }

    #[test]
    fn test_empty_patch_has_no_update_expression() {
        let patch = CoffeeItemPatch::default();

        assert!(patch.is_empty());
        assert!(UpdateExpression::from_patch(&patch).unwrap().is_none());
    }

    #[test]
    fn test_update_expression_uses_placeholders() {
        let mut attributes = Map::new();
        attributes.insert("size".to_string(), json!("large"));
        let patch = CoffeeItemPatch {
            name: Some("Flat White".to_string()),
            price: Some(3.75),
            availability: None,
            attributes,
        };

        let update = UpdateExpression::from_patch(&patch).unwrap().unwrap();

        assert_eq!(update.expression, "SET #f0 = :v0, #f1 = :v1, #f2 = :v2");
        assert_eq!(update.names.get("#pk").map(String::as_str), Some("id"));
        assert_eq!(update.names.get("#f0").map(String::as_str), Some("name"));
        assert_eq!(update.names.get("#f1").map(String::as_str), Some("price"));
        assert_eq!(update.names.get("#f2").map(String::as_str), Some("size"));
        assert_eq!(
            update.values.get(":v0"),
            Some(&AttributeValue::S("Flat White".to_string()))
        );
        assert_eq!(
            update.values.get(":v2"),
            Some(&AttributeValue::S("large".to_string()))
        );
    }
}
