//! Validation of incoming coffee item payloads
//!
//! Bodies are first checked for shape (must be a JSON object), then deserialized
//! into typed requests and run through their `validator` rules. Nothing here
//! touches the store.

use std::borrow::Cow;

use coffee_storage::coffee_item::{CoffeeItem, CoffeeItemAttribute, CoffeeItemPatch};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

/// Longest accepted id, name or attribute name
pub const MAX_FIELD_LENGTH: usize = 255;

/// Reasons a payload is rejected
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Request is missing `Content-Type: application/json`
    #[error("Missing Content-Type: application/json header")]
    MissingJsonContentType,
    /// Body is not parseable JSON
    #[error("Invalid JSON payload")]
    InvalidJson,
    /// Body is valid JSON but not an object
    #[error("Request body must be a JSON object")]
    NotAnObject,
    /// Body has a missing field or a field of the wrong type
    #[error("Invalid coffee item: {0}")]
    Malformed(String),
    /// A field failed its validation rule
    #[error("Invalid field `{field}`: {reason}")]
    InvalidField {
        /// Offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },
    /// Update body carries nothing to change
    #[error("Update must contain at least one field")]
    EmptyUpdate,
    /// Update body tries to change the item id
    #[error("Field `id` cannot be updated")]
    ImmutableId,
}

/// Payload of a create request
#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct NewCoffeeItem {
    /// Item id; generated when omitted
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub id: Option<String>,
    /// Display name
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    /// Price, zero or more
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price: f64,
    /// Whether the item can currently be ordered
    #[serde(default)]
    pub availability: Option<bool>,
    /// Free-form attributes stored as-is
    #[serde(flatten)]
    #[validate(custom(function = "validate_attributes"))]
    #[schemars(skip)]
    pub attributes: Map<String, Value>,
}

impl NewCoffeeItem {
    /// Builds the item to persist, assigning a fresh UUID v4 when no id was given
    #[must_use]
    pub fn into_item(self) -> CoffeeItem {
        CoffeeItem {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: self.name.trim().to_string(),
            price: self.price,
            availability: self.availability,
            attributes: self.attributes,
        }
    }
}

/// Payload of an update request; every field is optional but at least one is required
#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct CoffeeItemUpdate {
    /// New display name
    #[serde(default)]
    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,
    /// New price
    #[serde(default)]
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price: Option<f64>,
    /// New availability
    #[serde(default)]
    pub availability: Option<bool>,
    /// Free-form attributes to set or overwrite
    #[serde(flatten)]
    #[validate(custom(function = "validate_attributes"))]
    #[schemars(skip)]
    pub attributes: Map<String, Value>,
}

impl From<CoffeeItemUpdate> for CoffeeItemPatch {
    fn from(update: CoffeeItemUpdate) -> Self {
        Self {
            name: update.name.map(|name| name.trim().to_string()),
            price: update.price,
            availability: update.availability,
            attributes: update.attributes,
        }
    }
}

impl TryFrom<Value> for NewCoffeeItem {
    type Error = ValidationError;

    fn try_from(payload: Value) -> Result<Self, Self::Error> {
        let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;
        reject_nulls(
            object,
            &[
                CoffeeItemAttribute::Id,
                CoffeeItemAttribute::Name,
                CoffeeItemAttribute::Price,
                CoffeeItemAttribute::Availability,
            ],
        )?;

        parse(payload)
    }
}

impl TryFrom<Value> for CoffeeItemUpdate {
    type Error = ValidationError;

    fn try_from(payload: Value) -> Result<Self, Self::Error> {
        let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;
        if object.contains_key(CoffeeItemAttribute::Id.to_string().as_str()) {
            return Err(ValidationError::ImmutableId);
        }
        reject_nulls(
            object,
            &[
                CoffeeItemAttribute::Name,
                CoffeeItemAttribute::Price,
                CoffeeItemAttribute::Availability,
            ],
        )?;

        let update: Self = parse(payload)?;
        if update.name.is_none()
            && update.price.is_none()
            && update.availability.is_none()
            && update.attributes.is_empty()
        {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(update)
    }
}

/// Validates a create payload
///
/// # Errors
///
/// Returns a [`ValidationError`] describing the first rule the payload breaks
pub fn validate_create(payload: Value) -> Result<NewCoffeeItem, ValidationError> {
    NewCoffeeItem::try_from(payload)
}

/// Validates an update payload into the patch to merge
///
/// # Errors
///
/// Returns a [`ValidationError`] describing the first rule the payload breaks
pub fn validate_update(payload: Value) -> Result<CoffeeItemPatch, ValidationError> {
    CoffeeItemUpdate::try_from(payload).map(Into::into)
}

/// Typed fields may be left out but never sent as `null`
fn reject_nulls(
    object: &Map<String, Value>,
    fields: &[CoffeeItemAttribute],
) -> Result<(), ValidationError> {
    for field in fields {
        let field = field.to_string();
        if object.get(&field).is_some_and(Value::is_null) {
            return Err(ValidationError::InvalidField {
                field,
                reason: "must not be null".to_string(),
            });
        }
    }
    Ok(())
}

fn parse<T: DeserializeOwned + Validate>(payload: Value) -> Result<T, ValidationError> {
    if !payload.is_object() {
        return Err(ValidationError::NotAnObject);
    }

    let request: T = serde_json::from_value(payload)
        .map_err(|err| ValidationError::Malformed(err.to_string()))?;

    request.validate().map_err(|errors| {
        // Report the first failing field in name order so messages are stable
        let mut field_errors: Vec<_> = errors.field_errors().into_iter().collect();
        field_errors.sort_by(|(a, _), (b, _)| a.cmp(b));

        field_errors
            .into_iter()
            .find_map(|(field, failures)| {
                failures.first().map(|error| ValidationError::InvalidField {
                    field: field.to_string(),
                    reason: error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string),
                })
            })
            .unwrap_or_else(|| ValidationError::Malformed(errors.to_string()))
    })?;

    Ok(request)
}

fn validate_name(name: &str) -> Result<(), validator::ValidationError> {
    if name.trim().is_empty() {
        return Err(invalid("blank_name", "must not be blank"));
    }
    if name.chars().count() > MAX_FIELD_LENGTH {
        return Err(invalid("name_too_long", "must be at most 255 characters"));
    }
    Ok(())
}

fn validate_attributes(attributes: &Map<String, Value>) -> Result<(), validator::ValidationError> {
    for (name, value) in attributes {
        if name.trim().is_empty() || name.chars().count() > MAX_FIELD_LENGTH {
            return Err(invalid(
                "invalid_attribute_name",
                "attribute names must be between 1 and 255 characters",
            ));
        }
        if value.is_null() {
            return Err(invalid(
                "null_attribute",
                "attribute values must not be null",
            ));
        }
    }
    Ok(())
}

fn invalid(code: &'static str, message: &'static str) -> validator::ValidationError {
    let mut error = validator::ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_keeps_caller_id() {
        let item = validate_create(json!({
            "id": "c001",
            "name": "Latte",
            "price": 4.5,
            "availability": true
        }))
        .unwrap()
        .into_item();

        assert_eq!(item.id, "c001");
        assert_eq!(item.name, "Latte");
        assert_eq!(item.availability, Some(true));
    }

    #[test]
    fn test_create_generates_id_when_missing() {
        let item = validate_create(json!({ "name": "Mocha", "price": 5 }))
            .unwrap()
            .into_item();

        assert!(Uuid::parse_str(&item.id).is_ok());
        assert!((item.price - 5.0).abs() < f64::EPSILON);
        assert_eq!(item.availability, None);
    }

    #[test]
    fn test_create_keeps_free_form_attributes() {
        let item = validate_create(json!({
            "name": "Cold Brew",
            "price": 3.0,
            "origin": "Kenya",
            "sizes": ["small", "large"]
        }))
        .unwrap()
        .into_item();

        assert_eq!(item.attributes.get("origin"), Some(&json!("Kenya")));
        assert_eq!(item.attributes.len(), 2);
    }

    #[test]
    fn test_create_requires_name() {
        let err = validate_create(json!({ "price": 4.5 })).unwrap_err();

        assert!(matches!(err, ValidationError::Malformed(ref msg) if msg.contains("name")));
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let err = validate_create(json!({ "name": "   ", "price": 1.0 })).unwrap_err();

        assert_eq!(
            err,
            ValidationError::InvalidField {
                field: "name".to_string(),
                reason: "must not be blank".to_string(),
            }
        );
    }

    #[test]
    fn test_create_rejects_bad_price() {
        let negative = validate_create(json!({ "name": "Latte", "price": -1 })).unwrap_err();
        assert!(matches!(negative, ValidationError::InvalidField { ref field, .. } if field == "price"));

        let text = validate_create(json!({ "name": "Latte", "price": "4.50" })).unwrap_err();
        assert!(matches!(text, ValidationError::Malformed(_)));
    }

    #[test]
    fn test_create_rejects_non_boolean_availability() {
        let err = validate_create(json!({ "name": "Latte", "price": 1, "availability": "yes" }))
            .unwrap_err();

        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn test_create_rejects_invalid_id() {
        let empty = validate_create(json!({ "id": "", "name": "Latte", "price": 1 })).unwrap_err();
        assert!(matches!(empty, ValidationError::InvalidField { ref field, .. } if field == "id"));

        let long = "x".repeat(256);
        let too_long =
            validate_create(json!({ "id": long, "name": "Latte", "price": 1 })).unwrap_err();
        assert!(matches!(too_long, ValidationError::InvalidField { ref field, .. } if field == "id"));
    }

    #[test]
    fn test_create_rejects_null_attribute() {
        let err = validate_create(json!({ "name": "Latte", "price": 1, "notes": null }))
            .unwrap_err();

        assert!(matches!(err, ValidationError::InvalidField { ref field, .. } if field == "attributes"));
    }

    #[test]
    fn test_body_must_be_an_object() {
        assert_eq!(
            validate_create(json!(["Latte"])).unwrap_err(),
            ValidationError::NotAnObject
        );
        assert_eq!(
            validate_update(json!("price")).unwrap_err(),
            ValidationError::NotAnObject
        );
    }

    #[test]
    fn test_update_builds_partial_patch() {
        let patch = validate_update(json!({ "price": 5.0 })).unwrap();

        assert_eq!(patch.price, Some(5.0));
        assert!(patch.name.is_none());
        assert!(patch.availability.is_none());
        assert!(patch.attributes.is_empty());
    }

    #[test]
    fn test_update_rejects_empty_body() {
        assert_eq!(
            validate_update(json!({})).unwrap_err(),
            ValidationError::EmptyUpdate
        );
    }

    #[test]
    fn test_update_rejects_explicit_nulls() {
        assert_eq!(
            validate_update(json!({ "name": "Mocha", "price": null })).unwrap_err(),
            ValidationError::InvalidField {
                field: "price".to_string(),
                reason: "must not be null".to_string(),
            }
        );
        assert!(matches!(
            validate_update(json!({ "availability": null })).unwrap_err(),
            ValidationError::InvalidField { ref field, .. } if field == "availability"
        ));
    }

    #[test]
    fn test_create_rejects_explicit_nulls() {
        for field in ["id", "name", "price", "availability"] {
            let mut payload = json!({ "id": "c001", "name": "Latte", "price": 4.5, "availability": true });
            payload[field] = Value::Null;

            assert_eq!(
                validate_create(payload).unwrap_err(),
                ValidationError::InvalidField {
                    field: field.to_string(),
                    reason: "must not be null".to_string(),
                }
            );
        }
    }

    #[test]
    fn test_update_rejects_id() {
        assert_eq!(
            validate_update(json!({ "id": "c002", "price": 1.0 })).unwrap_err(),
            ValidationError::ImmutableId
        );
    }

    #[test]
    fn test_update_rejects_blank_name() {
        let err = validate_update(json!({ "name": "" })).unwrap_err();

        assert!(matches!(err, ValidationError::InvalidField { ref field, .. } if field == "name"));
    }
}
