use std::sync::Arc;

use axum::{http::StatusCode, Extension};
use coffee_storage::coffee_item::{CoffeeItem, CoffeeItemStore};
use schemars::JsonSchema;
use serde::Deserialize;
use strum::Display;
use tracing::instrument;

use crate::{
    middleware::AuthenticatedUser,
    types::{AppError, Envelope, ValidatedJson, ValidatedPath},
    validation::{CoffeeItemUpdate, NewCoffeeItem, MAX_FIELD_LENGTH},
};

/// Catalog operations reachable over HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CoffeeOperation {
    /// `GET /coffee`
    List,
    /// `GET /coffee/{id}`
    GetById,
    /// `POST /coffee`
    Create,
    /// `PUT /coffee/{id}`
    Update,
    /// `DELETE /coffee/{id}`
    Delete,
}

impl CoffeeOperation {
    /// Status code of a successful response
    #[must_use]
    pub const fn success_status(self) -> StatusCode {
        match self {
            Self::Create => StatusCode::CREATED,
            Self::List | Self::GetById | Self::Update | Self::Delete => StatusCode::OK,
        }
    }

    fn respond<T: serde::Serialize>(self, body: T) -> Envelope<T> {
        Envelope::build(self.success_status(), body)
    }
}

/// Path parameters of the single-item routes
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CoffeeItemPath {
    /// Coffee item id
    pub id: String,
}

impl CoffeeItemPath {
    /// Id to look up in the store
    ///
    /// Ids longer than creation allows cannot be stored, so they resolve to
    /// not found without a store round trip.
    fn stored_id(&self) -> Result<&str, AppError> {
        if self.id.chars().count() > MAX_FIELD_LENGTH {
            return Err(AppError::coffee_item_not_found());
        }
        Ok(&self.id)
    }
}

/// List coffee items
///
/// Returns every item in the catalog, in no particular order.
#[instrument(skip_all, fields(operation = %CoffeeOperation::List, subject = %user.subject))]
pub async fn list_coffee_items(
    Extension(store): Extension<Arc<dyn CoffeeItemStore>>,
    user: AuthenticatedUser,
) -> Result<Envelope<Vec<CoffeeItem>>, AppError> {
    let items = store.list().await?;

    Ok(CoffeeOperation::List.respond(items))
}

/// Get a coffee item
#[instrument(skip_all, fields(operation = %CoffeeOperation::GetById, subject = %user.subject, id = %path.id))]
pub async fn get_coffee_item(
    Extension(store): Extension<Arc<dyn CoffeeItemStore>>,
    user: AuthenticatedUser,
    ValidatedPath(path): ValidatedPath<CoffeeItemPath>,
) -> Result<Envelope<CoffeeItem>, AppError> {
    let item = store
        .get(path.stored_id()?)
        .await?
        .ok_or_else(AppError::coffee_item_not_found)?;

    Ok(CoffeeOperation::GetById.respond(item))
}

/// Create a coffee item
///
/// The id is optional; a UUID is generated when it is omitted. Creating an item
/// with an id that already exists fails with 409 and leaves the stored item as is.
#[instrument(skip_all, fields(operation = %CoffeeOperation::Create, subject = %user.subject))]
pub async fn create_coffee_item(
    Extension(store): Extension<Arc<dyn CoffeeItemStore>>,
    user: AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<NewCoffeeItem>,
) -> Result<Envelope<CoffeeItem>, AppError> {
    let item = store.put(payload.into_item()).await?;
    tracing::info!(id = %item.id, "Created coffee item");

    Ok(CoffeeOperation::Create.respond(item))
}

/// Update a coffee item
///
/// Merges the given fields into the stored item. Fields that are not sent keep
/// their current value and the id can never change.
#[instrument(skip_all, fields(operation = %CoffeeOperation::Update, subject = %user.subject, id = %path.id))]
pub async fn update_coffee_item(
    Extension(store): Extension<Arc<dyn CoffeeItemStore>>,
    user: AuthenticatedUser,
    ValidatedPath(path): ValidatedPath<CoffeeItemPath>,
    ValidatedJson(payload): ValidatedJson<CoffeeItemUpdate>,
) -> Result<Envelope<CoffeeItem>, AppError> {
    let item = store
        .update(path.stored_id()?, &payload.into())
        .await?
        .ok_or_else(AppError::coffee_item_not_found)?;

    Ok(CoffeeOperation::Update.respond(item))
}

/// Delete a coffee item
///
/// Returns the item that was removed.
#[instrument(skip_all, fields(operation = %CoffeeOperation::Delete, subject = %user.subject, id = %path.id))]
pub async fn delete_coffee_item(
    Extension(store): Extension<Arc<dyn CoffeeItemStore>>,
    user: AuthenticatedUser,
    ValidatedPath(path): ValidatedPath<CoffeeItemPath>,
) -> Result<Envelope<CoffeeItem>, AppError> {
    let item = store
        .delete(path.stored_id()?)
        .await?
        .ok_or_else(AppError::coffee_item_not_found)?;
    tracing::info!(id = %item.id, "Deleted coffee item");

    Ok(CoffeeOperation::Delete.respond(item))
}
