//! Error types for coffee item storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    delete_item::DeleteItemError, get_item::GetItemError, put_item::PutItemError,
    scan::ScanError, update_item::UpdateItemError,
};
use thiserror::Error;

/// Result type alias for storage operations
pub type CoffeeItemStorageResult<T> = Result<T, CoffeeItemStorageError>;

/// Storage error types for coffee item operations
#[derive(Debug, Error)]
pub enum CoffeeItemStorageError {
    /// Failed to insert coffee item into `DynamoDB`
    #[error("Failed to insert coffee item into DynamoDB: {0:?}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to get coffee item from `DynamoDB`
    #[error("Failed to get coffee item from DynamoDB: {0:?}")]
    DynamoDbGetError(#[from] SdkError<GetItemError>),

    /// Failed to scan coffee items from `DynamoDB`
    #[error("Failed to scan coffee items from DynamoDB: {0:?}")]
    DynamoDbScanError(#[from] SdkError<ScanError>),

    /// Failed to update coffee item in `DynamoDB`
    #[error("Failed to update coffee item in DynamoDB: {0:?}")]
    DynamoDbUpdateError(#[from] SdkError<UpdateItemError>),

    /// Failed to delete coffee item from `DynamoDB`
    #[error("Failed to delete coffee item from DynamoDB: {0:?}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteItemError>),

    /// An item with the same id already exists
    #[error("Coffee item already exists: {0}")]
    ItemExists(String),

    /// Failed to convert a coffee item to or from a `DynamoDB` item
    #[error("Failed to parse coffee item: {0}")]
    SerializationError(String),
}

impl CoffeeItemStorageError {
    /// Whether the failure is the store being unreachable rather than a rejected request
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::DynamoDbPutError(err) => is_transient_sdk_error(err),
            Self::DynamoDbGetError(err) => is_transient_sdk_error(err),
            Self::DynamoDbScanError(err) => is_transient_sdk_error(err),
            Self::DynamoDbUpdateError(err) => is_transient_sdk_error(err),
            Self::DynamoDbDeleteError(err) => is_transient_sdk_error(err),
            Self::ItemExists(_) | Self::SerializationError(_) => false,
        }
    }
}

impl From<serde_dynamo::Error> for CoffeeItemStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

fn is_transient_sdk_error<E, R>(err: &SdkError<E, R>) -> bool {
    matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_)
    )
}
