//! Storage for the coffee shop item catalog
//!
//! Provides the `CoffeeItem` model and the `CoffeeItemStore` abstraction the HTTP
//! service is built against, with a `DynamoDB` implementation and, behind the
//! `test-utils` feature, an in-memory one.

pub mod coffee_item;
