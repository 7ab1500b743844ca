// Domain Layer - Pure value records returned by queries

pub mod error;
pub mod product;

// Re-exports
pub use error::DomainError;
pub use product::{Extension, ProductKey, Subscription, SubscriptionStatus};
