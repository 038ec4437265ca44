//! Foundation layer - shared value objects and error types.
//!
//! These types are used across every domain area: strongly-typed identifiers,
//! timestamps, monetary amounts, and the base error vocabulary.

mod amount;
mod errors;
mod ids;
mod timestamp;

pub use amount::Amount;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AccountId, CourseId, OrderId, ProductId};
pub use timestamp::Timestamp;
