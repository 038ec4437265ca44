//! Account domain area - the principal owning entitlement collections.

mod aggregate;

pub use aggregate::{Account, Enrollment, Purchase};
