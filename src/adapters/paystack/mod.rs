//! Paystack payment gateway adapter.

mod paystack_gateway;
mod types;

pub use paystack_gateway::{PaystackConfig, PaystackGateway};
