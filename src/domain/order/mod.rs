//! Order domain area - immutable transaction records.

mod line_item;
mod record;
mod status;

pub use line_item::{ItemKind, LineItem};
pub use record::{NewOrder, Order};
pub use status::{OrderStatus, PaymentMethod};
