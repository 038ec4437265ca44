//! Transactional email adapters.

mod resend_mailer;

pub use resend_mailer::{ResendMailer, ResendMailerConfig};
