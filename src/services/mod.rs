//! Business logic layer

pub mod admission;
pub mod email;
pub mod notifier;
pub mod validation;

pub use admission::{AdmissionService, PublishDecision};
pub use email::{EmailConfig, EmailService};
pub use notifier::Notifier;
