//! Facility and syllabus feedback forms.
//!
//! Each form is a controller owning its response state. Submitting validates
//! the state, shapes it into a document and appends that document through a
//! [`database::SubmissionGateway`].

pub mod config;
pub mod database;
pub mod forms;
pub mod session;

#[cfg(feature = "desktop")]
pub mod commands;

pub use crate::config::{connect_gateway, AppConfig, Backend, ConfigError};
pub use crate::database::{DocumentHandle, GatewayError, SubmissionGateway};
pub use crate::forms::{FacilityController, FormError, FormPhase, SyllabusController};
pub use crate::session::{SessionIdentity, SessionStore};
