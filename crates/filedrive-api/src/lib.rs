//! Filedrive API Library
//!
//! HTTP handlers, the API-gateway event adapter, and application setup.

mod api_doc;
pub mod auth;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use gateway::{dispatch, GatewayEvent, GatewayResponse};
pub use services::{CleanupService, FileService};
pub use state::AppState;
