//! HTTP Intake Adapter - Webhook and Control Endpoints

pub mod auth;
pub mod server;

pub use auth::WebhookAuth;
pub use server::{router, serve, AppState};
