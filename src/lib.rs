#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "A multi-tenant task tracker: administrators create and assign tasks, users see and"]
#![doc = "progress the tasks assigned to them. The crate holds the domain models, the identity"]
#![doc = "layer (password hashing, bearer tokens, session cookies and the authorization gate),"]
#![doc = "the task and account services, persistence and the HTTP routes. The binary"]
#![doc = "(`main.rs`) only reads configuration and starts the server."]

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use crate::app::AppState;
pub use crate::error::AppError;
