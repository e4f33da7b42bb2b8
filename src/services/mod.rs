//! Business rules sitting between the HTTP handlers and the store.

pub mod accounts;
pub mod tasks;

pub use accounts::AccountService;
pub use tasks::TaskService;
