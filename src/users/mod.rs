//! Account creation and credential updates.

pub mod handlers;

pub use handlers::{create_user, update_user, UserResponse};
