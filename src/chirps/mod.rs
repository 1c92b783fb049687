//! Chirps: short posts owned by a user.

pub mod filter;
pub mod handlers;

pub use filter::{clean_body, validate_body, MAX_CHIRP_LENGTH};
pub use handlers::{create_chirp, delete_chirp, get_chirp, list_chirps};
