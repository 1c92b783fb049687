//! Database module for the Chirpy server
//!
//! Record types, the repository traits the rest of the crate is written
//! against, and two implementations: Postgres (`DbOperations`) and an
//! in-process store (`MemoryStore`).

pub mod memory;
pub mod models;
pub mod operations;
pub mod repository;

pub use memory::MemoryStore;
pub use models::{Chirp, RefreshToken, SessionState, User};
pub use operations::DbOperations;
pub use repository::{ChirpRepository, RefreshTokenRepository, Store, UserRepository};
