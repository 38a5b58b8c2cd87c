pub mod directory;
pub mod manager;
pub mod models;

pub use directory::{Directory, DirectoryError, DirectoryState, InMemoryDirectory, PgDirectory};
pub use manager::{DatabaseManager, DatabaseError};
