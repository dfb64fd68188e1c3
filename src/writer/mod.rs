pub mod error;
pub mod schema_gen;
pub mod sqlite;

pub use error::ImportError;
pub use schema_gen::*;
pub use sqlite::*;
