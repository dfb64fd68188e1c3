pub mod cache;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod limiter;
pub mod retry;

pub use cache::*;
pub use client::*;
pub use endpoint::*;
pub use error::*;
pub use limiter::*;
pub use retry::*;
