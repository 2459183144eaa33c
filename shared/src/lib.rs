pub mod api;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod types;

pub use config::*;
pub use error::*;
pub use session::*;
pub use types::*;
