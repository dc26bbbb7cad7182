pub mod config;
pub mod error;
pub mod identity;

pub use config::*;
pub use error::{Error, Result};
pub use identity::*;
