pub mod config;
pub mod corpus;
pub mod error;
pub mod program;
pub mod thumb;

pub use error::{Error, Result};
