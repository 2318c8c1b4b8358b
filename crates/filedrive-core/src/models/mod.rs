//! Data models for the application

mod file;
mod identity;
mod upload;

pub use file::*;
pub use identity::*;
pub use upload::*;
