pub mod common;
pub mod config;
pub mod reconciler;
pub mod vimexx;

pub use config::*;
