mod client;
mod config;
mod models;

pub(crate) use config::load_settings;

pub use client::*;
pub use config::Credentials;
