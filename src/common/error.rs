use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Configuration error: {message}"))]
    ConfigError { message: String },
    #[snafu(display("Authentication failed: {message}"))]
    AuthError { message: String },
    #[snafu(display("Zone lookup failed for {domain}: {message}"))]
    ZoneError { domain: String, message: String },
    #[snafu(display("{method} {url} failed: {source}"))]
    RequestError {
        url: String,
        method: String,
        source: ureq::Error,
    },
    #[snafu(display("{message}"))]
    ResponseError { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
