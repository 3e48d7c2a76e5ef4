use std::str::FromStr;

use crate::common::{ConfigSnafu, Result, FALLBACK_TTL};
use crate::reconciler::Authenticator;
use crate::vimexx::{Credentials, VimexxClient};

/// How long the host tool should wait before validating, matching what
/// Vimexx name servers typically need.
pub const DEFAULT_PROPAGATION_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// TTL applied to every pushed record. Exposed as a setting rather
    /// than buried in the client, since it rewrites the whole zone.
    pub ttl: u32,
    pub propagation_seconds: u64,
    pub endpoint: Option<url::Url>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        Self::from_settings(&crate::vimexx::load_settings(path)?)
    }

    pub fn from_settings(settings: &config::Config) -> Result<Self> {
        let credentials = Credentials::from_settings(settings)?;
        let ttl = parse_key(settings, "dns_vimexx_ttl")?.unwrap_or(FALLBACK_TTL);
        let propagation_seconds = parse_key(settings, "dns_vimexx_propagation_seconds")?
            .unwrap_or(DEFAULT_PROPAGATION_SECONDS);
        let endpoint = match optional_key(settings, "dns_vimexx_endpoint")? {
            Some(raw) => Some(url::Url::parse(&raw).map_err(|err| {
                ConfigSnafu {
                    message: format!("Invalid dns_vimexx_endpoint: {err}"),
                }
                .build()
            })?),
            None => None,
        };

        Ok(Self {
            credentials,
            ttl,
            propagation_seconds,
            endpoint,
        })
    }

    pub fn get_authenticator(self) -> Authenticator<VimexxClient> {
        let mut client = VimexxClient::new(self.credentials).with_fallback_ttl(self.ttl);
        if let Some(endpoint) = self.endpoint {
            client = client.with_endpoint(endpoint);
        }
        Authenticator::new(client, self.ttl)
    }
}

fn optional_key(settings: &config::Config, key: &str) -> Result<Option<String>> {
    match settings.get_string(key) {
        Ok(value) => Ok(Some(value)),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(err) => ConfigSnafu {
            message: format!("Failed to read {key}: {err}"),
        }
        .fail(),
    }
}

fn parse_key<T: FromStr>(settings: &config::Config, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match optional_key(settings, key)? {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(err) => ConfigSnafu {
                message: format!("Invalid value for {key}: {err}"),
            }
            .fail(),
        },
        None => Ok(None),
    }
}
