use crate::common::{ConfigSnafu, Result};

const CREDENTIAL_KEYS: [&str; 4] = [
    "dns_vimexx_client_id",
    "dns_vimexx_client_secret",
    "dns_vimexx_username",
    "dns_vimexx_password",
];

/// Vimexx issues OAuth2 password-grant tokens, so four values are needed
/// rather than a single API key.
#[derive(Clone, serde::Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

// Hand-written so the secret and password stay out of logs and panic
// messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Loads credentials from a key-value file, with `DNS_VIMEXX_*`
    /// environment variables taking precedence.
    pub fn load(path: &str) -> Result<Self> {
        Self::from_settings(&load_settings(path)?)
    }

    pub fn from_settings(settings: &config::Config) -> Result<Self> {
        let mut values = Vec::with_capacity(CREDENTIAL_KEYS.len());
        let mut missing = Vec::new();
        for key in CREDENTIAL_KEYS {
            match settings.get_string(key) {
                Ok(value) if !value.is_empty() => values.push(value),
                _ => missing.push(key),
            }
        }

        if !missing.is_empty() {
            return ConfigSnafu {
                message: format!("Missing required credentials: {}", missing.join(", ")),
            }
            .fail();
        }

        let mut values = values.into_iter();
        Ok(Self {
            client_id: values.next().unwrap_or_default(),
            client_secret: values.next().unwrap_or_default(),
            username: values.next().unwrap_or_default(),
            password: values.next().unwrap_or_default(),
        })
    }
}

/// Reads the credentials file plus environment overrides. No network
/// access happens here; a bad file fails before any API call is made.
pub(crate) fn load_settings(path: &str) -> Result<config::Config> {
    check_permissions(path);
    config::Config::builder()
        .add_source(config::File::new(path, config::FileFormat::Ini))
        .add_source(config::Environment::default())
        .build()
        .map_err(|err| {
            ConfigSnafu {
                message: format!("Failed to read credentials file {path}: {err}"),
            }
            .build()
        })
}

// The credentials file holds an account password; it should be readable
// by its owner only.
#[cfg(unix)]
fn check_permissions(path: &str) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = std::fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = path,
                mode = format!("{:o}", mode & 0o777),
                "Credentials file is accessible by other users; restrict it to its owner"
            );
        }
    }
}

#[cfg(not(unix))]
fn check_permissions(_path: &str) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;

    fn settings_from(ini: &str) -> config::Config {
        config::Config::builder()
            .add_source(config::File::from_str(ini, config::FileFormat::Ini))
            .build()
            .unwrap()
    }

    #[test]
    fn loads_complete_credentials() {
        let settings = settings_from(
            "dns_vimexx_client_id = 1234\n\
             dns_vimexx_client_secret = s3cret\n\
             dns_vimexx_username = user@example.com\n\
             dns_vimexx_password = hunter2\n",
        );
        let credentials = Credentials::from_settings(&settings).unwrap();
        assert_eq!(credentials.client_id, "1234");
        assert_eq!(credentials.client_secret, "s3cret");
        assert_eq!(credentials.username, "user@example.com");
        assert_eq!(credentials.password, "hunter2");
    }

    #[test]
    fn missing_keys_fail_with_a_configuration_error() {
        let settings = settings_from("dns_vimexx_client_id = 1234\n");
        let err = Credentials::from_settings(&settings).unwrap_err();
        assert!(matches!(err, Error::ConfigError { .. }));

        let message = err.to_string();
        assert!(message.contains("dns_vimexx_client_secret"));
        assert!(message.contains("dns_vimexx_username"));
        assert!(message.contains("dns_vimexx_password"));
        assert!(!message.contains("dns_vimexx_client_id,"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credentials = Credentials {
            client_id: "1234".into(),
            client_secret: "s3cret".into(),
            username: "user".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{credentials:?}");
        assert!(debug.contains("1234"));
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn empty_values_count_as_missing() {
        let settings = settings_from(
            "dns_vimexx_client_id = 1234\n\
             dns_vimexx_client_secret =\n\
             dns_vimexx_username = user\n\
             dns_vimexx_password = hunter2\n",
        );
        let err = Credentials::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("dns_vimexx_client_secret"));
    }
}
