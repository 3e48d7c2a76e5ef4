use serde::de::DeserializeOwned;
use snafu::prelude::*;

use crate::common::{
    AuthSnafu, Error, Record, RequestSnafu, ResponseSnafu, Result, Zone, ZoneApi, FALLBACK_TTL,
};

use super::models::{
    ApiRequest, ApiResponse, DnsRecord, DnsRecordsData, TokenResponse, ZoneQuery, ZoneUpdate,
};
use super::Credentials;

const API_BASE_URL: &str = "https://api.vimexx.nl";
const API_PREFIX: &str = "/api/v1";
const DNS_ENDPOINT: &str = "/whmcs/domain/dns";
// Vimexx rejects API calls that do not carry a current WHMCS version.
const WHMCS_VERSION: &str = "8.6.1-release.1";
const AUTH_SCOPE: &str = "whmcs-access";

pub const PROVIDER_NAME: &str = "Vimexx";

enum WriteMethod {
    Post,
    Put,
}

impl ToString for WriteMethod {
    fn to_string(&self) -> String {
        match self {
            WriteMethod::Post => "POST",
            WriteMethod::Put => "PUT",
        }
        .to_string()
    }
}

impl From<WriteMethod> for String {
    fn from(value: WriteMethod) -> Self {
        value.to_string()
    }
}

/// Blocking client for the Vimexx WHMCS API. Authenticates lazily on the
/// first call and reuses the bearer token for the rest of its lifetime.
pub struct VimexxClient {
    credentials: Credentials,
    endpoint: url::Url,
    fallback_ttl: u32,
    access_token: Option<String>,
}

impl VimexxClient {
    pub fn new(credentials: Credentials) -> Self {
        let endpoint = url::Url::parse(API_BASE_URL).expect("default endpoint should be a URL");
        Self {
            credentials,
            endpoint,
            fallback_ttl: FALLBACK_TTL,
            access_token: None,
        }
    }

    /// Points the client at a different API endpoint, for test setups.
    pub fn with_endpoint(mut self, endpoint: url::Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the TTL reported for fetched records that carry none.
    pub fn with_fallback_ttl(mut self, ttl: u32) -> Self {
        self.fallback_ttl = ttl;
        self
    }

    fn base_url(&self) -> &str {
        self.endpoint.as_str().trim_end_matches('/')
    }

    fn authenticate(&mut self) -> Result<String> {
        let url = format!("{}/auth/token", self.base_url());
        tracing::debug!(
            provider = PROVIDER_NAME,
            username = self.credentials.username,
            "Requesting access token"
        );

        let response: TokenResponse = ureq::post(&url)
            .send_form(&[
                ("grant_type", "password"),
                ("client_id", &self.credentials.client_id),
                ("client_secret", &self.credentials.client_secret),
                ("username", &self.credentials.username),
                ("password", &self.credentials.password),
                ("scope", AUTH_SCOPE),
            ])
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => AuthSnafu {
                    message: format!("Token endpoint returned status {code}"),
                }
                .build(),
                err => Error::RequestError {
                    url: url.clone(),
                    method: "POST".to_string(),
                    source: err,
                },
            })?
            .into_json()
            .map_err(|err| {
                AuthSnafu {
                    message: format!("Failed to decode token response: {err}"),
                }
                .build()
            })?;

        match response.access_token {
            Some(token) => {
                self.access_token = Some(token.clone());
                Ok(token)
            }
            None => AuthSnafu {
                message: "No access token in response",
            }
            .fail(),
        }
    }

    fn token(&mut self) -> Result<String> {
        match &self.access_token {
            Some(token) => Ok(token.clone()),
            None => self.authenticate(),
        }
    }

    fn api_request<T: DeserializeOwned>(
        &mut self,
        endpoint: &str,
        method: WriteMethod,
        body: impl serde::Serialize,
    ) -> Result<Option<T>> {
        let token = self.token()?;
        let url = format!("{}{API_PREFIX}{endpoint}", self.base_url());

        tracing::debug!(
            provider = PROVIDER_NAME,
            url = url.as_str(),
            method = method.to_string(),
            "Sending request"
        );

        let request = match method {
            WriteMethod::Post => ureq::post(&url),
            WriteMethod::Put => ureq::put(&url),
        };
        let response: ApiResponse<T> = request
            .set("Authorization", &format!("Bearer {token}"))
            .set("Content-Type", "application/json")
            .send_json(ApiRequest {
                body,
                version: WHMCS_VERSION,
            })
            .context(RequestSnafu {
                url: url.as_str(),
                method,
            })?
            .into_json()
            .map_err(|err| {
                ResponseSnafu {
                    message: format!("Failed to deserialize response: {err}"),
                }
                .build()
            })?;

        if !response.result {
            return ResponseSnafu {
                message: format!(
                    "Request unsuccessful: {}",
                    response.message.unwrap_or_else(|| "no message".to_string())
                ),
            }
            .fail();
        }

        Ok(response.data)
    }
}

impl ZoneApi for VimexxClient {
    fn fetch_records(&mut self, zone: &Zone) -> Result<Vec<Record>> {
        let data: Option<DnsRecordsData> = self
            .api_request(DNS_ENDPOINT, WriteMethod::Post, ZoneQuery::from(zone))
            .map_err(|err| match err {
                // An API-level refusal on a fetch means the zone is not
                // manageable under these credentials.
                Error::ResponseError { message } => Error::ZoneError {
                    domain: zone.name(),
                    message,
                },
                err => err,
            })?;

        let records = data.map(|data| data.dns_records).unwrap_or_default();
        tracing::info!(
            provider = PROVIDER_NAME,
            zone = zone.name(),
            records = records.len(),
            "Fetched zone record set"
        );

        Ok(records
            .into_iter()
            .map(|record| record.into_record(self.fallback_ttl))
            .collect())
    }

    fn push_records(&mut self, zone: &Zone, records: Vec<Record>) -> Result<()> {
        let update = ZoneUpdate {
            sld: zone.sld.clone(),
            tld: zone.tld.clone(),
            dns_records: records.into_iter().map(DnsRecord::from).collect(),
        };
        let count = update.dns_records.len();

        let _: Option<serde_json::Value> =
            self.api_request(DNS_ENDPOINT, WriteMethod::Put, update)?;

        tracing::info!(
            provider = PROVIDER_NAME,
            zone = zone.name(),
            records = count,
            "Pushed zone record set"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            client_id: "1234".into(),
            client_secret: "s3cret".into(),
            username: "user".into(),
            password: "hunter2".into(),
        }
    }

    #[test]
    fn fallback_ttl_defaults_to_the_policy_constant() {
        let client = VimexxClient::new(credentials());
        assert_eq!(client.fallback_ttl, FALLBACK_TTL);
    }

    #[test]
    fn configured_ttl_is_used_for_fetched_records() {
        let client = VimexxClient::new(credentials()).with_fallback_ttl(300);
        assert_eq!(client.fallback_ttl, 300);

        let record = DnsRecord {
            name: "www".into(),
            kind: "A".into(),
            content: "1.2.3.4".into(),
            ttl: None,
            prio: None,
        };
        assert_eq!(record.into_record(client.fallback_ttl).ttl, 300);
    }
}
