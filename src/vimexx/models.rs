use serde::{Deserialize, Deserializer, Serializer};

use crate::common::{Record, Zone};

#[derive(serde::Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: Option<String>,
}

/// Every API call wraps its payload together with the WHMCS version
/// string Vimexx expects to see.
#[derive(serde::Serialize)]
pub(super) struct ApiRequest<T: serde::Serialize> {
    pub body: T,
    pub version: &'static str,
}

#[derive(serde::Deserialize)]
pub(super) struct ApiResponse<T> {
    #[serde(default = "default_true")]
    pub result: bool,
    #[serde(default)]
    pub message: Option<String>,
    // No `default` attribute here: serde already maps an absent Option
    // field to None, and the attribute would put a `T: Default` bound on
    // the Deserialize impl that payload types do not satisfy.
    pub data: Option<T>,
}

fn default_true() -> bool {
    true
}

#[derive(serde::Serialize)]
pub(super) struct ZoneQuery {
    pub sld: String,
    pub tld: String,
}

impl From<&Zone> for ZoneQuery {
    fn from(value: &Zone) -> Self {
        Self {
            sld: value.sld.clone(),
            tld: value.tld.clone(),
        }
    }
}

#[derive(serde::Serialize)]
pub(super) struct ZoneUpdate {
    pub sld: String,
    pub tld: String,
    pub dns_records: Vec<DnsRecord>,
}

#[derive(serde::Deserialize)]
pub(super) struct DnsRecordsData {
    #[serde(default)]
    pub dns_records: Vec<DnsRecord>,
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub(super) struct DnsRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    // The API omits the TTL on reads, emits it as a string or a number
    // when it does appear, and wants the string form on writes.
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        serialize_with = "stringly_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub ttl: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub prio: Option<u32>,
}

impl DnsRecord {
    /// Normalizes a fetched record: trailing dots off names, quotes off
    /// TXT content, and the fallback TTL where the provider omitted one.
    pub fn into_record(self, fallback_ttl: u32) -> Record {
        Record {
            name: self.name.trim_end_matches('.').to_string(),
            kind: self.kind.to_ascii_uppercase(),
            content: self.content.trim_matches('"').to_string(),
            ttl: self.ttl.unwrap_or(fallback_ttl),
            prio: self.prio,
        }
    }
}

impl From<Record> for DnsRecord {
    fn from(value: Record) -> Self {
        Self {
            name: value.name,
            kind: value.kind,
            content: value.content,
            ttl: Some(value.ttl),
            prio: value.prio,
        }
    }
}

fn lenient_u32<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u32>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => {
            number.as_u64().and_then(|n| u32::try_from(n).ok())
        }
        Some(serde_json::Value::String(string)) => string.trim().parse().ok(),
        _ => None,
    })
}

fn stringly_u32<S: Serializer>(
    value: &Option<u32>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_str(&value.to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_records_with_and_without_ttl() {
        let data: DnsRecordsData = serde_json::from_str(
            r#"{"dns_records":[
                {"name":"www.example.com.","type":"A","content":"1.2.3.4","ttl":"3600"},
                {"name":"mail","type":"mx","content":"mx.example.com","ttl":300,"prio":10},
                {"name":"note","type":"TXT","content":"\"hello\""}
            ]}"#,
        )
        .unwrap();

        let records: Vec<Record> = data
            .dns_records
            .into_iter()
            .map(|record| record.into_record(86400))
            .collect();

        assert_eq!(records[0].name, "www.example.com");
        assert_eq!(records[0].ttl, 3600);
        assert_eq!(records[1].kind, "MX");
        assert_eq!(records[1].ttl, 300);
        assert_eq!(records[1].prio, Some(10));
        assert_eq!(records[2].content, "hello");
        assert_eq!(records[2].ttl, 86400);
    }

    #[test]
    fn serializes_ttl_as_a_string() {
        let record = DnsRecord::from(Record {
            name: "www".into(),
            kind: "A".into(),
            content: "1.2.3.4".into(),
            ttl: 86400,
            prio: None,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ttl"], "86400");
        assert_eq!(json["type"], "A");
        assert!(json.get("prio").is_none());
    }

    #[test]
    fn missing_data_defaults_to_a_successful_empty_envelope() {
        let response: ApiResponse<DnsRecordsData> = serde_json::from_str(r#"{}"#).unwrap();
        assert!(response.result);
        assert!(response.data.is_none());

        let failure: ApiResponse<DnsRecordsData> =
            serde_json::from_str(r#"{"result":false,"message":"domain not found"}"#).unwrap();
        assert!(!failure.result);
        assert_eq!(failure.message.as_deref(), Some("domain not found"));
    }
}
