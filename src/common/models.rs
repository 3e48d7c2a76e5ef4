use super::{Result, ZoneSnafu};

pub const RECORD_KIND_A: &str = "A";
pub const RECORD_KIND_AAAA: &str = "AAAA";
pub const RECORD_KIND_CNAME: &str = "CNAME";
pub const RECORD_KIND_MX: &str = "MX";
pub const RECORD_KIND_TXT: &str = "TXT";

/// TTL applied to every pushed record. The provider never reports
/// existing TTLs, so every push rewrites the whole zone with this value.
pub const FALLBACK_TTL: u32 = 86400;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    pub name: String,
    pub kind: String,
    pub content: String,
    pub ttl: u32,
    pub prio: Option<u32>,
}

impl Record {
    /// Identity for merge and filter purposes. TTL and priority never
    /// distinguish two records.
    pub fn matches(&self, other: &Self) -> bool {
        return self.name == other.name && self.kind == other.kind && self.content == other.content;
    }
}

/// A registered domain the way the provider addresses it: second-level
/// and top-level label pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub sld: String,
    pub tld: String,
}

impl Zone {
    pub fn from_domain(domain: &str) -> Result<Self> {
        let mut labels = domain.trim_end_matches('.').rsplit('.');
        let tld = labels.next().filter(|label| !label.is_empty());
        let sld = labels.next().filter(|label| !label.is_empty());
        match (sld, tld) {
            (Some(sld), Some(tld)) => Ok(Self {
                sld: sld.to_string(),
                tld: tld.to_string(),
            }),
            _ => ZoneSnafu {
                domain,
                message: "expected at least two labels",
            }
            .fail(),
        }
    }

    pub fn name(&self) -> String {
        format!("{}.{}", self.sld, self.tld)
    }
}

/// The provider API seam. One round trip per call; the record set is
/// always a full snapshot, there is no incremental add or remove.
pub trait ZoneApi {
    fn fetch_records(&mut self, zone: &Zone) -> Result<Vec<Record>>;
    fn push_records(&mut self, zone: &Zone, records: Vec<Record>) -> Result<()>;
}
