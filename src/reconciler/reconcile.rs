use crate::common::{Record, RECORD_KIND_TXT};

/// Label prepended to the validated domain for DNS-01 records.
pub const CHALLENGE_LABEL: &str = "_acme-challenge";

pub fn challenge_record(domain: &str, validation: &str, ttl: u32) -> Record {
    Record {
        name: format!("{CHALLENGE_LABEL}.{}", domain.trim_end_matches('.')),
        kind: RECORD_KIND_TXT.to_string(),
        content: validation.to_string(),
        ttl,
        prio: None,
    }
}

// The provider does not return TTLs on a fetch but requires one on every
// pushed record, so the whole set gets the fallback value.
fn clamp_ttl(records: Vec<Record>, ttl: u32) -> Vec<Record> {
    records
        .into_iter()
        .map(|mut record| {
            record.ttl = ttl;
            record
        })
        .collect()
}

/// Returns the fetched set with the challenge record appended, unless a
/// record with the same identity is already present.
pub fn with_challenge(records: Vec<Record>, challenge: &Record, ttl: u32) -> Vec<Record> {
    let mut records = clamp_ttl(records, ttl);
    if !records.iter().any(|record| record.matches(challenge)) {
        let mut challenge = challenge.clone();
        challenge.ttl = ttl;
        records.push(challenge);
    }
    records
}

/// Returns the fetched set with every record matching the challenge
/// identity removed. A set that never contained it passes through
/// unchanged, which makes retried cleanups safe.
pub fn without_challenge(records: Vec<Record>, challenge: &Record, ttl: u32) -> Vec<Record> {
    clamp_ttl(
        records
            .into_iter()
            .filter(|record| !record.matches(challenge))
            .collect(),
        ttl,
    )
}
