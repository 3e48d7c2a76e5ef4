use crate::common::{Result, Zone, ZoneApi};

use super::reconcile::{challenge_record, with_challenge, without_challenge};

/// Drives one DNS-01 challenge against a zone: publish the validation
/// record, and once the issuance tool has validated it, remove it again.
///
/// Both operations are a full fetch-then-push of the zone's record set,
/// because the provider has no single-record add or remove. Nothing is
/// written when any step fails, so the remote set is either replaced
/// wholesale or left as fetched. Concurrent edits to the same zone from
/// elsewhere during that window are not protected against.
pub struct Authenticator<A: ZoneApi> {
    api: A,
    ttl: u32,
}

impl<A: ZoneApi> Authenticator<A> {
    pub fn new(api: A, ttl: u32) -> Self {
        Self { api, ttl }
    }

    /// Publishes the validation TXT record for `domain`.
    pub fn perform(&mut self, domain: &str, validation: &str) -> Result<()> {
        let zone = Zone::from_domain(domain)?;
        let challenge = challenge_record(domain, validation, self.ttl);

        let current = self.api.fetch_records(&zone)?;
        tracing::debug!(
            zone = zone.name(),
            records = current.len(),
            "Fetched record set"
        );
        tracing::warn!(
            zone = zone.name(),
            ttl = self.ttl,
            "The provider does not report TTLs; every record in the zone is rewritten with the fallback TTL"
        );

        let desired = with_challenge(current, &challenge, self.ttl);
        self.api.push_records(&zone, desired)?;

        tracing::info!(
            domain = domain,
            name = challenge.name,
            "Challenge record published"
        );
        Ok(())
    }

    /// Removes the validation TXT record for `domain`. Safe to call when
    /// the record is already gone.
    pub fn cleanup(&mut self, domain: &str, validation: &str) -> Result<()> {
        let zone = Zone::from_domain(domain)?;
        let challenge = challenge_record(domain, validation, self.ttl);

        let current = self.api.fetch_records(&zone)?;
        let remaining = without_challenge(current, &challenge, self.ttl);
        self.api.push_records(&zone, remaining)?;

        tracing::info!(
            domain = domain,
            name = challenge.name,
            "Challenge record removed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Error, Record, ResponseSnafu, RECORD_KIND_A, RECORD_KIND_TXT};

    struct FakeApi {
        records: Vec<Record>,
        pushes: usize,
        fail_push: bool,
    }

    impl FakeApi {
        fn with(records: Vec<Record>) -> Self {
            Self {
                records,
                pushes: 0,
                fail_push: false,
            }
        }
    }

    impl ZoneApi for FakeApi {
        fn fetch_records(&mut self, _zone: &Zone) -> Result<Vec<Record>> {
            Ok(self.records.clone())
        }

        fn push_records(&mut self, _zone: &Zone, records: Vec<Record>) -> Result<()> {
            if self.fail_push {
                return ResponseSnafu {
                    message: "simulated transport failure",
                }
                .fail();
            }
            self.pushes += 1;
            self.records = records;
            Ok(())
        }
    }

    fn www() -> Record {
        Record {
            name: "www".into(),
            kind: RECORD_KIND_A.into(),
            content: "1.2.3.4".into(),
            ttl: 300,
            prio: None,
        }
    }

    #[test]
    fn perform_publishes_the_challenge_record() {
        let mut authenticator = Authenticator::new(FakeApi::with(vec![www()]), 86400);
        authenticator.perform("example.com", "abc123").unwrap();

        let records = &authenticator.api.records;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record.ttl == 86400));
        assert!(records.iter().any(|record| {
            record.name == "_acme-challenge.example.com"
                && record.kind == RECORD_KIND_TXT
                && record.content == "abc123"
        }));
    }

    #[test]
    fn perform_rejects_a_single_label_domain() {
        let mut authenticator = Authenticator::new(FakeApi::with(vec![]), 86400);
        let err = authenticator.perform("localhost", "abc123").unwrap_err();
        assert!(matches!(err, Error::ZoneError { .. }));
        assert_eq!(authenticator.api.pushes, 0);
    }

    #[test]
    fn failed_push_leaves_the_remote_set_untouched() {
        let mut api = FakeApi::with(vec![www()]);
        api.fail_push = true;
        let mut authenticator = Authenticator::new(api, 86400);

        let err = authenticator.perform("example.com", "abc123").unwrap_err();
        assert!(matches!(err, Error::ResponseError { .. }));
        assert_eq!(authenticator.api.records, vec![www()]);

        // A later cleanup against the unmodified set is a no-op filter.
        authenticator.api.fail_push = false;
        authenticator.cleanup("example.com", "abc123").unwrap();
        assert_eq!(authenticator.api.records.len(), 1);
        assert_eq!(authenticator.api.records[0].name, "www");
    }

    #[test]
    fn cleanup_removes_the_challenge_and_retries_safely() {
        let mut authenticator = Authenticator::new(FakeApi::with(vec![www()]), 86400);
        authenticator.perform("example.com", "abc123").unwrap();
        authenticator.cleanup("example.com", "abc123").unwrap();

        let after_first = authenticator.api.records.clone();
        assert_eq!(after_first.len(), 1);
        assert_eq!(after_first[0].name, "www");

        authenticator.cleanup("example.com", "abc123").unwrap();
        assert_eq!(authenticator.api.records, after_first);
        // Cleanup always pushes the filtered snapshot, present or not.
        assert_eq!(authenticator.api.pushes, 3);
    }
}
