//! Catalog file structure.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Document;

/// Contents of a `catalog.json` or `latest.json` file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    /// Time of the last content change, UTC with a trailing `Z`
    #[serde(with = "utc_seconds")]
    pub updated_at: DateTime<Utc>,

    /// Number of documents in this file
    pub count: usize,

    /// Documents, newest first
    pub documents: Vec<Document>,
}

impl Catalog {
    pub fn new(documents: Vec<Document>, updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at: updated_at.trunc_subsecs(0),
            count: documents.len(),
            documents,
        }
    }

    /// First `n` documents as a new catalog with the same timestamp.
    pub fn latest(&self, n: usize) -> Self {
        let documents: Vec<Document> = self.documents.iter().take(n).cloned().collect();
        Self::new(documents, self.updated_at)
    }
}

/// `YYYY-MM-DDTHH:MM:SSZ` timestamps.
mod utc_seconds {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::tests::doc;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let catalog = Catalog::new(vec![], ts);
        let json = serde_json::to_string(&catalog).unwrap();
        assert_eq!(
            json,
            r#"{"updated_at":"2025-01-02T03:04:05Z","count":0,"documents":[]}"#
        );

        let back: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, catalog);
    }

    #[test]
    fn test_subseconds_dropped() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(750);
        let json = serde_json::to_value(Catalog::new(vec![], ts)).unwrap();
        assert_eq!(json["updated_at"], "2025-01-02T03:04:05Z");
    }

    #[test]
    fn test_latest_truncates_count() {
        let docs = vec![
            doc("a", "2025-01-03"),
            doc("b", "2025-01-02"),
            doc("c", "2025-01-01"),
        ];
        let catalog = Catalog::new(docs, Utc::now());

        let latest = catalog.latest(2);
        assert_eq!(latest.count, 2);
        assert_eq!(latest.documents.len(), 2);
        assert_eq!(latest.updated_at, catalog.updated_at);

        assert_eq!(catalog.latest(10).count, 3);
    }
}
