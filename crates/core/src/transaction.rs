//! Transaction record and builder
//!
//! A transaction is an immutable batch descriptor: which content was seen,
//! where it came from, and how many items each entry carried. The three
//! sequence fields are conceptually parallel, but equal length is a caller
//! contract - the relay moves records, it does not validate their content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Unique identifier for a transaction
pub type TransactionId = Uuid;

/// Full transaction details
///
/// Never mutated after construction; the dispatch pipeline hands it to the
/// sink and drops it, delivered or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Content identifiers (e.g. file hashes)
    pub content_hashes: Vec<String>,
    /// Origin domain per content entry
    pub origin_domains: Vec<String>,
    /// Item count per content entry
    pub item_counts: Vec<u64>,
    /// Free-form extra payload
    pub extra: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Start building a transaction
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::default()
    }

    /// Build a transaction from loosely structured JSON input.
    ///
    /// Recognized fields: `content_hashes` (array of strings),
    /// `origin_domains` (array of strings), `item_counts` (array of
    /// unsigned integers) and `extra` (string). Absent fields default to
    /// empty; unknown fields are ignored. Shape mismatches are rejected,
    /// never coerced.
    pub fn from_json(value: &Value) -> Result<Transaction> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::malformed("transaction", "expected a JSON object"))?;

        let mut builder = Transaction::builder();

        if let Some(hashes) = object.get("content_hashes") {
            builder = builder.with_content_hashes(string_seq("content_hashes", hashes)?);
        }
        if let Some(domains) = object.get("origin_domains") {
            builder = builder.with_origin_domains(string_seq("origin_domains", domains)?);
        }
        if let Some(counts) = object.get("item_counts") {
            builder = builder.with_item_counts(count_seq("item_counts", counts)?);
        }
        if let Some(extra) = object.get("extra") {
            let extra = extra
                .as_str()
                .ok_or_else(|| Error::malformed("extra", "expected a string"))?;
            builder = builder.with_extra(extra);
        }

        Ok(builder.build())
    }

    /// Number of content entries
    pub fn entry_count(&self) -> usize {
        self.content_hashes.len()
    }

    /// Sum of all item counts
    pub fn total_items(&self) -> u64 {
        self.item_counts.iter().sum()
    }
}

fn string_seq(field: &'static str, value: &Value) -> Result<Vec<String>> {
    let entries = value
        .as_array()
        .ok_or_else(|| Error::malformed(field, "expected an array of strings"))?;

    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::malformed(field, format!("non-string entry: {entry}")))
        })
        .collect()
}

fn count_seq(field: &'static str, value: &Value) -> Result<Vec<u64>> {
    let entries = value
        .as_array()
        .ok_or_else(|| Error::malformed(field, "expected an array of unsigned integers"))?;

    entries
        .iter()
        .map(|entry| {
            entry
                .as_u64()
                .ok_or_else(|| Error::malformed(field, format!("non-integer entry: {entry}")))
        })
        .collect()
}

/// Builder for [`Transaction`]
///
/// Every component is optional; absent components default to an empty
/// sequence or empty string so the record's shape is always complete.
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    content_hashes: Vec<String>,
    origin_domains: Vec<String>,
    item_counts: Vec<u64>,
    extra: String,
}

impl TransactionBuilder {
    pub fn with_content_hashes<I, S>(mut self, hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content_hashes = hashes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_origin_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origin_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_item_counts<I>(mut self, counts: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        self.item_counts = counts.into_iter().collect();
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Finalize the record, assigning an id and creation timestamp
    pub fn build(self) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            content_hashes: self.content_hashes,
            origin_domains: self.origin_domains,
            item_counts: self.item_counts,
            extra: self.extra,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults_to_empty_shape() {
        let tx = Transaction::builder().build();

        assert!(tx.content_hashes.is_empty());
        assert!(tx.origin_domains.is_empty());
        assert!(tx.item_counts.is_empty());
        assert_eq!(tx.extra, "");
    }

    #[test]
    fn test_builder_populates_all_fields() {
        let tx = Transaction::builder()
            .with_content_hashes(["QmUtQJK2YncnLcBL6W9d8xeJzSmThb2CU7mpbdiC4CpkcE"])
            .with_origin_domains(["example.org"])
            .with_item_counts([40])
            .with_extra("v2")
            .build();

        assert_eq!(tx.content_hashes.len(), 1);
        assert_eq!(tx.origin_domains, vec!["example.org"]);
        assert_eq!(tx.item_counts, vec![40]);
        assert_eq!(tx.extra, "v2");
        assert_eq!(tx.total_items(), 40);
    }

    #[test]
    fn test_unequal_sequence_lengths_are_not_rejected() {
        // Parallel lengths are a caller contract, not a core invariant
        let tx = Transaction::builder()
            .with_content_hashes(["a", "b", "c"])
            .with_item_counts([1])
            .build();

        assert_eq!(tx.entry_count(), 3);
        assert_eq!(tx.item_counts.len(), 1);
    }

    #[test]
    fn test_from_json_full_record() {
        let tx = Transaction::from_json(&json!({
            "content_hashes": ["h1", "h2"],
            "origin_domains": ["a.com", "b.com"],
            "item_counts": [10, 20],
            "extra": "payload",
        }))
        .unwrap();

        assert_eq!(tx.content_hashes, vec!["h1", "h2"]);
        assert_eq!(tx.origin_domains, vec!["a.com", "b.com"]);
        assert_eq!(tx.item_counts, vec![10, 20]);
        assert_eq!(tx.extra, "payload");
        assert_eq!(tx.total_items(), 30);
    }

    #[test]
    fn test_from_json_absent_fields_default() {
        let tx = Transaction::from_json(&json!({ "item_counts": [5] })).unwrap();

        assert!(tx.content_hashes.is_empty());
        assert!(tx.origin_domains.is_empty());
        assert_eq!(tx.item_counts, vec![5]);
        assert_eq!(tx.extra, "");
    }

    #[test]
    fn test_from_json_ignores_unknown_fields() {
        let tx = Transaction::from_json(&json!({
            "extra": "x",
            "gas_limit": 800_000,
        }))
        .unwrap();

        assert_eq!(tx.extra, "x");
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Transaction::from_json(&json!(["not", "an", "object"])).unwrap_err();

        let Error::MalformedTransaction { field, .. } = err;
        assert_eq!(field, "transaction");
    }

    #[test]
    fn test_from_json_rejects_non_array_hashes() {
        let err = Transaction::from_json(&json!({ "content_hashes": "h1" })).unwrap_err();

        let Error::MalformedTransaction { field, .. } = err;
        assert_eq!(field, "content_hashes");
    }

    #[test]
    fn test_from_json_rejects_non_string_domain_entry() {
        let err = Transaction::from_json(&json!({ "origin_domains": ["ok", 7] })).unwrap_err();

        let Error::MalformedTransaction { field, .. } = err;
        assert_eq!(field, "origin_domains");
    }

    #[test]
    fn test_from_json_rejects_negative_and_fractional_counts() {
        for bad in [json!({ "item_counts": [-1] }), json!({ "item_counts": [1.5] })] {
            let err = Transaction::from_json(&bad).unwrap_err();
            let Error::MalformedTransaction { field, .. } = err;
            assert_eq!(field, "item_counts");
        }
    }

    #[test]
    fn test_from_json_rejects_non_string_extra() {
        let err = Transaction::from_json(&json!({ "extra": 42 })).unwrap_err();

        let Error::MalformedTransaction { field, .. } = err;
        assert_eq!(field, "extra");
    }

    #[test]
    fn test_serde_round_trip() {
        let tx = Transaction::builder()
            .with_content_hashes(["h1"])
            .with_item_counts([3])
            .build();

        let encoded = serde_json::to_string(&tx).unwrap();
        let decoded: Transaction = serde_json::from_str(&encoded).unwrap();

        assert_eq!(tx, decoded);
    }
}
