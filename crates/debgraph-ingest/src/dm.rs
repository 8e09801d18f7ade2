//! `dm.txt` ledger parser.
//!
//! ```text
//! Fingerprint: 0123456789ABCDEF0123456789ABCDEF01234567
//! Uid: Jane Doe <jane@example.org>
//! Allow: foo (FEDCBA9876543210FEDCBA9876543210FEDCBA98),
//!   bar (FEDCBA9876543210FEDCBA9876543210FEDCBA98)
//! ```
//!
//! Every `Fingerprint:` line starts a new record. `Allow:` lines and their
//! continuation lines carry `name (giver)` pairs, comma separated.

use crate::IngestError;
use debgraph_transform::RawRecord;
use serde_json::{json, Value};

#[derive(Debug, Default)]
struct Entry {
    fingerprint: String,
    uid: Option<String>,
    allow: Vec<Value>,
}

impl Entry {
    fn into_record(self) -> RawRecord {
        let mut record = RawRecord::new().with("fingerprint", self.fingerprint);
        if let Some(uid) = self.uid {
            record.insert("uid", uid);
        }
        if !self.allow.is_empty() {
            record.insert("allow", Value::Array(self.allow));
        }
        record
    }
}

/// Parse `name (giver), name (giver)` pairs from one allow line.
fn parse_allowances(text: &str, line_no: usize, out: &mut Vec<Value>) -> Result<(), IngestError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut i = 0;
    while i < tokens.len() {
        let name = tokens[i].trim_end_matches(',');
        let Some(giver) = tokens.get(i + 1) else {
            return Err(IngestError::malformed(
                line_no,
                format!("allowance `{name}` has no giver"),
            ));
        };
        let giver: String = giver
            .chars()
            .filter(|c| !matches!(c, '(' | ')' | ','))
            .collect();
        if name.is_empty() || giver.is_empty() {
            return Err(IngestError::malformed(line_no, "empty allowance"));
        }
        out.push(json!({"name": name, "giver": giver}));
        i += 2;
    }
    Ok(())
}

pub fn parse_dm_permissions(text: &str) -> Result<Vec<RawRecord>, IngestError> {
    let mut records = Vec::new();
    let mut current: Option<Entry> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(fingerprint) = line.strip_prefix("Fingerprint:") {
            if let Some(done) = current.take() {
                records.push(done.into_record());
            }
            let fingerprint = fingerprint.trim();
            if fingerprint.is_empty() {
                return Err(IngestError::malformed(line_no, "empty fingerprint"));
            }
            current = Some(Entry {
                fingerprint: fingerprint.to_string(),
                ..Entry::default()
            });
            continue;
        }

        let Some(entry) = current.as_mut() else {
            return Err(IngestError::malformed(
                line_no,
                "expected `Fingerprint:` before any other field",
            ));
        };

        if let Some(uid) = line.strip_prefix("Uid:") {
            entry.uid = Some(uid.trim().to_string());
        } else {
            let allowances = line.strip_prefix("Allow:").unwrap_or(line);
            parse_allowances(allowances, line_no, &mut entry.allow)?;
        }
    }

    if let Some(done) = current {
        records.push(done.into_record());
    }

    tracing::debug!(entries = records.len(), "parsed dm permission ledger");
    Ok(records)
}
