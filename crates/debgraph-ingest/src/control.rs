//! dpkg `available` parser.
//!
//! Stanzas are separated by blank lines. Each `Field: value` line opens a
//! field; lines starting with whitespace continue it. Field names are
//! lower-cased, and the relationship fields in [`LIST_FIELDS`] become lists.

use crate::IngestError;
use debgraph_transform::RawRecord;
use serde_json::Value;

/// Comma-separated fields stored as ordered lists.
pub const LIST_FIELDS: &[&str] = &[
    "depends",
    "replaces",
    "breaks",
    "tag",
    "conflicts",
    "suggests",
    "recommends",
];

#[derive(Debug, Default)]
struct Stanza {
    fields: Vec<(String, String)>,
}

impl Stanza {
    fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn into_record(self) -> RawRecord {
        let mut record = RawRecord::new();
        for (name, value) in self.fields {
            if LIST_FIELDS.contains(&name.as_str()) {
                let items: Vec<Value> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect();
                record.insert(name, Value::Array(items));
            } else {
                record.insert(name, value);
            }
        }
        record
    }
}

pub fn parse_available(text: &str) -> Result<Vec<RawRecord>, IngestError> {
    let mut records = Vec::new();
    let mut stanza = Stanza::default();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if line.trim().is_empty() {
            if !stanza.is_empty() {
                records.push(std::mem::take(&mut stanza).into_record());
            }
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            let Some((_, value)) = stanza.fields.last_mut() else {
                return Err(IngestError::malformed(
                    line_no,
                    "continuation line outside of a field",
                ));
            };
            let folded = &line[1..];
            value.push('\n');
            // a lone "." stands for an empty line in long descriptions
            if folded.trim() != "." {
                value.push_str(folded);
            }
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(IngestError::malformed(
                line_no,
                format!("expected `Field: value`, got `{line}`"),
            ));
        };
        stanza
            .fields
            .push((name.trim().to_lowercase(), value.trim().to_string()));
    }

    if !stanza.is_empty() {
        records.push(stanza.into_record());
    }

    tracing::debug!(packages = records.len(), "parsed available database");
    Ok(records)
}
