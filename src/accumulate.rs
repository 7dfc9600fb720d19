//! Appending one timestamped snapshot to a capacity document.
//!
//! A document is a single JSON object mapping timestamps to snapshot values,
//! in insertion order. Prior entries are never rewritten.

use crate::{Accumulator, AccumulatorKind, CapacityError};
use serde_json::{Map, Value};

/// Splices the new entry into the existing text without parsing it.
///
/// A document that already holds the key `"<timestamp>":` is rejected with
/// `DuplicateTimestamp`, so two runs inside the same second keep keys unique.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextSplice;

impl Accumulator for TextSplice {
    fn append(
        &self,
        existing: &str,
        timestamp: &str,
        value: &str,
    ) -> Result<String, CapacityError> {
        let mut doc = String::with_capacity(existing.len() + timestamp.len() + value.len() + 8);
        if existing.is_empty() {
            doc.push('{');
        } else {
            let head = existing
                .strip_suffix('}')
                .ok_or_else(|| CapacityError::CorruptDocument(tail(existing)))?;
            if head.contains(&format!("\"{}\":", timestamp)) {
                return Err(CapacityError::DuplicateTimestamp(timestamp.to_string()));
            }
            doc.push_str(head);
            doc.push(',');
        }
        doc.push_str(&format!("\"{}\": {}", timestamp, value));
        doc.push('}');
        Ok(doc)
    }
}

/// Parses the existing document, inserts the entry and re-serializes.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredMerge;

impl Accumulator for StructuredMerge {
    fn append(
        &self,
        existing: &str,
        timestamp: &str,
        value: &str,
    ) -> Result<String, CapacityError> {
        let mut doc: Map<String, Value> = if existing.is_empty() {
            Map::new()
        } else {
            match serde_json::from_str(existing) {
                Ok(Value::Object(map)) => map,
                _ => return Err(CapacityError::CorruptDocument(tail(existing))),
            }
        };
        if doc.contains_key(timestamp) {
            return Err(CapacityError::DuplicateTimestamp(timestamp.to_string()));
        }
        let value: Value = serde_json::from_str(value)
            .map_err(|e| CapacityError::EvaluationFailed(e.to_string()))?;
        doc.insert(timestamp.to_string(), value);
        serde_json::to_string(&doc).map_err(|e| CapacityError::CorruptDocument(e.to_string()))
    }
}

impl Accumulator for AccumulatorKind {
    fn append(
        &self,
        existing: &str,
        timestamp: &str,
        value: &str,
    ) -> Result<String, CapacityError> {
        match self {
            AccumulatorKind::Text => TextSplice.append(existing, timestamp, value),
            AccumulatorKind::Structured => StructuredMerge.append(existing, timestamp, value),
        }
    }
}

// Last few characters, enough to see what the document ends with in a log line.
fn tail(existing: &str) -> String {
    let chars: Vec<char> = existing.chars().collect();
    let start = chars.len().saturating_sub(16);
    chars[start..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_entry_opens_document() {
        assert_eq!(
            TextSplice.append("", "t1", r#"{"a":1}"#).unwrap(),
            r#"{"t1": {"a":1}}"#
        );
    }

    #[test]
    fn later_entries_keep_prior_bytes() {
        let first = TextSplice.append("", "t1", "1").unwrap();
        let second = TextSplice.append(&first, "t2", "2").unwrap();
        assert_eq!(second, r#"{"t1": 1,"t2": 2}"#);
        assert!(second.starts_with(&first[..first.len() - 1]));
    }

    #[test]
    fn many_entries_parse_in_order() {
        let keys: Vec<String> = (0..25)
            .map(|i| format!("2026-10-17 {:02}:{:02}:00", i / 4, (i % 4) * 15))
            .collect();
        let mut doc = String::new();
        for (i, key) in keys.iter().enumerate() {
            doc = TextSplice
                .append(&doc, key, &format!(r#"{{"count":{}}}"#, i))
                .unwrap();
        }
        let parsed: Map<String, Value> = serde_json::from_str(&doc).unwrap();
        assert_eq!(parsed.len(), keys.len());
        assert_eq!(parsed.keys().cloned().collect::<Vec<_>>(), keys);
        assert_eq!(parsed[&keys[7]]["count"], 7);
    }

    #[test]
    fn corrupt_document_is_rejected() {
        for existing in ["not-ending-in-brace", r#"{"t1": 1"#, "[1]\n"] {
            assert!(matches!(
                TextSplice.append(existing, "t", "1"),
                Err(CapacityError::CorruptDocument(_))
            ));
            assert!(matches!(
                StructuredMerge.append(existing, "t", "1"),
                Err(CapacityError::CorruptDocument(_))
            ));
        }
    }

    #[test]
    fn structured_merge_matches_text_splice() {
        let mut text = String::new();
        let mut structured = String::new();
        for (t, v) in [("t1", r#"{"count":42}"#), ("t2", "[1,2]"), ("t3", "null")] {
            text = TextSplice.append(&text, t, v).unwrap();
            structured = StructuredMerge.append(&structured, t, v).unwrap();
        }
        let text: Value = serde_json::from_str(&text).unwrap();
        let structured: Value = serde_json::from_str(&structured).unwrap();
        assert_eq!(text, structured);
        assert_eq!(
            serde_json::to_string(&structured).unwrap(),
            r#"{"t1":{"count":42},"t2":[1,2],"t3":null}"#
        );
    }

    #[test]
    fn structured_merge_rejects_duplicates() {
        let doc = StructuredMerge.append("", "t1", "1").unwrap();
        assert!(matches!(
            StructuredMerge.append(&doc, "t1", "2"),
            Err(CapacityError::DuplicateTimestamp(t)) if t == "t1"
        ));
    }

    #[test]
    fn text_splice_rejects_duplicates() {
        let doc = TextSplice.append("", "2026-10-14 14:00:00", "1").unwrap();
        assert!(matches!(
            TextSplice.append(&doc, "2026-10-14 14:00:00", "2"),
            Err(CapacityError::DuplicateTimestamp(t)) if t == "2026-10-14 14:00:00"
        ));
        // Compactly written keys count too.
        assert!(matches!(
            TextSplice.append(r#"{"t1":1}"#, "t1", "2"),
            Err(CapacityError::DuplicateTimestamp(_))
        ));
        assert_eq!(
            TextSplice.append(&doc, "2026-10-14 14:00:01", "2").unwrap(),
            r#"{"2026-10-14 14:00:00": 1,"2026-10-14 14:00:01": 2}"#
        );
    }

    #[test]
    fn structured_merge_reads_spliced_documents() {
        let doc = TextSplice.append("", "t1", "1").unwrap();
        assert_eq!(
            StructuredMerge.append(&doc, "t2", "2").unwrap(),
            r#"{"t1":1,"t2":2}"#
        );
    }

    #[test]
    fn kind_dispatches() {
        assert_eq!(
            AccumulatorKind::Text.append("", "t", "1").unwrap(),
            r#"{"t": 1}"#
        );
        assert_eq!(
            AccumulatorKind::Structured.append("", "t", "1").unwrap(),
            r#"{"t":1}"#
        );
    }
}
