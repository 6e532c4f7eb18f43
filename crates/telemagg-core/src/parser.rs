//! Delimited-text → [`Snapshot`] parser.
//!
//! The payload is a header row followed by data rows. One header column
//! (located by name) carries the entity identifier; every other column
//! becomes a metric of that entity. Validation is all-or-nothing: a single
//! malformed row rejects the whole payload so a partial snapshot can never
//! be published.
//!
//! Record splitting is done by the `csv` crate:
//! - `\n`, `\r\n` and bare `\r` all terminate a record; literal `\n` / `\r\n`
//!   escape sequences (as emitted by some upstreams that double-escape) are
//!   normalized first
//! - double-quoted fields, with `""` as an escaped quote
//! - blank lines are ignored; a leading UTF-8 BOM is dropped

use std::collections::BTreeMap;

use csv::StringRecord;
use tracing::debug;

use crate::config::{ParserConfig, delimiter_byte};
use crate::error::{ConfigError, ParseError, ParseResult};
use crate::types::{EntityMetrics, Snapshot};

/// Pure parser; holds only dialect settings and performs no I/O.
#[derive(Debug, Clone)]
pub struct SnapshotParser {
    delimiter: u8,
    id_columns: Vec<String>,
}

impl Default for SnapshotParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            id_columns: ParserConfig::default().id_columns,
        }
    }
}

impl SnapshotParser {
    /// Fails if the delimiter is not a usable single-byte ASCII character.
    pub fn new(config: &ParserConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            delimiter: delimiter_byte(config.delimiter)?,
            id_columns: config.id_columns.clone(),
        })
    }

    /// Parse and validate a full payload.
    ///
    /// Empty, whitespace-only and header-only payloads produce an empty
    /// snapshot. Duplicate identifiers resolve to the last row. Row numbers
    /// in errors count data rows from 1; the header is row 0.
    pub fn parse(&self, raw: &str) -> ParseResult<Snapshot> {
        let text = normalize(raw.trim_start_matches('\u{feff}'));
        if text.trim().is_empty() {
            return Ok(Snapshot::empty());
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut records = reader
            .records()
            .filter(|record| !matches!(record, Ok(r) if is_blank(r)));

        let header: Vec<String> = match records.next() {
            Some(record) => record
                .map_err(|e| malformed(0, &e))?
                .iter()
                .map(|h| h.trim().to_string())
                .collect(),
            None => return Ok(Snapshot::empty()),
        };

        let id_idx = self
            .id_columns
            .iter()
            .find_map(|candidate| header.iter().position(|h| h == candidate))
            .ok_or_else(|| ParseError::Schema {
                expected: self.id_columns.clone(),
            })?;

        let mut entities: BTreeMap<String, EntityMetrics> = BTreeMap::new();
        let mut rows = 0usize;

        for (idx, record) in records.enumerate() {
            let row = idx + 1;
            let record = record.map_err(|e| malformed(row, &e))?;

            if record.len() != header.len() {
                return Err(ParseError::RowShape {
                    row,
                    expected: header.len(),
                    found: record.len(),
                });
            }

            let id = record[id_idx].trim().to_string();
            let metrics: EntityMetrics = header
                .iter()
                .zip(record.iter())
                .enumerate()
                .filter(|(i, _)| *i != id_idx)
                .map(|(_, (name, value))| (name.clone(), value.to_string()))
                .collect();

            entities.insert(id, metrics);
            rows += 1;
        }

        debug!(rows, entities = entities.len(), "payload parsed");
        Ok(Snapshot::new(entities))
    }
}

/// Expand double-escaped line breaks into real ones.
fn normalize(raw: &str) -> String {
    raw.replace("\\r\\n", "\n")
        .replace("\\n", "\n")
        .replace("\\r", "")
}

/// A whitespace-only line reads as a single blank field.
fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record[0].trim().is_empty()
}

fn malformed(row: usize, err: &csv::Error) -> ParseError {
    ParseError::Malformed {
        row,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParseResult<Snapshot> {
        SnapshotParser::default().parse(raw)
    }

    #[test]
    fn parses_well_formed_payload() {
        let snapshot = parse("entity_id,bw,lat\nA,1.0,2.0\nB,3.0,4.0").unwrap();
        assert_eq!(
            serde_json::to_string(&snapshot).unwrap(),
            r#"{"A":{"bw":"1.0","lat":"2.0"},"B":{"bw":"3.0","lat":"4.0"}}"#
        );
    }

    #[test]
    fn accepts_switch_id_column() {
        let snapshot = parse("switch_id,metric_1,metric_2\nSW-01,10.5,UP\nSW-02,99.9,DOWN\n").unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.metric("SW-02", "metric_2").map(String::as_str), Some("DOWN"));
    }

    #[test]
    fn identifier_column_need_not_be_first() {
        let snapshot = parse("bw,entity_id\n1.0,A\n").unwrap();
        assert_eq!(snapshot.metric("A", "bw").map(String::as_str), Some("1.0"));
        assert!(snapshot.metric("A", "entity_id").is_none());
    }

    #[test]
    fn empty_and_whitespace_input_is_empty_snapshot() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("   \n\t\n").unwrap().is_empty());
    }

    #[test]
    fn header_only_is_empty_snapshot() {
        assert!(parse("switch_id,metric_1,metric_2").unwrap().is_empty());
        assert!(parse("switch_id,metric_1,metric_2\n").unwrap().is_empty());
    }

    #[test]
    fn missing_identifier_is_schema_error() {
        let err = parse("host,bw\nA,1\n").unwrap_err();
        assert!(matches!(err, ParseError::Schema { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Schema);
    }

    #[test]
    fn short_row_is_row_shape_error() {
        let err = parse("switch_id,metric_1,metric_2\nSW-01,10.5,UP\nSW-02,99.9").unwrap_err();
        assert_eq!(
            err,
            ParseError::RowShape {
                row: 2,
                expected: 3,
                found: 2
            }
        );
        assert_eq!(err.kind(), crate::ErrorKind::RowShape);
    }

    #[test]
    fn long_row_is_row_shape_error() {
        let err = parse("entity_id,bw\nA,1,extra\n").unwrap_err();
        assert!(matches!(err, ParseError::RowShape { row: 1, expected: 2, found: 3 }));
    }

    #[test]
    fn duplicate_identifier_last_row_wins() {
        let snapshot = parse("entity_id,bw\nA,1\nB,2\nA,3\n").unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.metric("A", "bw").map(String::as_str), Some("3"));
    }

    #[test]
    fn escaped_line_breaks_are_normalized() {
        let snapshot = parse("switch_id,metric_1\\nSW-01,10.5\\r\\nSW-02,99.9").unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.metric("SW-02", "metric_1").map(String::as_str), Some("99.9"));
    }

    #[test]
    fn crlf_and_blank_lines() {
        let snapshot = parse("entity_id,bw\r\n\r\nA,1\r\n\r\nB,2\r\n").unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.metric("A", "bw").map(String::as_str), Some("1"));
    }

    #[test]
    fn quoted_fields_keep_delimiters_and_quotes() {
        let snapshot = parse("entity_id,label\nA,\"rack 1, row \"\"b\"\"\"\n").unwrap();
        assert_eq!(
            snapshot.metric("A", "label").map(String::as_str),
            Some("rack 1, row \"b\"")
        );
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_payload() {
        // The open quote swallows the line break, so the field count of the
        // final row no longer matches the header.
        let err = parse("entity_id,label,bw\nA,ok,1\nB,\"open\n").unwrap_err();
        assert!(matches!(err, ParseError::RowShape { row: 2, expected: 3, found: 2 }));
    }

    #[test]
    fn bare_carriage_return_terminates_records() {
        let snapshot = parse("entity_id,bw\rA,1\rB,2\r").unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.metric("B", "bw").map(String::as_str), Some("2"));
    }

    #[test]
    fn mixed_line_endings() {
        let snapshot = parse("entity_id,bw\r\nA,1\rB,2\nC,3").unwrap();
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let snapshot = parse("\u{feff}entity_id,bw\nA,1").unwrap();
        assert_eq!(snapshot.metric("A", "bw").map(String::as_str), Some("1"));
    }

    #[test]
    fn identifier_value_is_trimmed_but_metrics_are_raw() {
        let snapshot = parse("entity_id,bw\n  A , 1.0 \n").unwrap();
        assert_eq!(snapshot.metric("A", "bw").map(String::as_str), Some(" 1.0 "));
    }

    #[test]
    fn custom_delimiter_and_id_column() {
        let parser = SnapshotParser::new(&ParserConfig {
            delimiter: ';',
            id_columns: vec!["host".to_string()],
        })
        .unwrap();
        let snapshot = parser.parse("host;cpu\nweb-1;0.5\n").unwrap();
        assert_eq!(snapshot.metric("web-1", "cpu").map(String::as_str), Some("0.5"));
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let err = SnapshotParser::new(&ParserConfig {
            delimiter: '→',
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
