//! Per-phone duration statistics
//!
//! The table maps a phone name to the mean and standard deviation of its
//! duration in seconds. It is built once per voice and shared read-only.
//!
//! The text resource format has one `name mean stddev` triple per line;
//! blank lines and lines starting with `#` are ignored.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DurationTableError {
    #[error("Failed to read phone duration table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed phone duration entry on line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Mean and standard deviation of one phone's duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhoneDuration {
    mean: f32,
    standard_deviation: f32,
}

impl PhoneDuration {
    pub fn new(mean: f32, standard_deviation: f32) -> Self {
        Self {
            mean,
            standard_deviation,
        }
    }

    pub fn mean(&self) -> f32 {
        self.mean
    }

    pub fn standard_deviation(&self) -> f32 {
        self.standard_deviation
    }
}

/// Lookup of duration statistics by phone name
#[derive(Debug, Clone, Default)]
pub struct PhoneDurationTable {
    entries: HashMap<String, PhoneDuration>,
}

impl PhoneDurationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, phone: impl Into<String>, mean: f32, standard_deviation: f32) -> Self {
        self.insert(phone, PhoneDuration::new(mean, standard_deviation));
        self
    }

    pub fn insert(&mut self, phone: impl Into<String>, duration: PhoneDuration) {
        self.entries.insert(phone.into(), duration);
    }

    pub fn get(&self, phone: &str) -> Option<PhoneDuration> {
        self.entries.get(phone).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the `name mean stddev` text format
    pub fn from_reader(reader: impl BufRead) -> Result<Self, DurationTableError> {
        let mut table = Self::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            let [name, mean, sd] = fields.as_slice() else {
                return Err(DurationTableError::Malformed {
                    line: line_number,
                    reason: format!("expected 3 fields, found {}", fields.len()),
                });
            };
            let parse = |field: &str| {
                field.parse::<f32>().map_err(|e| DurationTableError::Malformed {
                    line: line_number,
                    reason: format!("'{field}': {e}"),
                })
            };
            table.insert(*name, PhoneDuration::new(parse(*mean)?, parse(*sd)?));
        }

        tracing::debug!(entries = table.len(), "Loaded phone duration table");
        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self, DurationTableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let source = "# phone mean stddev\n\npau 0.2 0.1\naa  0.1   0.025\n";
        let table = PhoneDurationTable::from_reader(source.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("aa"), Some(PhoneDuration::new(0.1, 0.025)));
        assert_eq!(table.get("pau").unwrap().mean(), 0.2);
        assert!(table.get("zh").is_none());
    }

    #[test]
    fn test_malformed_lines_report_line_number() {
        let err = PhoneDurationTable::from_reader("aa 0.1 0.02\nbb 0.1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DurationTableError::Malformed { line: 2, .. }));

        let err = PhoneDurationTable::from_reader("aa fast 0.02\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'fast'"));
    }
}
