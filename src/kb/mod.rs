//! Drug-reaction knowledge base: load-once, read-only lookup data built
//! upstream from adverse-event report extracts.
//!
//! The base is loaded from a CSV table at startup and shared immutably for
//! the lifetime of the process. Malformed rows are skipped with a warning;
//! a missing or unreadable file is fatal and leaves the service reporting
//! "not ready" instead of operating on a partial base.

pub mod literal;
pub mod matcher;

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::Severity;

use literal::LiteralError;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("knowledge base file not found: {0}")]
    FileNotFound(std::path::PathBuf),

    #[error("knowledge base is empty after loading")]
    EmptyBase,

    #[error("invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("row {row}: {detail}")]
    MalformedRow { row: usize, detail: String },

    #[error("collection literal: {0}")]
    Literal(#[from] LiteralError),
}

/// One knowledge base entry: a canonical drug name, its known reaction
/// vocabulary, the severity labels observed for it, and the precomputed
/// worst-case severity. Read-only after load.
#[derive(Debug, Clone, PartialEq)]
pub struct DrugKnowledgeEntry {
    pub drug_name: String,
    pub reactions: BTreeSet<String>,
    pub severities: BTreeSet<String>,
    pub highest_severity: Severity,
}

/// Raw CSV row shape. Collection columns stay serialized here and go
/// through the strict literal parser before an entry is accepted.
#[derive(Debug, Deserialize)]
struct RawRow {
    drugname: String,
    reactions: String,
    severities: String,
    #[serde(rename = "highestSeverity")]
    highest_severity: String,
}

/// The loaded drug-reaction knowledge base.
///
/// Entries keep file order — the matcher's tie-break policy is defined
/// independently of it (lexicographically smallest candidate wins).
#[derive(Debug)]
pub struct KnowledgeBase {
    entries: Vec<DrugKnowledgeEntry>,
}

impl KnowledgeBase {
    /// Load the knowledge base from a CSV file.
    ///
    /// Rows that fail to parse (bad collection literal, unknown severity
    /// label, blank drug name) are logged and skipped; loading continues.
    /// An unreadable file or a base with zero valid entries is an error.
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        if !path.exists() {
            return Err(KnowledgeError::FileNotFound(path.to_path_buf()));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for (idx, row) in reader.deserialize::<RawRow>().enumerate() {
            // Row numbering is 1-based and excludes the header.
            let row_no = idx + 1;
            let raw = match row {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(row = row_no, error = %e, "Skipping unreadable knowledge base row");
                    skipped += 1;
                    continue;
                }
            };
            match parse_entry(raw, row_no) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(row = row_no, error = %e, "Skipping malformed knowledge base row");
                    skipped += 1;
                }
            }
        }

        if entries.is_empty() {
            return Err(KnowledgeError::EmptyBase);
        }

        info!(
            drugs = entries.len(),
            skipped,
            path = %path.display(),
            "Knowledge base loaded"
        );
        Ok(Self { entries })
    }

    /// Build a base directly from entries (tests, fixtures).
    pub fn from_entries(entries: Vec<DrugKnowledgeEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[DrugKnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its exact canonical drug name.
    pub fn entry(&self, drug_name: &str) -> Option<&DrugKnowledgeEntry> {
        self.entries.iter().find(|e| e.drug_name == drug_name)
    }
}

fn parse_entry(raw: RawRow, row: usize) -> Result<DrugKnowledgeEntry, KnowledgeError> {
    let drug_name = raw.drugname.trim().to_string();
    if drug_name.is_empty() {
        return Err(KnowledgeError::MalformedRow {
            row,
            detail: "blank drug name".into(),
        });
    }

    let reactions: BTreeSet<String> = literal::parse_string_collection(&raw.reactions)?
        .into_iter()
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .collect();

    let severities: BTreeSet<String> = literal::parse_string_collection(&raw.severities)?
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let highest_severity = Severity::from_str(raw.highest_severity.trim())?;

    Ok(DrugKnowledgeEntry {
        drug_name,
        reactions,
        severities,
        highest_severity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_kb(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const HEADER: &str = "drugname,reactions,severities,highestSeverity\n";

    #[test]
    fn loads_valid_rows() {
        let file = write_kb(&format!(
            "{HEADER}lisinopril,\"{{'cough', 'angioedema'}}\",\"{{'Near-Critical'}}\",Near-Critical\n\
             amlodipine,\"{{'oedema peripheral'}}\",\"{{'Needs Attention'}}\",Needs Attention\n"
        ));

        let kb = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(kb.len(), 2);

        let entry = kb.entry("lisinopril").unwrap();
        assert!(entry.reactions.contains("cough"));
        assert!(entry.reactions.contains("angioedema"));
        assert_eq!(entry.highest_severity, Severity::NearCritical);
    }

    #[test]
    fn skips_malformed_rows_and_keeps_loading() {
        let file = write_kb(&format!(
            "{HEADER}baddrug,not a literal,\"{{'Unknown'}}\",Unknown\n\
             lisinopril,\"{{'cough'}}\",\"{{'Critical'}}\",Critical\n\
             other,\"{{'rash'}}\",\"{{'Huge'}}\",Catastrophic\n"
        ));

        let kb = KnowledgeBase::load(file.path()).unwrap();
        assert_eq!(kb.len(), 1, "only the well-formed row survives");
        assert_eq!(kb.entries()[0].drug_name, "lisinopril");
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = KnowledgeBase::load(Path::new("/nonexistent/kb.csv")).unwrap_err();
        assert!(matches!(err, KnowledgeError::FileNotFound(_)));
    }

    #[test]
    fn all_rows_malformed_is_fatal() {
        let file = write_kb(&format!("{HEADER}bad,nope,nope,Whatever\n"));
        let err = KnowledgeBase::load(file.path()).unwrap_err();
        assert!(matches!(err, KnowledgeError::EmptyBase));
    }

    #[test]
    fn reactions_are_lowercased() {
        let file = write_kb(&format!(
            "{HEADER}warfarin,\"{{'Haemorrhage', 'EPISTAXIS'}}\",\"{{'Critical'}}\",Critical\n"
        ));
        let kb = KnowledgeBase::load(file.path()).unwrap();
        let entry = kb.entry("warfarin").unwrap();
        assert!(entry.reactions.contains("haemorrhage"));
        assert!(entry.reactions.contains("epistaxis"));
    }

    #[test]
    fn empty_reaction_set_spelling_is_accepted() {
        let file = write_kb(&format!("{HEADER}placebo,set(),set(),Unknown\n"));
        let kb = KnowledgeBase::load(file.path()).unwrap();
        assert!(kb.entry("placebo").unwrap().reactions.is_empty());
    }
}
