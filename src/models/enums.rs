use serde::{Deserialize, Serialize};

use crate::kb::KnowledgeError;

/// Entity categories produced by the extraction capability.
///
/// Wire labels match the NER model's tag set (`DRUG`, `SYMPTOM`, `DISEASE`);
/// labels outside this set are skipped during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "DRUG")]
    Drug,
    #[serde(rename = "SYMPTOM")]
    Symptom,
    #[serde(rename = "DISEASE")]
    Disease,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drug => "DRUG",
            Self::Symptom => "SYMPTOM",
            Self::Disease => "DISEASE",
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = KnowledgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRUG" => Ok(Self::Drug),
            "SYMPTOM" => Ok(Self::Symptom),
            "DISEASE" => Ok(Self::Disease),
            _ => Err(KnowledgeError::InvalidEnum {
                field: "EntityType".into(),
                value: s.into(),
            }),
        }
    }
}

/// Case-level severity labels from the adverse-event report data.
///
/// Ranking is a strict total order: Critical > Near-Critical >
/// Needs Attention > Unknown. It governs both the per-reaction severity
/// pick and case-level escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "Critical")]
    Critical,
    #[serde(rename = "Near-Critical")]
    NearCritical,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::NearCritical => "Near-Critical",
            Self::NeedsAttention => "Needs Attention",
            Self::Unknown => "Unknown",
        }
    }

    /// Numeric rank — higher is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 3,
            Self::NearCritical => 2,
            Self::NeedsAttention => 1,
            Self::Unknown => 0,
        }
    }

    /// The more severe of two labels (severity escalation).
    pub fn max(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = KnowledgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Critical" => Ok(Self::Critical),
            "Near-Critical" => Ok(Self::NearCritical),
            "Needs Attention" => Ok(Self::NeedsAttention),
            "Unknown" => Ok(Self::Unknown),
            _ => Err(KnowledgeError::InvalidEnum {
                field: "Severity".into(),
                value: s.into(),
            }),
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}
