pub mod entity;
pub mod enums;

pub use entity::{
    AdverseEventRecord, AnalysisReport, AnalysisSummary, EntitySpan, MatchResult, MatchedSymptom,
};
pub use enums::{EntityType, Severity};
