//! Feasibility verdict for a scenario, derived from its recorded constraints.
//!
//! Rules are checked in priority order and the first match wins:
//! a failing live check, inference without any live check, any live check,
//! then the default.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Constraint, EvidenceSource};

/// Substrings that mark a live-tested constraint as a failure (case-insensitive).
///
/// This is a plain substring match: "does NOT fail" still counts as a failure.
const FAILURE_MARKERS: [&str; 2] = ["fail", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Feasible")]
    Feasible,
    #[serde(rename = "Partially Feasible")]
    PartiallyFeasible,
    #[serde(rename = "Not Feasible")]
    NotFeasible,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Feasible => "Feasible",
            Verdict::PartiallyFeasible => "Partially Feasible",
            Verdict::NotFeasible => "Not Feasible",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint counts per evidence source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceCounts {
    pub from_docs: usize,
    pub from_live: usize,
    pub from_inference: usize,
}

impl EvidenceCounts {
    pub fn total(&self) -> usize {
        self.from_docs + self.from_live + self.from_inference
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerdictResult {
    pub verdict: Verdict,
    pub confidence: Confidence,
    pub evidence: EvidenceCounts,
    pub constraints: Vec<Constraint>,
}

/// Classify a scenario's full constraint set.
pub fn evaluate_verdict(constraints: &[Constraint]) -> VerdictResult {
    let live: Vec<&Constraint> = from_source(constraints, EvidenceSource::Live);
    let evidence = EvidenceCounts {
        from_docs: from_source(constraints, EvidenceSource::Docs).len(),
        from_live: live.len(),
        from_inference: from_source(constraints, EvidenceSource::Inference).len(),
    };

    let (verdict, confidence) = if live.iter().any(|c| reports_failure(&c.description)) {
        (Verdict::NotFeasible, Confidence::High)
    } else if evidence.from_inference > 0 && evidence.from_live == 0 {
        (Verdict::PartiallyFeasible, Confidence::Low)
    } else if evidence.from_live > 0 {
        (Verdict::Feasible, Confidence::High)
    } else {
        (Verdict::Feasible, Confidence::Medium)
    };

    VerdictResult {
        verdict,
        confidence,
        evidence,
        constraints: constraints.to_vec(),
    }
}

fn from_source(constraints: &[Constraint], source: EvidenceSource) -> Vec<&Constraint> {
    constraints.iter().filter(|c| c.source == source).collect()
}

fn reports_failure(description: &str) -> bool {
    let lowered = description.to_lowercase();
    FAILURE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
