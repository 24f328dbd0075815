//! Pipeline stages for turning report text into recommendations.
//!
//! Each submodule implements exactly one step and is independently testable
//! against a stub [`crate::llm::LanguageModel`] / [`crate::search::SearchProvider`].
//!
//! ## Data Flow
//!
//! ```text
//! report ──▶ analyze ──▶ search ──▶ recommend ──▶ text
//!  (PDF)     (LLM)       (LLM+web)   (LLM)
//! ```
//!
//! 1. [`analyze`]  : excerpt the report and ask for a summary of abnormal findings
//! 2. [`search`]   : derive a query from the analysis and fetch a few articles
//! 3. [`recommend`]: combine analysis and articles into recommendations
//!
//! The driver that sequences them lives in [`crate::advise`].

pub mod analyze;
pub mod recommend;
pub mod search;

use serde::{Deserialize, Serialize};
use std::fmt;

/// States of the linear pipeline.
///
/// `Extract → Analyze → Search → Recommend → Done`. Failure is terminal from
/// any state; there is no branching and no resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Analyze,
    Search,
    Recommend,
    Done,
}

impl Stage {
    /// The three model-driven stages, in execution order.
    pub const AGENT_STAGES: [Stage; 3] = [Stage::Analyze, Stage::Search, Stage::Recommend];

    /// The state that follows this one on success.
    pub fn next(self) -> Stage {
        match self {
            Stage::Extract => Stage::Analyze,
            Stage::Analyze => Stage::Search,
            Stage::Search => Stage::Recommend,
            Stage::Recommend | Stage::Done => Stage::Done,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Analyze => "analyze",
            Stage::Search => "search",
            Stage::Recommend => "recommend",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_linearly_to_done() {
        let mut s = Stage::Extract;
        let mut seen = vec![s];
        while s != Stage::Done {
            s = s.next();
            seen.push(s);
        }
        assert_eq!(
            seen,
            vec![
                Stage::Extract,
                Stage::Analyze,
                Stage::Search,
                Stage::Recommend,
                Stage::Done
            ]
        );
        assert_eq!(Stage::Done.next(), Stage::Done);
    }
}
