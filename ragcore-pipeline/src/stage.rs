//! The stage contract and its typed control-flow result (C5, spec §4.5).
//!
//! The source system controls stage flow with Python exceptions: a
//! retrieval or generation failure raises, is caught several layers up, and
//! turned into an error-shaped [`ragcore_types::SearchOutput`]. Per
//! REDESIGN FLAGS, stages here return a typed [`StageOutcome`] instead —
//! "did this stage need to stop the pipeline" is a value the executor
//! matches on, not a control-flow side channel.

use async_trait::async_trait;
use ragcore_types::{CoreError, SearchContext};

/// Which pipeline stage produced a [`StageOutcome`], used for stage-level
/// timing and log correlation (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    PipelineResolution,
    QueryEnhancement,
    Retrieval,
    Reranking,
    Reasoning,
    Generation,
}

impl StageName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PipelineResolution => "pipeline_resolution",
            Self::QueryEnhancement => "query_enhancement",
            Self::Retrieval => "retrieval",
            Self::Reranking => "reranking",
            Self::Reasoning => "reasoning",
            Self::Generation => "generation",
        }
    }
}

/// What happened when a stage ran.
#[derive(Debug)]
pub enum StageOutcome {
    /// The stage completed; the executor proceeds to the next stage.
    Ok,
    /// The stage hit a problem that does not prevent the rest of the
    /// pipeline from running (spec §7's non-fatal propagation policy) — for
    /// example the optional reasoning stage's provider being unavailable.
    /// The message is recorded on [`SearchContext::errors`] and execution
    /// continues.
    RecoverableError(String),
    /// The stage hit a problem that makes the rest of the pipeline
    /// meaningless to run (e.g. retrieval backend unreachable, a missing
    /// entity, access denial, a deadline elapsing). Carries the typed
    /// [`CoreError`] kind rather than a bare message, so the service
    /// boundary can map it to the right outward error (spec §7) instead of
    /// collapsing every abort into one kind. The executor stops
    /// immediately; the error's `Display` text is also recorded on
    /// [`SearchContext::errors`] before returning.
    FatalError(CoreError),
}

/// One step of the search pipeline.
///
/// Implementations receive the shared, mutable [`SearchContext`] and read
/// or write whichever fields are theirs to own; the executor — not this
/// trait — is responsible for running stages in the fixed order required
/// by spec §4.5 (reranking never runs before retrieval, generation never
/// runs before reranking).
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> StageName;

    async fn run(&self, ctx: &mut SearchContext) -> StageOutcome;
}
