//! Pipeline-resolution stage (spec §4.5 stage 1), grounded on
//! `original_source/backend/rag_solution/services/pipeline_service.py::_validate_configuration`
//! and `::_validate_collection_access`.

use async_trait::async_trait;
use ragcore_types::{Collection, CoreError, PipelineConfig, SearchContext};

use crate::stage::{Stage, StageName, StageOutcome};

/// A resolved pipeline configuration plus the collection it targets.
#[derive(Debug, Clone)]
pub struct ResolvedPipeline {
    pub pipeline: PipelineConfig,
    pub collection: Collection,
}

/// Looks up a pipeline configuration (falling back to the caller's default
/// pipeline when none is named) and the collection it targets. A
/// persistence backend is out of scope (spec Non-goals); this trait is the
/// seam one plugs into.
#[async_trait]
pub trait PipelineResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if no matching pipeline, collection,
    /// or required template exists; [`CoreError::Configuration`] if a
    /// required default is absent (spec §4.5 stage 1).
    async fn resolve(
        &self,
        pipeline_id: Option<&str>,
        collection_id: &str,
        user_id: &str,
    ) -> Result<ResolvedPipeline, CoreError>;
}

/// The first pipeline stage: resolves the effective [`PipelineConfig`] and
/// [`Collection`], enforcing collection-level access control before any
/// retrieval work begins.
pub struct PipelineResolutionStage<R: PipelineResolver> {
    resolver: R,
}

impl<R: PipelineResolver> PipelineResolutionStage<R> {
    pub const fn new(resolver: R) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl<R: PipelineResolver> Stage for PipelineResolutionStage<R> {
    fn name(&self) -> StageName {
        StageName::PipelineResolution
    }

    async fn run(&self, ctx: &mut SearchContext) -> StageOutcome {
        let resolved = match self
            .resolver
            .resolve(
                ctx.input.pipeline_id.as_deref(),
                &ctx.resolved_collection_id,
                &ctx.resolved_user_id,
            )
            .await
        {
            Ok(resolved) => resolved,
            Err(err) => return StageOutcome::FatalError(err),
        };

        if !resolved.collection.is_accessible_to(&ctx.resolved_user_id) {
            // Access denial is expressed as NotFound, never a distinct
            // "forbidden" kind, so a caller cannot tell "doesn't exist"
            // apart from "exists but you can't see it" (spec §7, §8
            // scenario 2).
            return StageOutcome::FatalError(CoreError::not_found("collection"));
        }

        ctx.resolved_pipeline_id = Some(resolved.pipeline.id.clone());
        ctx.resolved_collection_id = resolved.collection.id.clone();
        ctx.vector_collection_name = Some(resolved.collection.vector_db_name.clone());
        StageOutcome::Ok
    }
}
