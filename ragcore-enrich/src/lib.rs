//! Optional, non-blocking content enrichment of search results (C4, spec
//! §4.4), grounded on
//! `original_source/backend/rag_solution/services/search_result_enricher.py`.

mod config;
mod enricher;
mod gateway;

pub use config::EnrichmentConfig;
pub use enricher::Enricher;
pub use gateway::{EnrichmentGateway, ToolArguments, ToolOutcome};
