//! The enrichment-tool capability boundary (spec §4.4).

use async_trait::async_trait;
use serde_json::Value;

/// Arguments passed to a tool, built from the search output's top
/// documents/chunks (spec §4.4: limited to 5 of each, chunk text truncated
/// to 500 characters, mirroring
/// `SearchResultEnricher._invoke_enrichment_tool`).
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    pub query: String,
    pub answer: String,
    pub documents: Vec<Value>,
    pub chunks: Vec<Value>,
}

/// One tool's outcome.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl ToolOutcome {
    #[must_use]
    pub const fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// The enrichment backend: availability check, tool discovery, invocation.
///
/// Concrete tool transports (MCP or otherwise) are out of scope (spec
/// Non-goals); this trait is the seam a transport plugs into, mirroring
/// `ResilientMCPGatewayClient`'s three operations.
#[async_trait]
pub trait EnrichmentGateway: Send + Sync {
    async fn is_available(&self) -> bool;

    /// Names of tools the gateway currently has enabled. Used when
    /// [`crate::EnrichmentConfig::tools`] is empty.
    async fn available_tools(&self) -> Vec<String>;

    async fn invoke_tool(&self, tool_name: &str, arguments: &ToolArguments) -> ToolOutcome;
}
