//! Evidence-source adapters.
//!
//! Each adapter turns one data source into an [`EvidenceBundle`] for an
//! incident. Adapters never decide policy: a source with nothing to say
//! returns an empty bundle, and the orchestrator substitutes an empty
//! bundle when an adapter fails outright.

use async_trait::async_trait;

use triage_core::evidence::{EvidenceBundle, EvidenceSource};
use triage_core::incident::Incident;
use triage_core::Result;

mod changes;
mod events;
mod knowledge;
mod logs;
mod remediation;
mod scoring;
mod tickets;

pub use changes::ChangeAdapter;
pub use events::EventAdapter;
pub use knowledge::KnowledgeAdapter;
pub use logs::LogAdapter;
pub use remediation::RemediationAdapter;
pub use scoring::{score_telemetry, TelemetryScoring};
pub use tickets::TicketAdapter;

/// What an adapter gets to look at when querying its source.
#[derive(Debug, Clone)]
pub struct AdapterContext {
    /// The incident under triage.
    pub incident: Incident,
    /// Free-text user query, possibly empty.
    pub query: String,
}

/// A queryable evidence source.
#[async_trait]
pub trait EvidenceAdapter: Send + Sync {
    /// Stable adapter name for logging.
    fn name(&self) -> &str;

    /// The source this adapter serves.
    fn source(&self) -> EvidenceSource;

    /// Gather evidence for the incident.
    async fn query(&self, context: &AdapterContext) -> Result<EvidenceBundle>;
}
