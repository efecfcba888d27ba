//! # Triage Core
//!
//! Shared foundation for the OpsTriage evidence aggregation system.
//!
//! This crate provides:
//! - Incident model and in-memory incident store
//! - Evidence item/bundle types shared by every data-source adapter
//! - The incident similarity engine
//! - The historical-ticket quality scorer
//! - Configuration loading with startup validation

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

pub mod config;
pub mod error;
pub mod evidence;
pub mod incident;
pub mod quality;
pub mod similarity;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        Config, ConnectorConfig, ConnectorType, KnowledgeBaseConfig, KnowledgeSourceKind,
        LlmProvider, LlmSettings,
    };
    pub use crate::evidence::{
        BundleSummary, ChangeRecord, EvidenceBundle, EvidenceItem, EvidenceSource,
        HistoricalTicket, KnowledgeDoc, LogEntry, MonitoringEvent, RemediationAction,
        TelemetrySeverity, TicketType,
    };
    pub use crate::incident::{Incident, IncidentStatus, IncidentStore, Severity};
    pub use crate::quality::{assess_tickets, QualityAssessment, QualityLevel};
    pub use crate::similarity::{find_similar, incident_similarity};
    pub use crate::{Error, Result};
}
