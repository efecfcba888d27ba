//! Change-correlation adapter.
//!
//! Change records arrive pre-correlated (scores attached by the change
//! pipeline upstream); this adapter tiers them and elects the top
//! suspect. High tier is correlation `>= 0.8`, medium is `0.5..0.8`.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use triage_core::evidence::{
    BundleSummary, ChangeRecord, EvidenceBundle, EvidenceItem, EvidenceSource,
};
use triage_core::Result;

use crate::adapters::{AdapterContext, EvidenceAdapter};

/// Correlation tier boundaries.
const HIGH_CORRELATION: f64 = 0.8;
const MEDIUM_CORRELATION: f64 = 0.5;

/// Adapter over pre-correlated deployment changes.
#[derive(Debug, Default)]
pub struct ChangeAdapter {
    changes_by_incident: HashMap<String, Vec<ChangeRecord>>,
}

impl ChangeAdapter {
    pub fn new(changes_by_incident: HashMap<String, Vec<ChangeRecord>>) -> Self {
        Self { changes_by_incident }
    }
}

#[async_trait]
impl EvidenceAdapter for ChangeAdapter {
    fn name(&self) -> &str {
        "changes"
    }

    fn source(&self) -> EvidenceSource {
        EvidenceSource::Changes
    }

    async fn query(&self, context: &AdapterContext) -> Result<EvidenceBundle> {
        let incident_id = context.incident.id.as_str();
        let mut changes = self
            .changes_by_incident
            .get(incident_id)
            .cloned()
            .unwrap_or_default();
        changes.sort_by(|a, b| {
            b.correlation_score
                .partial_cmp(&a.correlation_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let high_ids: Vec<String> = changes
            .iter()
            .filter(|c| c.correlation_score >= HIGH_CORRELATION)
            .map(|c| c.change_id.clone())
            .collect();
        let medium_ids: Vec<String> = changes
            .iter()
            .filter(|c| {
                c.correlation_score >= MEDIUM_CORRELATION && c.correlation_score < HIGH_CORRELATION
            })
            .map(|c| c.change_id.clone())
            .collect();
        // Sorted descending, so the first high-tier record is the
        // strongest correlation.
        let top_suspect = changes
            .iter()
            .find(|c| c.correlation_score >= HIGH_CORRELATION)
            .cloned();

        debug!(
            incident_id,
            total = changes.len(),
            high = high_ids.len(),
            medium = medium_ids.len(),
            "Change evidence gathered"
        );

        Ok(EvidenceBundle {
            source: EvidenceSource::Changes,
            incident_id: incident_id.to_string(),
            items: changes.into_iter().map(EvidenceItem::Change).collect(),
            summary: BundleSummary::Changes {
                high_ids,
                medium_ids,
                top_suspect,
            },
        })
    }
}
