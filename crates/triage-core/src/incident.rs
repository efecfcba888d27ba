//! Incident model and in-memory incident store.
//!
//! Incidents are created externally (seed/import) and never deleted during
//! a run. The only mutation is a status update, which also stamps
//! `updated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;
use tracing::{debug, info};

use crate::{Error, Result};

/// Incident severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(Error::invalid_value(
                "severity",
                format!("unknown severity '{other}'"),
            )),
        }
    }
}

/// Incident lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Resolved,
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IncidentStatus::Open => "open",
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Resolved => "resolved",
        };
        f.write_str(s)
    }
}

impl FromStr for IncidentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(IncidentStatus::Open),
            "investigating" => Ok(IncidentStatus::Investigating),
            "resolved" => Ok(IncidentStatus::Resolved),
            other => Err(Error::invalid_value(
                "status",
                format!("unknown status '{other}'"),
            )),
        }
    }
}

/// A production incident record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    /// Stable incident identifier (e.g. "INC001").
    pub id: String,
    /// Short summary line.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Severity at time of creation.
    pub severity: Severity,
    /// Current lifecycle status.
    pub status: IncidentStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Stamped on every status update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Names of the services impacted by this incident.
    #[serde(default)]
    pub affected_services: Vec<String>,
    /// Current assignee, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

/// In-memory incident store.
///
/// Thread-safe; incidents are seeded at startup and mutated only via
/// [`IncidentStore::update_status`].
#[derive(Debug, Default)]
pub struct IncidentStore {
    incidents: RwLock<HashMap<String, Incident>>,
}

impl IncidentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given incidents.
    pub fn with_incidents(incidents: Vec<Incident>) -> Self {
        let map = incidents
            .into_iter()
            .map(|inc| (inc.id.clone(), inc))
            .collect::<HashMap<_, _>>();
        info!(count = map.len(), "Incident store seeded");
        Self {
            incidents: RwLock::new(map),
        }
    }

    /// Insert or replace an incident.
    pub fn insert(&self, incident: Incident) {
        let mut incidents = self.incidents.write().unwrap();
        incidents.insert(incident.id.clone(), incident);
    }

    /// Look up an incident by id.
    pub fn get(&self, id: &str) -> Option<Incident> {
        self.incidents.read().unwrap().get(id).cloned()
    }

    /// Whether the incident exists.
    pub fn contains(&self, id: &str) -> bool {
        self.incidents.read().unwrap().contains_key(id)
    }

    /// All incidents, ordered by id for stable output.
    pub fn list(&self) -> Vec<Incident> {
        let mut all: Vec<Incident> = self.incidents.read().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Number of stored incidents.
    pub fn len(&self) -> usize {
        self.incidents.read().unwrap().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.incidents.read().unwrap().is_empty()
    }

    /// Update the status of an incident, stamping `updated_at`.
    ///
    /// Returns the updated incident, or [`Error::NotFound`] for unknown ids.
    pub fn update_status(&self, id: &str, status: IncidentStatus) -> Result<Incident> {
        let mut incidents = self.incidents.write().unwrap();
        let incident = incidents.get_mut(id).ok_or_else(|| Error::not_found(id))?;
        incident.status = status;
        incident.updated_at = Some(Utc::now());
        debug!(incident_id = %id, status = %status, "Incident status updated");
        Ok(incident.clone())
    }
}
