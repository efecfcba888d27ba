//! Incident-management backend connectors.
//!
//! A connector answers three questions about an incident: which resolved
//! incidents looked like it, which change tickets are attached to it, and
//! what resolution texts its look-alikes carried. The mock backend is
//! fully functional and drives similarity search over the in-memory
//! store; the ServiceNow and Jira backends validate their credentials at
//! construction but return no data.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use triage_core::config::{Config, ConnectorType, JiraCredentials, ServiceNowCredentials};
use triage_core::evidence::{HistoricalTicket, TicketType};
use triage_core::incident::IncidentStore;
use triage_core::similarity::find_similar;
use triage_core::{Error, Result};

pub mod knowledge;

pub use knowledge::{
    build_knowledge_connector, KnowledgeConnector, MockKnowledgeBase, WikiConnector,
};

/// Read access to an incident-management backend.
#[async_trait]
pub trait IncidentConnector: Send + Sync {
    /// Stable backend name for logging.
    fn connector_name(&self) -> &str;

    /// Tickets for resolved incidents similar to the given one.
    ///
    /// Unknown incidents yield an empty list, not an error.
    async fn get_similar_incidents(&self, incident_id: &str) -> Result<Vec<HistoricalTicket>>;

    /// Change tickets attached directly to the given incident.
    async fn get_related_changes(&self, incident_id: &str) -> Result<Vec<HistoricalTicket>>;

    /// Resolution texts from the incident's similar resolved incidents.
    async fn get_resolutions(&self, incident_id: &str) -> Result<Vec<String>>;
}

/// In-memory connector backed by the incident store.
///
/// Similar-incident retrieval is dynamic: every call runs the similarity
/// engine over the current store contents, so newly resolved incidents
/// become historical reference material immediately.
#[derive(Debug)]
pub struct MockConnector {
    store: Arc<IncidentStore>,
    threshold: f64,
    max_results: usize,
    /// incident id -> resolution text for resolved incidents
    resolutions: HashMap<String, String>,
    /// target incident id -> change tickets attached to it
    related_changes: HashMap<String, Vec<HistoricalTicket>>,
}

impl MockConnector {
    pub fn new(store: Arc<IncidentStore>, threshold: f64, max_results: usize) -> Self {
        Self {
            store,
            threshold,
            max_results,
            resolutions: HashMap::new(),
            related_changes: HashMap::new(),
        }
    }

    /// Attach resolution texts, keyed by resolved incident id.
    pub fn with_resolutions(mut self, resolutions: HashMap<String, String>) -> Self {
        self.resolutions = resolutions;
        self
    }

    /// Attach change tickets, keyed by target incident id.
    pub fn with_related_changes(
        mut self,
        related_changes: HashMap<String, Vec<HistoricalTicket>>,
    ) -> Self {
        self.related_changes = related_changes;
        self
    }

    fn similar_tickets(&self, incident_id: &str) -> Vec<HistoricalTicket> {
        let Some(target) = self.store.get(incident_id) else {
            debug!(incident_id, "Unknown incident, no similar tickets");
            return Vec::new();
        };
        let candidates = self.store.list();
        find_similar(&target, &candidates, self.threshold, self.max_results)
            .into_iter()
            .map(|(incident, score)| HistoricalTicket {
                ticket_id: format!("TKT-{}", incident.id),
                ticket_type: TicketType::SimilarIncident,
                description: Some(incident.description.clone()),
                resolution: self.resolutions.get(&incident.id).cloned(),
                similarity_score: Some(score),
                source_incident_id: Some(incident.id.clone()),
                source_incident_title: Some(incident.title.clone()),
                severity: Some(incident.severity),
                status: Some(incident.status),
            })
            .collect()
    }
}

#[async_trait]
impl IncidentConnector for MockConnector {
    fn connector_name(&self) -> &str {
        "mock"
    }

    async fn get_similar_incidents(&self, incident_id: &str) -> Result<Vec<HistoricalTicket>> {
        Ok(self.similar_tickets(incident_id))
    }

    async fn get_related_changes(&self, incident_id: &str) -> Result<Vec<HistoricalTicket>> {
        Ok(self
            .related_changes
            .get(incident_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_resolutions(&self, incident_id: &str) -> Result<Vec<String>> {
        Ok(self
            .similar_tickets(incident_id)
            .into_iter()
            .filter_map(|t| t.resolution)
            .filter(|r| !r.trim().is_empty())
            .collect())
    }
}

/// ServiceNow backend stub.
///
/// Construction requires complete credentials; queries return no data.
#[derive(Debug)]
pub struct ServiceNowConnector {
    credentials: ServiceNowCredentials,
}

impl ServiceNowConnector {
    pub fn new(credentials: ServiceNowCredentials) -> Result<Self> {
        if credentials.instance_url.is_empty()
            || credentials.username.is_empty()
            || credentials.api_token.is_empty()
        {
            return Err(Error::config("incomplete servicenow credentials"));
        }
        info!(instance = %credentials.instance_url, "ServiceNow connector configured");
        Ok(Self { credentials })
    }

    /// Instance this connector points at.
    pub fn instance_url(&self) -> &str {
        &self.credentials.instance_url
    }
}

#[async_trait]
impl IncidentConnector for ServiceNowConnector {
    fn connector_name(&self) -> &str {
        "servicenow"
    }

    async fn get_similar_incidents(&self, incident_id: &str) -> Result<Vec<HistoricalTicket>> {
        warn!(incident_id, "ServiceNow retrieval not implemented, returning no tickets");
        Ok(Vec::new())
    }

    async fn get_related_changes(&self, _incident_id: &str) -> Result<Vec<HistoricalTicket>> {
        Ok(Vec::new())
    }

    async fn get_resolutions(&self, _incident_id: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Jira Service Management backend stub.
#[derive(Debug)]
pub struct JiraConnector {
    credentials: JiraCredentials,
}

impl JiraConnector {
    pub fn new(credentials: JiraCredentials) -> Result<Self> {
        if credentials.base_url.is_empty()
            || credentials.email.is_empty()
            || credentials.api_token.is_empty()
        {
            return Err(Error::config("incomplete jira credentials"));
        }
        info!(base_url = %credentials.base_url, "Jira connector configured");
        Ok(Self { credentials })
    }

    /// Site this connector points at.
    pub fn base_url(&self) -> &str {
        &self.credentials.base_url
    }
}

#[async_trait]
impl IncidentConnector for JiraConnector {
    fn connector_name(&self) -> &str {
        "jira"
    }

    async fn get_similar_incidents(&self, incident_id: &str) -> Result<Vec<HistoricalTicket>> {
        warn!(incident_id, "Jira retrieval not implemented, returning no tickets");
        Ok(Vec::new())
    }

    async fn get_related_changes(&self, _incident_id: &str) -> Result<Vec<HistoricalTicket>> {
        Ok(Vec::new())
    }

    async fn get_resolutions(&self, _incident_id: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Build the connector selected by the configuration.
///
/// The mock backend is seeded with the bundled demo resolution and
/// change-ticket tables.
pub fn build_connector(
    config: &Config,
    store: Arc<IncidentStore>,
) -> Result<Arc<dyn IncidentConnector>> {
    match config.connector.connector_type {
        ConnectorType::Mock => Ok(Arc::new(
            MockConnector::new(
                store,
                config.similarity.threshold,
                config.similarity.max_results,
            )
            .with_resolutions(crate::data::demo_resolutions())
            .with_related_changes(crate::data::demo_related_changes()),
        )),
        ConnectorType::ServiceNow => {
            let credentials = config
                .connector
                .servicenow
                .clone()
                .ok_or_else(|| Error::config("servicenow connector selected without credentials"))?;
            Ok(Arc::new(ServiceNowConnector::new(credentials)?))
        }
        ConnectorType::Jira => {
            let credentials = config
                .connector
                .jira
                .clone()
                .ok_or_else(|| Error::config("jira connector selected without credentials"))?;
            Ok(Arc::new(JiraConnector::new(credentials)?))
        }
    }
}
