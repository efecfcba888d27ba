//! Resolution pipeline orchestrator.
//!
//! Runs the evidence adapters as an explicit, ordered sequence: tickets,
//! knowledge base, changes, logs, events, remediation. A failing adapter
//! is logged and replaced with an empty bundle; the pipeline itself does
//! not abort. The merged bundle map is cached raw (summaries are cheap,
//! gathering is not) and shared between `resolve` and the chat path.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use triage_cache::{EvidenceMap, ResultCache};
use triage_core::config::Config;
use triage_core::evidence::{
    BundleSummary, ChangeRecord, EvidenceBundle, EvidenceItem, EvidenceSource, HistoricalTicket,
    KnowledgeDoc, TicketType,
};
use triage_core::incident::{Incident, IncidentStore};
use triage_core::{Error, Result};
use triage_llm::{build_client, ChatMessage, CompletionClient, CompletionStream};

use crate::adapters::{
    AdapterContext, ChangeAdapter, EventAdapter, EvidenceAdapter, KnowledgeAdapter, LogAdapter,
    RemediationAdapter, TicketAdapter,
};
use crate::connectors::{build_connector, build_knowledge_connector};
use crate::data;

const NO_FINDINGS: &str = "No significant findings from available data sources.";
const SNIPPET_CHARS: usize = 200;

const SYSTEM_PROMPT: &str = "You are an incident-response assistant. Ground every \
answer in the evidence context you are given; say so when the evidence does not \
cover a question. Be concise and operational.";

/// Confidence contributions per evidence kind.
const SIMILAR_INCIDENT_BONUS: f64 = 0.3;
const KNOWLEDGE_BONUS: f64 = 0.2;
const HIGH_CHANGE_BONUS: f64 = 0.4;
const MEDIUM_CHANGE_BONUS: f64 = 0.2;
const BASELINE_BONUS: f64 = 0.1;

/// The final report for one resolution run.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub incident_id: String,
    /// Historical resolutions followed by suggested remediation actions.
    pub resolution_steps: Vec<String>,
    pub related_knowledge: Vec<KnowledgeDoc>,
    pub correlated_changes: Vec<ChangeRecord>,
    pub summary: String,
    /// Overall confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Pipeline counters since startup.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PipelineStats {
    pub resolutions: u64,
    pub cache_hits: u64,
    pub adapter_failures: u64,
    pub fallback_summaries: u64,
}

/// Coordinates adapters, cache and the LLM collaborator.
pub struct Orchestrator {
    store: Arc<IncidentStore>,
    adapters: Vec<Arc<dyn EvidenceAdapter>>,
    cache: Arc<ResultCache>,
    llm: Arc<dyn CompletionClient>,
    stats: RwLock<PipelineStats>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("adapters", &self.adapters.len())
            .field("llm", &self.llm.provider_name())
            .finish()
    }
}

impl Orchestrator {
    /// Assemble an orchestrator from explicit parts.
    pub fn new(
        store: Arc<IncidentStore>,
        adapters: Vec<Arc<dyn EvidenceAdapter>>,
        cache: Arc<ResultCache>,
        llm: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            store,
            adapters,
            cache,
            llm,
            stats: RwLock::new(PipelineStats::default()),
        }
    }

    /// Wire the full pipeline from configuration, backed by the bundled
    /// demo dataset for the in-memory sources.
    pub fn from_config(config: &Config, store: Arc<IncidentStore>) -> Result<Self> {
        let connector = build_connector(config, Arc::clone(&store))?;
        let knowledge = build_knowledge_connector(config)?;
        let llm = build_client(&config.llm).map_err(|e| Error::config(e.to_string()))?;
        let cache = Arc::new(ResultCache::new(Duration::from_secs(config.cache.ttl_secs)));

        let adapters: Vec<Arc<dyn EvidenceAdapter>> = vec![
            Arc::new(TicketAdapter::new(connector)),
            Arc::new(KnowledgeAdapter::new(knowledge)),
            Arc::new(ChangeAdapter::new(data::demo_changes())),
            Arc::new(LogAdapter::new(data::demo_logs())),
            Arc::new(EventAdapter::new(data::demo_events())),
            Arc::new(RemediationAdapter::new()),
        ];

        info!(
            adapters = adapters.len(),
            llm = llm.provider_name(),
            "Pipeline assembled"
        );
        Ok(Self::new(store, adapters, cache, llm))
    }

    /// The result cache, for exclusion management and reporting.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The incident store backing this pipeline.
    pub fn store(&self) -> &IncidentStore {
        &self.store
    }

    /// Snapshot of the pipeline counters.
    pub fn stats(&self) -> PipelineStats {
        *self.stats.read().unwrap()
    }

    /// Gather evidence through the cache; on a miss, run every adapter in
    /// order and cache the raw bundle map.
    async fn gather(&self, incident: &Incident, query: &str) -> EvidenceMap {
        if let Some(cached) = self.cache.get(&incident.id) {
            self.stats.write().unwrap().cache_hits += 1;
            return cached;
        }

        let context = AdapterContext {
            incident: incident.clone(),
            query: query.to_string(),
        };
        let mut bundles = EvidenceMap::new();
        for adapter in &self.adapters {
            let bundle = match adapter.query(&context).await {
                Ok(bundle) => bundle,
                Err(e) => {
                    warn!(
                        adapter = adapter.name(),
                        incident_id = %incident.id,
                        error = %e,
                        "Adapter failed, substituting empty bundle"
                    );
                    self.stats.write().unwrap().adapter_failures += 1;
                    EvidenceBundle::empty(adapter.source(), incident.id.as_str())
                }
            };
            bundles.insert(adapter.source(), bundle);
        }
        self.cache.set(&incident.id, bundles.clone());
        bundles
    }

    /// Run the full resolution pipeline for one incident.
    pub async fn resolve(&self, incident_id: &str, query: &str) -> Result<ResolutionReport> {
        let incident = self
            .store
            .get(incident_id)
            .ok_or_else(|| Error::not_found(incident_id))?;

        let bundles = self.gather(&incident, query).await;
        let confidence = confidence_score(&bundles);

        let messages = build_summary_messages(&incident, &bundles, query);
        let summary = match self.llm.complete(&messages).await {
            Ok(completion) => completion.content,
            Err(e) => {
                warn!(
                    incident_id,
                    provider = self.llm.provider_name(),
                    error = %e,
                    "Summary synthesis failed, using deterministic fallback"
                );
                self.stats.write().unwrap().fallback_summaries += 1;
                fallback_summary(&bundles)
            }
        };

        let resolution_steps = resolution_steps(&bundles);
        let related_knowledge = knowledge_docs(&bundles, usize::MAX);
        let correlated_changes = correlated_changes(&bundles);

        self.stats.write().unwrap().resolutions += 1;
        info!(incident_id, confidence, "Resolution pipeline complete");

        Ok(ResolutionReport {
            incident_id: incident_id.to_string(),
            resolution_steps,
            related_knowledge,
            correlated_changes,
            summary,
            confidence,
        })
    }

    /// Start a streamed chat turn about an incident.
    ///
    /// Evidence comes through the same cache as `resolve`; items the user
    /// excluded are filtered out of the context. Provider failures surface
    /// as a single error chunk; dropping the stream cancels the turn.
    pub async fn chat_stream(
        &self,
        incident_id: &str,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<CompletionStream> {
        let incident = self
            .store
            .get(incident_id)
            .ok_or_else(|| Error::not_found(incident_id))?;

        let bundles = self.gather(&incident, "").await;
        let excluded: HashSet<String> = self.cache.list_excluded(incident_id).into_iter().collect();
        let context = build_chat_context(&incident, &bundles, &excluded);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(format!("{SYSTEM_PROMPT}\n\n{context}")));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(message));

        match self.llm.stream(&messages).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                warn!(
                    incident_id,
                    provider = self.llm.provider_name(),
                    error = %e,
                    "Chat stream failed to start"
                );
                Ok(Box::pin(futures::stream::once(async move { Err(e) })))
            }
        }
    }
}

fn similar_tickets(bundles: &EvidenceMap) -> Vec<&HistoricalTicket> {
    bundles
        .get(&EvidenceSource::Tickets)
        .map(|bundle| {
            bundle
                .items
                .iter()
                .filter_map(|item| match item {
                    EvidenceItem::Ticket(t) if t.ticket_type == TicketType::SimilarIncident => {
                        Some(t)
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn knowledge_docs(bundles: &EvidenceMap, max: usize) -> Vec<KnowledgeDoc> {
    bundles
        .get(&EvidenceSource::KnowledgeBase)
        .map(|bundle| {
            bundle
                .items
                .iter()
                .filter_map(|item| match item {
                    EvidenceItem::Document(d) => Some(d.clone()),
                    _ => None,
                })
                .take(max)
                .collect()
        })
        .unwrap_or_default()
}

fn correlated_changes(bundles: &EvidenceMap) -> Vec<ChangeRecord> {
    bundles
        .get(&EvidenceSource::Changes)
        .map(|bundle| {
            bundle
                .items
                .iter()
                .filter_map(|item| match item {
                    EvidenceItem::Change(c) => Some(c.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn resolution_steps(bundles: &EvidenceMap) -> Vec<String> {
    let mut steps: Vec<String> = bundles
        .get(&EvidenceSource::Tickets)
        .map(|bundle| bundle.resolutions().to_vec())
        .unwrap_or_default();
    if let Some(bundle) = bundles.get(&EvidenceSource::Remediation) {
        steps.extend(bundle.items.iter().filter_map(|item| match item {
            EvidenceItem::Remediation(action) => Some(action.title.clone()),
            _ => None,
        }));
    }
    steps
}

fn high_and_medium_counts(bundles: &EvidenceMap) -> (usize, usize) {
    match bundles.get(&EvidenceSource::Changes).map(|b| &b.summary) {
        Some(BundleSummary::Changes {
            high_ids,
            medium_ids,
            ..
        }) => (high_ids.len(), medium_ids.len()),
        _ => (0, 0),
    }
}

/// Evidence-weighted confidence in `[0, 1]`.
fn confidence_score(bundles: &EvidenceMap) -> f64 {
    let mut score = 0.0;
    if !similar_tickets(bundles).is_empty() {
        score += SIMILAR_INCIDENT_BONUS;
    }
    if bundles
        .get(&EvidenceSource::KnowledgeBase)
        .is_some_and(|b| !b.is_empty())
    {
        score += KNOWLEDGE_BONUS;
    }
    let (high, medium) = high_and_medium_counts(bundles);
    if high > 0 {
        score += HIGH_CHANGE_BONUS;
    } else if medium > 0 {
        score += MEDIUM_CHANGE_BONUS;
    }
    (score + BASELINE_BONUS).min(1.0)
}

/// Deterministic summary used when the collaborator is unavailable.
///
/// Three findings at most, suspect first: likely cause from the top
/// suspect change, similar-incident count, knowledge-document count.
fn fallback_summary(bundles: &EvidenceMap) -> String {
    let mut findings = Vec::new();

    if let Some(suspect) = bundles
        .get(&EvidenceSource::Changes)
        .and_then(EvidenceBundle::top_suspect)
    {
        findings.push(format!(
            "Likely cause: {} (change {}, correlation {:.2})",
            suspect.description, suspect.change_id, suspect.correlation_score
        ));
    }
    let similar = similar_tickets(bundles).len();
    if similar > 0 {
        findings.push(format!("Found {similar} similar resolved incidents"));
    }
    let docs = bundles
        .get(&EvidenceSource::KnowledgeBase)
        .map(EvidenceBundle::len)
        .unwrap_or(0);
    if docs > 0 {
        findings.push(format!("{docs} knowledge base articles matched"));
    }

    if findings.is_empty() {
        NO_FINDINGS.to_string()
    } else {
        findings.join(". ")
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

/// Shared evidence context block rendered into LLM prompts.
fn render_evidence_context(
    incident: &Incident,
    similar: &[&HistoricalTicket],
    resolutions: &[String],
    docs: &[KnowledgeDoc],
    top_suspect: Option<&ChangeRecord>,
    high_count: usize,
) -> String {
    let mut out = format!(
        "Incident {}: {} (severity {}, status {})\nDescription: {}\n",
        incident.id, incident.title, incident.severity, incident.status, incident.description
    );

    if let Some(suspect) = top_suspect {
        out.push_str(&format!(
            "\nTop suspect change: {} (correlation {:.2}): {}\n",
            suspect.change_id,
            suspect.correlation_score,
            snippet(&suspect.description)
        ));
    }
    if high_count > 0 {
        out.push_str(&format!("High-correlation changes: {high_count}\n"));
    }

    if !similar.is_empty() {
        out.push_str("\nSimilar resolved incidents:\n");
        for ticket in similar.iter().take(3) {
            out.push_str(&format!(
                "- {} ({}, similarity {:.2})\n",
                ticket.source_incident_id.as_deref().unwrap_or("?"),
                ticket.source_incident_title.as_deref().unwrap_or("untitled"),
                ticket.similarity_score.unwrap_or(0.0)
            ));
        }
    }

    if !resolutions.is_empty() {
        out.push_str("\nPast resolutions:\n");
        for resolution in resolutions.iter().take(3) {
            out.push_str(&format!("- {}\n", snippet(resolution)));
        }
    }

    if !docs.is_empty() {
        out.push_str("\nKnowledge base:\n");
        for doc in docs.iter().take(3) {
            out.push_str(&format!("- {}: {}\n", doc.title, snippet(&doc.content)));
        }
    }

    out
}

/// Prompt for the one-shot resolution summary.
fn build_summary_messages(
    incident: &Incident,
    bundles: &EvidenceMap,
    query: &str,
) -> Vec<ChatMessage> {
    let similar = similar_tickets(bundles);
    let resolutions = bundles
        .get(&EvidenceSource::Tickets)
        .map(|b| b.resolutions().to_vec())
        .unwrap_or_default();
    let docs = knowledge_docs(bundles, 3);
    let (high_count, _) = high_and_medium_counts(bundles);
    let top_suspect = bundles
        .get(&EvidenceSource::Changes)
        .and_then(EvidenceBundle::top_suspect);

    let context =
        render_evidence_context(incident, &similar, &resolutions, &docs, top_suspect, high_count);
    let request = if query.trim().is_empty() {
        "Summarize the most likely cause and the recommended next steps.".to_string()
    } else {
        format!("Operator question: {query}\nAnswer using the evidence above.")
    };

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("{context}\n{request}")),
    ]
}

/// Chat context from cached evidence, with excluded items filtered out.
fn build_chat_context(
    incident: &Incident,
    bundles: &EvidenceMap,
    excluded: &HashSet<String>,
) -> String {
    let keep = |source: EvidenceSource, item: &EvidenceItem| -> bool {
        !excluded.contains(&item.composite_id(source))
    };

    let similar: Vec<&HistoricalTicket> = bundles
        .get(&EvidenceSource::Tickets)
        .map(|bundle| {
            bundle
                .items
                .iter()
                .filter(|item| keep(EvidenceSource::Tickets, item))
                .filter_map(|item| match item {
                    EvidenceItem::Ticket(t) if t.ticket_type == TicketType::SimilarIncident => {
                        Some(t)
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let resolutions: Vec<String> = similar
        .iter()
        .filter_map(|t| t.resolution.clone())
        .filter(|r| !r.trim().is_empty())
        .collect();

    let docs: Vec<KnowledgeDoc> = bundles
        .get(&EvidenceSource::KnowledgeBase)
        .map(|bundle| {
            bundle
                .items
                .iter()
                .filter(|item| keep(EvidenceSource::KnowledgeBase, item))
                .filter_map(|item| match item {
                    EvidenceItem::Document(d) => Some(d.clone()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let (high_count, _) = high_and_medium_counts(bundles);
    let top_suspect = bundles
        .get(&EvidenceSource::Changes)
        .and_then(EvidenceBundle::top_suspect)
        .filter(|suspect| {
            !excluded.contains(&format!(
                "{}:{}",
                EvidenceSource::Changes.label(),
                suspect.change_id
            ))
        });

    render_evidence_context(incident, &similar, &resolutions, &docs, top_suspect, high_count)
}
