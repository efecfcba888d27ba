//! Incident similarity engine.
//!
//! Compares incidents on keyword overlap (title, description) and
//! affected-service overlap, producing a bounded score in `[0, 1]`.
//! Used by the ticket adapter to find historically resolved incidents
//! related to a new one.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use crate::incident::{Incident, IncidentStatus};

/// Component weights for the overall score.
const TITLE_WEIGHT: f64 = 0.4;
const DESCRIPTION_WEIGHT: f64 = 0.4;
const SERVICES_WEIGHT: f64 = 0.2;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Tokens ignored during keyword extraction.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
        "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "this", "but",
        "they", "have", "had", "what", "when", "where", "who", "which", "why", "how",
    ]
    .into_iter()
    .collect()
});

/// Normalize text for comparison: lowercase, strip non-alphanumeric
/// characters, collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_ALNUM.replace_all(&lowered, " ");
    MULTI_SPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Extract the keyword set of a text: normalized tokens with stopwords
/// and tokens of length <= 2 removed.
pub fn extract_keywords(text: &str) -> HashSet<String> {
    normalize_text(text)
        .split_whitespace()
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(*w))
        .map(|w| w.to_string())
        .collect()
}

fn jaccard<T: std::hash::Hash + Eq>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// Keyword-overlap similarity between two texts in `[0, 1]`.
///
/// Returns `0.0` when either text has no extractable keywords.
pub fn text_similarity(text1: &str, text2: &str) -> f64 {
    let k1 = extract_keywords(text1);
    let k2 = extract_keywords(text2);
    if k1.is_empty() || k2.is_empty() {
        return 0.0;
    }
    jaccard(&k1, &k2)
}

/// Jaccard similarity between two affected-service lists in `[0, 1]`.
///
/// Returns `0.0` when either list is empty.
pub fn service_similarity(services1: &[String], services2: &[String]) -> f64 {
    if services1.is_empty() || services2.is_empty() {
        return 0.0;
    }
    let s1: HashSet<&String> = services1.iter().collect();
    let s2: HashSet<&String> = services2.iter().collect();
    jaccard(&s1, &s2)
}

/// Overall similarity between two incidents.
///
/// Weighted sum of title (0.4), description (0.4) and affected-service
/// (0.2) similarities. Missing fields contribute 0 to their term.
/// Symmetric; `incident_similarity(a, a) == 1.0` whenever `a` has
/// extractable keywords and at least one affected service.
pub fn incident_similarity(a: &Incident, b: &Incident) -> f64 {
    let title_sim = text_similarity(&a.title, &b.title);
    let desc_sim = text_similarity(&a.description, &b.description);
    let service_sim = service_similarity(&a.affected_services, &b.affected_services);

    title_sim * TITLE_WEIGHT + desc_sim * DESCRIPTION_WEIGHT + service_sim * SERVICES_WEIGHT
}

/// Find resolved incidents similar to `target` among `candidates`.
///
/// Excludes the target itself (by id) and every candidate whose status is
/// not `resolved` - only proven resolutions are historical reference
/// material. Results with similarity `>= threshold` are sorted descending
/// by score (stable on ties) and truncated to `max_results`.
pub fn find_similar(
    target: &Incident,
    candidates: &[Incident],
    threshold: f64,
    max_results: usize,
) -> Vec<(Incident, f64)> {
    let mut matches: Vec<(Incident, f64)> = Vec::new();

    for candidate in candidates {
        if candidate.id == target.id {
            continue;
        }
        if candidate.status != IncidentStatus::Resolved {
            continue;
        }

        let score = incident_similarity(target, candidate);
        if score >= threshold {
            matches.push((candidate.clone(), score));
        }
    }

    matches.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    matches.truncate(max_results);

    debug!(
        target = %target.id,
        matches = matches.len(),
        threshold,
        "Similarity search complete"
    );
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::Severity;
    use chrono::Utc;

    fn incident(id: &str, title: &str, desc: &str, services: &[&str], status: IncidentStatus) -> Incident {
        Incident {
            id: id.to_string(),
            title: title.to_string(),
            description: desc.to_string(),
            severity: Severity::High,
            status,
            created_at: Utc::now(),
            updated_at: None,
            affected_services: services.iter().map(|s| s.to_string()).collect(),
            assignee: None,
        }
    }

    #[test]
    fn normalize_strips_and_collapses() {
        assert_eq!(normalize_text("  DB: conn-pool  FAILED!! "), "db conn pool failed");
    }

    #[test]
    fn keywords_drop_stopwords_and_short_tokens() {
        let kw = extract_keywords("The database is down at us-east");
        assert!(kw.contains("database"));
        assert!(kw.contains("down"));
        assert!(!kw.contains("the"));
        assert!(!kw.contains("is"));
        assert!(!kw.contains("at"));
    }

    #[test]
    fn self_similarity_is_one() {
        let a = incident(
            "INC001",
            "Database connection timeout",
            "Connections to the primary database time out after 30 seconds",
            &["auth-service", "user-service"],
            IncidentStatus::Open,
        );
        let score = incident_similarity(&a, &a);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        let a = incident(
            "INC001",
            "Database connection timeout",
            "Primary database unreachable",
            &["auth-service"],
            IncidentStatus::Open,
        );
        let b = incident(
            "INC002",
            "Payment gateway latency spike",
            "Checkout requests slow",
            &["payment-service"],
            IncidentStatus::Resolved,
        );
        let ab = incident_similarity(&a, &b);
        let ba = incident_similarity(&b, &a);
        assert_eq!(ab, ba);
        assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn disjoint_incidents_score_zero() {
        let a = incident("INC001", "Database timeout", "connection pool exhausted", &["db"], IncidentStatus::Open);
        let b = incident("INC002", "Frontend render glitch", "stylesheet missing", &["web"], IncidentStatus::Resolved);
        assert_eq!(incident_similarity(&a, &b), 0.0);
    }

    #[test]
    fn empty_text_contributes_zero_not_error() {
        let a = incident("INC001", "", "", &[], IncidentStatus::Open);
        let b = incident("INC002", "Database timeout", "pool exhausted", &["db"], IncidentStatus::Resolved);
        assert_eq!(incident_similarity(&a, &b), 0.0);
    }

    #[test]
    fn identical_title_and_services_scores_high() {
        // Title term: 0.4 * 1.0, service term: 0.2 * 1.0; descriptions disjoint.
        let a = incident(
            "INC001",
            "Database connection timeout",
            "new incident, nothing known yet",
            &["auth-service", "user-service"],
            IncidentStatus::Open,
        );
        let b = incident(
            "INC002",
            "Database connection timeout",
            "resolved by restarting the pool",
            &["auth-service", "user-service"],
            IncidentStatus::Resolved,
        );
        let score = incident_similarity(&a, &b);
        assert!(score >= 0.6 - 1e-9);
        assert!(score <= 1.0);
    }

    #[test]
    fn find_similar_excludes_self_and_unresolved() {
        let target = incident(
            "INC001",
            "Database connection timeout",
            "Primary database times out",
            &["auth-service"],
            IncidentStatus::Open,
        );
        let twin_unresolved = incident(
            "INC002",
            "Database connection timeout",
            "Primary database times out",
            &["auth-service"],
            IncidentStatus::Investigating,
        );
        let twin_resolved = incident(
            "INC003",
            "Database connection timeout",
            "Primary database times out",
            &["auth-service"],
            IncidentStatus::Resolved,
        );
        let candidates = vec![target.clone(), twin_unresolved, twin_resolved];

        let matches = find_similar(&target, &candidates, 0.2, 5);
        let ids: Vec<&str> = matches.iter().map(|(i, _)| i.id.as_str()).collect();
        assert_eq!(ids, vec!["INC003"]);
    }

    #[test]
    fn find_similar_honors_threshold_and_limit() {
        let target = incident(
            "INC001",
            "Database connection timeout",
            "Primary database times out",
            &["auth-service"],
            IncidentStatus::Open,
        );
        let mut candidates = Vec::new();
        for i in 0..10 {
            candidates.push(incident(
                &format!("INC{:03}", i + 100),
                "Database connection timeout",
                "Primary database times out",
                &["auth-service"],
                IncidentStatus::Resolved,
            ));
        }

        let matches = find_similar(&target, &candidates, 0.2, 3);
        assert_eq!(matches.len(), 3);

        let none = find_similar(&target, &candidates, 1.1, 3);
        assert!(none.is_empty());
    }
}
