//! Completeness scoring for historical ticket resolutions.
//!
//! Flags low-quality evidence: a similar incident whose ticket has no
//! usable description or resolution is a weak historical reference even
//! when its similarity score is high.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::evidence::HistoricalTicket;

/// Score thresholds for the quality levels.
const GOOD_THRESHOLD: f64 = 0.8;
const WARNING_THRESHOLD: f64 = 0.5;

/// Quality level of a ticket or a ticket set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Good,
    Warning,
    Poor,
}

impl QualityLevel {
    fn from_score(score: f64) -> Self {
        if score >= GOOD_THRESHOLD {
            QualityLevel::Good
        } else if score >= WARNING_THRESHOLD {
            QualityLevel::Warning
        } else {
            QualityLevel::Poor
        }
    }
}

/// Quality assessment of a single ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketQuality {
    /// Ticket this assessment is for.
    pub ticket_id: String,
    /// Score in `[0, 1]`, rounded to 2 decimals.
    pub score: f64,
    /// Level derived from the score.
    pub level: QualityLevel,
    /// Issues found (missing/short fields).
    pub issues: Vec<String>,
    /// Description component of the score.
    pub description_score: f64,
    /// Resolution component of the score.
    pub resolution_score: f64,
}

/// Aggregate quality assessment over a set of tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// Average score across all assessed tickets, rounded to 2 decimals.
    pub average_score: f64,
    /// Level derived from the average score.
    pub overall_level: QualityLevel,
    /// Per-ticket assessments.
    pub ticket_qualities: Vec<TicketQuality>,
    /// Number of tickets assessed.
    pub total_tickets: usize,
    /// Tickets at level good.
    pub good_count: usize,
    /// Tickets at level warning.
    pub warning_count: usize,
    /// Tickets at level poor.
    pub poor_count: usize,
}

impl QualityAssessment {
    /// The assessment of an empty ticket set.
    pub fn empty() -> Self {
        Self {
            average_score: 0.0,
            overall_level: QualityLevel::Poor,
            ticket_qualities: Vec::new(),
            total_tickets: 0,
            good_count: 0,
            warning_count: 0,
            poor_count: 0,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Score one free-text field: 0 when missing, 0.25 when under 20 chars,
/// 0.35 when under 50, 0.5 otherwise. Half of the ticket score each.
fn field_score(field: Option<&str>, name: &str, issues: &mut Vec<String>) -> f64 {
    let text = field.map(str::trim).unwrap_or("");
    // Tier boundaries count characters, not bytes.
    let length = text.chars().count();
    if text.is_empty() {
        issues.push(format!("Missing {name}"));
        0.0
    } else if length < 20 {
        issues.push(format!("{name} too short (less than 20 characters)"));
        0.25
    } else if length < 50 {
        0.35
    } else {
        0.5
    }
}

/// Assess the completeness of a single ticket.
pub fn assess_ticket(ticket: &HistoricalTicket) -> TicketQuality {
    let mut issues = Vec::new();

    let description_score = field_score(ticket.description.as_deref(), "description", &mut issues);
    let resolution_score = field_score(ticket.resolution.as_deref(), "resolution", &mut issues);
    let score = round2(description_score + resolution_score);

    debug!(
        ticket_id = %ticket.ticket_id,
        score,
        issues = issues.len(),
        "Ticket quality assessed"
    );

    TicketQuality {
        ticket_id: ticket.ticket_id.clone(),
        score,
        level: QualityLevel::from_score(score),
        issues,
        description_score,
        resolution_score,
    }
}

/// Assess a set of tickets, producing per-ticket scores, the average and
/// an overall level. Empty input yields `average_score = 0.0` at level
/// poor with `total_tickets = 0`.
pub fn assess_tickets(tickets: &[HistoricalTicket]) -> QualityAssessment {
    if tickets.is_empty() {
        return QualityAssessment::empty();
    }

    let mut ticket_qualities = Vec::with_capacity(tickets.len());
    let mut total_score = 0.0;
    let (mut good, mut warning, mut poor) = (0, 0, 0);

    for ticket in tickets {
        let quality = assess_ticket(ticket);
        total_score += quality.score;
        match quality.level {
            QualityLevel::Good => good += 1,
            QualityLevel::Warning => warning += 1,
            QualityLevel::Poor => poor += 1,
        }
        ticket_qualities.push(quality);
    }

    let average_score = round2(total_score / tickets.len() as f64);

    QualityAssessment {
        average_score,
        overall_level: QualityLevel::from_score(average_score),
        ticket_qualities,
        total_tickets: tickets.len(),
        good_count: good,
        warning_count: warning,
        poor_count: poor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::TicketType;
    use pretty_assertions::assert_eq;

    fn ticket(description: Option<&str>, resolution: Option<&str>) -> HistoricalTicket {
        HistoricalTicket {
            ticket_id: "TKT-001".to_string(),
            ticket_type: TicketType::SimilarIncident,
            description: description.map(str::to_string),
            resolution: resolution.map(str::to_string),
            similarity_score: Some(0.7),
            source_incident_id: None,
            source_incident_title: None,
            severity: None,
            status: None,
        }
    }

    const LONG: &str = "Connection pool exhausted after deploy; restarting the pool resolved it.";
    const MID: &str = "Restarted the connection pool";

    #[test]
    fn empty_set_is_poor_with_zero_average() {
        let assessment = assess_tickets(&[]);
        assert_eq!(assessment.average_score, 0.0);
        assert_eq!(assessment.overall_level, QualityLevel::Poor);
        assert_eq!(assessment.total_tickets, 0);
    }

    #[test]
    fn complete_ticket_is_good() {
        let quality = assess_ticket(&ticket(Some(LONG), Some(LONG)));
        assert_eq!(quality.score, 1.0);
        assert_eq!(quality.level, QualityLevel::Good);
        assert!(quality.issues.is_empty());
    }

    #[test]
    fn missing_fields_flag_issues() {
        let quality = assess_ticket(&ticket(None, None));
        assert_eq!(quality.score, 0.0);
        assert_eq!(quality.level, QualityLevel::Poor);
        assert_eq!(
            quality.issues,
            vec!["Missing description", "Missing resolution"]
        );
    }

    #[test]
    fn short_fields_score_partial_credit() {
        // Both fields under 20 chars: 0.25 + 0.25.
        let quality = assess_ticket(&ticket(Some("too short"), Some("also short")));
        assert_eq!(quality.score, 0.5);
        assert_eq!(quality.level, QualityLevel::Warning);
        assert_eq!(quality.issues.len(), 2);

        // Mid-length fields: 0.35 + 0.35.
        let quality = assess_ticket(&ticket(Some(MID), Some(MID)));
        assert_eq!(quality.score, 0.7);
        assert_eq!(quality.level, QualityLevel::Warning);
        assert!(quality.issues.is_empty());
    }

    #[test]
    fn tier_boundaries_count_characters_not_bytes() {
        // 19 two-byte characters: 38 bytes, still the under-20 tier.
        let short = "ß".repeat(19);
        let quality = assess_ticket(&ticket(Some(&short), Some(&short)));
        assert_eq!(quality.score, 0.5);
        assert_eq!(quality.issues.len(), 2);

        // 25 two-byte characters: 50 bytes, but the 20..50 character tier.
        let mid = "ß".repeat(25);
        let quality = assess_ticket(&ticket(Some(&mid), Some(&mid)));
        assert_eq!(quality.score, 0.7);
        assert!(quality.issues.is_empty());
    }

    #[test]
    fn aggregate_averages_and_counts_levels() {
        let tickets = vec![
            ticket(Some(LONG), Some(LONG)), // 1.0 good
            ticket(None, None),             // 0.0 poor
        ];
        let assessment = assess_tickets(&tickets);
        assert_eq!(assessment.average_score, 0.5);
        assert_eq!(assessment.overall_level, QualityLevel::Warning);
        assert_eq!(assessment.total_tickets, 2);
        assert_eq!(assessment.good_count, 1);
        assert_eq!(assessment.poor_count, 1);
        assert_eq!(assessment.warning_count, 0);
    }
}
