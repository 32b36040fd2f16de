//! Prompt construction for Arlo, the relationship assistant.

use std::fmt::Write as _;

use chrono::{DateTime, Duration, Utc};

use super::analyzer::RelationshipAnalysis;
use super::circumstances::Circumstance;
use crate::model::{Circle, Contact, Interaction};

/// System prompt for free-form chat.
pub const CHAT_SYSTEM_PROMPT: &str = r#"You are Arlo, a warm and practical personal relationship assistant inside Circl.
You help the user stay in touch with the people who matter to them.

Guidelines:
- Be concise and specific; refer to contacts by name
- Ground every suggestion in the network context you are given
- Use **bold** for names and key actions, and short bullet lists for multiple suggestions
- Never invent facts about contacts that are not in the context
- If the context is empty, suggest how the user can start (import contacts, log an interaction)"#;

/// System prompt for structured recommendations.
pub const RECOMMENDATION_SYSTEM_PROMPT: &str = r#"You are Arlo, a personal relationship assistant. Given a summary of the user's network and a list of contacts, recommend who to reach out to and how.

Rules:
- Only recommend contacts that appear in the context, using their exact names
- Prefer overdue contacts, inner circle first, and upcoming birthdays
- Suggestions must be concrete actions (a message topic, a call, a plan)
- priority is one of "high", "medium", "low"
- actionLabel is a short button label such as "Send message" or "Schedule call"

Return ONLY a valid JSON array (no markdown fences, no extra text):
[{"contactName":"Jane Doe","priority":"high","suggestion":"...","reasoning":"...","actionLabel":"Send message"}]"#;

/// Network-wide counts for the prompt header.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct NetworkSummary {
    pub total: usize,
    pub inner: usize,
    pub middle: usize,
    pub outer: usize,
    pub stale_inner: usize,
    pub stale_middle: usize,
    pub stale_outer: usize,
    /// Interactions within the recent-activity window.
    pub recent_interactions: usize,
}

impl NetworkSummary {
    pub fn stale_total(&self) -> usize {
        self.stale_inner + self.stale_middle + self.stale_outer
    }
}

/// One contact with its analysis and detected circumstances.
#[derive(Debug, Clone)]
pub struct ContactInsight<'a> {
    pub contact: &'a Contact,
    pub analysis: RelationshipAnalysis,
    pub circumstances: Vec<Circumstance>,
}

pub fn summarize(
    insights: &[ContactInsight<'_>],
    interactions: &[Interaction],
    now: DateTime<Utc>,
    recent_days: i64,
) -> NetworkSummary {
    let mut s = NetworkSummary {
        total: insights.len(),
        ..Default::default()
    };
    for i in insights {
        let overdue = i.analysis.is_overdue;
        match i.contact.circle() {
            Circle::Inner => {
                s.inner += 1;
                s.stale_inner += overdue as usize;
            }
            Circle::Middle => {
                s.middle += 1;
                s.stale_middle += overdue as usize;
            }
            Circle::Outer => {
                s.outer += 1;
                s.stale_outer += overdue as usize;
            }
        }
    }
    let cutoff = Duration::try_days(recent_days)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    s.recent_interactions = interactions.iter().filter(|i| i.date >= cutoff).count();
    s
}

/// Contacts worth putting in front of the model: overdue first, then inner
/// circle before outer, then longest silence.
pub fn rank_for_context<'a, 'b>(
    insights: &'b [ContactInsight<'a>],
    limit: usize,
) -> Vec<&'b ContactInsight<'a>> {
    let mut ranked: Vec<&ContactInsight<'a>> = insights.iter().collect();
    ranked.sort_by(|a, b| {
        b.analysis
            .is_overdue
            .cmp(&a.analysis.is_overdue)
            .then_with(|| circle_rank(a.contact.circle()).cmp(&circle_rank(b.contact.circle())))
            .then_with(|| {
                b.analysis
                    .days_since_last_contact
                    .cmp(&a.analysis.days_since_last_contact)
            })
            .then_with(|| a.contact.name().cmp(b.contact.name()))
    });
    ranked.truncate(limit);
    ranked
}

fn circle_rank(circle: Circle) -> u8 {
    match circle {
        Circle::Inner => 0,
        Circle::Middle => 1,
        Circle::Outer => 2,
    }
}

pub fn format_summary(s: &NetworkSummary, recent_days: i64) -> String {
    format!(
        "Network: {} contacts ({} inner, {} middle, {} outer).\n\
         Overdue: {} inner (>7 days), {} middle (>21 days), {} outer (>60 days).\n\
         Interactions in the last {recent_days} days: {}.",
        s.total,
        s.inner,
        s.middle,
        s.outer,
        s.stale_inner,
        s.stale_middle,
        s.stale_outer,
        s.recent_interactions,
    )
}

pub fn format_contact(insight: &ContactInsight<'_>) -> String {
    let c = insight.contact;
    let f = &c.fields;
    let mut out = format!(
        "- {} ({} circle): last contact {} days ago, strength {:.2}",
        c.name(),
        c.circle(),
        insight.analysis.days_since_last_contact,
        insight.analysis.relationship_strength,
    );
    if insight.analysis.is_overdue {
        out.push_str(", OVERDUE");
    }
    let details = [
        ("company", &f.company),
        ("title", &f.job_title),
        ("location", &f.location),
        ("hobbies", &f.hobbies),
        ("how met", &f.how_met),
    ];
    for (label, value) in details {
        if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            let _ = write!(out, "\n  {label}: {v}");
        }
    }
    if let Some(b) = f.birthday {
        let _ = write!(out, "\n  birthday: {}", b.format("%B %-d"));
    }
    if !insight.circumstances.is_empty() {
        let labels: Vec<&str> = insight.circumstances.iter().map(|c| c.label()).collect();
        let _ = write!(out, "\n  notes: {}", labels.join(", "));
    }
    out
}

/// Full network context: summary plus up to `limit` contact blocks.
pub fn build_context(
    insights: &[ContactInsight<'_>],
    summary: &NetworkSummary,
    recent_days: i64,
    limit: usize,
) -> String {
    let mut out = format_summary(summary, recent_days);
    let ranked = rank_for_context(insights, limit);
    if !ranked.is_empty() {
        out.push_str("\n\nContacts:\n");
        let blocks: Vec<String> = ranked.into_iter().map(format_contact).collect();
        out.push_str(&blocks.join("\n"));
    }
    out
}

pub fn recommendation_prompt(context: &str, count: usize) -> String {
    format!("{context}\n\nRecommend up to {count} people to reach out to this week.")
}
