use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::circumstances::Circumstance;
use super::matcher::MatcherChain;
use super::prompt::{rank_for_context, ContactInsight};
use crate::error::{CirclError, Result};
use crate::llm::strip_code_fence;
use crate::model::{Circle, Contact};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Lenient parse; anything unrecognized is `Medium`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" | "urgent" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub contact_id: Uuid,
    pub contact_name: String,
    pub priority: Priority,
    pub suggestion: String,
    pub reasoning: String,
    pub action_label: String,
    pub created_at: DateTime<Utc>,
}

/// Recommendations tagged by where they came from. Items have the same shape
/// either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "items", rename_all = "snake_case")]
pub enum RecommendationSet {
    AiGenerated(Vec<Recommendation>),
    RuleBased(Vec<Recommendation>),
}

impl RecommendationSet {
    pub fn items(&self) -> &[Recommendation] {
        match self {
            Self::AiGenerated(items) | Self::RuleBased(items) => items,
        }
    }

    pub fn is_ai_generated(&self) -> bool {
        matches!(self, Self::AiGenerated(_))
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

/// One element of the model's JSON array. Every field may be missing or null.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LlmRecommendation {
    contact_name: Option<String>,
    priority: Option<String>,
    suggestion: Option<String>,
    reasoning: Option<String>,
    action_label: Option<String>,
}

/// Parse the model output, tolerating code fences and prose around the array.
/// Names that match no contact are dropped, as are repeats of a contact.
pub fn parse_recommendations(
    text: &str,
    contacts: &[Contact],
    matcher: &MatcherChain,
    now: DateTime<Utc>,
) -> Result<Vec<Recommendation>> {
    let body = strip_code_fence(text);
    let json = match (body.find('['), body.rfind(']')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => {
            return Err(CirclError::Llm(
                "recommendation response is not a JSON array".into(),
            ))
        }
    };
    let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in raw {
        let item: LlmRecommendation = match serde_json::from_value(value) {
            Ok(item) => item,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed recommendation");
                continue;
            }
        };
        let name = item.contact_name.unwrap_or_default();
        let Some(contact) = matcher.find(&name, contacts) else {
            tracing::debug!(name = %name, "dropping recommendation for unknown contact");
            continue;
        };
        let suggestion = item.suggestion.unwrap_or_default();
        if suggestion.trim().is_empty() || !seen.insert(contact.id) {
            continue;
        }
        out.push(Recommendation {
            contact_id: contact.id,
            contact_name: contact.name().to_string(),
            priority: Priority::parse_lenient(item.priority.as_deref().unwrap_or_default()),
            suggestion: suggestion.trim().to_string(),
            reasoning: item.reasoning.unwrap_or_default().trim().to_string(),
            action_label: non_empty_or(item.action_label.as_deref().unwrap_or_default().trim(), "Reach out"),
            created_at: now,
        });
    }
    Ok(out)
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Deterministic suggestion for one contact from its circumstances.
pub fn rule_based_for(insight: &ContactInsight<'_>, now: DateTime<Utc>) -> Recommendation {
    let c = insight.contact;
    let first = c.first_name();
    let days = insight.analysis.days_since_last_contact;
    let has = |x: Circumstance| insight.circumstances.contains(&x);

    let (suggestion, reasoning, action) = if has(Circumstance::BirthdayThisMonth) {
        (
            format!("Send {first} a birthday message"),
            format!("{}'s birthday is this month.", c.name()),
            "Send wishes",
        )
    } else if has(Circumstance::StaleContact) {
        (
            format!("Reach out to {first} to catch up"),
            format!(
                "It has been {days} days since you last talked; {} circle contacts are due every {} days.",
                c.circle(),
                c.circle().threshold_days()
            ),
            "Send message",
        )
    } else if has(Circumstance::ProfessionalConnection) {
        let company = c.fields.company.as_deref().unwrap_or_default();
        (
            format!("Check in with {first} about how things are going at {company}"),
            "Keeping professional ties warm pays off over time.".to_string(),
            "Send message",
        )
    } else {
        (
            format!("Say hello to {first}"),
            format!("Last contact was {days} days ago."),
            "Say hello",
        )
    };

    let priority = match (insight.analysis.is_overdue, c.circle()) {
        (true, Circle::Inner) => Priority::High,
        (true, _) => Priority::Medium,
        _ if has(Circumstance::BirthdayThisMonth) => Priority::Medium,
        _ => Priority::Low,
    };

    Recommendation {
        contact_id: c.id,
        contact_name: c.name().to_string(),
        priority,
        suggestion,
        reasoning,
        action_label: action.to_string(),
        created_at: now,
    }
}

/// Up to `count` rule-based recommendations, most pressing contacts first.
pub fn rule_based(
    insights: &[ContactInsight<'_>],
    count: usize,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    rank_for_context(insights, count)
        .into_iter()
        .map(|i| rule_based_for(i, now))
        .collect()
}

/// Append rule-based items for contacts not yet covered until `min` is reached.
pub fn pad_with_rules(
    mut items: Vec<Recommendation>,
    insights: &[ContactInsight<'_>],
    min: usize,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    if items.len() >= min {
        return items;
    }
    let covered: HashSet<Uuid> = items.iter().map(|r| r.contact_id).collect();
    let extra: Vec<Recommendation> = rank_for_context(insights, insights.len())
        .into_iter()
        .filter(|i| !covered.contains(&i.contact.id))
        .take(min - items.len())
        .map(|i| rule_based_for(i, now))
        .collect();
    items.extend(extra);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::analyzer::analyze;
    use crate::insights::circumstances::detect;
    use crate::model::NewContact;
    use chrono::Duration;

    fn network(now: DateTime<Utc>) -> Vec<Contact> {
        let user = Uuid::now_v7();
        let mut fresh = Contact::new(user, NewContact::new("Jane Doe").with_circle(Circle::Inner));
        fresh.fields.last_contact = Some(now - Duration::days(2));
        let stale = Contact::new(user, NewContact::new("Omar Haddad").with_circle(Circle::Inner));
        let mut pro = Contact::new(user, NewContact::new("Priya Nair").with_circle(Circle::Middle));
        pro.fields.company = Some("Acme".into());
        pro.fields.job_title = Some("CTO".into());
        pro.fields.last_contact = Some(now - Duration::days(5));
        vec![fresh, stale, pro]
    }

    fn insights(contacts: &[Contact], now: DateTime<Utc>) -> Vec<ContactInsight<'_>> {
        contacts
            .iter()
            .map(|c| {
                let analysis = analyze(c, &[], now);
                let circumstances = detect(c, &analysis, now.date_naive());
                ContactInsight {
                    contact: c,
                    analysis,
                    circumstances,
                }
            })
            .collect()
    }

    #[test]
    fn parses_fenced_array_and_matches_names() {
        let now = Utc::now();
        let cs = network(now);
        let text = "```json\n[{\"contactName\":\"jane doe\",\"priority\":\"HIGH\",\"suggestion\":\"Call her\",\"reasoning\":\"r\",\"actionLabel\":\"Call\"}]\n```";
        let recs = parse_recommendations(text, &cs, &MatcherChain::default(), now).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].contact_name, "Jane Doe");
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[0].action_label, "Call");
    }

    #[test]
    fn drops_unknown_and_duplicate_names() {
        let now = Utc::now();
        let cs = network(now);
        let text = r#"Here you go: [
            {"contactName":"Nobody Known","suggestion":"x"},
            {"contactName":"Omar","suggestion":"Text Omar"},
            {"contactName":"Omar Haddad","suggestion":"Again"}
        ] hope this helps"#;
        let recs = parse_recommendations(text, &cs, &MatcherChain::default(), now).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].contact_name, "Omar Haddad");
        assert_eq!(recs[0].priority, Priority::Medium);
        assert_eq!(recs[0].action_label, "Reach out");
    }

    #[test]
    fn null_fields_keep_the_rest_of_the_array() {
        let now = Utc::now();
        let cs = network(now);
        let text = r#"[
            {"contactName":"Jane Doe","priority":null,"suggestion":"Call Jane","reasoning":null,"actionLabel":null},
            {"contactName":null,"suggestion":"Orphan"},
            "not an object",
            {"contactName":"Omar Haddad","suggestion":"Text Omar","priority":"low"}
        ]"#;
        let recs = parse_recommendations(text, &cs, &MatcherChain::default(), now).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].contact_name, "Jane Doe");
        assert_eq!(recs[0].priority, Priority::Medium);
        assert_eq!(recs[0].reasoning, "");
        assert_eq!(recs[0].action_label, "Reach out");
        assert_eq!(recs[1].priority, Priority::Low);
    }

    #[test]
    fn non_array_is_an_error() {
        let now = Utc::now();
        let cs = network(now);
        assert!(parse_recommendations("I cannot help", &cs, &MatcherChain::default(), now).is_err());
        assert!(parse_recommendations("[not json]", &cs, &MatcherChain::default(), now).is_err());
    }

    #[test]
    fn rule_based_prefers_overdue_inner() {
        let now = Utc::now();
        let cs = network(now);
        let ins = insights(&cs, now);
        let recs = rule_based(&ins, 3, now);
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].contact_name, "Omar Haddad");
        assert_eq!(recs[0].priority, Priority::High);
        assert!(recs[0].suggestion.contains("Omar"));
        let priya = recs.iter().find(|r| r.contact_name == "Priya Nair").unwrap();
        assert!(priya.suggestion.contains("Acme"));
    }

    #[test]
    fn padding_skips_covered_contacts() {
        let now = Utc::now();
        let cs = network(now);
        let ins = insights(&cs, now);
        let ai = vec![rule_based_for(&ins[1], now)];
        let padded = pad_with_rules(ai, &ins, 3, now);
        assert_eq!(padded.len(), 3);
        let ids: HashSet<_> = padded.iter().map(|r| r.contact_id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn set_serializes_with_source_tag() {
        let set = RecommendationSet::RuleBased(Vec::new());
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["source"], "rule_based");
        assert!(!set.is_ai_generated());
    }
}
