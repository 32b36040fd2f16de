//! Relationship insights: per-contact heuristics, network summaries, and
//! recommendations from the LLM with a rule-based fallback.

pub mod analyzer;
pub mod cache;
pub mod circumstances;
pub mod matcher;
pub mod prompt;
pub mod recommend;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use analyzer::{analyze, is_overdue, RelationshipAnalysis};
pub use cache::{CachedInsights, InsightCache};
pub use circumstances::{detect, Circumstance};
pub use matcher::{resolve_exact, ExactName, MatcherChain, NameMatcher, Substring, TokenOverlap};
pub use prompt::{ContactInsight, NetworkSummary, CHAT_SYSTEM_PROMPT, RECOMMENDATION_SYSTEM_PROMPT};
pub use recommend::{Priority, Recommendation, RecommendationSet};

use crate::config::InsightsConfig;
use crate::llm::TextGenerator;
use crate::model::{Contact, Interaction};

/// Every contact analyzed, plus the network-wide summary.
#[derive(Debug, Clone)]
pub struct NetworkAnalysis<'a> {
    pub insights: Vec<ContactInsight<'a>>,
    pub summary: NetworkSummary,
}

impl<'a> NetworkAnalysis<'a> {
    pub fn context(&self, recent_days: i64, limit: usize) -> String {
        prompt::build_context(&self.insights, &self.summary, recent_days, limit)
    }

    pub fn overdue(&self) -> impl Iterator<Item = &ContactInsight<'a>> {
        self.insights.iter().filter(|i| i.analysis.is_overdue)
    }
}

pub fn analyze_network<'a>(
    contacts: &'a [Contact],
    interactions: &[Interaction],
    now: DateTime<Utc>,
    recent_days: i64,
) -> NetworkAnalysis<'a> {
    let mut by_contact: HashMap<Uuid, Vec<Interaction>> = HashMap::new();
    for i in interactions {
        by_contact.entry(i.contact_id).or_default().push(i.clone());
    }

    let today = now.date_naive();
    let insights: Vec<ContactInsight<'a>> = contacts
        .iter()
        .map(|c| {
            let own = by_contact.get(&c.id).map(Vec::as_slice).unwrap_or_default();
            let analysis = analyze(c, own, now);
            let circumstances = detect(c, &analysis, today);
            ContactInsight {
                contact: c,
                analysis,
                circumstances,
            }
        })
        .collect();
    let summary = prompt::summarize(&insights, interactions, now, recent_days);
    NetworkAnalysis { insights, summary }
}

/// Ask the model for recommendations; fall back to rules on any failure.
///
/// AI results whose names match no contact are dropped, and the list is
/// padded with rule-based items up to `min_recommendations`. If nothing from
/// the model survives, the whole set is rule-based.
pub async fn recommend<G: TextGenerator>(
    generator: &G,
    contacts: &[Contact],
    interactions: &[Interaction],
    config: &InsightsConfig,
    now: DateTime<Utc>,
) -> RecommendationSet {
    let network = analyze_network(contacts, interactions, now, config.recent_activity_days);
    let min = config.min_recommendations;
    if contacts.is_empty() {
        return RecommendationSet::RuleBased(Vec::new());
    }

    let context = network.context(config.recent_activity_days, config.max_context_contacts);
    let request = prompt::recommendation_prompt(&context, min.max(1));
    let parsed = match generator
        .generate(&request, Some(RECOMMENDATION_SYSTEM_PROMPT))
        .await
    {
        Ok(text) => recommend::parse_recommendations(&text, contacts, &MatcherChain::default(), now),
        Err(e) => Err(e),
    };

    match parsed {
        Ok(items) if !items.is_empty() => {
            tracing::debug!(count = items.len(), "AI recommendations parsed");
            RecommendationSet::AiGenerated(recommend::pad_with_rules(items, &network.insights, min, now))
        }
        Ok(_) => {
            tracing::warn!("AI recommendations matched no contacts, using rule-based fallback");
            RecommendationSet::RuleBased(recommend::rule_based(&network.insights, min, now))
        }
        Err(e) => {
            tracing::warn!(error = %e, "AI recommendations unavailable, using rule-based fallback");
            RecommendationSet::RuleBased(recommend::rule_based(&network.insights, min, now))
        }
    }
}
