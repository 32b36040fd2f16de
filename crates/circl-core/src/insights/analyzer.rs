//! Relationship heuristics: how long since we last talked, whether that is
//! too long for the contact's circle, and a rough strength score.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::{Circle, Contact, Interaction};

/// Days assumed when a contact has never been contacted.
pub const NEVER_CONTACTED_DAYS: i64 = 365;

const BASE_STRENGTH: f64 = 0.5;
const INTERACTION_BONUS: f64 = 0.02;
const MAX_INTERACTION_BONUS: f64 = 0.2;
const RECENT_BONUS: f64 = 0.1;
const RECENT_WINDOW_DAYS: i64 = 30;
const ENRICHMENT_BONUS: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipAnalysis {
    pub contact_id: Uuid,
    pub days_since_last_contact: i64,
    pub is_overdue: bool,
    pub relationship_strength: f64,
    pub interaction_count: usize,
    pub last_interaction: Option<DateTime<Utc>>,
}

fn circle_weight(circle: Circle) -> f64 {
    match circle {
        Circle::Inner => 0.4,
        Circle::Middle => 0.2,
        Circle::Outer => 0.1,
    }
}

/// Analyze one contact. Interactions for other contacts are ignored, and the
/// order of `interactions` does not matter.
pub fn analyze(contact: &Contact, interactions: &[Interaction], now: DateTime<Utc>) -> RelationshipAnalysis {
    let own: Vec<&Interaction> = interactions
        .iter()
        .filter(|i| i.contact_id == contact.id)
        .collect();
    let last_interaction = own.iter().map(|i| i.date).max();

    let days_since_last_contact = last_interaction
        .or(contact.fields.last_contact)
        .map(|t| (now - t).num_days().max(0))
        .unwrap_or(NEVER_CONTACTED_DAYS);

    let mut strength = BASE_STRENGTH + circle_weight(contact.circle());
    strength += (own.len() as f64 * INTERACTION_BONUS).min(MAX_INTERACTION_BONUS);
    if last_interaction.is_some_and(|t| (now - t).num_days() <= RECENT_WINDOW_DAYS) {
        strength += RECENT_BONUS;
    }
    let f = &contact.fields;
    let enrichment = [&f.company, &f.hobbies, &f.how_met, &f.notes]
        .iter()
        .filter(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
        .count();
    strength += enrichment as f64 * ENRICHMENT_BONUS;

    RelationshipAnalysis {
        contact_id: contact.id,
        days_since_last_contact,
        is_overdue: is_overdue(contact.circle(), days_since_last_contact),
        relationship_strength: strength.clamp(0.0, 1.0),
        interaction_count: own.len(),
        last_interaction,
    }
}

/// Overdue when strictly more days have passed than the circle allows.
pub fn is_overdue(circle: Circle, days_since_last_contact: i64) -> bool {
    days_since_last_contact > circle.threshold_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InteractionKind, NewContact};
    use chrono::Duration;

    fn contact(circle: Circle) -> Contact {
        Contact::new(Uuid::now_v7(), NewContact::new("Jane Doe").with_circle(circle))
    }

    fn touch(c: &Contact, days_ago: i64, now: DateTime<Utc>) -> Interaction {
        Interaction::new(c.user_id, c.id, InteractionKind::Call, now - Duration::days(days_ago))
    }

    #[test]
    fn never_contacted_defaults_to_a_year() {
        let now = Utc::now();
        let a = analyze(&contact(Circle::Outer), &[], now);
        assert_eq!(a.days_since_last_contact, NEVER_CONTACTED_DAYS);
        assert!(a.is_overdue);
    }

    #[test]
    fn inner_circle_ten_days_is_overdue() {
        let now = Utc::now();
        let mut c = contact(Circle::Inner);
        c.fields.last_contact = Some(now - Duration::days(10));
        let a = analyze(&c, &[], now);
        assert_eq!(a.days_since_last_contact, 10);
        assert!(a.is_overdue);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(!is_overdue(Circle::Inner, 7));
        assert!(is_overdue(Circle::Inner, 8));
        assert!(!is_overdue(Circle::Middle, 21));
        assert!(is_overdue(Circle::Outer, 61));
    }

    #[test]
    fn latest_interaction_beats_last_contact() {
        let now = Utc::now();
        let mut c = contact(Circle::Middle);
        c.fields.last_contact = Some(now - Duration::days(40));
        let interactions = vec![touch(&c, 30, now), touch(&c, 3, now), touch(&c, 12, now)];
        let a = analyze(&c, &interactions, now);
        assert_eq!(a.days_since_last_contact, 3);
        assert_eq!(a.interaction_count, 3);
        assert!(!a.is_overdue);
    }

    #[test]
    fn ignores_other_contacts_interactions() {
        let now = Utc::now();
        let c = contact(Circle::Outer);
        let other = contact(Circle::Outer);
        let a = analyze(&c, &[touch(&other, 1, now)], now);
        assert_eq!(a.interaction_count, 0);
        assert_eq!(a.days_since_last_contact, NEVER_CONTACTED_DAYS);
    }

    #[test]
    fn future_dates_clamp_to_zero() {
        let now = Utc::now();
        let mut c = contact(Circle::Inner);
        c.fields.last_contact = Some(now + Duration::days(2));
        assert_eq!(analyze(&c, &[], now).days_since_last_contact, 0);
    }

    #[test]
    fn strength_components() {
        let now = Utc::now();
        let c = contact(Circle::Outer);
        let a = analyze(&c, &[], now);
        assert!((a.relationship_strength - 0.6).abs() < 1e-9);

        let mut rich = contact(Circle::Middle);
        rich.fields.company = Some("Acme".into());
        rich.fields.notes = Some("met at a conference".into());
        rich.fields.hobbies = Some("   ".into());
        let a = analyze(&rich, &[touch(&rich, 5, now)], now);
        // 0.5 + 0.2 + 0.02 + 0.1 + 2 * 0.05
        assert!((a.relationship_strength - 0.92).abs() < 1e-9);
    }

    #[test]
    fn strength_monotone_in_interactions_and_clamped() {
        let now = Utc::now();
        let mut c = contact(Circle::Inner);
        c.fields.company = Some("Acme".into());
        c.fields.how_met = Some("school".into());
        let mut previous = 0.0;
        let mut interactions = Vec::new();
        for n in 0..20 {
            interactions.push(touch(&c, 100 + n, now));
            let s = analyze(&c, &interactions, now).relationship_strength;
            assert!(s >= previous);
            assert!((0.0..=1.0).contains(&s));
            previous = s;
        }
        assert_eq!(previous, 1.0);
    }

    #[test]
    fn order_independent() {
        let now = Utc::now();
        let c = contact(Circle::Middle);
        let mut interactions = vec![touch(&c, 2, now), touch(&c, 50, now), touch(&c, 9, now)];
        let a = analyze(&c, &interactions, now);
        interactions.reverse();
        assert_eq!(a, analyze(&c, &interactions, now));
    }
}
