use chrono::NaiveDate;
use uuid::Uuid;

use crate::model::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_contact_creation_defaults() {
    let user = Uuid::now_v7();
    let contact = Contact::new(user, NewContact::new("Jane Doe"));

    assert_eq!(contact.name(), "Jane Doe");
    assert_eq!(contact.circle(), Circle::Outer);
    assert_eq!(contact.user_id, user);
    assert!(contact.fields.tags.is_empty());
    assert!(!contact.fields.favorite);
    assert_eq!(contact.first_name(), "Jane");
}

#[test]
fn test_circle_parse_case_insensitive() {
    assert_eq!("Inner".parse::<Circle>().unwrap(), Circle::Inner);
    assert_eq!(" MIDDLE ".parse::<Circle>().unwrap(), Circle::Middle);
    assert_eq!("outer".parse::<Circle>().unwrap(), Circle::Outer);
    assert!("family".parse::<Circle>().is_err());
}

#[test]
fn test_circle_thresholds() {
    assert_eq!(Circle::Inner.threshold_days(), 7);
    assert_eq!(Circle::Middle.threshold_days(), 21);
    assert_eq!(Circle::Outer.threshold_days(), 60);
}

#[test]
fn test_circle_serde_snake_case() {
    let json = serde_json::to_string(&Circle::Middle).unwrap();
    assert_eq!(json, "\"middle\"");
}

#[test]
fn test_new_contact_validation() {
    assert!(NewContact::new("Ada").validate().is_ok());
    assert!(NewContact::new("   ").validate().is_err());
    assert!(NewContact::new("x".repeat(MAX_NAME_LENGTH + 1))
        .validate()
        .is_err());
    assert!(NewContact::new("ü".repeat(MAX_NAME_LENGTH))
        .validate()
        .is_ok());
}

#[test]
fn test_contact_patch_applies_and_clears() {
    let mut contact = Contact::new(
        Uuid::now_v7(),
        NewContact {
            company: Some("Acme".into()),
            ..NewContact::new("Sam")
        },
    );
    let before = contact.updated_at;

    contact.apply(&ContactPatch {
        circle: Some(Circle::Inner),
        company: Some(None),
        hobbies: Some(Some("climbing".into())),
        ..Default::default()
    });

    assert_eq!(contact.circle(), Circle::Inner);
    assert!(contact.fields.company.is_none());
    assert_eq!(contact.fields.hobbies.as_deref(), Some("climbing"));
    assert!(contact.updated_at >= before);
}

#[test]
fn test_contact_json_is_flat() {
    let contact = Contact::new(Uuid::now_v7(), NewContact::new("Flat"));
    let value = serde_json::to_value(&contact).unwrap();
    assert_eq!(value["name"], "Flat");
    assert_eq!(value["circle"], "outer");
}

#[test]
fn test_interaction_kind_aliases() {
    assert_eq!("Phone".parse::<InteractionKind>().unwrap(), InteractionKind::Call);
    assert_eq!("coffee".parse::<InteractionKind>().unwrap(), InteractionKind::Meeting);
    assert_eq!("text".parse::<InteractionKind>().unwrap(), InteractionKind::Message);
    assert!("carrier pigeon".parse::<InteractionKind>().is_err());
}

#[test]
fn test_interaction_blank_notes_dropped() {
    let i = Interaction::new(
        Uuid::now_v7(),
        Uuid::now_v7(),
        InteractionKind::Note,
        chrono::Utc::now(),
    )
    .with_notes("   ");
    assert!(i.notes.is_none());
}

// -- Keystones --

fn keystone(d: NaiveDate, recurrence: Option<Recurrence>) -> Keystone {
    let k = Keystone::new(Uuid::now_v7(), "Event".into(), KeystoneCategory::Other, d);
    match recurrence {
        Some(r) => k.with_recurrence(r),
        None => k,
    }
}

#[test]
fn test_one_off_keystone_in_future() {
    let k = keystone(date(2026, 11, 1), None);
    assert_eq!(k.next_occurrence(date(2026, 10, 17)), Some(date(2026, 11, 1)));
}

#[test]
fn test_one_off_keystone_passed() {
    let k = keystone(date(2026, 9, 1), None);
    assert_eq!(k.next_occurrence(date(2026, 10, 17)), None);
}

#[test]
fn test_weekly_keystone() {
    let k = keystone(date(2026, 10, 1), Some(Recurrence::Weekly));
    assert_eq!(k.next_occurrence(date(2026, 10, 17)), Some(date(2026, 10, 22)));
    // Landing exactly on an occurrence returns today.
    assert_eq!(k.next_occurrence(date(2026, 10, 15)), Some(date(2026, 10, 15)));
}

#[test]
fn test_monthly_keystone_clamps_month_end() {
    let k = keystone(date(2026, 1, 31), Some(Recurrence::Monthly));
    assert_eq!(k.next_occurrence(date(2026, 2, 10)), Some(date(2026, 2, 28)));
    assert_eq!(k.next_occurrence(date(2026, 3, 1)), Some(date(2026, 3, 31)));
}

#[test]
fn test_yearly_keystone_rolls_to_next_year() {
    let k = keystone(date(1990, 5, 20), Some(Recurrence::Yearly));
    assert_eq!(k.next_occurrence(date(2026, 10, 17)), Some(date(2027, 5, 20)));
    assert_eq!(k.next_occurrence(date(2026, 3, 1)), Some(date(2026, 5, 20)));
}

#[test]
fn test_yearly_leap_day() {
    let k = keystone(date(2024, 2, 29), Some(Recurrence::Yearly));
    assert_eq!(k.next_occurrence(date(2026, 1, 10)), Some(date(2026, 2, 28)));
}

#[test]
fn test_upcoming_sorted_and_bounded() {
    let today = date(2026, 10, 17);
    let ks = vec![
        keystone(date(2026, 10, 30), None),
        keystone(date(2026, 10, 20), None),
        keystone(date(2027, 1, 1), None),
        keystone(date(2026, 9, 1), None),
    ];
    let due = upcoming(&ks, today, 14);
    let dates: Vec<NaiveDate> = due.iter().map(|(_, d)| *d).collect();
    assert_eq!(dates, vec![date(2026, 10, 20), date(2026, 10, 30)]);
}

#[test]
fn test_upcoming_with_unbounded_window() {
    let today = date(2026, 10, 17);
    let ks = vec![keystone(date(2031, 5, 1), None)];
    let due = upcoming(&ks, today, i64::MAX);
    assert_eq!(due.len(), 1);
}

#[test]
fn test_keystone_title_required() {
    let k = Keystone::new(Uuid::now_v7(), " ".into(), KeystoneCategory::Reminder, date(2026, 1, 1));
    assert!(k.validate().is_err());
}
