use std::collections::BTreeSet;

use super::email::{split_emails, EmailKind};
use super::headers::HeaderMapping;
use super::parser::Row;
use super::validate::{extract, normalize_url, parse_bool, parse_date, FieldValues};
use crate::model::{NewContact, DEFAULT_CONTACT_NAME};

/// Turn one raw CSV row into contact fields using `mapping`.
pub fn map_row(row: &Row, mapping: &HeaderMapping) -> NewContact {
    map_values(&extract(row, mapping))
}

/// Build contact fields from mapped values.
///
/// Missing name becomes `Imported Contact`, unknown circles become `outer`,
/// booleans default to false and a non-numeric graduation year is dropped.
/// Addresses in the personal email column that are labelled or recognized as
/// work addresses fill `work_email` when that column gave nothing. No address
/// is dropped: a second work address fills an empty `personal_email`, and any
/// beyond that are listed in the notes.
pub fn map_values(values: &FieldValues) -> NewContact {
    let text = |key: &str| values.get(key).map(|v| v.trim().to_string());

    let mut personal = Vec::new();
    let mut work = Vec::new();
    if let Some(cell) = values.get("work_email") {
        work.extend(split_emails(cell).unwrap_or_default().into_iter().map(|e| e.address));
    }
    if let Some(cell) = values.get("personal_email") {
        for email in split_emails(cell).unwrap_or_default() {
            match email.kind {
                EmailKind::Work => work.push(email.address),
                EmailKind::Personal | EmailKind::Other => personal.push(email.address),
            }
        }
    }
    let mut work = work.into_iter();
    let work_email = work.next();
    let mut personal = personal.into_iter().chain(work);
    let personal_email = personal.next();
    let extra_emails: Vec<String> = personal.collect();

    let notes = match (text("notes"), extra_emails.is_empty()) {
        (notes, true) => notes,
        (None, false) => Some(format!("Other emails: {}", extra_emails.join(", "))),
        (Some(n), false) => Some(format!("{n}\n\nOther emails: {}", extra_emails.join(", "))),
    };

    let tags: BTreeSet<String> = values
        .get("tags")
        .map(|v| {
            v.split([';', ','])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    NewContact {
        name: text("name").unwrap_or_else(|| DEFAULT_CONTACT_NAME.to_string()),
        circle: values
            .get("circle")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default(),
        personal_email,
        work_email,
        mobile_phone: text("mobile_phone"),
        work_phone: text("work_phone"),
        birthday: values.get("birthday").and_then(|v| parse_date(v)),
        location: text("location"),
        company: text("company"),
        job_title: text("job_title"),
        industry: text("industry"),
        linkedin_url: values.get("linkedin_url").and_then(|v| normalize_url(v)),
        twitter_handle: text("twitter_handle"),
        instagram_handle: text("instagram_handle"),
        website: values.get("website").and_then(|v| normalize_url(v)),
        university: text("university"),
        major: text("major"),
        graduation_year: values
            .get("graduation_year")
            .and_then(|v| v.trim().parse::<i32>().ok())
            .filter(|y| (1900..=2100).contains(y)),
        how_met: text("how_met"),
        hobbies: text("hobbies"),
        family_details: text("family_details"),
        notes,
        favorite: values.get("favorite").is_some_and(|v| parse_bool(v)),
        tags,
        last_contact: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::headers::detect_headers;
    use crate::import::parser::parse_str;
    use crate::model::Circle;

    #[test]
    fn maps_simple_row() {
        let parsed = parse_str("Name,Email,Phone\n\"Jane Doe\",\"jane@x.com\",\"\"\n", b',').unwrap();
        let mapping = detect_headers(&parsed.headers);
        let contact = map_row(&parsed.rows[0], &mapping);

        assert_eq!(contact.name, "Jane Doe");
        assert_eq!(contact.personal_email.as_deref(), Some("jane@x.com"));
        assert_eq!(contact.mobile_phone, None);
        assert_eq!(contact.circle, Circle::Outer);
    }

    #[test]
    fn defaults_name_when_missing() {
        let parsed = parse_str("Email\nsolo@x.com\n", b',').unwrap();
        let contact = map_row(&parsed.rows[0], &detect_headers(&parsed.headers));
        assert_eq!(contact.name, DEFAULT_CONTACT_NAME);
    }

    #[test]
    fn labelled_work_address_goes_to_work_email() {
        let parsed = parse_str(
            "Name,Email\nKay,\"kay@acme.com (work); kay@gmail.com\"\n",
            b',',
        )
        .unwrap();
        let contact = map_row(&parsed.rows[0], &detect_headers(&parsed.headers));
        assert_eq!(contact.personal_email.as_deref(), Some("kay@gmail.com"));
        assert_eq!(contact.work_email.as_deref(), Some("kay@acme.com"));
    }

    #[test]
    fn surplus_work_address_is_kept_as_personal() {
        let parsed = parse_str(
            "Name,Personal Email,Work Email\nLu,lu@acme.com (office),lu@corp.com\n",
            b',',
        )
        .unwrap();
        let contact = map_row(&parsed.rows[0], &detect_headers(&parsed.headers));
        assert_eq!(contact.work_email.as_deref(), Some("lu@corp.com"));
        assert_eq!(contact.personal_email.as_deref(), Some("lu@acme.com"));
        assert_eq!(contact.notes, None);
    }

    #[test]
    fn leftover_addresses_go_to_notes() {
        let parsed = parse_str(
            "Name,Personal Email,Work Email,Notes\n\
             Lu,\"lu@home.net; lu@acme.com (work)\",lu@corp.com,Met in Porto\n",
            b',',
        )
        .unwrap();
        let contact = map_row(&parsed.rows[0], &detect_headers(&parsed.headers));
        assert_eq!(contact.work_email.as_deref(), Some("lu@corp.com"));
        assert_eq!(contact.personal_email.as_deref(), Some("lu@home.net"));
        assert_eq!(
            contact.notes.as_deref(),
            Some("Met in Porto\n\nOther emails: lu@acme.com")
        );
    }

    #[test]
    fn parses_typed_fields() {
        let parsed = parse_str(
            "Name,Circle,Favorite,Graduation Year,Tags,Website,Birthday\n\
             Mo,Inner,yes,2012,\"climbing; chess,\",mo.dev,1991-02-03\n",
            b',',
        )
        .unwrap();
        let c = map_row(&parsed.rows[0], &detect_headers(&parsed.headers));
        assert_eq!(c.circle, Circle::Inner);
        assert!(c.favorite);
        assert_eq!(c.graduation_year, Some(2012));
        assert_eq!(c.tags.len(), 2);
        assert_eq!(c.website.as_deref(), Some("https://mo.dev"));
        assert_eq!(c.birthday.unwrap().to_string(), "1991-02-03");
    }

    #[test]
    fn non_numeric_year_is_dropped() {
        let parsed = parse_str("Name,Graduation Year\nNo,twenty twelve\n", b',').unwrap();
        let c = map_row(&parsed.rows[0], &detect_headers(&parsed.headers));
        assert_eq!(c.graduation_year, None);
        assert!(!c.favorite);
    }
}
