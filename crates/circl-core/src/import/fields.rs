use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Basic,
    Social,
    Professional,
    Education,
    Personal,
}

/// How a column's values are checked and normalized on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Email,
    Phone,
    Url,
    Date,
    Enum,
    Boolean,
    Number,
    List,
}

/// One importable contact attribute.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDef {
    pub key: &'static str,
    pub label: &'static str,
    pub group: FieldGroup,
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub required: bool,
    pub example: &'static str,
    /// Lowercase header spellings recognized after exact and substring matching fail.
    #[serde(skip)]
    pub aliases: &'static [&'static str],
}

macro_rules! field {
    ($key:literal, $label:literal, $group:ident, $kind:ident, $example:literal, [$($alias:literal),*]) => {
        FieldDef {
            key: $key,
            label: $label,
            group: FieldGroup::$group,
            kind: FieldType::$kind,
            required: false,
            example: $example,
            aliases: &[$($alias),*],
        }
    };
}

/// Import schema in detection order. Personal email and mobile phone come
/// before their work counterparts so a bare "Email" or "Phone" column lands
/// on the personal field.
pub const FIELDS: &[FieldDef] = &[
    field!("name", "Name", Basic, Text, "Jane Doe",
        ["full name", "contact name", "contact", "display name"]),
    field!("personal_email", "Personal Email", Basic, Email, "jane@gmail.com",
        ["email", "e-mail", "email address", "e-mail address", "mail", "home email"]),
    field!("work_email", "Work Email", Basic, Email, "jane@acme.com",
        ["business email", "office email", "company email"]),
    field!("mobile_phone", "Mobile Phone", Basic, Phone, "+1 555 0100",
        ["phone", "mobile", "cell", "cell phone", "phone number", "telephone", "tel"]),
    field!("work_phone", "Work Phone", Basic, Phone, "+1 555 0199",
        ["office phone", "business phone"]),
    field!("birthday", "Birthday", Basic, Date, "1990-04-12",
        ["birth date", "date of birth", "dob", "bday"]),
    field!("location", "Location", Basic, Text, "Lisbon, Portugal",
        ["city", "address", "town", "country", "home address"]),
    field!("circle", "Circle", Basic, Enum, "inner",
        ["tier", "closeness", "group"]),
    field!("tags", "Tags", Basic, List, "climbing; book club",
        ["labels", "categories"]),
    field!("notes", "Notes", Basic, Text, "Met at the 2019 offsite",
        ["note", "comments", "description"]),
    field!("favorite", "Favorite", Basic, Boolean, "yes",
        ["starred", "fav", "favourite"]),
    field!("linkedin_url", "LinkedIn URL", Social, Url, "https://linkedin.com/in/janedoe",
        ["linkedin", "linkedin profile"]),
    field!("twitter_handle", "Twitter Handle", Social, Text, "@janedoe",
        ["twitter", "x", "x handle"]),
    field!("instagram_handle", "Instagram Handle", Social, Text, "@jane.doe",
        ["instagram", "ig"]),
    field!("website", "Website", Social, Url, "https://janedoe.dev",
        ["web", "url", "homepage", "site"]),
    field!("company", "Company", Professional, Text, "Acme Corp",
        ["organization", "organisation", "employer", "org"]),
    field!("job_title", "Job Title", Professional, Text, "Product Manager",
        ["title", "position", "role"]),
    field!("industry", "Industry", Professional, Text, "Fintech",
        ["sector"]),
    field!("university", "University", Education, Text, "University of Porto",
        ["school", "college", "alma mater"]),
    field!("major", "Major", Education, Text, "Economics",
        ["degree", "field of study"]),
    field!("graduation_year", "Graduation Year", Education, Number, "2012",
        ["class of", "grad year", "year"]),
    field!("how_met", "How We Met", Personal, Text, "College roommate",
        ["how met", "met", "met at", "source"]),
    field!("hobbies", "Hobbies", Personal, Text, "Bouldering, chess",
        ["interests"]),
    field!("family_details", "Family Details", Personal, Text, "Partner Sam, two kids",
        ["family", "spouse", "kids", "children"]),
];

pub fn field_by_key(key: &str) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|f| f.key == key)
}

/// Case-insensitive lookup by display label or key.
pub fn field_by_label(label: &str) -> Option<&'static FieldDef> {
    let wanted = label.trim();
    FIELDS
        .iter()
        .find(|f| f.label.eq_ignore_ascii_case(wanted) || f.key.eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_and_labels_are_unique() {
        let keys: HashSet<_> = FIELDS.iter().map(|f| f.key).collect();
        let labels: HashSet<_> = FIELDS.iter().map(|f| f.label.to_lowercase()).collect();
        assert_eq!(keys.len(), FIELDS.len());
        assert_eq!(labels.len(), FIELDS.len());
    }

    #[test]
    fn nothing_is_required() {
        assert!(FIELDS.iter().all(|f| !f.required));
    }

    #[test]
    fn aliases_do_not_collide() {
        let mut seen = HashSet::new();
        for f in FIELDS {
            for a in f.aliases {
                assert!(seen.insert(*a), "alias '{a}' used twice");
                assert_eq!(*a, a.to_lowercase());
            }
        }
    }

    #[test]
    fn lookup_by_label_or_key() {
        assert_eq!(field_by_label("personal email").unwrap().key, "personal_email");
        assert_eq!(field_by_label("job_title").unwrap().label, "Job Title");
        assert!(field_by_label("Shoe Size").is_none());
        assert_eq!(field_by_key("circle").unwrap().kind, FieldType::Enum);
    }
}
