//! Resolve a free-text contact name from the model back to a stored contact.

use std::collections::HashSet;

use crate::error::{CirclError, Result};
use crate::model::Contact;

/// One way of matching a name against the contact list.
pub trait NameMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Index of the matching contact, if this strategy finds one.
    fn find(&self, query: &str, contacts: &[Contact]) -> Option<usize>;
}

/// Case-insensitive equality after trimming.
pub struct ExactName;

impl NameMatcher for ExactName {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn find(&self, query: &str, contacts: &[Contact]) -> Option<usize> {
        let q = normalize(query);
        contacts.iter().position(|c| normalize(c.name()) == q)
    }
}

/// Either name contains the other, e.g. "Jane" vs "Jane Doe".
pub struct Substring;

impl NameMatcher for Substring {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn find(&self, query: &str, contacts: &[Contact]) -> Option<usize> {
        let q = normalize(query);
        if q.len() < 3 {
            return None;
        }
        contacts.iter().position(|c| {
            let n = normalize(c.name());
            !n.is_empty() && (n.contains(&q) || q.contains(&n))
        })
    }
}

/// Most shared name tokens, at least one. Ties keep the first contact.
pub struct TokenOverlap;

impl NameMatcher for TokenOverlap {
    fn name(&self) -> &'static str {
        "token_overlap"
    }

    fn find(&self, query: &str, contacts: &[Contact]) -> Option<usize> {
        let q = normalize(query);
        let wanted: HashSet<&str> = q.split_whitespace().filter(|t| t.len() > 1).collect();
        if wanted.is_empty() {
            return None;
        }
        let mut best: Option<(usize, usize)> = None;
        for (i, c) in contacts.iter().enumerate() {
            let n = normalize(c.name());
            let shared = n.split_whitespace().filter(|t| wanted.contains(t)).count();
            if shared > 0 && !best.is_some_and(|(_, s)| shared <= s) {
                best = Some((i, shared));
            }
        }
        best.map(|(i, _)| i)
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Strategies tried in order until one matches.
pub struct MatcherChain {
    matchers: Vec<Box<dyn NameMatcher>>,
}

impl Default for MatcherChain {
    fn default() -> Self {
        Self {
            matchers: vec![Box::new(ExactName), Box::new(Substring), Box::new(TokenOverlap)],
        }
    }
}

impl MatcherChain {
    pub fn new(matchers: Vec<Box<dyn NameMatcher>>) -> Self {
        Self { matchers }
    }

    pub fn find<'c>(&self, query: &str, contacts: &'c [Contact]) -> Option<&'c Contact> {
        self.matchers.iter().find_map(|m| {
            let i = m.find(query, contacts)?;
            tracing::trace!(strategy = m.name(), query, "matched contact name");
            Some(&contacts[i])
        })
    }
}

/// Strict lookup for commands that change data: exact names only, and a
/// name shared by several contacts is an error. Fuzzy candidates are only
/// offered as a hint in the error message.
pub fn resolve_exact<'c>(query: &str, contacts: &'c [Contact]) -> Result<&'c Contact> {
    let q = normalize(query);
    let exact: Vec<&Contact> = contacts.iter().filter(|c| normalize(c.name()) == q).collect();
    match exact.as_slice() {
        [one] => Ok(one),
        [] => {
            let hint = MatcherChain::default()
                .find(query, contacts)
                .map(|c| format!(" (did you mean '{}'?)", c.name()))
                .unwrap_or_default();
            Err(CirclError::NotFound(format!("no contact named '{}'{hint}", query.trim())))
        }
        many => {
            let ids: Vec<String> = many.iter().map(|c| c.id.to_string()).collect();
            Err(CirclError::InvalidInput(format!(
                "{} contacts are named '{}', use an id instead: {}",
                many.len(),
                query.trim(),
                ids.join(", ")
            )))
        }
    }
}
