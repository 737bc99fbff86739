//! Planning id generation and resolution
//!
//! Planning ids use the format `{6-char-hex}-plan-{slug}`.
//! Example: `019b42-plan-party-day`.

/// Generate a planning id from its title
pub fn generate_id(title: &str) -> String {
    let uuid = uuid::Uuid::now_v7();
    let hex_prefix = &uuid.to_string()[..6];
    format!("{}-plan-{}", hex_prefix, slugify(title))
}

/// Slugify a title for use in ids
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
            // Apostrophes vanish instead of becoming hyphens
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Result of resolving a partial planning reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdMatch {
    /// No known id matches
    None,
    /// Exactly one match
    One(String),
    /// Several candidates match the reference
    Ambiguous(Vec<String>),
}

/// Resolve a partial reference against a set of known planning ids.
///
/// A reference matches an id when it is the full id, a prefix of it (hex
/// prefixes in particular), or a substring of its slug portion.
pub fn resolve<'a>(reference: &str, ids: impl IntoIterator<Item = &'a str>) -> IdMatch {
    let mut matches: Vec<String> = ids
        .into_iter()
        .filter(|id| id_matches(id, reference))
        .map(str::to_string)
        .collect();

    match matches.len() {
        0 => IdMatch::None,
        1 => IdMatch::One(matches.remove(0)),
        _ => IdMatch::Ambiguous(matches),
    }
}

fn id_matches(id: &str, reference: &str) -> bool {
    if id == reference || id.starts_with(reference) {
        return true;
    }
    // Slug portion is everything after the first '-'
    match id.split_once('-') {
        Some((_, rest)) => rest.contains(reference),
        None => false,
    }
}
