//! Slug normalization and per-refresh collision resolution.

use std::collections::HashSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Slugs are cut to this many bytes before collision suffixes.
pub const MAX_SLUG_LEN: usize = 64;

/// Normalize a name into `[a-z0-9-]`.
///
/// Compatibility decomposition, combining marks dropped, lowercased; every
/// run of other characters becomes a single `-`, with none at either end.
/// May return an empty string when nothing usable remains.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len().min(MAX_SLUG_LEN));
    let mut pending_dash = false;

    for ch in value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// One slug to allocate.
#[derive(Debug, Clone, Copy)]
pub struct SlugRequest<'a> {
    /// Text the slug is derived from
    pub source: &'a str,
    pub enabled: bool,
}

/// Assign unique slugs for one refresh, in input order.
///
/// Enabled requests claim slugs first, then disabled ones, so a disabled
/// duplicate never pushes an enabled item onto a suffixed slug. The first
/// claimant of a slug keeps it bare; later ones get `-1`, `-2`, ...
/// `None` marks a request whose source normalizes to nothing.
pub fn assign_slugs(requests: &[SlugRequest<'_>]) -> Vec<Option<String>> {
    let mut assigned: Vec<Option<String>> = vec![None; requests.len()];
    let mut taken: HashSet<String> = HashSet::with_capacity(requests.len());

    let enabled_first = requests
        .iter()
        .enumerate()
        .filter(|(_, r)| r.enabled)
        .chain(requests.iter().enumerate().filter(|(_, r)| !r.enabled));

    for (index, request) in enabled_first {
        let base = slugify(request.source);
        if base.is_empty() {
            continue;
        }

        let mut candidate = base.clone();
        let mut counter = 1u32;
        while taken.contains(&candidate) {
            candidate = format!("{}-{}", base, counter);
            counter += 1;
        }
        taken.insert(candidate.clone());
        assigned[index] = Some(candidate);
    }

    assigned
}
