use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Bytes escaped when a slug is placed in a URL path segment. Unreserved
/// characters stay readable.
const SLUG_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Number of owner-id characters appended to a slug.
pub const OWNER_PREFIX_LEN: usize = 8;

/// Derive the agent slug from its display name and the owner's identity.
///
/// `lower(trim(name))` with whitespace runs collapsed to `-`, then `-` and the
/// first [`OWNER_PREFIX_LEN`] characters of `owner_id`. The same
/// `(owner, name)` pair always yields the same slug, which is what makes
/// republishing an update rather than a new agent.
///
/// Other characters, including `/`, `?` and `#`, are kept as is; they are
/// escaped only where the slug enters a URL (see [`public_url`]).
#[must_use]
pub fn derive_slug(name: &str, owner_id: &str) -> String {
    let base = name
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let suffix: String = owner_id.chars().take(OWNER_PREFIX_LEN).collect();
    format!("{base}-{suffix}")
}

/// Public URL of an agent on the registry front end. The slug is
/// percent-encoded as a single path segment.
#[must_use]
pub fn public_url(registry_host: &str, slug: &str) -> String {
    format!(
        "https://{}/agents/{}",
        registry_host.trim_end_matches('/'),
        utf8_percent_encode(slug, SLUG_SEGMENT)
    )
}
