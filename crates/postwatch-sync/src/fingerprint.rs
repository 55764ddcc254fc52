//! Content-derived post identity.
//!
//! A post's id must be stable across repeated scrapes of the same page, so it
//! is derived from what the page shows (author + content), never from scrape
//! time or page position.

use sha2::{Digest, Sha256};

/// Hex digits of the content digest kept in the id. Twelve is plenty for a
/// per-channel post corpus while keeping ids log-friendly.
const DIGEST_PREFIX_LEN: usize = 12;

/// Builds the stable fingerprint id for a post.
///
/// Shape: `community_post_<author-slug>_<digest-prefix>`. The author slug
/// keeps ids greppable; the digest carries the actual identity.
#[must_use]
pub fn post_fingerprint(author: &str, content: &str) -> String {
    let digest = Sha256::digest(format!("{author}\n{content}").as_bytes());
    let hex = format!("{digest:x}");
    format!(
        "community_post_{}_{}",
        author_slug(author),
        &hex[..DIGEST_PREFIX_LEN]
    )
}

fn author_slug(author: &str) -> String {
    author
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .take(32)
        .collect()
}
