use md5::{Digest, Md5};

/// Characters of the title that participate in the identity.
const TITLE_PREFIX_CHARS: usize = 40;

/// Length of the hex digest kept as the deal id.
const ID_HEX_LEN: usize = 12;

/// Stable deal identity derived from the listing title.
///
/// The title is lower-cased, cut to its first 40 characters, and every
/// character outside `[a-z0-9]` becomes `-` before hashing. Re-scraping the
/// same listing therefore yields the same id across runs, and matches the
/// ids the collector has already written into existing deal files.
pub fn deal_id(title: &str) -> String {
    let normalized: String = title
        .to_lowercase()
        .chars()
        .take(TITLE_PREFIX_CHARS)
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect();

    let digest = Md5::digest(normalized.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(ID_HEX_LEN);
    id
}
