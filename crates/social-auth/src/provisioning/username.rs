//! Unique username generation.
//!
//! The provider's display name becomes the local account name: it is
//! truncated, stripped of spaces, lowercased and trimmed. When that name is taken, a
//! numeric suffix is appended (`janedoe1`, `janedoe2`, ...) while keeping the
//! whole candidate within [`MAX_USERNAME_LENGTH`] characters.
//!
//! [`UsernameCandidates`] yields the candidates lazily so callers can check
//! availability however they like, synchronously or against storage.

/// Maximum length of an account name, in characters.
pub const MAX_USERNAME_LENGTH: usize = 60;

/// Returns the first `max` characters of `value`.
fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Normalizes a provider display name into a base account name.
///
/// Lowercasing can expand a character into several (`İ` becomes `i̇`), so the
/// result is truncated again once lowercased. The result never has
/// surrounding whitespace.
#[must_use]
pub fn normalize_username(name: &str) -> String {
    let lowered = truncate_chars(name, MAX_USERNAME_LENGTH)
        .replace(' ', "")
        .to_lowercase();
    truncate_chars(lowered.trim(), MAX_USERNAME_LENGTH)
        .trim_end()
        .to_string()
}

/// Lazy sequence of username candidates for a display name.
///
/// The first candidate is the normalized name; each following candidate
/// appends the next integer suffix. The base is re-truncated before each
/// suffix so that base plus suffix never exceeds the length limit; it only
/// ever shrinks.
#[derive(Debug, Clone)]
pub struct UsernameCandidates {
    base: String,
    suffix: u64,
    started: bool,
}

impl UsernameCandidates {
    /// Creates the candidate sequence for `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            base: normalize_username(name),
            suffix: 1,
            started: false,
        }
    }
}

impl Iterator for UsernameCandidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if !self.started {
            self.started = true;
            return Some(self.base.clone());
        }

        let suffix = self.suffix.to_string();
        let max_base = MAX_USERNAME_LENGTH.saturating_sub(suffix.len() + 1);
        let truncated_len = truncate_chars(&self.base, max_base).len();
        self.base.truncate(truncated_len);
        self.suffix += 1;

        Some(format!("{}{}", self.base, suffix))
    }
}

/// Returns the first candidate for `name` that `is_taken` does not reject.
///
/// Candidates are checked in the exact form they are returned in. For
/// storage-backed checks, iterate [`UsernameCandidates`] directly.
pub fn generate_unique_username(name: &str, mut is_taken: impl FnMut(&str) -> bool) -> String {
    UsernameCandidates::new(name)
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_default()
}
