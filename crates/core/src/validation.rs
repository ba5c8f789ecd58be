//! Input validation for booking-related writes.
//!
//! Each check returns [`CoreError::Validation`] with a message safe to show
//! to the caller.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Minimum subject length after trimming.
pub const MIN_SUBJECT_LEN: usize = 2;

/// Maximum rating comment length in characters.
pub const MAX_RATING_COMMENT_LEN: usize = 1000;

/// Only session mode the product offers.
pub const MODE_VISIO: &str = "visio";

/// Trim a request subject and enforce its minimum length.
pub fn validate_subject(subject: &str) -> Result<String, CoreError> {
    let subject = subject.trim();
    if subject.chars().count() < MIN_SUBJECT_LEN {
        return Err(CoreError::Validation(format!(
            "Subject must be at least {MIN_SUBJECT_LEN} characters"
        )));
    }
    Ok(subject.to_string())
}

/// Accent-free, trimmed, lower-cased form of a subject used for matching.
///
/// The subject is NFD-decomposed and combining marks are dropped, so
/// precomposed and decomposed spellings produce the same slug.
pub fn subject_slug(subject: &str) -> String {
    subject
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Only `visio` is accepted; `None` defaults to it.
pub fn validate_mode(mode: Option<&str>) -> Result<&'static str, CoreError> {
    match mode.map(str::trim) {
        None | Some(MODE_VISIO) => Ok(MODE_VISIO),
        Some(other) => Err(CoreError::Validation(format!(
            "Unsupported mode '{other}', only '{MODE_VISIO}' is available"
        ))),
    }
}

/// A meeting link must be an absolute http(s) URL.
pub fn validate_meeting_link(link: &str) -> Result<(), CoreError> {
    let link = link.trim();
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
        _ => Err(CoreError::Validation(
            "Meeting link must be an http(s) URL".to_string(),
        )),
    }
}

/// Check a rating's score and comment, and that the session has ended.
pub fn validate_rating(
    score: i16,
    comment: Option<&str>,
    ends_at: Timestamp,
    now: Timestamp,
) -> Result<(), CoreError> {
    if !(1..=5).contains(&score) {
        return Err(CoreError::Validation(format!(
            "Rating must be between 1 and 5, got {score}"
        )));
    }
    if comment.is_some_and(|c| c.chars().count() > MAX_RATING_COMMENT_LEN) {
        return Err(CoreError::Validation(format!(
            "Comment must be at most {MAX_RATING_COMMENT_LEN} characters"
        )));
    }
    if now < ends_at {
        return Err(CoreError::InvalidState(
            "Session can only be rated after it has ended".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn subject_is_trimmed_and_checked() {
        assert_eq!(validate_subject("  Maths ").unwrap(), "Maths");
        assert_matches!(validate_subject(" x "), Err(CoreError::Validation(_)));
        assert_matches!(validate_subject(""), Err(CoreError::Validation(_)));
    }

    #[test]
    fn slug_strips_accents() {
        assert_eq!(subject_slug("  Électricité Générale "), "electricite generale");
        assert_eq!(subject_slug("Français"), "francais");
        assert_eq!(subject_slug("MATHS"), "maths");
    }

    #[test]
    fn slug_folds_decomposed_input() {
        assert_eq!(subject_slug("Re\u{301}seaux"), "reseaux");
        assert_eq!(subject_slug("Re\u{301}seaux"), subject_slug("Réseaux"));
    }

    #[test]
    fn slug_folds_latin_extended_letters() {
        assert_eq!(subject_slug("Ștefan Gödel ő"), "stefan godel o");
        assert_eq!(subject_slug("Ărdeal"), "ardeal");
        assert_eq!(subject_slug("Čeština"), "cestina");
    }

    #[test]
    fn only_visio_mode() {
        assert_eq!(validate_mode(None).unwrap(), "visio");
        assert_eq!(validate_mode(Some("visio")).unwrap(), "visio");
        assert_matches!(validate_mode(Some("presentiel")), Err(CoreError::Validation(_)));
    }

    #[test]
    fn meeting_links() {
        assert!(validate_meeting_link("https://meet.jit.si/edu-1-abc").is_ok());
        assert!(validate_meeting_link("http://localhost:8080/room").is_ok());
        assert!(validate_meeting_link("ftp://meet").is_err());
        assert!(validate_meeting_link("https://").is_err());
        assert!(validate_meeting_link("https://meet jit").is_err());
    }

    #[test]
    fn rating_gate() {
        let now = Utc::now();
        let ended = now - Duration::minutes(1);
        let upcoming = now + Duration::minutes(1);

        assert!(validate_rating(5, Some("Great"), ended, now).is_ok());
        assert!(validate_rating(1, None, now, now).is_ok());
        assert_matches!(
            validate_rating(4, None, upcoming, now),
            Err(CoreError::InvalidState(_))
        );
        assert_matches!(validate_rating(0, None, ended, now), Err(CoreError::Validation(_)));
        assert_matches!(validate_rating(6, None, ended, now), Err(CoreError::Validation(_)));

        let long = "a".repeat(MAX_RATING_COMMENT_LEN + 1);
        assert_matches!(
            validate_rating(3, Some(&long), ended, now),
            Err(CoreError::Validation(_))
        );
    }
}
