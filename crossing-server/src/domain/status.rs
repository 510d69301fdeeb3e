//! Open/closed classification of free-text crossing statuses.
//!
//! The feed reports statuses as human-readable strings ("Clear",
//! "Blocked - train present", "Offline - maintenance"). A crossing counts
//! as open when its status mentions any of [`OPEN_KEYWORDS`].
//!
//! An offline signal is classified as open: a non-functional signal does
//! not block traffic.

/// Lowercase tokens that mark a status as passable.
pub const OPEN_KEYWORDS: [&str; 4] = ["clear", "active", "operational", "offline"];

/// Whether `status` describes an open crossing.
///
/// Case-insensitive substring match against [`OPEN_KEYWORDS`]. Empty and
/// unrecognised statuses are closed; callers that treat "no prior record"
/// as open must handle that themselves.
///
/// # Examples
///
/// ```
/// use crossing_server::domain::is_open;
///
/// assert!(is_open("Clear"));
/// assert!(is_open("ACTIVE"));
/// assert!(is_open("Offline - maintenance"));
/// assert!(!is_open("Down"));
/// assert!(!is_open(""));
/// ```
pub fn is_open(status: &str) -> bool {
    let status = status.to_lowercase();
    OPEN_KEYWORDS.iter().any(|keyword| status.contains(keyword))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Text that cannot contain any keyword: digits, spaces and punctuation.
    fn keyword_free() -> impl Strategy<Value = String> {
        "[0-9 \\-_.:]{0,20}"
    }

    /// A keyword with randomised letter case.
    fn cased_keyword() -> impl Strategy<Value = String> {
        (
            proptest::sample::select(OPEN_KEYWORDS.to_vec()),
            proptest::collection::vec(any::<bool>(), 11),
        )
            .prop_map(|(keyword, upper)| {
                keyword
                    .chars()
                    .zip(upper)
                    .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
                    .collect::<String>()
            })
    }

    proptest! {
        /// Any string containing a keyword, in any case, is open.
        #[test]
        fn keyword_anywhere_is_open(
            prefix in keyword_free(),
            keyword in cased_keyword(),
            suffix in keyword_free(),
        ) {
            let status = format!("{prefix}{keyword}{suffix}");
            prop_assert!(is_open(&status));
        }

        /// Strings with no letters can never be open.
        #[test]
        fn no_keyword_is_closed(status in keyword_free()) {
            prop_assert!(!is_open(&status));
        }
    }
}
