/// @-mention extraction from comment bodies
///
/// A mention is an `@` immediately followed by an email address, e.g.
/// `@jane@example.com`. Extraction lowercases every hit and deduplicates
/// while preserving first-seen order; resolving the addresses to users in
/// the commenting user's organization happens at the service layer.

use once_cell::sync::Lazy;
use regex::Regex;

static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    // Must never fail: the pattern is a compile-time constant.
    Regex::new(r"(?i)@([A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,})")
        .unwrap_or_else(|e| panic!("invalid mention regex: {}", e))
});

/// Extracts mentioned email addresses from a comment body
///
/// Addresses are lowercased and deduplicated, preserving first-seen order.
/// A body with no mentions yields an empty vec.
pub fn extract_mention_emails(body: &str) -> Vec<String> {
    let mut seen = Vec::new();

    for caps in MENTION_RE.captures_iter(body) {
        if let Some(m) = caps.get(1) {
            let email = m.as_str().to_lowercase();
            if !seen.contains(&email) {
                seen.push(email);
            }
        }
    }

    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_single_mention() {
        let emails = extract_mention_emails("ping @jane@example.com about this");
        assert_eq!(emails, vec!["jane@example.com"]);
    }

    #[test]
    fn test_extracts_multiple_mentions_in_order() {
        let emails =
            extract_mention_emails("@bob@corp.io please sync with @alice@corp.io today");
        assert_eq!(emails, vec!["bob@corp.io", "alice@corp.io"]);
    }

    #[test]
    fn test_lowercases_and_dedupes() {
        let emails =
            extract_mention_emails("@Jane@Example.COM and again @jane@example.com");
        assert_eq!(emails, vec!["jane@example.com"]);
    }

    #[test]
    fn test_plain_at_sign_is_not_a_mention() {
        assert!(extract_mention_emails("meet @ noon").is_empty());
        assert!(extract_mention_emails("no mentions here").is_empty());
        assert!(extract_mention_emails("").is_empty());
    }

    #[test]
    fn test_bare_email_without_at_prefix_ignored() {
        assert!(extract_mention_emails("contact jane@example.com directly").is_empty());
    }

    #[test]
    fn test_mention_with_plus_and_dots() {
        let emails = extract_mention_emails("cc @first.last+tag@sub.domain.org");
        assert_eq!(emails, vec!["first.last+tag@sub.domain.org"]);
    }
}
