use std::sync::LazyLock;

use regex::Regex;

static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").unwrap());
static H2_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^##[ \t]+(.+)$").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Collapse runs of blank lines to a single blank line and trim the ends.
pub fn clean(md: &str) -> String {
    let unix = md.replace("\r\n", "\n");
    BLANK_RUN_RE.replace_all(&unix, "\n\n").trim().to_string()
}

/// First non-blank `#` heading in the body, else the first non-blank `##`.
pub fn guess_title(md: &str) -> Option<String> {
    [&*H1_RE, &*H2_RE].iter().find_map(|re| {
        re.captures_iter(md).find_map(|caps| {
            let title = caps[1].trim();
            (!title.is_empty()).then(|| title.to_string())
        })
    })
}

/// Word-initial capitalisation: a letter is uppercased when the previous
/// character is not a letter, and lowercased otherwise.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_blank_runs() {
        let md = "# A\n\n\n\n\nbody\n\n\nend\n\n";
        assert_eq!(clean(md), "# A\n\nbody\n\nend");
    }

    #[test]
    fn keeps_single_blank_line() {
        assert_eq!(clean("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn normalizes_crlf_before_collapsing() {
        assert_eq!(clean("a\r\n\r\n\r\n\r\nb"), "a\n\nb");
    }

    #[test]
    fn title_prefers_h1_over_earlier_h2() {
        let md = "## Sub heading\ntext\n# Main\n";
        assert_eq!(guess_title(md).as_deref(), Some("Main"));
    }

    #[test]
    fn blank_headings_are_skipped() {
        assert_eq!(guess_title("#  \n# Real Title\n## Sub").as_deref(), Some("Real Title"));
        assert_eq!(guess_title("# \t\n##  \n## Later").as_deref(), Some("Later"));
    }

    #[test]
    fn title_falls_back_to_h2() {
        let md = "intro\n## Services\n### Deep\n";
        assert_eq!(guess_title(md).as_deref(), Some("Services"));
    }

    #[test]
    fn deeper_headings_are_ignored() {
        assert_eq!(guess_title("### Only three\n#### four"), None);
        assert_eq!(guess_title("#NoSpace"), None);
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("intro"), "Intro");
        assert_eq!(title_case("call to ACTION"), "Call To Action");
        assert_eq!(title_case("faq-section 2nd"), "Faq-Section 2Nd");
        assert_eq!(title_case(""), "");
    }
}
