//! Section-anchored extraction of provider responses.
//!
//! The prompts demand labeled sections (`**Verse:** …`). Models drift
//! on bold markers and casing, so the anchor match tolerates both; a
//! section runs until the next recognized header.

/// Fields pulled out of a provider response. All optional — a drifting
/// model may omit any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuote {
    /// "Chapter.Verse" reference, e.g. "2.47".
    pub verse: Option<String>,
    pub sanskrit: Option<String>,
    pub translation: Option<String>,
    /// Whichever guidance section the strategy produced.
    pub wisdom: Option<String>,
    /// Themed strategy only.
    pub challenge: Option<String>,
}

impl ParsedQuote {
    /// True when the response contains at least one content-bearing
    /// section.
    pub fn has_content(&self) -> bool {
        self.verse.is_some() || self.sanskrit.is_some() || self.translation.is_some()
    }
}

/// Minimum response length before a reply is even considered.
const MIN_RESPONSE_CHARS: usize = 50;

const WISDOM_HEADERS: &[&str] = &["Today's Wisdom", "Daily Reflection", "Practical Guidance"];

const ALL_HEADERS: &[&str] = &[
    "Verse",
    "Sanskrit",
    "Translation",
    "Today's Wisdom",
    "Daily Reflection",
    "Practical Guidance",
    "Today's Challenge",
];

/// Extract the labeled sections from a raw provider response.
pub fn parse_quote(raw: &str) -> ParsedQuote {
    let mut parsed = ParsedQuote::default();
    let mut current: Option<(&str, String)> = None;

    for line in raw.lines() {
        if let Some((header, rest)) = match_header(line) {
            if let Some((h, body)) = current.take() {
                store(&mut parsed, h, body);
            }
            current = Some((header, rest.trim().to_string()));
        } else if let Some((_, ref mut body)) = current {
            if !body.is_empty() {
                body.push(' ');
            }
            body.push_str(line.trim());
        }
    }
    if let Some((h, body)) = current {
        store(&mut parsed, h, body);
    }

    parsed
}

/// A reply is usable when it is non-trivially long and at least one
/// section anchored. Anything else goes down the fallback path.
pub fn is_usable(raw: &str, parsed: &ParsedQuote) -> bool {
    raw.trim().len() >= MIN_RESPONSE_CHARS && (parsed.has_content() || raw.contains("Verse:"))
}

/// Strip bold markers and squeeze blank-line runs for display.
pub fn clean_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0usize;
    for line in raw.replace("**", "").lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.trim().to_string()
}

/// Match a header line: optional `**`, a known label, a colon. Returns
/// the canonical label and the remainder of the line after the colon.
fn match_header(line: &str) -> Option<(&'static str, &str)> {
    let trimmed = line.trim_start();
    let stripped = trimmed.strip_prefix("**").unwrap_or(trimmed);
    for header in ALL_HEADERS {
        if let Some(rest) = strip_prefix_ignore_case(stripped, header) {
            let rest = rest.strip_prefix("**").unwrap_or(rest);
            let rest = rest.trim_start();
            if let Some(rest) = rest.strip_prefix(':') {
                let rest = rest.strip_prefix("**").unwrap_or(rest);
                return Some((header, rest));
            }
            // "**Verse:**" puts the colon before the closing stars.
            if let Some(rest) = stripped
                .get(header.len()..)
                .and_then(|r| r.strip_prefix(":**"))
            {
                return Some((header, rest));
            }
        }
    }
    None
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    // get() keeps a multi-byte first character from panicking the slice.
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&s[prefix.len()..]),
        _ => None,
    }
}

fn store(parsed: &mut ParsedQuote, header: &str, body: String) {
    let body = body.trim().to_string();
    if body.is_empty() {
        return;
    }
    match header {
        "Verse" => parsed.verse = Some(body),
        "Sanskrit" => parsed.sanskrit = Some(body),
        "Translation" => parsed.translation = Some(body),
        "Today's Challenge" => parsed.challenge = Some(body),
        h if WISDOM_HEADERS.contains(&h) => parsed.wisdom = Some(body),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = "**Verse:** 3.21\n\
**Sanskrit:** यद्यदाचरति श्रेष्ठस्तत्तदेवेतरो जनः।\n\
**Translation:** Whatever a great person does, others follow.\n\
**Today's Wisdom:** Lead by example. Your actions teach louder than \
your words ever could, so act the way you wish the world would.";

    #[test]
    fn extracts_all_sections() {
        let parsed = parse_quote(GOOD);
        assert_eq!(parsed.verse.as_deref(), Some("3.21"));
        assert!(parsed.sanskrit.as_deref().unwrap().contains("श्रेष्ठ"));
        assert!(parsed
            .translation
            .as_deref()
            .unwrap()
            .starts_with("Whatever"));
        assert!(parsed.wisdom.as_deref().unwrap().contains("Lead by example"));
        assert!(is_usable(GOOD, &parsed));
    }

    #[test]
    fn multiline_sections_are_joined() {
        let raw = "**Translation:** First part\ncontinues here\n**Verse:** 2.14";
        let parsed = parse_quote(raw);
        assert_eq!(
            parsed.translation.as_deref(),
            Some("First part continues here")
        );
        assert_eq!(parsed.verse.as_deref(), Some("2.14"));
    }

    #[test]
    fn tolerates_unbolded_headers_and_casing() {
        let raw = "verse: 6.5\nsanskrit: उद्धरेदात्मनात्मानं\ntranslation: Lift yourself by your own efforts.";
        let parsed = parse_quote(raw);
        assert_eq!(parsed.verse.as_deref(), Some("6.5"));
        assert!(parsed.sanskrit.is_some());
        assert!(parsed.translation.is_some());
    }

    #[test]
    fn alternate_wisdom_headers_land_in_wisdom() {
        let raw =
            "**Verse:** 1.1\n**Daily Reflection:** Reflect on beginnings and what they demand of us.";
        assert!(parse_quote(raw).wisdom.is_some());
        let raw =
            "**Verse:** 1.1\n**Practical Guidance:** Take one small step today toward the hard thing.";
        assert!(parse_quote(raw).wisdom.is_some());
    }

    #[test]
    fn themed_challenge_is_captured() {
        let raw = "**Today's Challenge:** overcoming fear and doubt\n**Verse:** 2.40";
        let parsed = parse_quote(raw);
        assert_eq!(parsed.challenge.as_deref(), Some("overcoming fear and doubt"));
    }

    #[test]
    fn short_or_headerless_replies_are_unusable() {
        let short = "ok";
        assert!(!is_usable(short, &parse_quote(short)));

        let rambling = "I am sorry, I cannot help with that request today because the \
             stars are not aligned and my guidance systems are offline.";
        assert!(!is_usable(rambling, &parse_quote(rambling)));
    }

    #[test]
    fn devanagari_first_line_does_not_panic_the_matcher() {
        // A line opening with multi-byte text must not trip the header
        // prefix slice.
        let raw = "कर्मण्येवाधिकारस्ते मा फलेषु कदाचन\n**Verse:** 2.47";
        let parsed = parse_quote(raw);
        assert_eq!(parsed.verse.as_deref(), Some("2.47"));
    }

    #[test]
    fn clean_text_strips_bold_and_squeezes_blanks() {
        let raw = "**Verse:** 2.47\n\n\n\n**Translation:** Act without attachment.";
        let cleaned = clean_text(raw);
        assert!(!cleaned.contains("**"));
        assert!(!cleaned.contains("\n\n\n"));
        assert!(cleaned.starts_with("Verse: 2.47"));
    }
}
