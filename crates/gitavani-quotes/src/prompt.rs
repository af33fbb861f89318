//! Prompt construction for the three quote strategies.
//!
//! Every prompt demands the same rigid labeled-section format so the
//! parser in [`crate::parse`] can anchor on the headers regardless of
//! which strategy produced the response.

use gitavani_core::{Language, QuoteStrategy};
use gitavani_corpus::VerseRef;
use rand::Rng;

/// Life themes the Themed strategy rotates through.
const THEMES: &[&str] = &[
    "overcoming stress and anxiety",
    "finding purpose in work",
    "building healthy relationships",
    "developing inner peace",
    "dealing with difficult people",
    "making important decisions",
    "finding motivation and energy",
    "balancing material and spiritual life",
    "developing patience and tolerance",
    "cultivating gratitude and contentment",
    "managing anger and frustration",
    "finding strength in adversity",
    "developing self-discipline",
    "overcoming fear and doubt",
    "cultivating compassion and kindness",
];

/// Build the provider prompt for one dispatch.
///
/// `position` carries the user's current cursor for the Sequential
/// strategy (pre-advance — the verse the user is at); other strategies
/// ignore it.
pub fn build_prompt(
    strategy: QuoteStrategy,
    language: Language,
    position: Option<VerseRef>,
) -> String {
    match strategy {
        QuoteStrategy::Random => random_prompt(language),
        QuoteStrategy::Sequential => {
            let pos = position.unwrap_or(VerseRef {
                chapter: 1,
                verse: 1,
            });
            sequential_prompt(language, pos)
        }
        QuoteStrategy::Themed => themed_prompt(language, random_theme()),
    }
}

pub fn random_theme() -> &'static str {
    let i = rand::thread_rng().gen_range(0..THEMES.len());
    THEMES[i]
}

fn random_prompt(language: Language) -> String {
    let lang = instructions(language);
    // A nonce discourages the model from repeating the famous verses on
    // every call.
    let seed: u32 = rand::thread_rng().gen();
    format!(
        "You are a spiritual guide sharing wisdom from the Bhagavad Gita. \
Generate a meaningful daily quote.

RANDOMIZATION SEED: {seed:08x} - use this to select a truly random verse, \
not commonly quoted ones like 2.47.

FORMATTING RULES:
- Use EXACTLY these headers, each on its own line: \
**Verse:**, **Sanskrit:**, **Translation:**, **Today's Wisdom:**
- No additional formatting or decorations.

CONTENT REQUIREMENTS:
- Select a random verse from chapters 1-18 of the Bhagavad Gita.
- Provide authentic Sanskrit text in Devanagari script.
- {primary}

OUTPUT FORMAT:
**Verse:** [Chapter.Verse number, e.g. 3.21]
**Sanskrit:** [Authentic Sanskrit verse in Devanagari]
**Translation:** [Clear, inspiring translation]
**Today's Wisdom:** [2-3 concise sentences of practical guidance for \
modern daily challenges]

{additional}

Generate the quote now:",
        primary = lang.primary,
        additional = lang.additional,
    )
}

fn sequential_prompt(language: Language, pos: VerseRef) -> String {
    let lang = instructions(language);
    format!(
        "You are providing sequential verses from the Bhagavad Gita for \
systematic daily study.

CURRENT POSITION: Chapter {chapter}, Verse {verse}

FORMATTING RULES:
- Use EXACTLY these headers, each on its own line: \
**Verse:**, **Sanskrit:**, **Translation:**, **Daily Reflection:**
- Provide the EXACT verse requested, not a random one.

OUTPUT FORMAT:
**Verse:** {chapter}.{verse}
**Sanskrit:** [Exact Sanskrit text for Chapter {chapter}, Verse {verse} \
in Devanagari]
**Translation:** [Accurate translation — {primary}]
**Daily Reflection:** [Three parts: the verse's context within the \
chapter, its deeper spiritual meaning, and actionable advice for daily \
life — 2-3 sentences each]

{additional}

Generate the sequential verse now:",
        chapter = pos.chapter,
        verse = pos.verse,
        primary = lang.primary,
        additional = lang.additional,
    )
}

fn themed_prompt(language: Language, theme: &str) -> String {
    let lang = instructions(language);
    format!(
        "You are a wise spiritual counselor. Someone is struggling with: {theme}

FORMATTING RULES:
- Use EXACTLY these headers, each on its own line: \
**Today's Challenge:**, **Verse:**, **Sanskrit:**, **Translation:**, \
**Practical Guidance:**
- Choose a verse that directly addresses this challenge.

OUTPUT FORMAT:
**Today's Challenge:** {theme}
**Verse:** [Chapter.Verse that directly addresses this challenge]
**Sanskrit:** [Authentic Sanskrit text in Devanagari]
**Translation:** [Clear, comforting translation — {primary}]
**Practical Guidance:** [Why this verse fits today's challenge, 2-3 \
concrete action steps, and one uplifting affirmation]

{additional}

Generate the themed quote now:",
        primary = lang.primary,
        additional = lang.additional,
    )
}

struct LanguageInstructions {
    primary: &'static str,
    additional: &'static str,
}

fn instructions(language: Language) -> LanguageInstructions {
    match language {
        Language::English => LanguageInstructions {
            primary: "provide all translations and wisdom in clear, beautiful English",
            additional: "Use inspiring, accessible language that resonates with modern \
                 English speakers. Avoid archaic terms.",
        },
        Language::Hindi => LanguageInstructions {
            primary: "सभी अनुवाद और ज्ञान सुंदर हिंदी में प्रदान करें",
            additional: "आधुनिक हिंदी भाषियों के लिए प्रेरणादायक और सुलभ भाषा का उपयोग करें। कठिन शब्दों से बचें।",
        },
        Language::Sanskrit => LanguageInstructions {
            primary: "provide detailed Sanskrit commentary and explanation",
            additional: "Include word-by-word meaning and grammatical insights for \
                 Sanskrit students. Use proper Devanagari script.",
        },
        Language::Gujarati => LanguageInstructions {
            primary: "બધા અનુવાદ અને જ્ઞાન સુંદર ગુજરાતીમાં આપો",
            additional: "આધુનિક ગુજરાતી ભાષીઓ માટે પ્રેરણાદાયક અને સુલભ ભાષાનો ઉપયોગ કરો.",
        },
        Language::Tamil => LanguageInstructions {
            primary: "அனைத்து மொழிபெயர்ப்பு மற்றும் ஞானத்தையும் அழகான தமிழில் வழங்கவும்",
            additional: "நவீன தமிழ் பேசுபவர்களுக்கு ஊக்கமளிக்கும் மொழியைப் பயன்படுத்தவும்.",
        },
    }
}
