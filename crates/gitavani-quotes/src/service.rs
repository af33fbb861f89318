use gitavani_core::{Language, QuoteStrategy};
use gitavani_corpus::{fallback_verse, random_seed_verse, CorpusVerse, VerseRef};
use rand::Rng;
use serde::Serialize;
use tracing::warn;

use crate::parse::{self, ParsedQuote};
use crate::prompt;
use crate::provider::QuoteProvider;

/// Where the delivered text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSource {
    /// Generated by the external provider.
    Provider,
    /// Served from the embedded corpus (Random short-circuit).
    Corpus,
    /// Hard-coded fallback after a provider failure.
    Fallback,
}

/// The adapter's output. `text` is never empty — when everything else
/// fails a fallback verse stands in, flagged by `success = false` and
/// `source = Fallback`.
#[derive(Debug, Clone)]
pub struct QuoteResult {
    pub success: bool,
    pub text: String,
    pub parsed: ParsedQuote,
    pub source: QuoteSource,
    pub language: Language,
    pub strategy: QuoteStrategy,
}

/// Content adapter sitting between the engine and the provider.
pub struct QuoteService {
    provider: Box<dyn QuoteProvider>,
    /// Probability the Random strategy skips the provider entirely.
    corpus_probability: f64,
}

impl QuoteService {
    pub fn new(provider: Box<dyn QuoteProvider>, corpus_probability: f64) -> Self {
        Self {
            provider,
            corpus_probability: corpus_probability.clamp(0.0, 1.0),
        }
    }

    /// Produce the day's quote for one user. Infallible by design: any
    /// provider or parse failure resolves to a fallback verse.
    ///
    /// `position` is the user's current (pre-advance) cursor, required
    /// for the Sequential strategy so the text matches the verse being
    /// presented.
    pub async fn daily_quote(
        &self,
        language: Language,
        strategy: QuoteStrategy,
        position: Option<VerseRef>,
    ) -> QuoteResult {
        // For true randomness guarantees (and zero provider cost) part
        // of the Random traffic is served straight from the corpus.
        if strategy == QuoteStrategy::Random
            && rand::thread_rng().gen_bool(self.corpus_probability)
        {
            return corpus_quote(random_seed_verse(), language, strategy);
        }

        let prompt_text = prompt::build_prompt(strategy, language, position);

        let raw = match self.provider.generate(&prompt_text).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(provider = %self.provider.name(), error = %e, "quote generation failed");
                return fallback_quote(language, strategy);
            }
        };

        let parsed = parse::parse_quote(&raw);
        if !parse::is_usable(&raw, &parsed) {
            warn!(
                provider = %self.provider.name(),
                chars = raw.trim().len(),
                "unusable provider response"
            );
            return fallback_quote(language, strategy);
        }

        QuoteResult {
            success: true,
            text: parse::clean_text(&raw),
            parsed,
            source: QuoteSource::Provider,
            language,
            strategy,
        }
    }
}

/// Format an embedded verse the same way the provider is asked to.
fn render_verse(verse: &CorpusVerse, language: Language) -> (String, ParsedQuote) {
    let translation = verse.translation(language);
    let text = format!(
        "Verse: {}\nSanskrit: {}\nTranslation: {}\nToday's Wisdom: {}",
        verse.reference, verse.sanskrit, translation, verse.wisdom
    );
    let parsed = ParsedQuote {
        verse: Some(verse.reference.to_string()),
        sanskrit: Some(verse.sanskrit.to_string()),
        translation: Some(translation.to_string()),
        wisdom: Some(verse.wisdom.to_string()),
        challenge: None,
    };
    (text, parsed)
}

fn corpus_quote(verse: &CorpusVerse, language: Language, strategy: QuoteStrategy) -> QuoteResult {
    let (text, parsed) = render_verse(verse, language);
    QuoteResult {
        success: true,
        text,
        parsed,
        source: QuoteSource::Corpus,
        language,
        strategy,
    }
}

fn fallback_quote(language: Language, strategy: QuoteStrategy) -> QuoteResult {
    let (text, parsed) = render_verse(fallback_verse(), language);
    QuoteResult {
        success: false,
        text,
        parsed,
        source: QuoteSource::Fallback,
        language,
        strategy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use async_trait::async_trait;

    struct StubProvider {
        reply: Result<&'static str, ()>,
    }

    #[async_trait]
    impl QuoteProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }
        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            match self.reply {
                Ok(s) => Ok(s.to_string()),
                Err(()) => Err(ProviderError::Unavailable("stub down".to_string())),
            }
        }
    }

    fn service(reply: Result<&'static str, ()>) -> QuoteService {
        // corpus_probability 0.0 — force the provider path in tests.
        QuoteService::new(Box::new(StubProvider { reply }), 0.0)
    }

    const GOOD: &str = "**Verse:** 3.21\n**Sanskrit:** यद्यदाचरति श्रेष्ठः\n\
**Translation:** Whatever a great person does, others follow.\n\
**Today's Wisdom:** Lead by example in everything you do today.";

    #[tokio::test]
    async fn provider_success_is_parsed_and_cleaned() {
        let svc = service(Ok(GOOD));
        let q = svc
            .daily_quote(Language::English, QuoteStrategy::Random, None)
            .await;
        assert!(q.success);
        assert_eq!(q.source, QuoteSource::Provider);
        assert!(!q.text.contains("**"));
        assert_eq!(q.parsed.verse.as_deref(), Some("3.21"));
    }

    #[tokio::test]
    async fn provider_failure_yields_nonempty_fallback() {
        let svc = service(Err(()));
        let q = svc
            .daily_quote(Language::English, QuoteStrategy::Random, None)
            .await;
        assert!(!q.success);
        assert_eq!(q.source, QuoteSource::Fallback);
        assert!(!q.text.is_empty());
        assert!(q.parsed.has_content());
    }

    #[tokio::test]
    async fn unusable_reply_yields_fallback() {
        let svc = service(Ok("hm"));
        let q = svc
            .daily_quote(Language::Hindi, QuoteStrategy::Themed, None)
            .await;
        assert!(!q.success);
        assert_eq!(q.source, QuoteSource::Fallback);
        assert!(!q.text.is_empty());
        // Hindi fallback carries the Hindi translation.
        assert!(q.parsed.translation.is_some());
    }

    #[tokio::test]
    async fn corpus_short_circuit_skips_the_provider() {
        // Probability 1.0 — the stub would fail if it were consulted.
        let svc = QuoteService::new(Box::new(StubProvider { reply: Err(()) }), 1.0);
        let q = svc
            .daily_quote(Language::English, QuoteStrategy::Random, None)
            .await;
        assert!(q.success);
        assert_eq!(q.source, QuoteSource::Corpus);
        assert!(!q.text.is_empty());
    }

    #[tokio::test]
    async fn sequential_never_short_circuits_to_corpus() {
        // Even at probability 1.0 a sequential request must go to the
        // provider so the text matches the cursor position.
        let svc = QuoteService::new(Box::new(StubProvider { reply: Ok(GOOD) }), 1.0);
        let q = svc
            .daily_quote(
                Language::English,
                QuoteStrategy::Sequential,
                Some(VerseRef {
                    chapter: 3,
                    verse: 21,
                }),
            )
            .await;
        assert_eq!(q.source, QuoteSource::Provider);
    }
}
