use serde::{Deserialize, Serialize};

/// Language a user receives translations and guidance in.
///
/// Sanskrit verse text is always delivered in Devanagari regardless of
/// this setting; the language only controls the translation and the
/// reflection sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Sanskrit,
    Gujarati,
    Tamil,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Language::English => "english",
            Language::Hindi => "hindi",
            Language::Sanskrit => "sanskrit",
            Language::Gujarati => "gujarati",
            Language::Tamil => "tamil",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "english" => Ok(Language::English),
            "hindi" => Ok(Language::Hindi),
            "sanskrit" => Ok(Language::Sanskrit),
            "gujarati" => Ok(Language::Gujarati),
            "tamil" => Ok(Language::Tamil),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

/// How the daily verse for a user is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStrategy {
    /// A random verse from anywhere in the corpus.
    #[default]
    Random,
    /// The user's next verse in reading order, tracked by their cursor.
    Sequential,
    /// A verse matched to a rotating daily life theme.
    Themed,
}

impl std::fmt::Display for QuoteStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QuoteStrategy::Random => "random",
            QuoteStrategy::Sequential => "sequential",
            QuoteStrategy::Themed => "themed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for QuoteStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "random" => Ok(QuoteStrategy::Random),
            "sequential" => Ok(QuoteStrategy::Sequential),
            "themed" => Ok(QuoteStrategy::Themed),
            other => Err(format!("unknown quote strategy: {other}")),
        }
    }
}

/// Which calendar the "already sent today" check uses.
///
/// The legacy behaviour compares dates on the server clock while the
/// delivery window itself is evaluated in the user's zone. A user just
/// past their local midnight can therefore be skipped or double-sent
/// near large UTC offsets. Both rules are supported so the choice is
/// explicit configuration instead of an accident of implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SentDayRule {
    /// Compare dates as seen by the server clock (UTC). Legacy default.
    #[default]
    ServerDate,
    /// Compare dates in the user's own time zone.
    UserZone,
}

impl std::fmt::Display for SentDayRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SentDayRule::ServerDate => "server-date",
            SentDayRule::UserZone => "user-zone",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SentDayRule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "server-date" => Ok(SentDayRule::ServerDate),
            "user-zone" => Ok(SentDayRule::UserZone),
            other => Err(format!("unknown sent-day rule: {other}")),
        }
    }
}
