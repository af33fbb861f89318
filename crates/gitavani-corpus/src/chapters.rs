use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of chapters in the Gita.
pub const CHAPTER_COUNT: u32 = 18;

/// Verses per chapter, index 0 = chapter 1.
const VERSE_COUNTS: [u32; CHAPTER_COUNT as usize] = [
    47, 72, 43, 42, 29, 47, 30, 28, 34, 42, 55, 20, 35, 27, 20, 24, 28, 78,
];

/// Verse count for `chapter` (1-based). Returns `None` out of range.
pub fn verse_count(chapter: u32) -> Option<u32> {
    if (1..=CHAPTER_COUNT).contains(&chapter) {
        Some(VERSE_COUNTS[(chapter - 1) as usize])
    } else {
        None
    }
}

/// A `(chapter, verse)` position in the corpus. Displayed as "2.47".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRef {
    pub chapter: u32,
    pub verse: u32,
}

impl VerseRef {
    pub fn new(chapter: u32, verse: u32) -> Self {
        Self { chapter, verse }
    }

    /// True when the position exists in the corpus.
    pub fn is_valid(&self) -> bool {
        verse_count(self.chapter).is_some_and(|n| self.verse >= 1 && self.verse <= n)
    }

    /// A uniformly random valid position.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        let chapter = rng.gen_range(1..=CHAPTER_COUNT);
        let verse = rng.gen_range(1..=VERSE_COUNTS[(chapter - 1) as usize]);
        Self { chapter, verse }
    }
}

impl std::fmt::Display for VerseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.chapter, self.verse)
    }
}

impl std::str::FromStr for VerseRef {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (c, v) = s
            .split_once('.')
            .ok_or_else(|| format!("not a verse reference: {s}"))?;
        let chapter: u32 = c.parse().map_err(|_| format!("bad chapter in: {s}"))?;
        let verse: u32 = v.parse().map_err(|_| format!("bad verse in: {s}"))?;
        let r = Self { chapter, verse };
        if r.is_valid() {
            Ok(r)
        } else {
            Err(format!("verse reference out of range: {s}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_all_chapters() {
        assert_eq!(verse_count(1), Some(47));
        assert_eq!(verse_count(2), Some(72));
        assert_eq!(verse_count(18), Some(78));
        assert_eq!(verse_count(0), None);
        assert_eq!(verse_count(19), None);
    }

    #[test]
    fn total_verse_count_is_700() {
        let total: u32 = (1..=CHAPTER_COUNT).map(|c| verse_count(c).unwrap()).sum();
        assert_eq!(total, 700);
    }

    #[test]
    fn ref_validity() {
        assert!(VerseRef::new(2, 47).is_valid());
        assert!(VerseRef::new(18, 78).is_valid());
        assert!(!VerseRef::new(18, 79).is_valid());
        assert!(!VerseRef::new(2, 0).is_valid());
        assert!(!VerseRef::new(19, 1).is_valid());
    }

    #[test]
    fn random_ref_is_always_valid() {
        for _ in 0..200 {
            assert!(VerseRef::random().is_valid());
        }
    }

    #[test]
    fn parse_round_trip() {
        let r: VerseRef = "12.20".parse().unwrap();
        assert_eq!(r, VerseRef::new(12, 20));
        assert_eq!(r.to_string(), "12.20");
        assert!("12.21".parse::<VerseRef>().is_err());
        assert!("2-47".parse::<VerseRef>().is_err());
    }
}
