//! Embedded verse texts.
//!
//! A small set of well-known verses with authentic Devanagari text.
//! `random_seed_verse` backs the provider short-circuit for the Random
//! strategy (guaranteed-authentic Sanskrit without a network call);
//! `fallback_verse` is the last resort when the provider fails or
//! returns something unusable — the engine must always have deliverable
//! content.

use gitavani_core::Language;
use rand::Rng;

use crate::chapters::VerseRef;

pub struct CorpusVerse {
    pub reference: VerseRef,
    pub sanskrit: &'static str,
    pub english: &'static str,
    pub hindi: &'static str,
    pub wisdom: &'static str,
}

impl CorpusVerse {
    /// Translation in the user's language. Only English and Hindi are
    /// embedded; everything else falls back to English.
    pub fn translation(&self, language: Language) -> &'static str {
        match language {
            Language::Hindi => self.hindi,
            _ => self.english,
        }
    }
}

const SEED_WISDOM: &str = "This verse reminds us of the eternal truths that guide our daily \
     lives. Apply this wisdom to find peace and purpose in your actions.";

static SEED_VERSES: &[CorpusVerse] = &[
    CorpusVerse {
        reference: VerseRef {
            chapter: 2,
            verse: 20,
        },
        sanskrit: "न जायते म्रियते वा कदाचिन्नायं भूत्वा भविता वा न भूयः। अजो नित्यः शाश्वतोऽयं पुराणो न हन्यते हन्यमाने शरीरे॥",
        english: "The soul is never born, nor does it die. It is not slain when the body is slain.",
        hindi: "आत्मा न तो जन्म लेती है और न ही मरती है। शरीर के नष्ट होने पर आत्मा नष्ट नहीं होती।",
        wisdom: SEED_WISDOM,
    },
    CorpusVerse {
        reference: VerseRef {
            chapter: 2,
            verse: 62,
        },
        sanskrit: "ध्यायतो विषयान्पुंसः सङ्गस्तेषूपजायते। सङ्गात्सञ्जायते कामः कामात्क्रोधोऽभिजायते॥",
        english: "While contemplating the objects of the senses, attachment develops. From attachment comes desire, and from desire arises anger.",
        hindi: "विषयों का चिंतन करने से उनमें आसक्ति होती है। आसक्ति से काम और काम से क्रोध उत्पन्न होता है।",
        wisdom: SEED_WISDOM,
    },
    CorpusVerse {
        reference: VerseRef {
            chapter: 4,
            verse: 7,
        },
        sanskrit: "यदा यदा हि धर्मस्य ग्लानिर्भवति भारत। अभ्युत्थानमधर्मस्य तदात्मानं सृजाम्यहम्॥",
        english: "Whenever there is a decline in dharma and rise of adharma, I manifest myself.",
        hindi: "जब-जब धर्म की हानि और अधर्म की वृद्धि होती है, तब-तब मैं अवतार लेता हूं।",
        wisdom: SEED_WISDOM,
    },
    CorpusVerse {
        reference: VerseRef {
            chapter: 6,
            verse: 5,
        },
        sanskrit: "उद्धरेदात्मनात्मानं नात्मानमवसादयेत्। आत्मैव ह्यात्मनो बन्धुरात्मैव रिपुरात्मनः॥",
        english: "One should lift oneself by one's own efforts and not degrade oneself. The mind alone is one's friend as well as one's enemy.",
        hindi: "मनुष्य को अपने द्वारा अपना उद्धार करना चाहिए। मन ही मनुष्य का मित्र है और मन ही शत्रु है।",
        wisdom: SEED_WISDOM,
    },
    CorpusVerse {
        reference: VerseRef {
            chapter: 15,
            verse: 7,
        },
        sanskrit: "ममैवांशो जीवलोके जीवभूतः सनातनः। मनःषष्ठानीन्द्रियाणि प्रकृतिस्थानि कर्षति॥",
        english: "The living entities in this world are My eternal fragmental parts, drawing the six senses including the mind from material nature.",
        hindi: "इस संसार में सभी जीव मेरे ही शाश्वत अंश हैं, जो प्रकृति से मन सहित छह इंद्रियों को आकर्षित करते हैं।",
        wisdom: SEED_WISDOM,
    },
];

static FALLBACK_VERSES: &[CorpusVerse] = &[
    CorpusVerse {
        reference: VerseRef {
            chapter: 2,
            verse: 47,
        },
        sanskrit: "कर्मण्येवाधिकारस्ते मा फलेषु कदाचन। मा कर्मफलहेतुर्भूर्मा ते सङ्गोऽस्त्वकर्मणि॥",
        english: "You have the right to perform your actions, but you are not entitled to the fruits of action. Never let the fruits of action be your motive, nor let your attachment be to inaction.",
        hindi: "तुम्हारा अधिकार केवल कर्म करने में है, उसके फलों में कभी नहीं। फल की इच्छा से कर्म मत करो, और न ही अकर्म में आसक्त हो।",
        wisdom: "Focus on your efforts and duties without being attached to the outcomes. This brings peace and reduces anxiety about results. When you work without attachment to success or failure, you find true freedom and inner calm.",
    },
    CorpusVerse {
        reference: VerseRef {
            chapter: 2,
            verse: 14,
        },
        sanskrit: "मात्रास्पर्शास्तु कौन्तेय शीतोष्णसुखदुःखदाः। आगमापायिनोऽनित्यास्तांस्तितिक्षस्व भारत॥",
        english: "The experiences of heat and cold, pleasure and pain, are temporary. They come and go, so learn to endure them with patience.",
        hindi: "सर्दी-गर्मी और सुख-दुख के अनुभव अस्थायी हैं। वे आते-जाते रहते हैं, इन्हें धैर्य से सहन करना सीखो।",
        wisdom: "Remember that all difficulties are temporary. Maintain your inner stability through life's ups and downs. Just as seasons change, your current challenges will also pass.",
    },
    CorpusVerse {
        reference: VerseRef {
            chapter: 6,
            verse: 5,
        },
        sanskrit: "उद्धरेदात्मनात्मानं नात्मानमवसादयेत्। आत्मैव ह्यात्मनो बन्धुरात्मैव रिपुरात्मनः॥",
        english: "One should lift oneself by one's own efforts and not degrade oneself. The mind alone is one's friend as well as one's enemy.",
        hindi: "मनुष्य को अपने द्वारा अपना उद्धार करना चाहिए। मन ही मनुष्य का मित्र है और मन ही शत्रु है।",
        wisdom: "You have the power to elevate yourself through your own efforts. Be your own best friend and supporter. Your mind can either be your greatest ally or your worst enemy - train it to work for you.",
    },
];

/// A random verse from the embedded seed set.
pub fn random_seed_verse() -> &'static CorpusVerse {
    let i = rand::thread_rng().gen_range(0..SEED_VERSES.len());
    &SEED_VERSES[i]
}

/// A random hard-coded fallback verse.
pub fn fallback_verse() -> &'static CorpusVerse {
    let i = rand::thread_rng().gen_range(0..FALLBACK_VERSES.len());
    &FALLBACK_VERSES[i]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_references_are_valid() {
        for v in SEED_VERSES.iter().chain(FALLBACK_VERSES.iter()) {
            assert!(v.reference.is_valid(), "bad reference {}", v.reference);
            assert!(!v.sanskrit.is_empty());
            assert!(!v.english.is_empty());
            assert!(!v.hindi.is_empty());
            assert!(!v.wisdom.is_empty());
        }
    }

    #[test]
    fn translation_selects_language() {
        let v = &FALLBACK_VERSES[0];
        assert_eq!(v.translation(Language::English), v.english);
        assert_eq!(v.translation(Language::Hindi), v.hindi);
        // No embedded Tamil text — English stands in.
        assert_eq!(v.translation(Language::Tamil), v.english);
    }
}
