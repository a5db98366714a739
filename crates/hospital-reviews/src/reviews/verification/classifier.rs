/// Content safety check consumed by the verification policy.
pub trait ContentClassifier: Send + Sync {
    fn is_inappropriate(&self, text: &str) -> bool;
}

const SPAM_TERMS: &[&str] = &[
    "click here",
    "buy now",
    "free money",
    "limited offer",
    "discount code",
    "promo code",
    "casino",
    "viagra",
    "crypto giveaway",
    "work from home",
    "earn cash",
    "visit my profile",
];

const PROFANITY_TERMS: &[&str] = &[
    "fuck", "shit", "bitch", "bastard", "asshole", "dickhead", "motherfucker", "cunt",
];

/// Denylist classifier over a spam list and a profanity list.
///
/// Matching is substring based on case-folded text.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    spam: Vec<String>,
    profanity: Vec<String>,
}

impl KeywordClassifier {
    pub fn new<S, P>(spam: S, profanity: P) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let fold = |term: String| term.trim().to_lowercase();
        Self {
            spam: spam
                .into_iter()
                .map(|term| fold(term.into()))
                .filter(|term| !term.is_empty())
                .collect(),
            profanity: profanity
                .into_iter()
                .map(|term| fold(term.into()))
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }

    pub fn matched_term(&self, text: &str) -> Option<&str> {
        let folded = text.to_lowercase();
        self.spam
            .iter()
            .chain(self.profanity.iter())
            .find(|term| folded.contains(term.as_str()))
            .map(String::as_str)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(SPAM_TERMS.iter().copied(), PROFANITY_TERMS.iter().copied())
    }
}

impl ContentClassifier for KeywordClassifier {
    fn is_inappropriate(&self, text: &str) -> bool {
        self.matched_term(text).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lists_flag_spam_and_profanity_case_insensitively() {
        let classifier = KeywordClassifier::default();
        assert!(classifier.is_inappropriate("CLICK HERE for a great deal"));
        assert!(classifier.is_inappropriate("what a Bastard of a receptionist"));
        assert!(!classifier.is_inappropriate("Friendly nurses and a clean ward."));
    }

    #[test]
    fn custom_lists_replace_defaults() {
        let classifier = KeywordClassifier::new(["  Lottery "], Vec::<String>::new());
        assert_eq!(classifier.matched_term("won the LOTTERY"), Some("lottery"));
        assert!(!classifier.is_inappropriate("click here"));
    }
}
