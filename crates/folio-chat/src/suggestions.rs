//! Canned prompts and copy shown on the landing view.

/// A one-click prompt offered before the first message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub label: &'static str,
}

pub const SUGGESTIONS: [Suggestion; 5] = [
    Suggestion { label: "About me" },
    Suggestion { label: "Projects" },
    Suggestion { label: "Contact" },
    Suggestion { label: "Blog" },
    Suggestion { label: "Resume" },
];

pub const GREETING: &str = "Hey, I'm Quentin 👋";
pub const HEADLINE: &str = "Software Engineer";
pub const INPUT_PLACEHOLDER: &str = "Ask me anything...";

/// Look up a suggestion by its 1-based position in the list.
pub fn suggestion_at(position: usize) -> Option<&'static Suggestion> {
    position.checked_sub(1).and_then(|i| SUGGESTIONS.get(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_order() {
        let labels: Vec<&str> = SUGGESTIONS.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec!["About me", "Projects", "Contact", "Blog", "Resume"]);
    }

    #[test]
    fn test_suggestion_at() {
        assert_eq!(suggestion_at(1).map(|s| s.label), Some("About me"));
        assert_eq!(suggestion_at(5).map(|s| s.label), Some("Resume"));
        assert!(suggestion_at(0).is_none());
        assert!(suggestion_at(6).is_none());
    }
}
