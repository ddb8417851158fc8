//! Keyword-matched FAQ replies for the help chat.

/// Keywords (French and English, lowercase) and the reply they trigger.
/// Rules are tried in order; the first hit wins. A keyword matches whole
/// words only, so "hi" does not fire on "sushi".
const RULES: &[(&[&str], &str)] = &[
    (
        &["bonjour", "salut", "hello", "hi"],
        "Hello! How can I help you today?",
    ),
    (
        &["supprimer", "delete", "remove"],
        "To delete an item, click the bin icon next to it. To empty a whole category, use the option in the management menu.",
    ),
    (
        &["pdf", "télécharger", "download"],
        "You can download your menu as a PDF with the 'Download menu' button below the menu preview.",
    ),
    (
        &["thème", "theme", "mode"],
        "To switch mode (theme), click the icon at the top left, then 'Change mode' to unlock the selection.",
    ),
    (
        &["image", "logo"],
        "You can customise the logo and background image from the settings menu (gear icon at the top right).",
    ),
    (
        &["merci", "thanks", "thank you"],
        "You're welcome! Feel free to ask if you have other questions.",
    ),
];

const FALLBACK: &str = "I'm not sure I understand. Could you rephrase? You can ask me about deleting items, downloading the PDF, or changing the theme.";

/// Pick the canned reply for a user message.
pub fn faq_reply(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| contains_phrase(&words, k)))
        .map(|(_, reply)| *reply)
        .unwrap_or(FALLBACK)
}

/// True when the words of `phrase` appear consecutively in `words`.
fn contains_phrase(words: &[&str], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split(' ').collect();
    words.windows(needle.len()).any(|w| w == needle.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting() {
        assert_eq!(faq_reply("Bonjour"), "Hello! How can I help you today?");
        assert_eq!(faq_reply("hi"), "Hello! How can I help you today?");
    }

    #[test]
    fn test_keyword_case_insensitive() {
        assert!(faq_reply("Comment TÉLÉCHARGER la carte ?").contains("PDF"));
        assert!(faq_reply("where is the Logo setting").contains("logo"));
    }

    #[test]
    fn test_first_rule_wins() {
        // Greeting comes before the delete rule.
        assert_eq!(
            faq_reply("salut, comment supprimer un plat ?"),
            "Hello! How can I help you today?"
        );
    }

    #[test]
    fn test_fallback() {
        assert_eq!(faq_reply("quel temps fait-il"), FALLBACK);
        assert_eq!(faq_reply(""), FALLBACK);
    }

    #[test]
    fn test_no_false_greeting_inside_words() {
        assert_eq!(faq_reply("this"), FALLBACK);
        assert!(faq_reply("how do I delete the sushi").contains("bin icon"));
        assert!(faq_reply("chi is my dish, remove it").contains("bin icon"));
    }

    #[test]
    fn test_multi_word_keyword() {
        assert_eq!(
            faq_reply("Thank you!"),
            "You're welcome! Feel free to ask if you have other questions."
        );
        assert_eq!(faq_reply("thank the chef"), FALLBACK);
    }
}
