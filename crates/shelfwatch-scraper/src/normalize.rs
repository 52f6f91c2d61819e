//! Product-name cleaning and the heuristics that tell real product names
//! apart from navigation, social links and legal boilerplate.

use std::sync::LazyLock;

use regex::Regex;

pub const MIN_NAME_LENGTH: usize = 4;
pub const MAX_NAME_LENGTH: usize = 100;

/// Names made mostly of capitals are menu entries or acronyms.
const MAX_UPPERCASE_RATIO: f64 = 0.7;

/// Noise terms, matched case-insensitively against the whole name or as a
/// leading word followed by a space.
const NOISE_TERMS: &[&str] = &[
    // navigation
    "home",
    "αρχική",
    "menu",
    "μενού",
    "contact",
    "επικοινωνία",
    "about",
    "σχετικά",
    "careers",
    "καριέρα",
    "news",
    "νέα",
    "history",
    "ιστορία",
    "philosophy",
    "φιλοσοφία",
    "quality",
    "ποιότητα",
    "recipes",
    "συνταγές",
    "login",
    "register",
    "cart",
    "checkout",
    "search",
    "αναζήτηση",
    "open menu",
    "close menu",
    // social
    "facebook",
    "instagram",
    "linkedin",
    "youtube",
    // legal
    "privacy",
    "cookies",
    "terms",
    "copyright",
    "newsletter",
    "all rights reserved",
];

/// Shapes that only ever belong to page chrome.
static MENU_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(en|el|ru)\s*$",
        r"^\d+$",
        r"^[→←↓↑»«]+",
        r"\|{2,}",
        r"^(view|see|read|click|learn)\s+(all|more)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid menu pattern"))
    .collect()
});

const EDGE_PUNCTUATION: &[char] = &['-', '–', '—', ':'];

/// Collapse whitespace runs, trim, and strip leading/trailing dashes and colons.
#[must_use]
pub fn normalize(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.trim_matches(EDGE_PUNCTUATION).trim().to_string()
}

/// Whether `name` plausibly names a product rather than page noise.
///
/// Expects already-normalized input.
#[must_use]
pub fn is_valid_product_name(name: &str) -> bool {
    let len = name.chars().count();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len) {
        return false;
    }

    let lower = name.trim().to_lowercase();

    let is_noise = NOISE_TERMS.iter().any(|term| {
        lower == *term
            || lower
                .strip_prefix(term)
                .is_some_and(|rest| rest.starts_with(' '))
    });
    if is_noise {
        return false;
    }

    if len > 5 {
        let upper = name.chars().filter(|c| c.is_uppercase()).count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = upper as f64 / len as f64;
        if ratio > MAX_UPPERCASE_RATIO {
            return false;
        }
    }

    !MENU_PATTERNS.iter().any(|re| re.is_match(&lower))
}

/// Normalize `text` and return it if it passes [`is_valid_product_name`].
#[must_use]
pub fn clean_product_name(text: &str) -> Option<String> {
    let name = normalize(text);
    is_valid_product_name(&name).then_some(name)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
