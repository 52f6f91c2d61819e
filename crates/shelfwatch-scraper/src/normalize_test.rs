use super::*;

// -----------------------------------------------------------------------
// normalize
// -----------------------------------------------------------------------

#[test]
fn normalize_collapses_whitespace() {
    assert_eq!(normalize("  Tomato \n\t Ketchup  "), "Tomato Ketchup");
}

#[test]
fn normalize_strips_edge_dashes_and_colons() {
    assert_eq!(normalize("– Mayonnaise Light —"), "Mayonnaise Light");
    assert_eq!(normalize(": Tzatziki:"), "Tzatziki");
    assert_eq!(normalize("--Mustard"), "Mustard");
}

#[test]
fn normalize_keeps_inner_punctuation() {
    assert_eq!(normalize("Sauce - Hot: 250ml"), "Sauce - Hot: 250ml");
}

#[test]
fn normalize_empty_input() {
    assert_eq!(normalize("   "), "");
    assert_eq!(normalize("—"), "");
}

// -----------------------------------------------------------------------
// is_valid_product_name: accepted
// -----------------------------------------------------------------------

#[test]
fn accepts_real_product_names() {
    assert!(is_valid_product_name("Heinz Tomato Ketchup 500ml"));
    assert!(is_valid_product_name("Mayonnaise Light 500g"));
    assert!(is_valid_product_name("Τζατζίκι 250g"));
    assert!(is_valid_product_name("BBQ Sauce"));
}

#[test]
fn accepts_noise_term_inside_a_longer_word() {
    // "home" followed by letters, not a space, is not the navigation entry.
    assert!(is_valid_product_name("Homemade Mayonnaise"));
    assert!(is_valid_product_name("Newsletter-free Dip"));
}

#[test]
fn accepts_length_bounds_inclusive() {
    assert!(is_valid_product_name("Dipp"));
    assert!(is_valid_product_name(&"a".repeat(MAX_NAME_LENGTH)));
}

// -----------------------------------------------------------------------
// is_valid_product_name: rejected
// -----------------------------------------------------------------------

#[test]
fn rejects_navigation_words() {
    assert!(!is_valid_product_name("Home"));
    assert!(!is_valid_product_name("Contact"));
    assert!(!is_valid_product_name("Αρχική"));
    assert!(!is_valid_product_name("Συνταγές"));
}

#[test]
fn rejects_noise_term_followed_by_more_words() {
    assert!(!is_valid_product_name("Recipes with mayonnaise"));
    assert!(!is_valid_product_name("All rights reserved 2026"));
    assert!(!is_valid_product_name("Open menu"));
}

#[test]
fn rejects_social_and_legal_links() {
    assert!(!is_valid_product_name("Instagram"));
    assert!(!is_valid_product_name("Privacy"));
    assert!(!is_valid_product_name("Cookies policy"));
}

#[test]
fn rejects_out_of_bounds_length() {
    assert!(!is_valid_product_name("EN"));
    assert!(!is_valid_product_name("Dip"));
    assert!(!is_valid_product_name(&"a".repeat(MAX_NAME_LENGTH + 1)));
}

#[test]
fn rejects_mostly_uppercase() {
    assert!(!is_valid_product_name("KETCHU"));
    assert!(!is_valid_product_name("SHOP NOW"));
}

#[test]
fn uppercase_ratio_ignores_short_names() {
    // Five characters or fewer are not subject to the ratio.
    assert!(is_valid_product_name("AIOLI"));
}

#[test]
fn rejects_language_codes_and_digits() {
    assert!(!is_valid_product_name("en  "));
    assert!(!is_valid_product_name("12345"));
}

#[test]
fn rejects_arrows_and_pipes() {
    assert!(!is_valid_product_name("→ Read more"));
    assert!(!is_valid_product_name("»» Next"));
    assert!(!is_valid_product_name("Sauces || Dips"));
}

#[test]
fn rejects_call_to_action() {
    assert!(!is_valid_product_name("View all products"));
    assert!(!is_valid_product_name("Learn more"));
    assert!(!is_valid_product_name("see   more"));
}

// -----------------------------------------------------------------------
// clean_product_name
// -----------------------------------------------------------------------

#[test]
fn clean_product_name_normalizes_then_validates() {
    assert_eq!(
        clean_product_name("  — Mayonnaise\n Light 500g "),
        Some("Mayonnaise Light 500g".to_string())
    );
    assert_eq!(clean_product_name(" Home "), None);
}
