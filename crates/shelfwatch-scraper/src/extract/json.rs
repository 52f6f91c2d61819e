//! Locating JSON arrays inside free text.

/// Given a string starting with `[`, return the slice up to and including the
/// matching `]`. Brackets inside JSON strings are ignored.
pub(super) fn extract_balanced_array(s: &str) -> Option<&str> {
    if !s.starts_with('[') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            '}' => depth -= 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The first bracketed substring of `text` that parses as a JSON array.
pub(super) fn first_json_array(text: &str) -> Option<Vec<serde_json::Value>> {
    text.match_indices('[').find_map(|(start, _)| {
        let candidate = extract_balanced_array(&text[start..])?;
        serde_json::from_str::<Vec<serde_json::Value>>(candidate).ok()
    })
}
