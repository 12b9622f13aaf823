/// Username generation
///
/// The base username is the first name followed by the last name, each
/// capitalised word by word: `"jean-pierre"`, `"de la tour"` gives
/// `JeanPierreDeLaTour`. When usernames starting with that base already
/// exist, their count is appended.

/// Used when both names are empty once normalized
const FALLBACK_BASE: &str = "Membre";

/// Capitalises each alphanumeric word of `name` and joins them
pub fn normalize_name(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn base_username(firstname: &str, lastname: &str) -> String {
    let base = format!("{}{}", normalize_name(firstname), normalize_name(lastname));
    if base.is_empty() {
        FALLBACK_BASE.to_string()
    } else {
        base
    }
}

/// Picks the username for `base` given the usernames already starting with it
///
/// No match keeps the base; otherwise the number of matches is appended,
/// then incremented until the name is free.
pub fn resolve_username(base: &str, existing: &[String]) -> String {
    if existing.is_empty() {
        return base.to_string();
    }

    let mut suffix = existing.len();
    loop {
        let candidate = format!("{base}{suffix}");
        if !existing.iter().any(|name| name == &candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
