//! Display helpers.

/// Upper-case the first character.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `needs_attention` → `Needs attention`.
pub fn status_label(status: &str) -> String {
    capitalize(&status.replace('_', " "))
}

/// Comma-separated, capitalized role names.
pub fn format_roles<S: AsRef<str>>(roles: &[S]) -> String {
    if roles.is_empty() {
        return "None".to_string();
    }
    roles
        .iter()
        .map(|r| capitalize(r.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
