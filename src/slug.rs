use uuid::Uuid;

/// URL-safe key derivation: lowercase, spaces become hyphens, everything
/// outside `[a-z0-9_-]` is dropped.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.trim().to_lowercase().chars() {
        match ch {
            ' ' => out.push('-'),
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => out.push(c),
            _ => {}
        }
    }
    out
}

/// Disambiguate a colliding auto-generated slug with a short random suffix.
pub fn with_unique_suffix(base: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", base, &suffix[..8])
}
