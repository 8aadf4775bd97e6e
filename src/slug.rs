/// Derive a lowercase-dashed slug from a display name. Pure, so slugs
/// can be recomputed deterministically whenever the name changes.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_dashes() {
        assert_eq!(slugify("Primary Button"), "primary-button");
        assert_eq!(slugify("Nav/Bar v2"), "nav-bar-v2");
        assert_eq!(slugify("  Spaced   Out  "), "spaced-out");
    }

    #[test]
    fn slugify_is_idempotent() {
        let once = slugify("Card — Header!");
        assert_eq!(slugify(&once), once);
    }
}
