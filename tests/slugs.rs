use axum_storefront_api::slug::{slugify, with_unique_suffix};

#[test]
fn lowercases_and_hyphenates() {
    assert_eq!(slugify("Ball Gowns"), "ball-gowns");
    assert_eq!(slugify("New Arrivals"), "new-arrivals");
}

#[test]
fn strips_punctuation() {
    assert_eq!(slugify("Evening & Opera"), "evening--opera");
    assert_eq!(slugify("Gown!"), "gown");
}

#[test]
fn trims_surrounding_whitespace() {
    assert_eq!(slugify("  Bridal  "), "bridal");
}

#[test]
fn unique_suffix_preserves_the_base() {
    let slug = with_unique_suffix("duchess-satin-gown");
    assert!(slug.starts_with("duchess-satin-gown-"));
    assert_eq!(slug.len(), "duchess-satin-gown-".len() + 8);
}
