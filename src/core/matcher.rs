use crate::domain::model::{AllergenTag, AllergyProfile};

/// Returns the active allergens whose name occurs anywhere in `text`.
///
/// Plain case-insensitive substring search: "soybean" matches soy. False
/// positives are accepted, false negatives are not.
pub fn match_allergens(text: &str, profile: &AllergyProfile) -> Vec<AllergenTag> {
    if text.is_empty() {
        return Vec::new();
    }

    let haystack = text.to_lowercase();
    profile
        .active_tags()
        .into_iter()
        .filter(|tag| haystack.contains(tag.name()))
        .collect()
}
