//! Recipe identity used to deduplicate recent history
//!
//! Two recipes with the same English name, diet and cuisine are the same
//! recipe, whatever their ingredients or steps say.

use crate::recipe::{Diet, Recipe};
use crate::text::Text;

/// Name used when a recipe carries no English name
const UNKNOWN_NAME: &str = "unknown-recipe";

/// Stand-in for a missing diet or cuisine
const ANY: &str = "any";

/// Derive the identity key for a name/diet/cuisine triple
///
/// The key is `{name}-{diet}-{cuisine}` lowercased, with whitespace runs
/// collapsed to `-` and everything outside `[a-z0-9-]` removed.
/// A plain string name is taken as-is, even when empty.
pub fn identity_of(recipe_name: Option<&Text>, diet: Option<Diet>, cuisine: Option<&str>) -> String {
    let name = recipe_name.and_then(Text::english).unwrap_or(UNKNOWN_NAME);
    let diet = diet.map(|d| d.as_str()).unwrap_or(ANY);
    let cuisine = cuisine.filter(|c| !c.is_empty()).unwrap_or(ANY);

    let base = format!("{}-{}-{}", name, diet, cuisine).to_lowercase();

    let mut key = String::with_capacity(base.len());
    let mut in_whitespace = false;
    for c in base.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                key.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            key.push(c);
        }
    }
    key
}

/// Identity of a whole recipe
pub fn recipe_identity(recipe: &Recipe) -> String {
    identity_of(recipe.recipe_name.as_ref(), recipe.diet, recipe.cuisine.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::LocalizedText;

    fn en(name: &str) -> Text {
        LocalizedText::english(name).into()
    }

    #[test]
    fn case_and_punctuation_do_not_matter() {
        let a = identity_of(Some(&en("Butter Chicken")), Some(Diet::Nonveg), Some("Indian"));
        let b = identity_of(Some(&en("butter chicken")), Some(Diet::Nonveg), Some("Indian"));
        assert_eq!(a, b);
        assert_eq!(a, "butter-chicken-nonveg-indian");

        let c = identity_of(Some(&en("Butter-Chicken!")), Some(Diet::Nonveg), Some("indian"));
        assert_eq!(a, c);
    }

    #[test]
    fn whitespace_runs_collapse_to_one_hyphen() {
        let key = identity_of(Some(&Text::from("Masala \t  Dosa")), None, Some("South  Indian"));
        assert_eq!(key, "masala-dosa-any-south-indian");
    }

    #[test]
    fn missing_parts_use_placeholders() {
        assert_eq!(identity_of(None, None, None), "unknown-recipe-any-any");
        let no_english = Text::Localized(LocalizedText {
            hi: Some("खीर".to_string()),
            ..LocalizedText::default()
        });
        assert_eq!(
            identity_of(Some(&no_english), Some(Diet::Veg), Some("")),
            "unknown-recipe-veg-any"
        );
    }

    #[test]
    fn plain_string_name_is_used_as_is() {
        assert_eq!(identity_of(Some(&Text::from("")), None, None), "-any-any");
        let empty_english = Text::from(LocalizedText::english(""));
        assert_eq!(identity_of(Some(&empty_english), None, None), "unknown-recipe-any-any");
    }

    #[test]
    fn non_ascii_letters_are_stripped() {
        let key = identity_of(Some(&Text::from("Crème Brûlée")), Some(Diet::Veg), Some("French"));
        assert_eq!(key, "crme-brle-veg-french");
    }

    #[test]
    fn recipe_identity_reads_recipe_fields() {
        let recipe = Recipe {
            recipe_name: Some(en("Dal Tadka")),
            diet: Some(Diet::Veg),
            cuisine: Some("Indian".to_string()),
            ..Recipe::default()
        };
        assert_eq!(recipe_identity(&recipe), "dal-tadka-veg-indian");
    }
}
