//! Recipe documents as produced by the generation service
//!
//! Every field is optional on the way in: the store keeps whatever it is
//! handed, and validation happens in [`crate::reply`] before that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::text::Text;
use crate::timefmt::parse_seconds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diet {
    Veg,
    Nonveg,
    Vegan,
}

impl Diet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Diet::Veg => "veg",
            Diet::Nonveg => "nonveg",
            Diet::Vegan => "vegan",
        }
    }
}

impl fmt::Display for Diet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Diet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "veg" => Ok(Diet::Veg),
            "nonveg" => Ok(Diet::Nonveg),
            "vegan" => Ok(Diet::Vegan),
            _ => Err(anyhow::anyhow!("{}", rust_i18n::t!("recipe.unknown_diet", diet = s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: Text,
    #[serde(default)]
    pub quantity: String,
    /// Descriptive image prompt, or the resolved image URL
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub step_number: u32,
    pub instruction: Text,
    /// Active time in seconds; null or "0" means no timer
    #[serde(default)]
    pub time_required: Option<String>,
    /// Comma-joined English ingredient names
    #[serde(default)]
    pub ingredients_used: Option<String>,
}

impl Step {
    /// Seconds for the step timer, if the step has active time
    pub fn active_seconds(&self) -> Option<u64> {
        let raw = self.time_required.as_deref()?.trim();
        if raw == "null" {
            return None;
        }
        Some(parse_seconds(Some(raw))).filter(|secs| *secs > 0)
    }

    /// English names listed in `ingredientsUsed`
    pub fn ingredient_names(&self) -> Vec<&str> {
        match self.ingredients_used.as_deref() {
            None | Some("null") => Vec::new(),
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_name: Option<Text>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Total active time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diet: Option<Diet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}

impl Recipe {
    /// Name usable for history: present and not an empty string
    pub fn usable_name(&self) -> Option<&Text> {
        self.recipe_name.as_ref().filter(|name| name.is_present())
    }

    /// Ingredients a step refers to, matched on English name
    pub fn ingredients_for_step(&self, step: &Step) -> Vec<&Ingredient> {
        let wanted: Vec<String> = step
            .ingredient_names()
            .into_iter()
            .map(str::to_lowercase)
            .collect();
        if wanted.is_empty() {
            return Vec::new();
        }

        self.ingredients
            .iter()
            .filter(|ing| {
                ing.name
                    .english()
                    .filter(|name| !name.is_empty())
                    .map(|name| wanted.contains(&name.to_lowercase()))
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// A recipe kept in recent history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentRecipeEntry {
    #[serde(flatten)]
    pub recipe: Recipe,
    /// Insertion timestamp in milliseconds, unique within the history
    pub id: i64,
    pub unique_id: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::LocalizedText;

    fn step(time: Option<&str>, used: Option<&str>) -> Step {
        Step {
            step_number: 1,
            instruction: Text::from("Stir"),
            time_required: time.map(str::to_string),
            ingredients_used: used.map(str::to_string),
        }
    }

    fn ingredient(en: &str) -> Ingredient {
        Ingredient {
            name: LocalizedText::english(en).into(),
            quantity: "1 cup".to_string(),
            image: None,
        }
    }

    #[test]
    fn active_seconds_ignores_passive_steps() {
        assert_eq!(step(Some("300"), None).active_seconds(), Some(300));
        assert_eq!(step(Some(" 45 "), None).active_seconds(), Some(45));
        assert_eq!(step(Some("90s"), None).active_seconds(), Some(90));
        assert_eq!(step(Some("-30"), None).active_seconds(), None);
        assert_eq!(step(Some("0"), None).active_seconds(), None);
        assert_eq!(step(Some("null"), None).active_seconds(), None);
        assert_eq!(step(None, None).active_seconds(), None);
        assert_eq!(step(Some("soon"), None).active_seconds(), None);
    }

    #[test]
    fn ingredient_names_are_split_and_trimmed() {
        let s = step(None, Some("Onion, Ghee ,, Cumin Seeds"));
        assert_eq!(s.ingredient_names(), vec!["Onion", "Ghee", "Cumin Seeds"]);
        assert!(step(None, Some("")).ingredient_names().is_empty());
        assert!(step(None, Some("null")).ingredient_names().is_empty());
    }

    #[test]
    fn step_ingredients_match_case_insensitively() {
        let recipe = Recipe {
            ingredients: vec![ingredient("Onion"), ingredient("Ghee"), ingredient("Salt")],
            ..Recipe::default()
        };
        let s = step(None, Some("onion, GHEE, Water"));
        let names: Vec<_> = recipe
            .ingredients_for_step(&s)
            .iter()
            .filter_map(|ing| ing.name.english())
            .collect();
        assert_eq!(names, vec!["Onion", "Ghee"]);
    }

    #[test]
    fn diet_parses_from_codes() {
        assert_eq!("veg".parse::<Diet>().unwrap(), Diet::Veg);
        assert_eq!(" NonVeg ".parse::<Diet>().unwrap(), Diet::Nonveg);
        assert!("pescatarian".parse::<Diet>().is_err());
    }

    #[test]
    fn usable_name_rejects_empty_plain_string() {
        let mut recipe = Recipe::default();
        assert!(recipe.usable_name().is_none());
        recipe.recipe_name = Some(Text::from(""));
        assert!(recipe.usable_name().is_none());
        recipe.recipe_name = Some(LocalizedText::default().into());
        assert!(recipe.usable_name().is_some());
    }

    #[test]
    fn recent_entry_flattens_recipe_fields() {
        let json = r#"{
            "recipeName": {"en": "Dal Tadka"},
            "ingredients": [],
            "steps": [],
            "totalTime": "1200",
            "diet": "veg",
            "cuisine": "Indian",
            "id": 1700000000000,
            "uniqueId": "dal-tadka-veg-indian",
            "createdAt": "2024-01-01T10:00:00Z",
            "lastAccessedAt": "2024-01-02T10:00:00.000Z"
        }"#;
        let entry: RecentRecipeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, 1_700_000_000_000);
        assert_eq!(entry.recipe.diet, Some(Diet::Veg));
        assert_eq!(entry.recipe.total_time.as_deref(), Some("1200"));

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["uniqueId"], "dal-tadka-veg-indian");
        assert_eq!(value["recipeName"]["en"], "Dal Tadka");
    }
}
