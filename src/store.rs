//! Recipe store: current recipe, recent history and display language
//!
//! The store is an explicit value handed to whoever needs it. Every mutation
//! goes through one of its methods and is written through to [`Storage`].
//! Persistence failures are logged and swallowed: the in-memory state stays
//! authoritative for the session.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::i18n::Language;
use crate::identity::recipe_identity;
use crate::recipe::{RecentRecipeEntry, Recipe};
use crate::storage::{Storage, CURRENT_LANGUAGE_KEY, CURRENT_RECIPE_KEY, RECENT_RECIPES_KEY};

/// Maximum number of recipes kept in recent history
pub const MAX_RECENT_RECIPES: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub current_recipe: Option<Recipe>,
    /// Most recent first
    pub recent_recipes: Vec<RecentRecipeEntry>,
    pub current_language: Language,
}

pub struct RecipeStore<S: Storage, C: Clock = SystemClock> {
    storage: S,
    clock: C,
    state: StoreState,
}

impl<S: Storage> RecipeStore<S> {
    /// Open the store on the wall clock
    pub fn open(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: Storage, C: Clock> RecipeStore<S, C> {
    /// Load the persisted state; anything missing or unreadable starts empty
    pub fn with_clock(storage: S, clock: C) -> Self {
        let current_recipe = load_json::<Recipe, _>(&storage, CURRENT_RECIPE_KEY);
        let recent_recipes = load_recent_recipes(&storage);
        let current_language = load_language(&storage).unwrap_or_default();

        Self {
            storage,
            clock,
            state: StoreState {
                current_recipe,
                recent_recipes,
                current_language,
            },
        }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn current_recipe(&self) -> Option<&Recipe> {
        self.state.current_recipe.as_ref()
    }

    pub fn recent_recipes(&self) -> &[RecentRecipeEntry] {
        &self.state.recent_recipes
    }

    pub fn current_language(&self) -> Language {
        self.state.current_language
    }

    pub fn find_recent(&self, id: i64) -> Option<&RecentRecipeEntry> {
        self.state.recent_recipes.iter().find(|entry| entry.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Make `recipe` current and record it in recent history
    ///
    /// The recipe is accepted as current whatever its shape. It only enters
    /// history when it has a usable name; an entry with the same identity is
    /// refreshed in place (keeping its id and creation time) and moved to the
    /// front.
    pub fn set_recipe(&mut self, recipe: Option<Recipe>) {
        self.state.current_recipe = recipe;
        self.save_current_recipe();

        let Some(recipe) = self.state.current_recipe.as_ref() else {
            return;
        };
        if recipe.usable_name().is_none() {
            return;
        }

        let unique_id = recipe_identity(recipe);
        let recipe = recipe.clone();
        let now = self.clock.now();

        let recents = &mut self.state.recent_recipes;
        match recents.iter().position(|entry| entry.unique_id == unique_id) {
            Some(index) => {
                debug!(unique_id = %unique_id, "updating existing recent recipe");
                let mut entry = recents.remove(index);
                entry.recipe = recipe;
                entry.last_accessed_at = now;
                recents.insert(0, entry);
            }
            None => {
                debug!(unique_id = %unique_id, "adding new recent recipe");
                // Millisecond timestamps can collide; keep ids unique and increasing
                let now_ms = now.timestamp_millis();
                let newest = recents.iter().map(|entry| entry.id).max();
                let id = match newest {
                    Some(newest) if newest >= now_ms => newest.checked_add(1).unwrap_or(now_ms),
                    _ => now_ms,
                };
                recents.insert(
                    0,
                    RecentRecipeEntry {
                        recipe,
                        id,
                        unique_id,
                        created_at: now,
                        last_accessed_at: now,
                    },
                );
            }
        }
        recents.truncate(MAX_RECENT_RECIPES);

        self.save_recent_recipes();
    }

    /// Drop the current recipe; history is untouched
    pub fn clear_recipe(&mut self) {
        self.state.current_recipe = None;
        self.save_current_recipe();
    }

    /// Remove one history entry; unknown ids are ignored
    pub fn remove_recent_recipe(&mut self, id: i64) {
        self.state.recent_recipes.retain(|entry| entry.id != id);
        self.save_recent_recipes();
    }

    pub fn clear_all_recent_recipes(&mut self) {
        self.state.recent_recipes.clear();
        if let Err(e) = self.storage.remove(RECENT_RECIPES_KEY) {
            warn!(error = %e, "failed to remove recent recipes from storage");
        }
    }

    /// Reload the current recipe from storage, if one is persisted
    pub fn restore_current_recipe(&mut self) {
        if let Some(recipe) = load_json::<Recipe, _>(&self.storage, CURRENT_RECIPE_KEY) {
            self.state.current_recipe = Some(recipe);
        }
    }

    pub fn set_current_language(&mut self, language: Language) {
        self.state.current_language = language;
        if let Err(e) = self.storage.set(CURRENT_LANGUAGE_KEY, language.code()) {
            warn!(error = %e, language = %language, "failed to save current language");
        }
    }

    fn save_current_recipe(&mut self) {
        let result = match &self.state.current_recipe {
            Some(recipe) => save_json(&mut self.storage, CURRENT_RECIPE_KEY, recipe),
            None => self.storage.remove(CURRENT_RECIPE_KEY),
        };
        if let Err(e) = result {
            warn!(error = %e, "failed to save current recipe");
        }
    }

    fn save_recent_recipes(&mut self) {
        if let Err(e) = save_json(&mut self.storage, RECENT_RECIPES_KEY, &self.state.recent_recipes) {
            warn!(error = %e, "failed to save recent recipes");
        }
    }
}

fn save_json<T: Serialize, S: Storage>(storage: &mut S, key: &str, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

/// Read and decode a JSON value; failures are logged and read as absent
fn load_json<T: DeserializeOwned, S: Storage>(storage: &S, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(error = %e, key, "failed to read from storage");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, key, "discarding unreadable stored value");
            None
        }
    }
}

/// Decode history entry by entry so one bad entry does not cost the rest
fn load_recent_recipes<S: Storage>(storage: &S) -> Vec<RecentRecipeEntry> {
    let Some(entries) = load_json::<Vec<Value>, _>(storage, RECENT_RECIPES_KEY) else {
        return Vec::new();
    };
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, index, "dropping unreadable recent recipe");
                None
            }
        })
        .collect()
}

fn load_language<S: Storage>(storage: &S) -> Option<Language> {
    let code = match storage.get(CURRENT_LANGUAGE_KEY) {
        Ok(code) => code?,
        Err(e) => {
            warn!(error = %e, "failed to read current language");
            return None;
        }
    };
    let language = Language::from_code(&code);
    if language.is_none() {
        warn!(code = %code, "ignoring unsupported stored language");
    }
    language
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Diet, Ingredient, Step};
    use crate::storage::MemoryStorage;
    use crate::text::{LocalizedText, Text};
    use anyhow::bail;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    /// Clock that advances one second per reading
    struct TickingClock {
        now: Cell<DateTime<Utc>>,
    }

    impl TickingClock {
        fn new() -> Self {
            Self {
                now: Cell::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            }
        }
    }

    impl Clock for TickingClock {
        fn now(&self) -> DateTime<Utc> {
            let now = self.now.get();
            self.now.set(now + Duration::seconds(1));
            now
        }
    }

    /// Clock that never moves
    struct FrozenClock(DateTime<Utc>);

    impl Clock for FrozenClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Storage whose writes always fail
    #[derive(Default)]
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            bail!("storage unavailable")
        }

        fn set(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            bail!("quota exceeded")
        }

        fn remove(&mut self, _key: &str) -> anyhow::Result<()> {
            bail!("storage unavailable")
        }
    }

    fn recipe(name: &str, diet: Diet, cuisine: &str) -> Recipe {
        Recipe {
            recipe_name: Some(LocalizedText::english(name).into()),
            ingredients: vec![Ingredient {
                name: LocalizedText::english("Salt").into(),
                quantity: "1 tsp".to_string(),
                image: None,
            }],
            steps: vec![Step {
                step_number: 1,
                instruction: Text::from("Cook"),
                time_required: Some("60".to_string()),
                ingredients_used: Some("Salt".to_string()),
            }],
            total_time: Some("60".to_string()),
            diet: Some(diet),
            cuisine: Some(cuisine.to_string()),
        }
    }

    fn store() -> RecipeStore<MemoryStorage, TickingClock> {
        RecipeStore::with_clock(MemoryStorage::new(), TickingClock::new())
    }

    #[test]
    fn new_store_is_empty_with_english() {
        let store = store();
        assert_eq!(store.state(), &StoreState::default());
        assert_eq!(store.current_language(), Language::En);
    }

    #[test]
    fn set_recipe_makes_it_current_and_persists() {
        let mut store = store();
        let dal = recipe("Dal Tadka", Diet::Veg, "Indian");

        store.set_recipe(Some(dal.clone()));

        assert_eq!(store.current_recipe(), Some(&dal));
        let saved = store.storage().get(CURRENT_RECIPE_KEY).unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Recipe>(&saved).unwrap(), dal);

        let entry = &store.recent_recipes()[0];
        assert_eq!(entry.unique_id, "dal-tadka-veg-indian");
        assert_eq!(entry.created_at, entry.last_accessed_at);
        assert_eq!(entry.id, entry.created_at.timestamp_millis());
    }

    #[test]
    fn same_identity_updates_in_place_and_moves_to_front() {
        let mut store = store();
        store.set_recipe(Some(recipe("Butter Chicken", Diet::Nonveg, "Indian")));
        store.set_recipe(Some(recipe("Paneer Tikka", Diet::Veg, "Indian")));
        let original = store.recent_recipes()[1].clone();

        let mut changed = recipe("butter chicken", Diet::Nonveg, "Indian");
        changed.total_time = Some("2400".to_string());
        store.set_recipe(Some(changed.clone()));

        let recents = store.recent_recipes();
        assert_eq!(recents.len(), 2);
        let updated = &recents[0];
        assert_eq!(updated.unique_id, original.unique_id);
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.last_accessed_at > original.last_accessed_at);
        assert_eq!(updated.recipe, changed);
    }

    #[test]
    fn dal_tadka_variants_share_one_entry() {
        let mut store = store();
        store.set_recipe(Some(recipe("Dal Tadka", Diet::Veg, "Indian")));
        store.set_recipe(Some(recipe("dal tadka", Diet::Veg, "indian")));
        assert_eq!(store.recent_recipes().len(), 1);
    }

    #[test]
    fn history_keeps_the_twenty_most_recent() {
        let mut store = store();
        for i in 0..25 {
            store.set_recipe(Some(recipe(&format!("Dish {}", i), Diet::Vegan, "Fusion")));
        }

        let recents = store.recent_recipes();
        assert_eq!(recents.len(), MAX_RECENT_RECIPES);
        let names: Vec<_> = recents
            .iter()
            .map(|entry| entry.recipe.recipe_name.as_ref().unwrap().select(Language::En).to_string())
            .collect();
        let expected: Vec<_> = (5..25).rev().map(|i| format!("Dish {}", i)).collect();
        assert_eq!(names, expected);

        let saved = store.storage().get(RECENT_RECIPES_KEY).unwrap().unwrap();
        let persisted: Vec<RecentRecipeEntry> = serde_json::from_str(&saved).unwrap();
        assert_eq!(persisted, recents.to_vec());
    }

    #[test]
    fn ids_stay_unique_when_the_clock_does_not_move() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut store = RecipeStore::with_clock(MemoryStorage::new(), FrozenClock(at));
        store.set_recipe(Some(recipe("Poha", Diet::Veg, "Indian")));
        store.set_recipe(Some(recipe("Upma", Diet::Veg, "Indian")));
        store.set_recipe(Some(recipe("Idli", Diet::Veg, "Indian")));

        let ids: Vec<_> = store.recent_recipes().iter().map(|entry| entry.id).collect();
        let base = at.timestamp_millis();
        assert_eq!(ids, vec![base + 2, base + 1, base]);
    }

    #[test]
    fn id_after_largest_possible_stored_id_does_not_overflow() {
        let mut seeded = store();
        seeded.set_recipe(Some(recipe("Poha", Diet::Veg, "Indian")));
        let mut entries = seeded.recent_recipes().to_vec();
        entries[0].id = i64::MAX;

        let mut storage = MemoryStorage::new();
        storage
            .set(RECENT_RECIPES_KEY, &serde_json::to_string(&entries).unwrap())
            .unwrap();
        let mut store = RecipeStore::with_clock(storage, TickingClock::new());
        store.set_recipe(Some(recipe("Upma", Diet::Veg, "Indian")));

        let recents = store.recent_recipes();
        assert_eq!(recents.len(), 2);
        assert_eq!(recents[0].unique_id, "upma-veg-indian");
        assert_eq!(recents[0].id, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap().timestamp_millis());
        assert_eq!(recents[1].id, i64::MAX);
    }

    #[test]
    fn one_unreadable_history_entry_does_not_drop_the_others() {
        let mut seeded = store();
        seeded.set_recipe(Some(recipe("Rajma", Diet::Veg, "Indian")));
        let good = serde_json::to_value(&seeded.recent_recipes()[0]).unwrap();
        let mut bad = good.clone();
        bad["steps"][0]["stepNumber"] = serde_json::json!("1");
        bad["uniqueId"] = serde_json::json!("broken-veg-indian");

        let mut storage = MemoryStorage::new();
        storage
            .set(RECENT_RECIPES_KEY, &serde_json::to_string(&vec![good, bad]).unwrap())
            .unwrap();
        let mut store = RecipeStore::with_clock(storage, TickingClock::new());
        assert_eq!(store.recent_recipes().len(), 1);
        assert_eq!(store.recent_recipes()[0].unique_id, "rajma-veg-indian");

        store.set_recipe(Some(recipe("Chole", Diet::Veg, "Indian")));
        let saved = store.storage().get(RECENT_RECIPES_KEY).unwrap().unwrap();
        let persisted: Vec<RecentRecipeEntry> = serde_json::from_str(&saved).unwrap();
        let ids: Vec<_> = persisted.iter().map(|entry| entry.unique_id.as_str()).collect();
        assert_eq!(ids, vec!["chole-veg-indian", "rajma-veg-indian"]);
    }

    #[test]
    fn unnamed_recipe_is_current_but_not_recent() {
        let mut store = store();
        let mut unnamed = recipe("x", Diet::Veg, "Indian");
        unnamed.recipe_name = None;
        store.set_recipe(Some(unnamed.clone()));
        assert_eq!(store.current_recipe(), Some(&unnamed));
        assert!(store.recent_recipes().is_empty());

        unnamed.recipe_name = Some(Text::from(""));
        store.set_recipe(Some(unnamed));
        assert!(store.recent_recipes().is_empty());
        assert_eq!(store.storage().get(RECENT_RECIPES_KEY).unwrap(), None);
    }

    #[test]
    fn set_recipe_none_removes_persisted_copy() {
        let mut store = store();
        store.set_recipe(Some(recipe("Kheer", Diet::Veg, "Indian")));
        store.set_recipe(None);
        assert_eq!(store.current_recipe(), None);
        assert_eq!(store.storage().get(CURRENT_RECIPE_KEY).unwrap(), None);
        assert_eq!(store.recent_recipes().len(), 1);
    }

    #[test]
    fn clear_recipe_keeps_history() {
        let mut store = store();
        store.set_recipe(Some(recipe("Kheer", Diet::Veg, "Indian")));
        store.clear_recipe();
        assert_eq!(store.current_recipe(), None);
        assert_eq!(store.storage().get(CURRENT_RECIPE_KEY).unwrap(), None);
        assert_eq!(store.recent_recipes().len(), 1);
    }

    #[test]
    fn clear_then_restore_with_nothing_persisted_stays_empty() {
        let mut store = store();
        store.set_recipe(Some(recipe("Kheer", Diet::Veg, "Indian")));
        store.clear_recipe();
        store.restore_current_recipe();
        assert_eq!(store.current_recipe(), None);
    }

    #[test]
    fn restore_reloads_persisted_recipe() {
        let mut storage = MemoryStorage::new();
        let kheer = recipe("Kheer", Diet::Veg, "Indian");
        storage
            .set(CURRENT_RECIPE_KEY, &serde_json::to_string(&kheer).unwrap())
            .unwrap();
        let mut store = RecipeStore::with_clock(storage, TickingClock::new());
        store.state.current_recipe = None;

        store.restore_current_recipe();
        assert_eq!(store.current_recipe(), Some(&kheer));
    }

    #[test]
    fn remove_recent_recipe_by_id() {
        let mut store = store();
        store.set_recipe(Some(recipe("Poha", Diet::Veg, "Indian")));
        store.set_recipe(Some(recipe("Upma", Diet::Veg, "Indian")));
        let before = store.recent_recipes().to_vec();

        store.remove_recent_recipe(-1);
        assert_eq!(store.recent_recipes(), before.as_slice());

        store.remove_recent_recipe(before[1].id);
        assert_eq!(store.recent_recipes(), &before[..1]);
        assert!(store.find_recent(before[1].id).is_none());

        let saved = store.storage().get(RECENT_RECIPES_KEY).unwrap().unwrap();
        let persisted: Vec<RecentRecipeEntry> = serde_json::from_str(&saved).unwrap();
        assert_eq!(persisted.len(), 1);
    }

    #[test]
    fn clear_all_recent_recipes_removes_persisted_list() {
        let mut store = store();
        store.set_recipe(Some(recipe("Poha", Diet::Veg, "Indian")));
        store.clear_all_recent_recipes();
        assert!(store.recent_recipes().is_empty());
        assert_eq!(store.storage().get(RECENT_RECIPES_KEY).unwrap(), None);
        assert!(store.current_recipe().is_some());
    }

    #[test]
    fn language_is_persisted_and_reloaded() {
        let mut store = store();
        store.set_current_language(Language::Pa);
        assert_eq!(store.current_language(), Language::Pa);
        assert_eq!(store.storage().get(CURRENT_LANGUAGE_KEY).unwrap().as_deref(), Some("pa"));

        let reopened = RecipeStore::with_clock(store.storage().clone(), TickingClock::new());
        assert_eq!(reopened.current_language(), Language::Pa);
    }

    #[test]
    fn unreadable_persisted_values_start_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(CURRENT_RECIPE_KEY, "{not json").unwrap();
        storage.set(RECENT_RECIPES_KEY, "42").unwrap();
        storage.set(CURRENT_LANGUAGE_KEY, "klingon").unwrap();

        let store = RecipeStore::with_clock(storage, TickingClock::new());
        assert_eq!(store.state(), &StoreState::default());
    }

    #[test]
    fn storage_failures_do_not_affect_memory_state() {
        let mut store = RecipeStore::with_clock(BrokenStorage, TickingClock::new());
        assert_eq!(store.state(), &StoreState::default());

        store.set_recipe(Some(recipe("Poha", Diet::Veg, "Indian")));
        store.set_recipe(Some(recipe("Upma", Diet::Veg, "Indian")));
        store.set_current_language(Language::Hi);
        assert_eq!(store.recent_recipes().len(), 2);
        assert_eq!(store.current_language(), Language::Hi);

        store.restore_current_recipe();
        assert!(store.current_recipe().is_some());

        let first = store.recent_recipes()[0].id;
        store.remove_recent_recipe(first);
        assert_eq!(store.recent_recipes().len(), 1);

        store.clear_recipe();
        store.clear_all_recent_recipes();
        assert_eq!(store.current_recipe(), None);
        assert!(store.recent_recipes().is_empty());
    }
}
