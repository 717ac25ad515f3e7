//! recipectl - keep AI-generated multilingual recipes close at hand
//!
//! The library holds the recipe state layer: the current recipe, a bounded
//! most-recent-first history deduplicated by recipe identity, and the active
//! display language, all persisted to a durable key-value store.

rust_i18n::i18n!("locales", fallback = "en");

pub mod clock;
pub mod config;
pub mod i18n;
pub mod identity;
pub mod logging;
pub mod recipe;
pub mod reply;
pub mod search;
pub mod storage;
pub mod store;
pub mod text;
pub mod timefmt;

pub use i18n::Language;
pub use identity::identity_of;
pub use recipe::{Diet, Ingredient, RecentRecipeEntry, Recipe, Step};
pub use reply::Rejection;
pub use store::{RecipeStore, StoreState};
pub use text::{select, LocalizedText, Text};
