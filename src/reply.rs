//! Classification of generative-AI replies
//!
//! A reply is either a recipe document or a small `{"message", "reason"}`
//! object explaining why no recipe was produced. This module checks the
//! structure once, at the service boundary, so that what reaches the store
//! is a well-formed [`Recipe`] or a typed [`Rejection`].

use rust_i18n::t;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::recipe::Recipe;

const DIET_MISMATCH: &str = "DIET_MISMATCH";
const DIET_MISMATCH_MODIFICATION: &str = "DIET_MISMATCH_MODIFICATION";
const NONSENSICAL_INPUT: &str = "NONSENSICAL_INPUT";
const INVALID_REQUEST_STRUCTURE: &str = "INVALID_REQUEST_STRUCTURE";

/// Why a reply did not yield a recipe
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("recipe does not match the requested diet")]
    DietMismatch,
    #[error("requested change conflicts with the recipe's diet")]
    DietMismatchModification,
    #[error("input does not describe a dish")]
    NonsensicalInput,
    #[error("request structure was rejected")]
    InvalidRequestStructure,
    #[error("AI flagged an issue: {0}")]
    Flagged(String),
    #[error("recipe data is incomplete or has an invalid structure: {0}")]
    Incomplete(String),
    #[error("reply is not valid JSON: {0}")]
    Malformed(String),
}

impl Rejection {
    /// User-facing explanation in the active CLI locale
    pub fn localized_message(&self) -> String {
        match self {
            Rejection::DietMismatch => t!("reply.diet_mismatch").to_string(),
            Rejection::DietMismatchModification => t!("reply.diet_mismatch_modification").to_string(),
            Rejection::NonsensicalInput => t!("reply.nonsensical_input").to_string(),
            Rejection::InvalidRequestStructure => t!("reply.invalid_request_structure").to_string(),
            Rejection::Flagged(reason) => t!("reply.flagged", reason = reason).to_string(),
            Rejection::Incomplete(detail) => t!("reply.incomplete", detail = detail).to_string(),
            Rejection::Malformed(detail) => t!("reply.malformed", detail = detail).to_string(),
        }
    }
}

/// Classify a reply to a generation request
pub fn parse_generation_reply(raw: &str) -> Result<Recipe, Rejection> {
    let payload = extract_payload(raw)?;
    into_recipe(payload)
}

/// Classify a reply to a modification of `original`
///
/// The original's name is kept when the reply drops it, and so are its diet
/// and cuisine, which keeps the modified recipe on the same history entry.
pub fn parse_modification_reply(raw: &str, original: &Recipe) -> Result<Recipe, Rejection> {
    let mut payload = extract_payload(raw)?;
    let obj = payload
        .as_object_mut()
        .ok_or_else(|| Rejection::Incomplete("reply is not an object".to_string()))?;

    if let Some(message) = obj.get("message").and_then(Value::as_str) {
        if message.to_lowercase().contains("modification failed") {
            let reason = obj.get("reason").and_then(Value::as_str).filter(|r| !r.is_empty());
            return Err(match reason {
                Some(DIET_MISMATCH_MODIFICATION) => Rejection::DietMismatchModification,
                Some(reason) => Rejection::Flagged(reason.to_string()),
                None => Rejection::Flagged("AI could not apply requested changes.".to_string()),
            });
        }
    }

    if english_name(obj).is_none() {
        if let Some(name) = &original.recipe_name {
            obj.insert("recipeName".to_string(), to_value(name)?);
        }
    }

    let mut recipe = into_recipe(payload)?;
    if recipe.diet.is_none() {
        recipe.diet = original.diet;
    }
    if recipe.cuisine.is_none() {
        recipe.cuisine = original.cuisine.clone();
    }
    Ok(recipe)
}

/// Pull the reply document out of a raw reply
///
/// Accepts the bare document or the generative-language API envelope, where
/// `candidates[0].content.parts[0]` holds the document as JSON text or,
/// occasionally, as an object.
pub fn extract_payload(raw: &str) -> Result<Value, Rejection> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| Rejection::Malformed(e.to_string()))?;

    let Some(part) = value.pointer("/candidates/0/content/parts/0").cloned() else {
        if value.get("candidates").is_some() {
            return Err(Rejection::Malformed("reply envelope holds no content".to_string()));
        }
        return Ok(value);
    };

    if let Some(text) = part.get("text").and_then(Value::as_str) {
        return serde_json::from_str(text.trim()).map_err(|e| Rejection::Malformed(e.to_string()));
    }
    if part.get("recipeName").is_some() || part.get("message").is_some() {
        return Ok(part);
    }
    Err(Rejection::Malformed("reply envelope holds no recipe".to_string()))
}

fn into_recipe(mut payload: Value) -> Result<Recipe, Rejection> {
    let obj = payload
        .as_object_mut()
        .ok_or_else(|| Rejection::Incomplete("reply is not an object".to_string()))?;

    if is_truthy(obj.get("message")) {
        return Err(rejection_for(obj));
    }

    validate_structure(obj)?;
    normalize(obj);

    serde_json::from_value(payload).map_err(|e| Rejection::Incomplete(e.to_string()))
}

fn rejection_for(obj: &Map<String, Value>) -> Rejection {
    let reason = obj.get("reason").and_then(Value::as_str).filter(|r| !r.is_empty());
    match reason {
        Some(DIET_MISMATCH) | Some(DIET_MISMATCH_MODIFICATION) => Rejection::DietMismatch,
        Some(NONSENSICAL_INPUT) => Rejection::NonsensicalInput,
        Some(INVALID_REQUEST_STRUCTURE) => Rejection::InvalidRequestStructure,
        Some(reason) => Rejection::Flagged(reason.to_string()),
        None => Rejection::Flagged(
            obj.get("message")
                .and_then(Value::as_str)
                .unwrap_or("AI flagged an issue.")
                .to_string(),
        ),
    }
}

fn validate_structure(obj: &Map<String, Value>) -> Result<(), Rejection> {
    let incomplete = |what: &str| Err(Rejection::Incomplete(what.to_string()));

    if english_name(obj).is_none() {
        return incomplete("recipeName.en is missing");
    }
    let Some(ingredients) = obj.get("ingredients").and_then(Value::as_array) else {
        return incomplete("ingredients is not a list");
    };
    let Some(steps) = obj.get("steps").and_then(Value::as_array) else {
        return incomplete("steps is not a list");
    };
    if !is_truthy(obj.get("totalTime")) {
        return incomplete("totalTime is missing");
    }

    for ingredient in ingredients {
        let has_name = ingredient.pointer("/name/en").map(|v| is_truthy(Some(v))).unwrap_or(false);
        if !has_name || ingredient.get("quantity").is_none() || ingredient.get("image").is_none() {
            return incomplete("invalid ingredient structure");
        }
    }

    for step in steps {
        let has_instruction = step
            .pointer("/instruction/en")
            .map(|v| is_truthy(Some(v)))
            .unwrap_or(false);
        let numbered = step.get("stepNumber").map(Value::is_number).unwrap_or(false);
        if !has_instruction
            || !numbered
            || step.get("timeRequired").is_none()
            || step.get("ingredientsUsed").is_none()
        {
            return incomplete("invalid step structure");
        }
    }

    Ok(())
}

/// Coerce loosely typed fields into the shapes [`Recipe`] expects
fn normalize(obj: &mut Map<String, Value>) {
    stringify_number(obj.get_mut("totalTime"));

    if let Some(diet) = obj.get("diet") {
        let known = matches!(diet.as_str(), Some("veg" | "nonveg" | "vegan"));
        if !known {
            obj.remove("diet");
        }
    }
    if let Some(Value::Null) = obj.get("cuisine") {
        obj.remove("cuisine");
    }

    if let Some(Value::Array(ingredients)) = obj.get_mut("ingredients") {
        for ingredient in ingredients.iter_mut().filter_map(Value::as_object_mut) {
            let quantity = ingredient.entry("quantity").or_insert(Value::Null);
            if quantity.is_null() {
                *quantity = Value::String(String::new());
            }
            stringify_number(Some(quantity));
        }
    }

    if let Some(Value::Array(steps)) = obj.get_mut("steps") {
        for step in steps.iter_mut().filter_map(Value::as_object_mut) {
            stringify_number(step.get_mut("timeRequired"));
        }
    }
}

fn stringify_number(value: Option<&mut Value>) {
    if let Some(value) = value {
        if let Value::Number(n) = value {
            *value = Value::String(n.to_string());
        }
    }
}

fn english_name(obj: &Map<String, Value>) -> Option<&str> {
    obj.get("recipeName")?
        .get("en")?
        .as_str()
        .filter(|name| !name.is_empty())
}

/// JSON truthiness as the reply producer understands it
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, Rejection> {
    serde_json::to_value(value).map_err(|e| Rejection::Incomplete(e.to_string()))
}
