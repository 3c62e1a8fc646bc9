//! The recipe entity and the normaliser that turns raw store values into it.
//!
//! Records pushed into the store sometimes come back nested one level deep
//! under a synthetic key (`{"-Nabc": {"title": ...}}`). [`RawRecord`] makes
//! that shape explicit and [`normalize`] flattens it before anything else
//! sees the record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Category given to recipes stored without one.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Title given to recipes stored without one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// A fully populated recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub category: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub source: String,
}

/// A store value as returned, before flattening.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    /// The record's fields sit directly in the object.
    Flat(Map<String, Value>),
    /// The record sits under a single synthetic key.
    Wrapped {
        key: String,
        inner: Map<String, Value>,
    },
}

impl RawRecord {
    /// Classify a JSON value from the store.
    ///
    /// An object without an `ingredients` field whose only entry is another
    /// object is a wrapper; every other object is flat.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(Error::Malformed(format!(
                    "expected an object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let wrapper_key = match map.iter().next() {
            Some((key, Value::Object(_)))
                if map.len() == 1 && !map.contains_key("ingredients") =>
            {
                Some(key.clone())
            }
            _ => None,
        };
        if let Some(key) = wrapper_key {
            if let Some(Value::Object(inner)) = map.remove(&key) {
                return Ok(RawRecord::Wrapped { key, inner });
            }
        }
        Ok(RawRecord::Flat(map))
    }

    /// The record's own fields, whichever shape it arrived in.
    pub fn into_fields(self) -> Map<String, Value> {
        match self {
            RawRecord::Flat(fields) => fields,
            RawRecord::Wrapped { inner, .. } => inner,
        }
    }
}

impl From<&Recipe> for RawRecord {
    fn from(recipe: &Recipe) -> Self {
        let mut fields = Map::new();
        fields.insert("title".into(), Value::String(recipe.title.clone()));
        fields.insert("category".into(), Value::String(recipe.category.clone()));
        fields.insert(
            "ingredients".into(),
            Value::Array(
                recipe
                    .ingredients
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
        fields.insert(
            "instructions".into(),
            Value::String(recipe.instructions.clone()),
        );
        fields.insert("source".into(), Value::String(recipe.source.clone()));
        RawRecord::Flat(fields)
    }
}

/// Flatten and default a raw record into a [`Recipe`].
///
/// Idempotent: normalising the flat form of a normalised recipe returns it
/// unchanged.
pub fn normalize(id: &str, raw: RawRecord) -> Recipe {
    let mut fields = raw.into_fields();

    let title = take_text(&mut fields, "title")
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let category = take_text(&mut fields, "category")
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let ingredients = match fields.remove("ingredients") {
        Some(Value::Array(items)) => items.into_iter().filter_map(value_text).collect(),
        Some(Value::String(list)) => parse_ingredients(&list),
        _ => Vec::new(),
    };
    let instructions = take_text(&mut fields, "instructions").unwrap_or_default();
    let source = take_text(&mut fields, "source").unwrap_or_default();

    Recipe {
        id: id.to_string(),
        title,
        category,
        ingredients,
        instructions,
        source,
    }
}

/// Split a comma-separated ingredient list as typed into a form.
pub fn parse_ingredients(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn take_text(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    fields.remove(key).and_then(value_text)
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Sort recipes by title, ignoring case.
pub fn sort_by_title(recipes: &mut [Recipe]) {
    recipes.sort_by_cached_key(|r| r.title.to_lowercase());
}

/// Browse filter: exact category and/or case-insensitive text search.
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl RecipeQuery {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(category) = &self.category {
            if &recipe.category != category {
                return false;
            }
        }
        match &self.search {
            Some(needle) if !needle.trim().is_empty() => {
                let needle = needle.trim().to_lowercase();
                recipe.title.to_lowercase().contains(&needle)
                    || recipe
                        .ingredients
                        .iter()
                        .any(|i| i.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

/// A new recipe as entered by hand.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewRecipe {
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub category: String,
    pub source: String,
}

/// Partial overwrite of a stored recipe. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecipePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl RecipePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.ingredients.is_none()
            && self.instructions.is_none()
            && self.category.is_none()
            && self.source.is_none()
    }
}
