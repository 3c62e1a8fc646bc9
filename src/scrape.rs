//! Recipe scraping from web pages.
//!
//! Pages are fetched with a blocking HTTP client and searched for a
//! schema.org `Recipe` in their JSON-LD blocks.

use std::time::Duration;

use html_escape::decode_html_entities;
use log::debug;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::settings::ScraperSettings;

/// The fields a scraper can lift from a recipe page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedRecipe {
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
}

/// Collaborator turning a URL into a recipe.
pub trait RecipeScraper {
    fn scrape(&self, url: &str) -> Result<ScrapedRecipe>;
}

/// Fetches pages over HTTP and reads their JSON-LD recipe markup.
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new(settings: &ScraperSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| scrape_error(url, format!("network error: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(scrape_error(url, format!("server answered {status}")));
        }
        response
            .text()
            .map_err(|e| scrape_error(url, format!("network error: {e}")))
    }
}

impl RecipeScraper for WebScraper {
    fn scrape(&self, url: &str) -> Result<ScrapedRecipe> {
        let body = self.fetch(url)?;
        let document = Html::parse_document(&body);
        extract_recipe(&document)
            .ok_or_else(|| scrape_error(url, "no schema.org recipe markup (unsupported site)"))
    }
}

fn scrape_error(url: &str, reason: impl Into<String>) -> Error {
    Error::Scrape {
        url: url.to_string(),
        reason: reason.into(),
    }
}

/// Find the first JSON-LD recipe in a parsed page.
pub fn extract_recipe(document: &Html) -> Option<ScrapedRecipe> {
    let selector = Selector::parse("script[type='application/ld+json']").ok()?;
    document.select(&selector).find_map(|script| {
        let cleaned = sanitize_json(&script.inner_html());
        match serde_json::from_str::<Value>(&cleaned) {
            Ok(json_ld) => find_recipe_node(&json_ld).map(recipe_from_node),
            Err(e) => {
                debug!("Skipping unparseable JSON-LD block: {e}");
                None
            }
        }
    })
}

fn sanitize_json(json: &str) -> String {
    let mut cleaned = json.trim().to_string();
    if !cleaned.starts_with('{') && !cleaned.starts_with('[') {
        if let Some(start) = cleaned.find('{') {
            cleaned = cleaned[start..].to_string();
        }
    }
    cleaned
        .replace(",]", "]")
        .replace(",}", "}")
        .replace("<!--", "")
        .replace("-->", "")
}

fn is_recipe_type(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("recipe"),
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| t.as_str().is_some_and(|t| t.eq_ignore_ascii_case("recipe"))),
        _ => false,
    }
}

fn find_recipe_node(json_ld: &Value) -> Option<&Value> {
    match json_ld {
        Value::Array(items) => items.iter().find_map(find_recipe_node),
        Value::Object(map) => {
            if is_recipe_type(json_ld) || map.contains_key("recipeInstructions") {
                Some(json_ld)
            } else {
                map.get("@graph").and_then(find_recipe_node)
            }
        }
        _ => None,
    }
}

/// Decode HTML entities once. A second pass runs only when the result still
/// holds an escaped ampersand or a numeric reference, the marks of a
/// double-encoded field; a literal `&lt;` in the text survives.
fn decode(text: &str) -> String {
    let once = decode_html_entities(text);
    let decoded = if once.contains("&amp;") || once.contains("&#") {
        decode_html_entities(&once).into_owned()
    } else {
        once.into_owned()
    };
    decoded.trim().to_string()
}

fn recipe_from_node(node: &Value) -> ScrapedRecipe {
    let title = node
        .get("name")
        .and_then(Value::as_str)
        .map(decode)
        .unwrap_or_default();

    let ingredients = node
        .get("recipeIngredient")
        .or_else(|| node.get("ingredients"))
        .map(|v| match v {
            Value::Array(items) => items.iter().filter_map(Value::as_str).map(decode).collect(),
            Value::String(s) => vec![decode(s)],
            _ => Vec::new(),
        })
        .unwrap_or_default();

    let mut steps = Vec::new();
    if let Some(instructions) = node.get("recipeInstructions") {
        collect_steps(instructions, &mut steps);
    }

    ScrapedRecipe {
        title,
        ingredients,
        instructions: steps.join("\n"),
    }
}

/// Flatten the many shapes of `recipeInstructions` into step texts.
fn collect_steps(value: &Value, steps: &mut Vec<String>) {
    match value {
        Value::String(text) => {
            let text = decode(text);
            if !text.is_empty() {
                steps.push(text);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_steps(item, steps);
            }
        }
        Value::Object(map) => {
            if let Some(list) = map.get("itemListElement") {
                collect_steps(list, steps);
            } else if let Some(text) = map.get("text").or_else(|| map.get("description")) {
                collect_steps(text, steps);
            }
        }
        _ => {}
    }
}
