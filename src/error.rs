use thiserror::Error;

/// Errors surfaced by recipe library operations.
///
/// None of these are fatal to the process; callers report them and move on.
#[derive(Error, Debug)]
pub enum Error {
    /// No recipe is stored under the requested identifier
    #[error("Recipe '{0}' was not found")]
    NotFound(String),

    /// A recipe could not be extracted from a URL
    #[error("Failed to scrape {url}: {reason}")]
    Scrape { url: String, reason: String },

    /// Export format key is not one of standard, category_sorted, cards
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// The export selection resolved to zero recipes
    #[error("Nothing to export")]
    EmptySelection,

    /// Operation requires an administrator session
    #[error("Admin login required")]
    Unauthorized,

    /// The store answered with something other than success
    #[error("Store error: {0}")]
    Store(String),

    /// A stored value does not have the shape of a recipe
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialisation failure
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Font file could not be parsed
    #[error("Font error: {0}")]
    Font(String),

    /// PDF rendering failure
    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
