//! # recipe-box – recipe library with PDF export
//!
//! Recipes live in a remote key-value store and are printed as PDF books or
//! 5"×7" cards. The export path runs in stages:
//!
//! 1. **Normalize** – raw store records → flat [`Recipe`]s ([`recipe`])
//! 2. **Assemble** – order recipes into a story for a format ([`assemble`], [`cards`])
//! 3. **Paginate** – flow the story into page frames ([`pagination`])
//! 4. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! [`export`] binds the stages to a store selection; [`catalog`] covers
//! browsing and admin-gated edits.

pub mod assemble;
pub mod auth;
pub mod cards;
pub mod catalog;
pub mod error;
pub mod export;
pub mod flowable;
pub mod fonts;
pub mod layout_config;
pub mod pagination;
pub mod recipe;
pub mod render;
pub mod scrape;
pub mod settings;
pub mod store;
pub mod style;

// Re-exports for convenience
pub use assemble::ExportFormat;
pub use error::{Error, Result};
pub use export::{build_card_template, export, export_recipe, render_document, ExportedDocument, Selection};
pub use recipe::{normalize, RawRecord, Recipe};
