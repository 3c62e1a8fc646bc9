//! Export gateway – resolves a selection against the store and turns it into
//! a finished PDF.
//!
//! ```text
//! store → normalize → build_story → paginate → render_pdf → bytes
//! ```

use log::{info, warn};

use crate::assemble::{build_story, recipe_flowables, ExportFormat};
use crate::error::{Error, Result};
use crate::layout_config::{BorderStyle, LayoutBox, LayoutConfig, PageLayout};
use crate::pagination::{paginate, PageTemplate};
use crate::recipe::{normalize, Recipe};
use crate::render::render_pdf;
use crate::store::RecipeStore;
use crate::style::StyleSheet;

/// Download name of the blank card outline.
pub const TEMPLATE_FILENAME: &str = "recipe_card_template.pdf";

/// Download name of an export of hand-picked recipes.
pub const SELECTED_FILENAME: &str = "Selected_Recipes.pdf";

/// Which recipes an export covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    /// Explicit identifiers; ones the store does not know are skipped.
    Ids(Vec<String>),
}

/// A rendered document and the name it should be saved under.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
}

/// Paginate `recipes` in `format` without rendering.
pub fn layout_document(
    recipes: &[Recipe],
    format: ExportFormat,
    styles: &StyleSheet,
    card_max_chars: usize,
) -> Result<LayoutConfig> {
    if recipes.is_empty() {
        return Err(Error::EmptySelection);
    }
    let story = build_story(recipes, format, card_max_chars);
    Ok(paginate(&story, &format.template(), styles, document_title(format)))
}

/// Render `recipes` in `format` to PDF bytes plus a suggested filename.
pub fn render_document(
    recipes: &[Recipe],
    format: ExportFormat,
    styles: &StyleSheet,
    card_max_chars: usize,
) -> Result<ExportedDocument> {
    let layout = layout_document(recipes, format, styles, card_max_chars)?;
    let bytes = render_pdf(&layout, &styles.fonts)?;
    info!(
        "Rendered {} recipes as {format}: {} pages, {} bytes",
        recipes.len(),
        layout.pages.len(),
        bytes.len()
    );
    Ok(ExportedDocument {
        bytes,
        filename: format.filename().to_string(),
        page_count: layout.pages.len(),
    })
}

/// Resolve `selection`, normalise every record and render the result.
///
/// `format_key` is one of `standard`, `category_sorted`, `cards`.
pub fn export(
    store: &dyn RecipeStore,
    selection: &Selection,
    format_key: &str,
    styles: &StyleSheet,
    card_max_chars: usize,
) -> Result<ExportedDocument> {
    let format: ExportFormat = format_key.parse()?;
    let recipes = resolve(store, selection)?;
    let mut document = render_document(&recipes, format, styles, card_max_chars)?;
    if matches!(selection, Selection::Ids(_)) && format == ExportFormat::Standard {
        document.filename = SELECTED_FILENAME.to_string();
    }
    Ok(document)
}

/// Fetch the recipes a selection names, skipping identifiers that are gone
/// or whose record cannot be read.
pub fn resolve(store: &dyn RecipeStore, selection: &Selection) -> Result<Vec<Recipe>> {
    let recipes = match selection {
        Selection::All => store
            .fetch_all()?
            .into_iter()
            .map(|(id, raw)| normalize(&id, raw))
            .collect::<Vec<_>>(),
        Selection::Ids(ids) => {
            let mut found = Vec::with_capacity(ids.len());
            for id in ids {
                match store.fetch(id) {
                    Ok(Some(raw)) => found.push(normalize(id, raw)),
                    Ok(None) => warn!("Skipping recipe '{id}': not in store"),
                    Err(e) => warn!("Skipping recipe '{id}': {e}"),
                }
            }
            found
        }
    };
    if recipes.is_empty() {
        return Err(Error::EmptySelection);
    }
    Ok(recipes)
}

/// Export one recipe as its own document, named after its title.
pub fn export_recipe(store: &dyn RecipeStore, id: &str, styles: &StyleSheet) -> Result<ExportedDocument> {
    let raw = store.fetch(id)?.ok_or_else(|| Error::NotFound(id.to_string()))?;
    let recipe = normalize(id, raw);
    let layout = paginate(
        &recipe_flowables(&recipe),
        &PageTemplate::letter(),
        styles,
        &recipe.title,
    );
    let bytes = render_pdf(&layout, &styles.fonts)?;
    Ok(ExportedDocument {
        bytes,
        filename: format!("{}.pdf", sanitize_filename(&recipe.title)),
        page_count: layout.pages.len(),
    })
}

/// One Letter page carrying the two empty card outlines.
pub fn card_template_layout() -> LayoutConfig {
    let template = PageTemplate::letter_two_cards();
    let mut layout = LayoutConfig::letter("Recipe Card Template");
    layout.pages.push(PageLayout {
        page_index: 0,
        boxes: template
            .frames
            .iter()
            .map(|frame| {
                let mut outline = LayoutBox::new(frame.x, frame.y, frame.width, frame.height);
                outline.border = Some(BorderStyle {
                    width: 1.0,
                    color: [0.0, 0.0, 0.0],
                });
                outline
            })
            .collect(),
    });
    layout
}

/// Blank card outline document, independent of any recipe.
pub fn build_card_template() -> Result<Vec<u8>> {
    render_pdf(&card_template_layout(), &StyleSheet::default().fonts)
}

/// Replace characters that do not belong in a file name.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').trim();
    if cleaned.is_empty() {
        "Recipe".to_string()
    } else {
        cleaned.to_string()
    }
}

fn document_title(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Standard => "All Recipes",
        ExportFormat::CategorySorted => "Recipes by Category",
        ExportFormat::Cards => "Recipe Cards",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store_with(records: &[(&str, serde_json::Value)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (id, record) in records {
            store.insert(id, record.clone());
        }
        store
    }

    #[test]
    fn sanitize_strips_path_separators() {
        assert_eq!(sanitize_filename("Mac & Cheese"), "Mac & Cheese");
        assert_eq!(sanitize_filename("50/50 Bread"), "50_50 Bread");
        assert_eq!(sanitize_filename("  ..  "), "Recipe");
    }

    #[test]
    fn unknown_format_is_reported_before_fetching() {
        let store = MemoryStore::new();
        let err = export(&store, &Selection::All, "poster", &StyleSheet::default(), 700).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(k) if k == "poster"));
    }

    #[test]
    fn empty_store_is_an_empty_selection() {
        let store = MemoryStore::new();
        let err = export(&store, &Selection::All, "standard", &StyleSheet::default(), 700).unwrap_err();
        assert!(matches!(err, Error::EmptySelection));
    }

    #[test]
    fn missing_ids_are_skipped() {
        let store = store_with(&[("a", json!({"title": "Apple Pie"}))]);
        let recipes = resolve(&store, &Selection::Ids(vec!["a".into(), "gone".into()])).unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].title, "Apple Pie");
        assert_eq!(recipes[0].category, "Uncategorized");
    }

    #[test]
    fn unreadable_ids_are_skipped_like_missing_ones() {
        let store = store_with(&[("a", json!({"title": "Apple"})), ("b", json!(7))]);
        let all = resolve(&store, &Selection::All).unwrap();
        let picked = resolve(
            &store,
            &Selection::Ids(vec!["a".into(), "b".into(), "".into()]),
        )
        .unwrap();
        assert_eq!(all, picked);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].title, "Apple");
    }

    #[test]
    fn selected_standard_export_is_named_selected() {
        let store = store_with(&[("a", json!({"title": "Apple Pie"}))]);
        let doc = export(
            &store,
            &Selection::Ids(vec!["a".into()]),
            "standard",
            &StyleSheet::default(),
            700,
        )
        .unwrap();
        assert_eq!(doc.filename, SELECTED_FILENAME);
        assert_eq!(&doc.bytes[0..5], b"%PDF-");
    }

    #[test]
    fn single_recipe_export_needs_the_recipe() {
        let store = MemoryStore::new();
        let err = export_recipe(&store, "nope", &StyleSheet::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound(id) if id == "nope"));
    }

    #[test]
    fn single_recipe_export_is_named_after_title() {
        let store = store_with(&[("a", json!({"title": "Soda Bread", "ingredients": ["flour"]}))]);
        let doc = export_recipe(&store, "a", &StyleSheet::default()).unwrap();
        assert_eq!(doc.filename, "Soda Bread.pdf");
        assert_eq!(doc.page_count, 1);
    }

    #[test]
    fn card_template_has_two_outlines_on_one_page() {
        let layout = card_template_layout();
        assert_eq!(layout.pages.len(), 1);
        let boxes = &layout.pages[0].boxes;
        assert_eq!(boxes.len(), 2);
        assert!(boxes.iter().all(|b| b.border.is_some() && b.text.is_none()));
        assert_eq!(boxes[0].width, 504.0);
        assert_eq!(boxes[0].height, 360.0);
        assert!(boxes[0].y < boxes[1].y);
    }
}
