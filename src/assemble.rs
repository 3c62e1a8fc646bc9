//! Document assembly – orders recipes and emits the story for each export
//! layout.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::cards::build_cards;
use crate::error::Error;
use crate::flowable::Flowable;
use crate::pagination::PageTemplate;
use crate::recipe::{sort_by_title, Recipe};
use crate::style::StyleKind;

/// Export layout selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// One recipe after another, a page each, sorted by title.
    #[default]
    Standard,
    /// Recipes grouped under full-page category dividers.
    CategorySorted,
    /// 5"×7" cards, two per page.
    Cards,
}

impl ExportFormat {
    pub fn key(self) -> &'static str {
        match self {
            ExportFormat::Standard => "standard",
            ExportFormat::CategorySorted => "category_sorted",
            ExportFormat::Cards => "cards",
        }
    }

    pub fn template(self) -> PageTemplate {
        match self {
            ExportFormat::Standard | ExportFormat::CategorySorted => PageTemplate::letter(),
            ExportFormat::Cards => PageTemplate::letter_two_cards(),
        }
    }

    /// Suggested download name for an export of every recipe.
    pub fn filename(self) -> &'static str {
        match self {
            ExportFormat::Standard => "All_Recipes.pdf",
            ExportFormat::CategorySorted => "Recipes_By_Category.pdf",
            ExportFormat::Cards => "Recipe_Cards.pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "standard" => Ok(ExportFormat::Standard),
            "category_sorted" => Ok(ExportFormat::CategorySorted),
            "cards" => Ok(ExportFormat::Cards),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Build the story for `recipes` in `format`. Input order does not matter.
pub fn build_story(recipes: &[Recipe], format: ExportFormat, card_max_chars: usize) -> Vec<Flowable> {
    let mut sorted = recipes.to_vec();
    sort_by_title(&mut sorted);
    debug!("Assembling {} recipes as {format}", sorted.len());

    match format {
        ExportFormat::Standard => standard_story(&sorted),
        ExportFormat::CategorySorted => category_story(&sorted),
        ExportFormat::Cards => card_story(&sorted, card_max_chars),
    }
}

/// The full record of one recipe, top to bottom.
pub fn recipe_flowables(recipe: &Recipe) -> Vec<Flowable> {
    let mut items = vec![
        Flowable::paragraph(&recipe.title, StyleKind::Title),
        Flowable::Spacer(12.0),
        Flowable::paragraph(format!("Category: {}", recipe.category), StyleKind::Category),
        Flowable::Spacer(12.0),
        Flowable::paragraph("Ingredients:", StyleKind::Subtitle),
    ];
    items.extend(
        recipe
            .ingredients
            .iter()
            .map(|i| Flowable::paragraph(format!("- {i}"), StyleKind::Text)),
    );
    items.extend([
        Flowable::Spacer(12.0),
        Flowable::paragraph("Instructions:", StyleKind::Subtitle),
        Flowable::paragraph(&recipe.instructions, StyleKind::Text),
        Flowable::Spacer(12.0),
        Flowable::paragraph(format!("Source: {}", recipe.source), StyleKind::Category),
    ]);
    items
}

/// Recipes already sorted by title; a page break between each pair.
fn standard_story(recipes: &[Recipe]) -> Vec<Flowable> {
    let mut story = Vec::new();
    for (idx, recipe) in recipes.iter().enumerate() {
        if idx > 0 {
            story.push(Flowable::PageBreak);
        }
        story.extend(recipe_flowables(recipe));
    }
    story
}

/// Group by category (ascending, case-sensitive); title order within a group
/// is kept from the already sorted input.
pub fn group_by_category(recipes: &[Recipe]) -> BTreeMap<&str, Vec<&Recipe>> {
    let mut groups: BTreeMap<&str, Vec<&Recipe>> = BTreeMap::new();
    for recipe in recipes {
        groups.entry(recipe.category.as_str()).or_default().push(recipe);
    }
    groups
}

fn category_story(recipes: &[Recipe]) -> Vec<Flowable> {
    let mut story = Vec::new();
    for (category, members) in group_by_category(recipes) {
        if !story.is_empty() {
            story.push(Flowable::PageBreak);
        }
        story.push(Flowable::Divider(category.to_uppercase()));
        for recipe in members {
            story.push(Flowable::PageBreak);
            story.extend(recipe_flowables(recipe));
        }
    }
    story
}

fn card_story(recipes: &[Recipe], max_chars: usize) -> Vec<Flowable> {
    let mut story = Vec::new();
    for recipe in recipes {
        for card in build_cards(recipe, max_chars) {
            if !story.is_empty() {
                story.push(Flowable::FrameBreak);
            }
            story.push(card.to_flowable());
        }
    }
    story
}
