//! Recipe cards – one recipe laid out as one or more 5"×7" cards.
//!
//! Instructions are cut into fixed-length chunks, one card per chunk. The
//! title repeats on every card, ingredients sit on the first card in two
//! balanced columns, and the source line closes the last card.

use crate::flowable::{Flowable, Table};
use crate::layout_config::INCH;
use crate::recipe::Recipe;
use crate::style::StyleKind;

/// Instruction characters per card unless configured otherwise.
pub const DEFAULT_MAX_CHARS: usize = 700;

/// Appended to the title of every card after the first.
pub const CONTINUED_SUFFIX: &str = " (continued)";

/// Width of each ingredient column.
pub const INGREDIENT_COLUMN_WIDTH_PT: f32 = 3.0 * INCH;

/// One printable card's worth of a recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub category: String,
    /// Two-column ingredient rows; empty unless this is the first card.
    pub ingredient_rows: Vec<[String; 2]>,
    pub instructions: String,
    /// Only set on the last card.
    pub source: Option<String>,
}

/// Cut `instructions` into chunks of at most `max_chars` characters.
///
/// Cuts fall wherever the limit lands, mid-word included. Always returns at
/// least one chunk; empty instructions give a single empty chunk.
pub fn chunk_instructions(instructions: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = instructions.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Lay ingredients out in two columns, left column first.
///
/// The left column takes the extra item when the count is odd; the right
/// column is padded with empty cells so both have the same row count.
pub fn split_columns(ingredients: &[String]) -> Vec<[String; 2]> {
    let half = ingredients.len().div_ceil(2);
    let (left, right) = ingredients.split_at(half);
    left.iter()
        .enumerate()
        .map(|(i, l)| {
            [
                format!("- {l}"),
                right.get(i).map(|r| format!("- {r}")).unwrap_or_default(),
            ]
        })
        .collect()
}

/// Expand a recipe into its cards, in reading order.
pub fn build_cards(recipe: &Recipe, max_chars: usize) -> Vec<Card> {
    let chunks = chunk_instructions(&recipe.instructions, max_chars);
    let last = chunks.len() - 1;

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| Card {
            title: if i == 0 {
                recipe.title.clone()
            } else {
                format!("{}{CONTINUED_SUFFIX}", recipe.title)
            },
            category: recipe.category.clone(),
            ingredient_rows: if i == 0 {
                split_columns(&recipe.ingredients)
            } else {
                Vec::new()
            },
            instructions: chunk,
            source: (i == last && !recipe.source.is_empty()).then(|| recipe.source.clone()),
        })
        .collect()
}

impl Card {
    pub fn is_continuation(&self) -> bool {
        self.title.ends_with(CONTINUED_SUFFIX)
    }

    /// The card as one keep-together block.
    pub fn to_flowable(&self) -> Flowable {
        let mut items = vec![
            Flowable::paragraph(&self.title, StyleKind::Title),
            Flowable::paragraph(&self.category, StyleKind::Category),
            Flowable::Spacer(6.0),
        ];

        if !self.ingredient_rows.is_empty() {
            items.push(Flowable::paragraph("Ingredients:", StyleKind::Subtitle));
            items.push(Flowable::Table(Table {
                rows: self.ingredient_rows.iter().map(|r| r.to_vec()).collect(),
                col_widths: vec![INGREDIENT_COLUMN_WIDTH_PT; 2],
                style: StyleKind::Text,
                pad_x: 4.0,
                pad_y: 2.0,
            }));
            items.push(Flowable::Spacer(6.0));
        }

        if !self.instructions.is_empty() {
            items.push(Flowable::paragraph("Instructions:", StyleKind::Subtitle));
            items.push(Flowable::paragraph(&self.instructions, StyleKind::Text));
            items.push(Flowable::Spacer(6.0));
        }

        if let Some(source) = &self.source {
            items.push(Flowable::paragraph(
                format!("Source: {source}"),
                StyleKind::Category,
            ));
        }

        Flowable::KeepTogether(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(ingredients: &[&str], instructions: &str, source: &str) -> Recipe {
        Recipe {
            id: "r".into(),
            title: "Bread".into(),
            category: "Baking".into(),
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            instructions: instructions.into(),
            source: source.into(),
        }
    }

    #[test]
    fn chunk_count_is_ceiling_of_length_over_limit() {
        for (len, limit, expected) in [(0, 700, 1), (1, 700, 1), (700, 700, 1), (701, 700, 2), (1400, 700, 2), (10, 3, 4)] {
            let text = "x".repeat(len);
            assert_eq!(chunk_instructions(&text, limit).len(), expected, "len {len} limit {limit}");
        }
    }

    #[test]
    fn chunks_preserve_character_order() {
        let text = "Knead the dough. Let it rise. Bake it.";
        let chunks = chunk_instructions(text, 7);
        assert!(chunks.iter().all(|c| c.chars().count() <= 7));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunking_counts_characters_not_bytes() {
        let chunks = chunk_instructions("crème brûlée", 5);
        assert_eq!(chunks, vec!["crème", " brûl", "ée"]);
    }

    #[test]
    fn odd_ingredient_count_favours_left_column() {
        let items: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        let rows = split_columns(&items);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], ["- a".to_string(), "- d".to_string()]);
        assert_eq!(rows[2], ["- c".to_string(), String::new()]);
        let right_filled = rows.iter().filter(|r| !r[1].is_empty()).count();
        assert_eq!(right_filled, 2);
    }

    #[test]
    fn no_ingredients_no_rows() {
        assert!(split_columns(&[]).is_empty());
    }

    #[test]
    fn continuation_cards_repeat_title_and_drop_ingredients() {
        let long = "y".repeat(1500);
        let cards = build_cards(&recipe(&["flour", "water"], &long, "grandma"), 700);
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].title, "Bread");
        assert!(!cards[0].is_continuation());
        assert_eq!(cards[1].title, "Bread (continued)");
        assert_eq!(cards[2].title, "Bread (continued)");
        assert_eq!(cards[0].ingredient_rows.len(), 1);
        assert!(cards[1].ingredient_rows.is_empty());
        assert!(cards[2].ingredient_rows.is_empty());
    }

    #[test]
    fn source_only_on_last_card() {
        let cards = build_cards(&recipe(&[], &"z".repeat(1000), "example.com"), 700);
        let with_source: Vec<_> = cards.iter().map(|c| c.source.is_some()).collect();
        assert_eq!(with_source, vec![false, true]);
    }

    #[test]
    fn empty_recipe_gives_one_bare_card() {
        let cards = build_cards(&recipe(&[], "", ""), 700);
        assert_eq!(cards.len(), 1);
        let Flowable::KeepTogether(items) = cards[0].to_flowable() else {
            panic!("card is not a keep-together block");
        };
        let texts: Vec<_> = items.iter().filter_map(Flowable::text).collect();
        assert_eq!(texts, vec!["Bread", "Baking"]);
    }
}
