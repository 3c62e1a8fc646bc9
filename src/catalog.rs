//! Recipe catalog – browse, view and maintain the stored recipes.
//!
//! Reads are open to everyone. Every write needs an admin [`Session`].

use std::collections::BTreeSet;

use log::{info, warn};
use serde_json::Value;

use crate::auth::{require_admin, Session};
use crate::error::{Error, Result};
use crate::recipe::{normalize, sort_by_title, NewRecipe, Recipe, RecipePatch, RecipeQuery};
use crate::scrape::RecipeScraper;
use crate::store::RecipeStore;

/// Browse result: matching recipes plus every category in the store.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Sorted by title, ignoring case.
    pub recipes: Vec<Recipe>,
    /// Sorted, de-duplicated; independent of the query.
    pub categories: Vec<String>,
}

/// Outcome of a multi-item import. One bad item never stops the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Identifiers of the stored recipes, in input order.
    pub added: Vec<String>,
    /// `(item, reason)` for every item that was not stored.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Catalog<S> {
    store: S,
}

impl<S: RecipeStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn list(&self, query: &RecipeQuery) -> Result<Listing> {
        let all: Vec<Recipe> = self
            .store
            .fetch_all()?
            .into_iter()
            .map(|(id, raw)| normalize(&id, raw))
            .collect();

        let categories: BTreeSet<String> = all.iter().map(|r| r.category.clone()).collect();
        let mut recipes: Vec<Recipe> = all.into_iter().filter(|r| query.matches(r)).collect();
        sort_by_title(&mut recipes);

        Ok(Listing {
            recipes,
            categories: categories.into_iter().collect(),
        })
    }

    pub fn view(&self, id: &str) -> Result<Recipe> {
        self.store
            .fetch(id)?
            .map(|raw| normalize(id, raw))
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn add_manual(&self, session: &Session, recipe: &NewRecipe) -> Result<String> {
        require_admin(session)?;
        let id = self.store.create(&serde_json::to_value(recipe)?)?;
        info!("Added recipe '{}' as {id}", recipe.title);
        Ok(id)
    }

    /// Scrape each URL and store what comes back, tagged with `category`.
    pub fn add_from_urls(
        &self,
        session: &Session,
        scraper: &dyn RecipeScraper,
        urls: &[String],
        category: &str,
    ) -> Result<BatchReport> {
        require_admin(session)?;
        let mut report = BatchReport::default();

        for url in urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
            let stored = scraper.scrape(url).and_then(|scraped| {
                self.store.create(&serde_json::to_value(NewRecipe {
                    title: scraped.title,
                    ingredients: scraped.ingredients,
                    instructions: scraped.instructions,
                    category: category.to_string(),
                    source: url.to_string(),
                })?)
            });
            match stored {
                Ok(id) => report.added.push(id),
                Err(e) => {
                    warn!("Error scraping {url}: {e}");
                    report.failed.push((url.to_string(), e.to_string()));
                }
            }
        }

        info!(
            "URL import: {} added, {} failed",
            report.added.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Import a JSON array of recipe objects, each stored as given.
    pub fn upload_json(&self, session: &Session, bytes: &[u8]) -> Result<BatchReport> {
        require_admin(session)?;
        let items = match serde_json::from_slice::<Value>(bytes)? {
            Value::Array(items) => items,
            _ => return Err(Error::Malformed("upload must be a JSON array".into())),
        };

        let mut report = BatchReport::default();
        for (idx, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                report
                    .failed
                    .push((format!("item {idx}"), "not a JSON object".to_string()));
                continue;
            }
            match self.store.create(&item) {
                Ok(id) => report.added.push(id),
                Err(e) => report.failed.push((format!("item {idx}"), e.to_string())),
            }
        }
        Ok(report)
    }

    /// Overwrite the fields set in `patch`; the identifier never changes.
    pub fn edit(&self, session: &Session, id: &str, patch: &RecipePatch) -> Result<Recipe> {
        require_admin(session)?;
        if self.store.fetch(id)?.is_none() {
            return Err(Error::NotFound(id.to_string()));
        }
        if !patch.is_empty() {
            self.store.update(id, &serde_json::to_value(patch)?)?;
        }
        self.view(id)
    }

    pub fn delete(&self, session: &Session, id: &str) -> Result<()> {
        require_admin(session)?;
        if self.store.fetch(id)?.is_none() {
            return Err(Error::NotFound(id.to_string()));
        }
        self.store.delete(id)?;
        info!("Deleted recipe {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::ScrapedRecipe;
    use crate::settings::AdminSettings;
    use crate::store::MemoryStore;
    use serde_json::json;

    struct FakeScraper;

    impl RecipeScraper for FakeScraper {
        fn scrape(&self, url: &str) -> Result<ScrapedRecipe> {
            if url.contains("broken") {
                return Err(Error::Scrape {
                    url: url.to_string(),
                    reason: "unsupported site".into(),
                });
            }
            Ok(ScrapedRecipe {
                title: "Focaccia".into(),
                ingredients: vec!["flour".into(), "olive oil".into()],
                instructions: "Dimple and bake.".into(),
            })
        }
    }

    fn admin() -> Session {
        Session::login(&AdminSettings::default(), "admin", "admin").unwrap()
    }

    fn seeded() -> Catalog<MemoryStore> {
        let store = MemoryStore::new();
        store.insert("b", json!({"title": "banana bread", "category": "Bread", "ingredients": ["banana"]}));
        store.insert("a", json!({"title": "Apple Pie", "category": "Dessert", "ingredients": ["apple"]}));
        store.insert("w", json!({"-Nx": {"title": "Wrapped Soup", "ingredients": ["leek"]}}));
        Catalog::new(store)
    }

    #[test]
    fn list_sorts_and_collects_categories() {
        let listing = seeded().list(&RecipeQuery::default()).unwrap();
        let titles: Vec<_> = listing.recipes.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Apple Pie", "banana bread", "Wrapped Soup"]);
        assert_eq!(listing.categories, vec!["Bread", "Dessert", "Uncategorized"]);
    }

    #[test]
    fn list_filters_keep_all_categories() {
        let query = RecipeQuery {
            category: None,
            search: Some("APPLE".into()),
        };
        let listing = seeded().list(&query).unwrap();
        assert_eq!(listing.recipes.len(), 1);
        assert_eq!(listing.categories.len(), 3);
    }

    #[test]
    fn view_flattens_wrapped_records() {
        let recipe = seeded().view("w").unwrap();
        assert_eq!(recipe.id, "w");
        assert_eq!(recipe.title, "Wrapped Soup");
        assert_eq!(recipe.category, "Uncategorized");
        assert!(matches!(seeded().view("zz"), Err(Error::NotFound(_))));
    }

    #[test]
    fn writes_need_admin() {
        let catalog = seeded();
        let anon = Session::anonymous();
        assert!(matches!(
            catalog.add_manual(&anon, &NewRecipe::default()),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(catalog.delete(&anon, "a"), Err(Error::Unauthorized)));
        assert!(matches!(
            catalog.edit(&anon, "a", &RecipePatch::default()),
            Err(Error::Unauthorized)
        ));
        assert_eq!(catalog.store().len(), 3);
    }

    #[test]
    fn add_manual_round_trips_through_view() {
        let catalog = Catalog::new(MemoryStore::new());
        let id = catalog
            .add_manual(
                &admin(),
                &NewRecipe {
                    title: "Pancakes".into(),
                    ingredients: vec!["egg".into(), "milk".into()],
                    instructions: "Whisk. Fry.".into(),
                    category: "Breakfast".into(),
                    source: String::new(),
                },
            )
            .unwrap();
        let recipe = catalog.view(&id).unwrap();
        assert_eq!(recipe.title, "Pancakes");
        assert_eq!(recipe.ingredients, vec!["egg", "milk"]);
    }

    #[test]
    fn url_import_continues_past_failures() {
        let catalog = Catalog::new(MemoryStore::new());
        let urls = vec![
            "https://good.example/one".to_string(),
            "https://broken.example/two".to_string(),
            " https://good.example/three ".to_string(),
        ];
        let report = catalog
            .add_from_urls(&admin(), &FakeScraper, &urls, "Bread")
            .unwrap();
        assert_eq!(report.added.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "https://broken.example/two");

        let stored = catalog.view(&report.added[1]).unwrap();
        assert_eq!(stored.category, "Bread");
        assert_eq!(stored.source, "https://good.example/three");
    }

    #[test]
    fn json_upload_skips_non_objects() {
        let catalog = Catalog::new(MemoryStore::new());
        let body = br#"[{"title": "Scones"}, 42, {"title": "Crumpets"}]"#;
        let report = catalog.upload_json(&admin(), body).unwrap();
        assert_eq!(report.added.len(), 2);
        assert_eq!(report.failed, vec![("item 1".to_string(), "not a JSON object".to_string())]);
        assert!(!report.is_clean());
    }

    #[test]
    fn json_upload_rejects_non_arrays() {
        let catalog = Catalog::new(MemoryStore::new());
        assert!(matches!(
            catalog.upload_json(&admin(), br#"{"title": "x"}"#),
            Err(Error::Malformed(_))
        ));
        assert!(matches!(
            catalog.upload_json(&admin(), b"not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn edit_overwrites_only_given_fields() {
        let catalog = seeded();
        let patch = RecipePatch {
            category: Some("Pies".into()),
            ..RecipePatch::default()
        };
        let recipe = catalog.edit(&admin(), "a", &patch).unwrap();
        assert_eq!(recipe.id, "a");
        assert_eq!(recipe.title, "Apple Pie");
        assert_eq!(recipe.category, "Pies");
        assert_eq!(recipe.ingredients, vec!["apple"]);
    }

    #[test]
    fn edit_and_delete_check_existence() {
        let catalog = seeded();
        assert!(matches!(
            catalog.edit(&admin(), "gone", &RecipePatch::default()),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(catalog.delete(&admin(), "gone"), Err(Error::NotFound(_))));
        catalog.delete(&admin(), "a").unwrap();
        assert!(matches!(catalog.view("a"), Err(Error::NotFound(_))));
        assert_eq!(catalog.store().len(), 2);
    }

    #[test]
    fn deleting_a_blank_id_sends_nothing_to_the_store() {
        use crate::settings::StoreSettings;
        use crate::store::FirebaseStore;

        let mut server = mockito::Server::new();
        let get = server.mock("GET", "/recipes/.json").expect(0).create();
        let delete = server.mock("DELETE", "/recipes/.json").expect(0).create();

        let store = FirebaseStore::new(&StoreSettings {
            url: server.url(),
            ..StoreSettings::default()
        })
        .unwrap();
        let catalog = Catalog::new(store);
        assert!(matches!(catalog.delete(&admin(), ""), Err(Error::Malformed(_))));
        assert!(catalog.edit(&admin(), "a/b", &RecipePatch::default()).is_err());

        get.assert();
        delete.assert();
    }
}
