//! recipebox – command-line front end for the recipe library.
//!
//! Usage:
//!   recipebox <command> [options]
//!
//! Commands that change the store need admin credentials, given with
//! `--user`/`--password` or `RECIPEBOX_USER`/`RECIPEBOX_PASSWORD`.

use std::{collections::HashMap, env, fs, path::PathBuf, process};

use recipe_box::auth::Session;
use recipe_box::catalog::{BatchReport, Catalog};
use recipe_box::export::{self, Selection, TEMPLATE_FILENAME};
use recipe_box::recipe::{parse_ingredients, NewRecipe, RecipePatch, RecipeQuery};
use recipe_box::scrape::WebScraper;
use recipe_box::settings::Settings;
use recipe_box::store::FirebaseStore;
use recipe_box::style::StyleSheet;
use recipe_box::Error;

/// Flags that stand alone; every other `--flag` takes a value.
const VALUE_FLAGS: &[&str] = &[
    "--category",
    "--search",
    "--title",
    "--ingredients",
    "--instructions",
    "--source",
    "--format",
    "--ids",
    "--out",
    "--user",
    "--password",
];

struct Args {
    command: String,
    positional: Vec<String>,
    flags: HashMap<String, String>,
}

impl Args {
    fn flag(&self, name: &str) -> Option<&str> {
        self.flags.get(name).map(String::as_str)
    }

    fn arg(&self, idx: usize, what: &str) -> Result<&str, String> {
        self.positional
            .get(idx)
            .map(String::as_str)
            .ok_or_else(|| format!("missing {what}"))
    }
}

fn main() {
    env_logger::init();

    let argv: Vec<String> = env::args().collect();
    let prog = argv.first().map(String::as_str).unwrap_or("recipebox");

    let args = match parse_args(&argv[1.min(argv.len())..]) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage(prog);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            print_usage(prog);
            process::exit(1);
        }
    };

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(&args, &settings) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn parse_args(raw: &[String]) -> Result<Option<Args>, String> {
    let mut iter = raw.iter();
    let command = match iter.next().map(String::as_str) {
        None | Some("--help") | Some("-h") | Some("help") => return Ok(None),
        Some(cmd) => cmd.to_string(),
    };

    let mut positional = Vec::new();
    let mut flags = HashMap::new();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            flag if VALUE_FLAGS.contains(&flag) => match iter.next() {
                Some(v) => {
                    flags.insert(flag.to_string(), v.clone());
                }
                None => return Err(format!("{flag} needs a value")),
            },
            other if other.starts_with('-') => return Err(format!("Unknown flag: {other}")),
            value => positional.push(value.to_string()),
        }
    }

    Ok(Some(Args {
        command,
        positional,
        flags,
    }))
}

fn run(args: &Args, settings: &Settings) -> Result<(), String> {
    let catalog = Catalog::new(FirebaseStore::new(&settings.store).map_err(|e| e.to_string())?);
    let styles = StyleSheet::from_settings(&settings.export);

    match args.command.as_str() {
        "list" => {
            let query = RecipeQuery {
                category: args.flag("--category").map(str::to_string),
                search: args.flag("--search").map(str::to_string),
            };
            let listing = catalog.list(&query).map_err(|e| e.to_string())?;
            for recipe in &listing.recipes {
                println!("{}\t{}\t{}", recipe.id, recipe.title, recipe.category);
            }
            eprintln!(
                "{} recipes; categories: {}",
                listing.recipes.len(),
                listing.categories.join(", ")
            );
        }
        "show" => {
            let recipe = catalog
                .view(args.arg(0, "recipe id")?)
                .map_err(|e| e.to_string())?;
            println!("{}", recipe.title);
            println!("Category: {}", recipe.category);
            println!();
            println!("Ingredients:");
            for item in &recipe.ingredients {
                println!("- {item}");
            }
            println!();
            println!("Instructions:");
            println!("{}", recipe.instructions);
            if !recipe.source.is_empty() {
                println!();
                println!("Source: {}", recipe.source);
            }
        }
        "add" => {
            let session = admin_session(args, settings)?;
            let recipe = NewRecipe {
                title: args.flag("--title").ok_or("--title is required")?.to_string(),
                ingredients: parse_ingredients(args.flag("--ingredients").unwrap_or_default()),
                instructions: args.flag("--instructions").unwrap_or_default().to_string(),
                category: args.flag("--category").unwrap_or_default().to_string(),
                source: args.flag("--source").unwrap_or_default().to_string(),
            };
            let id = catalog
                .add_manual(&session, &recipe)
                .map_err(|e| e.to_string())?;
            println!("{id}");
        }
        "add-url" => {
            let session = admin_session(args, settings)?;
            let urls: Vec<String> = args
                .arg(0, "URL list")?
                .split(',')
                .map(|u| u.trim().to_string())
                .collect();
            let scraper = WebScraper::new(&settings.scraper).map_err(|e| e.to_string())?;
            let report = catalog
                .add_from_urls(
                    &session,
                    &scraper,
                    &urls,
                    args.flag("--category").unwrap_or_default(),
                )
                .map_err(|e| e.to_string())?;
            print_report(&report);
        }
        "upload-json" => {
            let session = admin_session(args, settings)?;
            let path = args.arg(0, "JSON file")?;
            let bytes = fs::read(path).map_err(|e| format!("reading '{path}': {e}"))?;
            let report = catalog
                .upload_json(&session, &bytes)
                .map_err(|e| e.to_string())?;
            print_report(&report);
        }
        "edit" => {
            let session = admin_session(args, settings)?;
            let patch = RecipePatch {
                title: args.flag("--title").map(str::to_string),
                ingredients: args.flag("--ingredients").map(parse_ingredients),
                instructions: args.flag("--instructions").map(str::to_string),
                category: args.flag("--category").map(str::to_string),
                source: args.flag("--source").map(str::to_string),
            };
            let recipe = catalog
                .edit(&session, args.arg(0, "recipe id")?, &patch)
                .map_err(|e| e.to_string())?;
            eprintln!("Updated '{}'", recipe.title);
        }
        "delete" => {
            let session = admin_session(args, settings)?;
            let id = args.arg(0, "recipe id")?;
            catalog.delete(&session, id).map_err(|e| e.to_string())?;
            eprintln!("Deleted {id}");
        }
        "export" => {
            let selection = match args.flag("--ids") {
                Some(ids) => Selection::Ids(
                    ids.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect(),
                ),
                None => Selection::All,
            };
            let result = export::export(
                catalog.store(),
                &selection,
                args.flag("--format").unwrap_or("standard"),
                &styles,
                settings.export.card_max_chars,
            );
            let doc = match result {
                Err(Error::EmptySelection) => return Err("No recipes found to export.".into()),
                other => other.map_err(|e| e.to_string())?,
            };
            write_output(args, &doc.filename, &doc.bytes)?;
        }
        "export-one" => {
            let doc = export::export_recipe(catalog.store(), args.arg(0, "recipe id")?, &styles)
                .map_err(|e| e.to_string())?;
            write_output(args, &doc.filename, &doc.bytes)?;
        }
        "template" => {
            let bytes = export::build_card_template().map_err(|e| e.to_string())?;
            write_output(args, TEMPLATE_FILENAME, &bytes)?;
        }
        other => return Err(format!("Unknown command: {other}")),
    }
    Ok(())
}

fn admin_session(args: &Args, settings: &Settings) -> Result<Session, String> {
    let user = args
        .flag("--user")
        .map(str::to_string)
        .or_else(|| env::var("RECIPEBOX_USER").ok())
        .unwrap_or_default();
    let password = args
        .flag("--password")
        .map(str::to_string)
        .or_else(|| env::var("RECIPEBOX_PASSWORD").ok())
        .unwrap_or_default();
    Session::login(&settings.admin, &user, &password).map_err(|e| e.to_string())
}

fn write_output(args: &Args, default_name: &str, bytes: &[u8]) -> Result<(), String> {
    let output = args
        .flag("--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default_name));

    // Create output directory if necessary.
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| format!("creating output directory: {e}"))?;
        }
    }
    fs::write(&output, bytes).map_err(|e| format!("writing '{}': {e}", output.display()))?;
    eprintln!("Wrote '{}' ({} bytes)", output.display(), bytes.len());
    Ok(())
}

fn print_report(report: &BatchReport) {
    for id in &report.added {
        println!("{id}");
    }
    for (item, reason) in &report.failed {
        eprintln!("Skipped {item}: {reason}");
    }
    eprintln!("{} added, {} skipped", report.added.len(), report.failed.len());
}

fn print_usage(prog: &str) {
    eprintln!("recipebox – recipe library and PDF exporter");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} list [--category NAME] [--search TEXT]");
    eprintln!("  {prog} show <id>");
    eprintln!("  {prog} add --title T [--ingredients \"a, b\"] [--instructions I] [--category C] [--source S]");
    eprintln!("  {prog} add-url <url[,url...]> [--category C]");
    eprintln!("  {prog} upload-json <file.json>");
    eprintln!("  {prog} edit <id> [--title T] [--ingredients \"a, b\"] [--instructions I] [--category C] [--source S]");
    eprintln!("  {prog} delete <id>");
    eprintln!("  {prog} export [--format standard|category_sorted|cards] [--ids a,b] [--out FILE]");
    eprintln!("  {prog} export-one <id> [--out FILE]");
    eprintln!("  {prog} template [--out FILE]");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --user, --password   Admin credentials for add, add-url, upload-json, edit, delete");
    eprintln!("  --out                Output path (default: the document's suggested name)");
    eprintln!("  --help               Print this message");
    eprintln!();
    eprintln!("Configuration is read from recipebox.toml and RECIPEBOX__* environment variables.");
}
