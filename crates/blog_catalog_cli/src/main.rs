//! Command-line entry point for the blog catalog.
//!
//! # Responsibility
//! - Open (and migrate) a catalog database, file-backed or in-memory.
//! - Run the create/retrieve/update/delete walkthrough or single commands.
//! - Print results as JSON on stdout.

use anyhow::{Context, Result};
use blog_catalog_core::db::{open_db, open_db_in_memory};
use blog_catalog_core::{
    default_log_level, init_logging, AuthorField, BlogField, BlogPatch, EntryField, EntryPatch,
    ListQuery, NewAuthor, NewBlog, NewEntry, OrderBy, Predicate, SqliteCatalog,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use serde_json::{json, to_value};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "blog-catalog", version, about = "Blog / Author / Entry record catalog")]
struct Cli {
    /// SQLite database file; an in-memory database is used when omitted.
    #[arg(long, env = "BLOG_CATALOG_DB")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off when omitted.
    #[arg(long, env = "BLOG_CATALOG_LOG_DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "BLOG_CATALOG_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the create / retrieve / update / delete walkthrough.
    Walkthrough,
    /// Lists blogs ordered by name.
    Blogs,
    /// Lists authors ordered by name.
    Authors,
    /// Lists entries, optionally only those published in one year.
    Entries {
        #[arg(long)]
        year: Option<i32>,
    },
    AddBlog {
        name: String,
        #[arg(long, default_value = "")]
        tagline: String,
    },
    AddAuthor {
        name: String,
        email: String,
    },
    /// Deletes a blog with its entries and their author links.
    DeleteBlog {
        id: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    let conn = match &cli.db {
        Some(path) => open_db(path)
            .with_context(|| format!("failed to open catalog at `{}`", path.display()))?,
        None => open_db_in_memory().context("failed to open in-memory catalog")?,
    };
    let catalog = SqliteCatalog::try_from_connection(&conn)?;

    let output = execute(&catalog, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Runs one command and returns its JSON result.
fn execute(catalog: &SqliteCatalog<'_>, command: Command) -> Result<serde_json::Value> {
    let output = match command {
        Command::Walkthrough => walkthrough(catalog)?,
        Command::Blogs => {
            let query = ListQuery::ordered_by(OrderBy::asc(BlogField::Name));
            to_value(catalog.all_blogs(&query)?)?
        }
        Command::Authors => {
            let query = ListQuery::ordered_by(OrderBy::asc(AuthorField::Name));
            to_value(catalog.all_authors(&query)?)?
        }
        Command::Entries { year } => {
            let predicate = year.map_or(Predicate::All, |year| {
                Predicate::year(EntryField::PubDate, year)
            });
            to_value(catalog.filter_entries(&predicate, &ListQuery::default())?)?
        }
        Command::AddBlog { name, tagline } => {
            to_value(catalog.create_blog(NewBlog::new(name, tagline))?)?
        }
        Command::AddAuthor { name, email } => {
            to_value(catalog.create_author(NewAuthor::new(name, email))?)?
        }
        Command::DeleteBlog { id } => {
            let blog = catalog.blog(id)?;
            to_value(catalog.delete_blog(&blog)?)?
        }
    };
    Ok(output)
}

/// Walks through creating, retrieving, updating and deleting records,
/// collecting each step's result.
fn walkthrough(catalog: &SqliteCatalog<'_>) -> Result<serde_json::Value> {
    info!("event=walkthrough module=cli status=start");

    // 1. Create
    let beatles = catalog.create_blog(NewBlog::new(
        "Beatles Blog",
        "All the latest Beatles news.",
    ))?;
    let phones = catalog.create_blog(NewBlog::new("New Smartphone", "Phones and more."))?;
    let laptops = catalog.create_blog(NewBlog::new("Laptops", "Portable computing."))?;
    let paul = catalog.create_author(NewAuthor::new("Paul", "paul@example.com"))?;
    let ringo = catalog.create_author(NewAuthor::new("Ringo", "ringo@example.com"))?;
    catalog.create_entry(
        NewEntry::new(beatles.id, "Abbey Road remaster", date(2007, 5, 1)?)
            .with_body("Remastered at last.")
            .with_authors([paul.id, ringo.id]),
    )?;
    catalog.create_entry(
        NewEntry::new(phones.id, "Pocket computers", date(2007, 6, 29)?).with_authors([paul.id]),
    )?;
    catalog.create_entry(NewEntry::new(laptops.id, "Thin and light", date(2008, 1, 15)?))?;

    // 2. Retrieve
    let all_blogs = catalog.all_blogs(&ListQuery::default())?;
    let by_id = catalog.blog(phones.id)?;
    let by_name = catalog.blog_by_iexact(BlogField::Name, "new smartphone")?;

    // 3. Update
    let retagged = catalog.update_all_blogs(&BlogPatch::tagline("Updated tagline"))?;
    let renamed_entries = catalog.update_entries(
        &Predicate::year(EntryField::PubDate, 2007),
        &EntryPatch::headline("Everything is the same"),
    )?;
    let mut brand_new = catalog.blog(phones.id)?;
    catalog.update_blog(&mut brand_new, &BlogPatch::name("Brandnew Smartphone"))?;

    // 4. Delete
    let beatles = catalog.blog(beatles.id)?;
    let single = catalog.delete_blog(&beatles)?;
    let by_year = catalog.delete_entries(&Predicate::year(EntryField::PubDate, 2008))?;
    let everything = catalog.delete_all_blogs()?;

    info!("event=walkthrough module=cli status=ok");
    Ok(json!({
        "create": { "blogs": all_blogs },
        "retrieve": { "by_id": by_id, "by_name_iexact": by_name },
        "update": {
            "tagline_updated": retagged,
            "entries_2007_updated": renamed_entries,
            "renamed": brand_new,
        },
        "delete": {
            "single_blog": single,
            "entries_2008": by_year,
            "all_blogs": everything,
            "remaining_blogs": catalog.count_blogs(&Predicate::All)?,
            "remaining_authors": catalog.count_authors(&Predicate::All)?,
        },
    }))
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("invalid date {year}-{month}-{day}"))
}
