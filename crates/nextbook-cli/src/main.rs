use std::fmt::Display;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use nextbook_core::{AppConfig, Author, Book, Database, ExitCode, NextbookError};
use nextbook_scraper::{GoodReadsSource, ScrapeError};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "nextbook",
    about = "Look books up on GoodReads and keep authors and books in a local store",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format. Also enabled by setting NEXTBOOK_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in a book from GoodReads by title and author name.
    Fetch {
        #[arg(long)]
        title: String,
        /// Full author name, e.g. "Ursula K. Le Guin".
        #[arg(long)]
        author: String,
        /// Store the filled book and its author.
        #[arg(long)]
        save: bool,
    },

    /// Author records.
    Author {
        #[command(subcommand)]
        action: AuthorAction,
    },

    /// Stored books.
    Book {
        #[command(subcommand)]
        action: BookAction,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Author Actions ─────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum AuthorAction {
    /// Add an author unless one with the same name exists.
    Add {
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        #[arg(long)]
        rating: Option<f64>,
        #[arg(long, action = clap::ArgAction::Append)]
        genre: Vec<String>,
    },
    /// Get an author by ID.
    Get { id: i64 },
    /// List authors.
    List {
        #[arg(long, default_value = "50")]
        limit: usize,
        #[arg(long, default_value = "0")]
        offset: usize,
    },
    /// Update an author.
    Update {
        id: i64,
        #[arg(long)]
        first: Option<String>,
        #[arg(long)]
        last: Option<String>,
        #[arg(long)]
        rating: Option<f64>,
    },
    /// Delete an author. Their books stay, unlinked.
    Delete { id: i64 },
}

// ─── Book Actions ───────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum BookAction {
    /// List stored books.
    List {
        #[arg(long, default_value = "50")]
        limit: usize,
        #[arg(long, default_value = "0")]
        offset: usize,
    },
    /// Get a book by ID.
    Get { id: i64 },
    /// Delete a book.
    Delete { id: i64 },
}

// ─── Config Actions ─────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Print the config file path.
    Path,
}

// ─── Main ───────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let start = Instant::now();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json_output = cli.json || std::env::var("NEXTBOOK_JSON").as_deref() == Ok("1");

    if let Err(e) = run(cli.command, json_output, start).await {
        fail(json_output, exit_code_for(&e), "error", &format!("{e:#}"), start);
    }
}

async fn run(command: Commands, json_output: bool, start: Instant) -> Result<()> {
    let config = AppConfig::load()?;
    debug!(path = %AppConfig::config_path().display(), "config loaded");

    match command {
        // ── Fetch ──────────────────────────────────────────────────────────
        Commands::Fetch {
            title,
            author,
            save,
        } => {
            let source = GoodReadsSource::from_config(&config.goodreads)?;
            let partial = Book::partial(title.as_str(), author.as_str());

            let book = match source.fill_in_book(&partial).await {
                Ok(Some(book)) => book,
                Ok(None) => fail(
                    json_output,
                    ExitCode::NetworkError,
                    "fetch_failed",
                    &format!("Could not load GoodReads data for \"{title}\""),
                    start,
                ),
                Err(e) => fail(
                    json_output,
                    ExitCode::GeneralError,
                    "malformed_response",
                    &e.to_string(),
                    start,
                ),
            };

            let saved_id = if save {
                Some(open_db(&config)?.save_completed_book(&book)?)
            } else {
                None
            };
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "book": book, "saved_id": saved_id },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                print_book(&book);
                if let Some(id) = saved_id {
                    println!("Saved as book {id}.");
                }
            }
        }

        // ── Authors ────────────────────────────────────────────────────────
        Commands::Author { action } => {
            let db = open_db(&config)?;
            match action {
                AuthorAction::Add {
                    first,
                    last,
                    rating,
                    genre,
                } => {
                    let mut author = Author::new(first, last).with_genres(genre);
                    author.average_rating = rating;

                    let Some(id) = db.safe_add_author(&author)? else {
                        fail(
                            json_output,
                            ExitCode::Conflict,
                            "conflict",
                            &format!("Author already exists: {}", author.display_name()),
                            start,
                        );
                    };
                    author.id = Some(id);
                    let dur = start.elapsed().as_millis();

                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":author,"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("Added author {id}: {}", author.display_name());
                    }
                }

                AuthorAction::Get { id } => {
                    let author = db.get_author(id)?;
                    let dur = start.elapsed().as_millis();
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":author,"meta":{"duration_ms":dur}}))?;
                    } else {
                        print_author(&author);
                    }
                }

                AuthorAction::List { limit, offset } => {
                    let authors = db.list_authors(limit, offset)?;
                    let dur = start.elapsed().as_millis();

                    if json_output {
                        let total = db.count_authors()?;
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": { "items": authors, "total": total, "limit": limit, "offset": offset },
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else if authors.is_empty() {
                        println!("No authors. Use `nextbook author add` or `nextbook fetch --save`.");
                    } else {
                        for a in &authors {
                            println!(
                                "{id:>5}  {name:<35}  {rating}",
                                id = or_dash(a.id),
                                name = a.display_name(),
                                rating = or_dash(a.average_rating),
                            );
                        }
                    }
                }

                AuthorAction::Update {
                    id,
                    first,
                    last,
                    rating,
                } => {
                    let mut author = db.get_author(id)?;
                    if let Some(f) = first {
                        author.first_name = f;
                    }
                    if let Some(l) = last {
                        author.last_name = l;
                    }
                    if rating.is_some() {
                        author.average_rating = rating;
                    }

                    if !db.safe_update_author(&author)? {
                        fail(
                            json_output,
                            ExitCode::Conflict,
                            "conflict",
                            &format!("Another author is already named {}", author.display_name()),
                            start,
                        );
                    }
                    let dur = start.elapsed().as_millis();

                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":author,"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("Updated author {id}: {}", author.display_name());
                    }
                }

                AuthorAction::Delete { id } => {
                    db.delete_author_by_id(id)?;
                    let dur = start.elapsed().as_millis();
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"deleted":id},"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("Deleted author: {id}");
                    }
                }
            }
        }

        // ── Books ──────────────────────────────────────────────────────────
        Commands::Book { action } => {
            let db = open_db(&config)?;
            match action {
                BookAction::List { limit, offset } => {
                    let books = db.list_books(limit, offset)?;
                    let dur = start.elapsed().as_millis();

                    if json_output {
                        let total = db.count_books()?;
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": { "items": books, "total": total, "limit": limit, "offset": offset },
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else if books.is_empty() {
                        println!("No books stored. Use `nextbook fetch --save` to add one.");
                    } else {
                        for book in &books {
                            println!(
                                "{id:>5}  {title:<40}  {author:<25}  {rating}",
                                id = or_dash(book.id),
                                title = book.title,
                                author = book.author_name,
                                rating = or_dash(book.rating),
                            );
                        }
                    }
                }

                BookAction::Get { id } => {
                    let book = db.get_book(id)?;
                    let dur = start.elapsed().as_millis();
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":book,"meta":{"duration_ms":dur}}))?;
                    } else {
                        print_book(&book);
                    }
                }

                BookAction::Delete { id } => {
                    db.delete_book(id)?;
                    let dur = start.elapsed().as_millis();
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"deleted":id},"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("Deleted book: {id}");
                    }
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::Show => {
                    let mut shown = config.clone();
                    if shown.goodreads.api_key.is_some() {
                        shown.goodreads.api_key = Some("********".to_string());
                    }
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":shown,"meta":{"duration_ms":dur}}))?;
                    } else {
                        print!("{}", toml::to_string_pretty(&shown)?);
                    }
                }
                ConfigAction::Path => {
                    let path = AppConfig::config_path();
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": { "path": path, "exists": path.exists() },
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn fail(json_output: bool, code: ExitCode, kind: &str, message: &str, start: Instant) -> ! {
    if json_output {
        let dur = start.elapsed().as_millis();
        let _ = print_json(&serde_json::json!({
            "status": "error",
            "error": kind,
            "message": message,
            "meta": { "duration_ms": dur }
        }));
    } else {
        eprintln!("{message}");
    }
    std::process::exit(code as i32);
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if let Some(e) = err.downcast_ref::<NextbookError>() {
        return e.exit_code();
    }
    match err.downcast_ref::<ScrapeError>() {
        Some(ScrapeError::Config(_)) => ExitCode::InvalidArgs,
        Some(ScrapeError::Http(_) | ScrapeError::Status { .. }) => ExitCode::NetworkError,
        _ => ExitCode::GeneralError,
    }
}

fn open_db(config: &AppConfig) -> Result<Database> {
    Ok(Database::open(&config.database_path())?)
}

fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn print_book(book: &Book) {
    println!("{}", book.title);
    println!("  author:   {}", book.author_name);
    println!("  goodreads id: {}", book.goodreads_id.as_deref().unwrap_or("-"));
    println!("  isbn:     {}", book.isbn.as_deref().unwrap_or("-"));
    println!("  rating:   {}", or_dash(book.rating));
    println!("  ratings:  {}", or_dash(book.number_of_ratings));
    println!("  reviews:  {}", or_dash(book.number_of_reviews));
    if !book.genres.is_empty() {
        println!("  genres:   {}", book.genres.join(", "));
    }
    if let Some(author) = &book.author {
        println!(
            "  author record: {}, {} (rating {})",
            author.last_name,
            author.first_name,
            or_dash(author.average_rating)
        );
    }
}

fn print_author(author: &Author) {
    println!("{}", author.display_name());
    println!("  id:       {}", or_dash(author.id));
    println!("  first:    {}", author.first_name);
    println!("  last:     {}", author.last_name);
    println!("  rating:   {}", or_dash(author.average_rating));
    if !author.genres.is_empty() {
        println!("  genres:   {}", author.genres.join(", "));
    }
    if let Some(reviews) = &author.book_reviews {
        println!("  reviews:  {reviews}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_fetch_with_save() {
        let cli = Cli::try_parse_from([
            "nextbook", "fetch", "--title", "Dune", "--author", "Frank Herbert", "--save", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Fetch { title, author, save } => {
                assert_eq!(title, "Dune");
                assert_eq!(author, "Frank Herbert");
                assert!(save);
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["nextbook", "-vv", "config", "path"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn not_found_error_exits_with_2() {
        let err = anyhow::Error::from(NextbookError::BookNotFound("9".to_string()));
        assert_eq!(exit_code_for(&err), ExitCode::NotFound);
    }

    #[test]
    fn missing_api_key_exits_with_invalid_args() {
        let err = anyhow::Error::from(ScrapeError::Config("no key".to_string()));
        assert_eq!(exit_code_for(&err), ExitCode::InvalidArgs);
    }

    #[test]
    fn or_dash_formats_missing_values() {
        assert_eq!(or_dash(Some(4.5)), "4.5");
        assert_eq!(or_dash(None::<u32>), "-");
    }
}
