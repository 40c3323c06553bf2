//! Shiori CLI - browse, search and read web novels from the terminal.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use serde::Serialize;
use shiori::config::Config;
use shiori::console::Console;
use shiori::network::{NetworkClient, ScraperNetworkClient};
use shiori::paging::{IteratorState, IteratorStatus, PagedList, PagedListIterator};
use shiori::response::Response;
use shiori::scrapers::{self, BookMetadata, DatabaseInterface, ScraperRegistry, SourceInterface};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Web novel catalog browser and reader.
#[derive(Parser, Debug)]
#[command(name = "shiori")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Use this config file instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered sources and databases.
    Sources,

    /// Browse a source's catalog.
    Catalog {
        source_id: String,

        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
    },

    /// Search one source's catalog.
    Search {
        source_id: String,
        query: String,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
    },

    /// Search every catalog source at once (first page of each).
    SearchAll { query: String },

    /// Show a book's cover and description.
    Book { book_url: String },

    /// List a book's chapters, oldest first.
    Chapters { book_url: String },

    /// Download one chapter and print its text.
    Read {
        /// Any URL of the source (usually the book page).
        source_url: String,
        chapter_url: String,
    },

    /// List the genres a database can filter by.
    Genres {
        #[arg(long, default_value = "baka_updates")]
        database: String,
    },

    /// Search a database by title.
    DbSearch {
        query: String,

        #[arg(long, default_value = "baka_updates")]
        database: String,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,
    },

    /// Show everything a database knows about a book.
    DbBook { book_url: String },
}

#[derive(Serialize)]
struct SourceInfo {
    id: &'static str,
    name: &'static str,
    base_url: &'static str,
    language: &'static str,
    catalog: bool,
}

#[derive(Serialize)]
struct DatabaseInfo {
    id: &'static str,
    name: &'static str,
    base_url: &'static str,
}

#[derive(Serialize)]
struct Listing {
    source: String,
    books: Vec<BookMetadata>,
    exhausted: bool,
    error: Option<String>,
}

#[derive(Serialize)]
struct BookDetails {
    url: String,
    source: &'static str,
    cover_image_url: Option<String>,
    description: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let cache = config
        .response_cache()
        .context("Failed to set up response cache")?;
    let client: Arc<dyn NetworkClient> = Arc::new(
        ScraperNetworkClient::new(&config.network, cache).context("Failed to create HTTP client")?,
    );
    let registry = ScraperRegistry::new(client.clone());
    let cli = Cli {
        console: Console::new(),
        json: args.json,
        registry,
        client,
    };

    match args.command {
        Command::Sources => cli.sources(),
        Command::Catalog { source_id, pages } => cli.catalog(&source_id, None, pages).await,
        Command::Search {
            source_id,
            query,
            pages,
        } => cli.catalog(&source_id, Some(query), pages).await,
        Command::SearchAll { query } => cli.search_all(&query).await,
        Command::Book { book_url } => cli.book(&book_url).await,
        Command::Chapters { book_url } => cli.chapters(&book_url).await,
        Command::Read {
            source_url,
            chapter_url,
        } => cli.read(&source_url, &chapter_url).await,
        Command::Genres { database } => cli.genres(&database).await,
        Command::DbSearch {
            query,
            database,
            pages,
        } => cli.db_search(&database, query, pages).await,
        Command::DbBook { book_url } => cli.db_book(&book_url).await,
    }
}

/// `RUST_LOG` wins unless `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("shiori=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shiori=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Turns an adapter error into an anyhow error carrying its full report.
fn into_anyhow<T>(response: Response<T>, what: &str) -> Result<T> {
    response
        .into_result()
        .map_err(anyhow::Error::msg)
        .with_context(|| what.to_string())
}

/// Drives `iterator` until `pages` pages are loaded or it stops.
async fn load_pages(iterator: &PagedListIterator<BookMetadata>, pages: u32) -> IteratorStatus {
    let mut status = iterator.status();
    for _ in 0..pages {
        status = iterator.load_next().await;
        if status.state != IteratorState::Idle {
            break;
        }
    }
    status
}

fn book_iterator<F, Fut>(fetch: F) -> PagedListIterator<BookMetadata>
where
    F: Fn(usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response<PagedList<BookMetadata>>> + Send + 'static,
{
    PagedListIterator::new(fetch)
}

struct Cli {
    console: Console,
    json: bool,
    registry: ScraperRegistry,
    client: Arc<dyn NetworkClient>,
}

impl Cli {
    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("Failed to serialize output")?
        );
        Ok(())
    }

    fn source_for(&self, url: &str) -> Result<Arc<dyn SourceInterface>> {
        self.registry
            .compatible_source(url)
            .ok_or_else(|| anyhow!("No source found for URL: {}", url))
    }

    fn database_by_id(&self, id: &str) -> Result<Arc<dyn DatabaseInterface>> {
        self.registry
            .databases()
            .iter()
            .find(|database| database.id() == id)
            .cloned()
            .ok_or_else(|| anyhow!("No database with id '{}'", id))
    }

    fn sources(&self) -> Result<()> {
        if self.json {
            let sources: Vec<_> = self
                .registry
                .sources()
                .iter()
                .map(|source| SourceInfo {
                    id: source.id(),
                    name: source.name(),
                    base_url: source.base_url(),
                    language: source.language().code(),
                    catalog: source.as_catalog().is_some(),
                })
                .collect();
            let databases: Vec<_> = self
                .registry
                .databases()
                .iter()
                .map(|database| DatabaseInfo {
                    id: database.id(),
                    name: database.name(),
                    base_url: database.base_url(),
                })
                .collect();
            return self.print_json(&serde_json::json!({
                "sources": sources,
                "databases": databases,
            }));
        }

        self.console.section("Sources");
        for source in self.registry.sources() {
            let kind = if source.as_catalog().is_some() {
                "catalog"
            } else {
                "generic"
            };
            println!(
                "{} {:<18} {:<16} {} {}",
                self.console.language_tag(source.language()),
                source.id(),
                source.name(),
                self.console.muted(kind),
                self.console.muted(source.base_url()),
            );
        }

        self.console.section("Databases");
        for database in self.registry.databases() {
            println!(
                "{:<18} {:<16} {}",
                database.id(),
                database.name(),
                self.console.muted(database.base_url())
            );
        }
        Ok(())
    }

    async fn catalog(&self, source_id: &str, query: Option<String>, pages: u32) -> Result<()> {
        let source = self
            .registry
            .catalog_by_id(source_id)
            .ok_or_else(|| anyhow!("No catalog source with id '{}'", source_id))?;

        let fetch_source = source.clone();
        let iterator = match query {
            Some(query) => book_iterator(move |index| {
                let source = fetch_source.clone();
                let query = query.clone();
                async move { source.catalog_search(index, &query).await }
            }),
            None => book_iterator(move |index| {
                let source = fetch_source.clone();
                async move { source.catalog_list(index).await }
            }),
        };

        let status = load_pages(&iterator, pages).await;
        self.print_listing(source.name(), &iterator, &status)
    }

    async fn search_all(&self, query: &str) -> Result<()> {
        let searches = self.registry.global_search(query);
        join_all(searches.iter().map(|search| async {
            let mut rx = search.iterator.subscribe();
            // a closed channel means the iterator is gone; nothing left to wait for
            let _ = rx.wait_for(|status| status.state != IteratorState::Loading).await;
        }))
        .await;

        if self.json {
            let listings: Vec<_> = searches
                .iter()
                .map(|search| listing(search.source.name(), &search.iterator))
                .collect();
            return self.print_json(&listings);
        }
        for search in &searches {
            let status = search.iterator.status();
            self.print_listing(search.source.name(), &search.iterator, &status)?;
        }
        Ok(())
    }

    fn print_listing(
        &self,
        name: &str,
        iterator: &PagedListIterator<BookMetadata>,
        status: &IteratorStatus,
    ) -> Result<()> {
        if self.json {
            return self.print_json(&listing(name, iterator));
        }

        self.console.section(&format!(
            "{} ({})",
            name,
            self.console.iterator_summary(status)
        ));
        iterator.with_items(|books| {
            for book in books {
                println!("{}", self.console.book_line(book));
            }
        });
        if let Some(error) = &status.error {
            self.console.error(error);
        }
        Ok(())
    }

    async fn book(&self, book_url: &str) -> Result<()> {
        let source = self.source_for(book_url)?;
        let (cover, description) = tokio::join!(
            source.book_cover_image_url(book_url),
            source.book_description(book_url)
        );
        let details = BookDetails {
            url: book_url.to_string(),
            source: source.name(),
            cover_image_url: into_anyhow(cover, "Failed to fetch cover")?,
            description: into_anyhow(description, "Failed to fetch description")?,
        };

        if self.json {
            return self.print_json(&details);
        }
        self.console.section(&details.url);
        self.console.info(&format!("Source: {}", details.source));
        match &details.cover_image_url {
            Some(cover) => self.console.info(&format!("Cover: {}", cover)),
            None => self.console.warning("No cover image"),
        }
        match &details.description {
            Some(description) => println!("\n{}", description),
            None => self.console.warning("No description"),
        }
        Ok(())
    }

    async fn chapters(&self, book_url: &str) -> Result<()> {
        let source = self.source_for(book_url)?;
        let chapters = into_anyhow(
            source.chapter_list(book_url).await,
            "Failed to fetch chapter list",
        )?;

        if self.json {
            return self.print_json(&chapters);
        }
        self.console.success(&format!("Found {} chapters", chapters.len()));
        for (position, chapter) in chapters.iter().enumerate() {
            println!("{}", self.console.chapter_line(position + 1, chapter));
        }
        Ok(())
    }

    async fn read(&self, source_url: &str, chapter_url: &str) -> Result<()> {
        let source = self.source_for(source_url)?;
        let chapter = into_anyhow(
            scrapers::download_chapter(self.client.as_ref(), source.as_ref(), chapter_url).await,
            "Failed to download chapter",
        )?;

        if self.json {
            return self.print_json(&chapter);
        }
        if let Some(title) = &chapter.title {
            self.console.section(title);
        }
        println!("{}", chapter.text);
        Ok(())
    }

    async fn genres(&self, database_id: &str) -> Result<()> {
        let database = self.database_by_id(database_id)?;
        let genres = into_anyhow(database.search_genres().await, "Failed to fetch genres")?;

        if self.json {
            return self.print_json(&genres);
        }
        self.console.section(&format!("{} genres", database.name()));
        for genre in &genres {
            println!("{}", genre.genre_name);
        }
        Ok(())
    }

    async fn db_search(&self, database_id: &str, query: String, pages: u32) -> Result<()> {
        let database = self.database_by_id(database_id)?;
        let fetch_database = database.clone();
        let iterator = book_iterator(move |index| {
            let database = fetch_database.clone();
            let query = query.clone();
            async move { database.search_by_title(index, &query).await }
        });

        let status = load_pages(&iterator, pages).await;
        self.print_listing(database.name(), &iterator, &status)
    }

    async fn db_book(&self, book_url: &str) -> Result<()> {
        let database = self
            .registry
            .compatible_database(book_url)
            .ok_or_else(|| anyhow!("No database found for URL: {}", book_url))?;
        let data = into_anyhow(database.book_data(book_url).await, "Failed to fetch book data")?;

        if self.json {
            return self.print_json(&data);
        }
        self.console.section(&data.title);
        if !data.book_type.is_empty() {
            self.console.info(&format!("Type: {}", data.book_type));
        }
        if !data.authors.is_empty() {
            let authors: Vec<_> = data.authors.iter().map(|a| a.name.as_str()).collect();
            self.console.info(&format!("Authors: {}", authors.join(", ")));
        }
        if !data.genres.is_empty() {
            let genres: Vec<_> = data.genres.iter().map(|g| g.genre_name.as_str()).collect();
            self.console.info(&format!("Genres: {}", genres.join(", ")));
        }
        if !data.tags.is_empty() {
            self.console.info(&format!("Tags: {}", data.tags.join(", ")));
        }
        if !data.alternative_titles.is_empty() {
            self.console
                .info(&format!("Also known as: {}", data.alternative_titles.join(" / ")));
        }
        if !data.description.is_empty() {
            println!("\n{}", data.description);
        }
        for (heading, books) in [
            ("Related", &data.related_books),
            ("Recommended", &data.similar_recommended),
        ] {
            if books.is_empty() {
                continue;
            }
            self.console.section(heading);
            for book in books {
                println!("{}", self.console.book_line(book));
            }
        }
        Ok(())
    }
}

fn listing(name: &str, iterator: &PagedListIterator<BookMetadata>) -> Listing {
    let status = iterator.status();
    Listing {
        source: name.to_string(),
        books: iterator.items(),
        exhausted: status.state == IteratorState::Consumed,
        error: status.error,
    }
}
