use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use libris_app::modules::books::{
    models::{BookFilter, BookId},
    service::{self, BookService},
    store::{BookStore, JsonBookStore},
};
use libris_kernel::settings::Settings;

/// Libris catalog administration
#[derive(Debug, Parser)]
#[command(name = "libris", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Print the catalog as JSON
    List {
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },
    /// Print one book as JSON
    Show { id: BookId },
    /// Validate the catalog document and summarize it
    Check,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Available,
    Overdue,
}

impl From<FilterArg> for BookFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => BookFilter::All,
            FilterArg::Available => BookFilter::Available,
            FilterArg::Overdue => BookFilter::Overdue,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load Libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    tracing::debug!(
        env = ?settings.environment,
        command = ?cli.command,
        "libris cli starting"
    );

    match cli.command {
        Command::Serve => libris_app::serve(settings).await,
        Command::List { filter } => {
            let books = open_service(&settings).list(filter.into()).await?;
            println!("{}", serde_json::to_string_pretty(&books)?);
            Ok(())
        }
        Command::Show { id } => {
            let book = open_service(&settings)
                .get(id)
                .await
                .with_context(|| format!("cannot show book {id}"))?;
            println!("{}", serde_json::to_string_pretty(&book)?);
            Ok(())
        }
        Command::Check => check(&settings).await,
    }
}

fn open_service(settings: &Settings) -> BookService {
    BookService::new(Arc::new(JsonBookStore::new(&settings.storage.data_path)))
}

async fn check(settings: &Settings) -> anyhow::Result<()> {
    let store = JsonBookStore::new(&settings.storage.data_path);
    let books = store
        .load_all()
        .await
        .with_context(|| format!("cannot read {}", store.path().display()))?;

    let mut seen = HashSet::new();
    let mut problems = Vec::new();
    for book in &books {
        if !seen.insert(book.id) {
            problems.push(format!("duplicate id {}", book.id));
        }
        if !book.is_consistent() {
            problems.push(format!(
                "book {} has available={} but borrower/returnDate disagree",
                book.id, book.available
            ));
        }
    }

    let today = service::today();
    let borrowed = books.iter().filter(|b| !b.available).count();
    let overdue = books.iter().filter(|b| b.is_overdue(today)).count();
    println!(
        "{}: {} books, {} borrowed, {} overdue",
        store.path().display(),
        books.len(),
        borrowed,
        overdue
    );

    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("error: {problem}");
        }
        bail!("{} problem(s) found in catalog", problems.len());
    }
    Ok(())
}
