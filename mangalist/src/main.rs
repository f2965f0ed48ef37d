// mangalist - personal manga tracking list
// Entry point and command dispatch

use anyhow::Context;
use clap::{Parser, Subcommand};
use mangalist::app;
use mangalist::config::KNOWN_STATUSES;
use mangalist::database::{MangaDraft, Status};
use mangalist::services::{MutationDispatcher, SortColumn, StatusFilter, ViewEngine};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "mangalist", version, about = "Track the manga you read")]
struct Cli {
    /// Data directory holding settings.json and the offline database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the list
    List {
        /// "all" or a status value
        #[arg(long)]
        status: Option<String>,
        /// Only manga with unread released chapters
        #[arg(long)]
        hot: bool,
        /// Sort column; naming the current column again reverses the order
        #[arg(long = "sort")]
        sort: Vec<String>,
    },
    /// Add a manga; it starts as to_read
    Add {
        title: String,
        #[arg(long)]
        priority: Option<i64>,
        #[arg(long)]
        last_read: Option<u32>,
        #[arg(long)]
        released: Option<u32>,
    },
    /// Set one field, e.g. `set <ID> lastChapterRead 12`
    Set { id: String, field: String, value: String },
    /// Change the reading status
    Status { id: String, status: String },
    /// Flip the "publication stopped" mark
    ToggleStopped { id: String },
    /// Delete a manga
    Remove {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Persist hot flags that disagree with status and chapter counts
    RepairHot,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mangalist=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting mangalist");

    let data_dir = app::resolve_data_dir(cli.data_dir)?;
    let mut state = app::setup(data_dir)
        .await
        .context("failed to initialize application")?;
    let dispatcher = &mut state.dispatcher;

    dispatcher.reload(None).await.context("failed to load the collection")?;

    match cli.command.unwrap_or(Command::List {
        status: None,
        hot: false,
        sort: Vec::new(),
    }) {
        Command::List { status, hot, sort } => {
            let engine = dispatcher.engine_mut();
            if let Some(status) = status {
                engine.set_status_filter(status.parse::<StatusFilter>()?);
            }
            if hot {
                engine.set_hot_only_filter(true);
            }
            for column in sort {
                engine.set_sort_column(SortColumn::from(column.as_str()));
            }
        }
        Command::Add {
            title,
            priority,
            last_read,
            released,
        } => {
            let id = dispatcher
                .create(MangaDraft {
                    title,
                    priority,
                    last_chapter_read: last_read,
                    released_chapters: released,
                })
                .await?;
            println!("Added {}", id);
        }
        Command::Set { id, field, value } => {
            dispatcher.update_field(&id, &field, &value).await?;
        }
        Command::Status { id, status } => {
            dispatcher.update_status(&id, status.parse::<Status>()?).await?;
        }
        Command::ToggleStopped { id } => {
            dispatcher.toggle_publication_stopped(&id).await?;
        }
        Command::Remove { id, yes } => {
            let removed = if yes {
                dispatcher.remove(&id, &|_: &str| true).await?
            } else {
                dispatcher.remove(&id, &prompt_yes_no).await?
            };
            if !removed {
                println!("Nothing deleted");
            }
        }
        Command::RepairHot => {
            let fixed = dispatcher.repair_hot_flags().await?;
            println!("Repaired {} hot flag(s)", fixed);
        }
    }

    print_view(dispatcher);
    Ok(())
}

/// Confirmation gate reading y/n from stdin
fn prompt_yes_no(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn print_view(dispatcher: &MutationDispatcher) {
    let engine: &ViewEngine = dispatcher.engine();

    println!(
        "{:<22} {:<32} {:<12} {:>8} {:>6} {:>8}  flags",
        "id", "title", "status", "priority", "read", "released"
    );
    for manga in engine.view() {
        let mut flags = Vec::new();
        if manga.hot {
            flags.push("hot");
        }
        if manga.is_publication_stopped {
            flags.push("stopped");
        }
        println!(
            "{:<22} {:<32} {:<12} {:>8} {:>6} {:>8}  {}",
            manga.id,
            manga.title,
            manga.status,
            display_opt(manga.priority),
            display_opt(manga.last_chapter_read),
            display_opt(manga.released_chapters),
            flags.join(",")
        );
    }

    let counts: Vec<String> = KNOWN_STATUSES
        .iter()
        .filter_map(|s| s.parse::<Status>().ok())
        .map(|s| format!("{}: {}", s, engine.count_by_status(&s)))
        .collect();
    println!(
        "\n{} shown of {} | {} | hot: {} | sorted by {} {:?}",
        engine.view().count(),
        engine.records().len(),
        counts.join(", "),
        engine.count_hot(),
        engine.sorting().column,
        engine.sorting().order
    );
    if let Some(error) = engine.last_error() {
        println!("last error: {}", error);
    }
}

fn display_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
