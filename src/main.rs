use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod gateway;
mod models;
mod normalize;
mod recommend;
mod selection;
mod session;
mod suggest;
mod util;


use crate::config::{Config, load_config};
use crate::gateway::Gateway;
use crate::gateway::catalog::CatalogStore;
use crate::models::RecommendRequest;
use crate::normalize::normalize;
use crate::recommend::RequestOutcome;
use crate::session::Session;

#[derive(Parser)]
#[command(name = "song-recommender")]
#[command(about = "Search songs, build a selection and get recommendations")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Quiet mode - only log warnings and errors
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the catalog and print the matching titles
    Search { query: String },
    /// Get recommendations for one or more songs
    Recommend {
        #[arg(required = true)]
        songs: Vec<String>,

        /// Which API handler serves the request
        #[arg(long, value_enum, default_value_t = Endpoint::Songs)]
        endpoint: Endpoint,
    },
    /// Interactive session: search, build "My Jams", request recommendations
    Session,
    /// Load song titles (one per line) into the local catalog
    CatalogImport { file: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Endpoint {
    /// `POST /api/songs`
    Songs,
    /// `POST /api/recommendations`
    Recommendations,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = load_config()?;

    match args.command {
        Command::Search { query } => {
            let gateway = Gateway::from_config(&config.provider)?;
            let response = api::songs(&gateway, "GET", Some(&query), None).await;
            println!("{} {}", response.status, serde_json::to_string_pretty(&response.body)?);
            exit_status(response.status)
        }
        Command::Recommend { songs, endpoint } => {
            let gateway = Gateway::from_config(&config.provider)?;
            let body = serde_json::to_string(&RecommendRequest { songs })?;
            let response = match endpoint {
                Endpoint::Songs => api::songs(&gateway, "POST", None, Some(&body)).await,
                Endpoint::Recommendations => {
                    api::recommendations(&gateway, "POST", Some(&body)).await
                }
            };
            println!("{} {}", response.status, serde_json::to_string_pretty(&response.body)?);
            if response.status == 200 {
                print_list("Recommended Songs", &normalize(&response.body));
            }
            exit_status(response.status)
        }
        Command::Session => run_session(&config).await,
        Command::CatalogImport { file } => import_catalog(&config, &file),
    }
}

fn init_logging(args: &Args) {
    let default_level = if args.debug {
        "song_recommender=debug"
    } else if args.quiet {
        "song_recommender=warn"
    } else {
        "song_recommender=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn exit_status(status: u16) -> Result<()> {
    if status == 200 {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Request failed with status {}", status))
    }
}

fn print_list(title: &str, songs: &[String]) {
    println!("\n{title}");
    println!("{}", "=".repeat(title.len()));
    if songs.is_empty() {
        println!("  (none)");
    }
    for (i, song) in songs.iter().enumerate() {
        println!("  {}. {}", i + 1, song);
    }
}

fn import_catalog(config: &Config, file: &str) -> Result<()> {
    let path = config
        .catalog_path()
        .context("catalog-import needs RECOMMENDER_PROVIDER=local and CATALOG_DB")?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read song list '{}'", file))?;

    let catalog = CatalogStore::open(path)?;
    let inserted = catalog.insert_titles(content.lines())?;
    println!("✓ Imported {inserted} songs into {}", path.display());
    Ok(())
}

const SESSION_HELP: &str =
    "Type to search. Commands: /add N, /rm N, /list, /status, /rec, /clear, /help, /quit";

async fn run_session(config: &Config) -> Result<()> {
    let gateway = Gateway::from_config(&config.provider)?;
    let session = Session::new(gateway, config.debounce);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{SESSION_HELP}");
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        let (command, argument) = match line.split_once(' ') {
            Some((command, argument)) => (command, argument.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{SESSION_HELP}"),
            "/add" => match pick(&session.suggestions(), argument) {
                Some(song) => {
                    if session.select(song.clone()) {
                        println!("✓ Added '{song}'");
                    } else {
                        println!("'{song}' is already in My Jams");
                    }
                    print_list("My Jams", &session.selection());
                }
                None => println!("✗ No suggestion numbered '{argument}'"),
            },
            "/rm" => match pick(&session.selection(), argument) {
                Some(song) => {
                    session.remove(&song);
                    print_list("My Jams", &session.selection());
                }
                None => println!("✗ No selected song numbered '{argument}'"),
            },
            "/list" => print_list("My Jams", &session.selection()),
            "/status" => println!(
                "Search: '{}' | Suggestions: {} | My Jams: {} | Recommendations: {}{}",
                session.search_text(),
                session.suggestions().len(),
                session.selection_len(),
                session.recommendations().len(),
                if session.is_loading() { " | loading" } else { "" }
            ),
            "/rec" => {
                if !session.has_selection() {
                    println!("Add at least one song first.");
                    continue;
                }
                println!("Getting Recommendations...");
                match session.request_recommendations().await {
                    RequestOutcome::Skipped => println!("Add at least one song first."),
                    RequestOutcome::AlreadyInFlight => {
                        println!("Still working on the last request.")
                    }
                    RequestOutcome::Discarded => {}
                    RequestOutcome::Completed(_) | RequestOutcome::Failed => {
                        print_list("Recommended Songs", &session.recommendations())
                    }
                }
            }
            "/clear" => {
                session.clear();
                println!("✓ Cleared selection, recommendations and search");
            }
            unknown if is_command(unknown) => {
                println!("✗ Unknown command '{unknown}'");
                println!("{SESSION_HELP}");
            }
            _ => {
                session.type_text(line);
                session.settle().await;
                let suggestions = session.suggestions();
                if !suggestions.is_empty() {
                    print_list("Suggestions", &suggestions);
                }
            }
        }
    }

    Ok(())
}

fn is_command(input: &str) -> bool {
    input.starts_with('/')
}

/// Resolve a 1-based list position typed by the user
fn pick(songs: &[String], position: &str) -> Option<String> {
    let index = position.parse::<usize>().ok()?.checked_sub(1)?;
    songs.get(index).cloned()
}
