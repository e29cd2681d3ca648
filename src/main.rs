mod api;
mod app;
mod cache;
mod config;
mod connectivity;
mod logging;
mod posts;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "postcache")]
#[command(about = "Browse posts from a REST endpoint through an offline-first local cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/postcache/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Behave as if there were no network
  #[arg(long, global = true)]
  offline: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Refresh from the first page and keep paging until the server runs out
  Sync {
    /// Stop after this many pages
    #[arg(long)]
    pages: Option<u32>,
  },
  /// List cached posts (local-only posts are marked with *)
  List {
    #[arg(long)]
    page_size: Option<u32>,
    /// Print at most this many posts
    #[arg(long)]
    limit: Option<usize>,
  },
  /// Show one cached post
  Show { id: i64 },
  /// Create a post locally and sync it to the server
  Create {
    #[arg(short, long)]
    title: String,
    #[arg(short, long)]
    body: String,
  },
  /// Drop every cached post the server already knows about
  ClearRemote,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = config::Config::load(args.config.as_deref())?;
  let _log_guard = logging::init()?;

  let mut app = app::App::new(&config, args.offline)?;

  match args.command {
    Command::Sync { pages } => app.sync(pages).await?,
    Command::List { page_size, limit } => app.list(page_size, limit).await?,
    Command::Show { id } => app.show(id)?,
    Command::Create { title, body } => app.create(&title, &body).await?,
    Command::ClearRemote => app.clear_remote()?,
  }

  Ok(())
}
