use std::io::{self, Write};

use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use worldscribe::config::Config;
use worldscribe::error::{Result, WorldscribeError};
use worldscribe::prompt::assemble;
use worldscribe::storage::ChapterStore;
use worldscribe::tables::WorldTables;
use worldscribe::Worldscribe;

#[derive(Parser, Debug)]
#[command(name = "worldscribe")]
#[command(about = "Assemble world-state prompts and generate chapters")]
struct Cli {
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the assembled prompt for a chapter.
    Prompt {
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        chapter: i64,
    },
    /// Generate a chapter, save it and append its summary.
    Generate {
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        chapter: i64,

        #[arg(long, default_value_t = false)]
        no_stream: bool,
    },
    /// Print the stored chapters before the given number.
    Recap {
        #[arg(long)]
        upto: i64,
    },
}

fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn stdout_error(e: io::Error) -> WorldscribeError {
    WorldscribeError::Runtime(e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,worldscribe=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Prompt { chapter } => {
            // Rendering needs no provider.
            let paths = config.data_paths();
            let tables = WorldTables::load(&paths.data_dir)?;
            let prepared = assemble(&tables, chapter)?;
            println!("{}", prepared.text);
        }
        Commands::Generate { chapter, no_stream } => {
            let scribe = Worldscribe::from_config(config)?;
            if no_stream {
                let generated = scribe.generate_chapter(chapter).await?;
                println!("{}", generated.text);
                eprintln!("saved {}", generated.path.display());
            } else {
                let prepared = scribe.prepare_chapter(chapter)?;
                let mut stream = scribe.stream_chapter(prepared);
                let mut stdout = io::stdout();
                while let Some(piece) = stream.next().await {
                    let piece = piece?;
                    stdout.write_all(piece.as_bytes()).map_err(stdout_error)?;
                    stdout.flush().map_err(stdout_error)?;
                }
                writeln!(stdout).map_err(stdout_error)?;
            }
        }
        Commands::Recap { upto } => {
            let paths = config.data_paths();
            let store = ChapterStore::new(paths.chapters_dir, paths.summary_log);
            print!("{}", store.load_previous_chapters(upto)?);
        }
    }

    Ok(())
}
