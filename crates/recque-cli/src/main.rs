//! recque CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "recque", version, about = "Recursive adaptive questioning for learning any topic")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start or resume an interactive learning session
    Learn {
        /// Topic to learn (omit when resuming)
        topic: Option<String>,

        /// Resume a previously saved session by id
        #[arg(long)]
        resume: Option<Uuid>,

        /// Provider to use (overrides the config default)
        #[arg(long)]
        provider: Option<String>,

        /// Directory for session snapshots
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Do not persist the session
        #[arg(long)]
        no_save: bool,
    },

    /// List stored sessions
    Sessions {
        /// Directory for session snapshots
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Delete the session with this id instead of listing
        #[arg(long)]
        delete: Option<Uuid>,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    // The library crates log under their own targets (recque_core and
    // friends), so each needs its own directive.
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in [
        "recque=info",
        "recque_core=info",
        "recque_providers=info",
        "recque_store=info",
    ] {
        filter = filter.add_directive(directive.parse().expect("valid directive"));
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Learn {
            topic,
            resume,
            provider,
            data_dir,
            config,
            no_save,
        } => commands::learn::execute(topic, resume, provider, data_dir, config, no_save).await,
        Commands::Sessions {
            data_dir,
            config,
            delete,
        } => commands::sessions::execute(data_dir, config, delete).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
