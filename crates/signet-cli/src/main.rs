//! signet command-line tool

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::Workspace;
use error::CliResult;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signet")]
#[command(about = "Sign and verify script fragments of wiki documents")]
#[command(version)]
struct Cli {
    /// Configuration file (config/signet.toml is used when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key pair, replacing any existing one
    Keygen {
        /// Key name
        #[arg(short, long)]
        name: String,
    },

    /// Trust a third-party public key
    Import {
        /// Key name to register it under
        #[arg(short, long)]
        name: String,

        /// Public key artifact, as written by `export`
        #[arg(short, long)]
        public: PathBuf,
    },

    /// Write the public half of a key
    Export {
        /// Key name
        #[arg(short, long)]
        name: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored keys
    List,

    /// Sign a fragment and store its signature record
    Sign {
        /// Key name to sign with, generated on first use
        #[arg(short, long)]
        key: String,

        /// Signing user, e.g. XWiki.Alice
        #[arg(short, long)]
        user: String,

        /// Document holding the fragment, e.g. Sandbox.WebHome
        #[arg(short, long)]
        document: String,

        /// Fragment id
        #[arg(long)]
        id: String,

        /// File with the fragment content
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Check a fragment against its stored signature
    Verify {
        #[arg(short, long)]
        document: String,

        #[arg(long)]
        id: String,

        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the fragments of a document the user still has to sign
    Scan {
        #[arg(short, long)]
        document: String,

        /// Editing user
        #[arg(short, long)]
        user: String,

        /// File with the document content
        #[arg(short, long)]
        file: PathBuf,

        /// Markup syntax (configured default when omitted)
        #[arg(short, long)]
        syntax: Option<String>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    let workspace = Workspace::open(cli.config.as_deref())?;

    match cli.command {
        Commands::Keygen { name } => {
            commands::keygen::handle(&workspace, name)?;
        }
        Commands::Import { name, public } => {
            commands::import::handle(&workspace, name, public)?;
        }
        Commands::Export { name, output } => {
            commands::export::handle(&workspace, name, output)?;
        }
        Commands::List => {
            commands::list::handle(&workspace)?;
        }
        Commands::Sign {
            key,
            user,
            document,
            id,
            file,
        } => {
            commands::sign::handle(&workspace, key, user, document, id, file)?;
        }
        Commands::Verify { document, id, file } => {
            commands::verify::handle(&workspace, document, id, file)?;
        }
        Commands::Scan {
            document,
            user,
            file,
            syntax,
        } => {
            commands::scan::handle(&workspace, document, user, file, syntax)?;
        }
    }

    Ok(())
}
