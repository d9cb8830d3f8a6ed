use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use extpack_cli::commands::{self, create::CreateArgs, install::InstallArgs};
use extpack_cli::{OutputFormat, hint_for};
use extpack_core::Settings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "extpack")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Bundle browser extensions into shareable packs and install them",
    long_about = "extpack turns unpacked browser-extension folders into a single .extpack file, \
                  validates and shares packs as links, and installs them into a Chromium-based \
                  browser by relaunching it with the extensions loaded."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    json: bool,

    /// Directory for caches, profiles and the installed-pack registry
    #[arg(long, global = true, env = "EXTPACK_HOME", value_name = "DIR")]
    home: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a pack from extension directories
    Create(CreateArgs),

    /// Check a pack file and list every problem
    Validate {
        /// Path to the pack file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show pack metadata and its extensions
    Info {
        /// Pack file or share link
        #[arg(value_name = "FILE|LINK")]
        source: String,
    },

    /// Install a pack into a Chromium-based browser
    Install(InstallArgs),

    /// List installed packs
    List,

    /// Remove a pack from the installed-pack list
    Forget {
        /// Name of the installed pack
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Print a share link for a pack
    Share {
        /// Path to the pack file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page that opens shared packs
        #[arg(long, default_value = commands::share::DEFAULT_BASE_URL)]
        base_url: String,
    },
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{} {:#}", style("error:").red().bold(), err);
        if let Some(hint) = hint_for(&err) {
            eprintln!("{} {}", style("hint:").yellow().bold(), hint);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let format = if cli.json { OutputFormat::Json } else { cli.format };
    let settings = || Settings::resolve(cli.home.clone());

    match cli.command {
        Commands::Create(args) => commands::create::execute(args, format),
        Commands::Validate { file } => commands::validate::execute(&file, format),
        Commands::Info { source } => commands::info::execute(&source, format),
        Commands::Install(args) => commands::install::execute(args, &settings()?, format),
        Commands::List => commands::list::execute(&settings()?, format),
        Commands::Forget { name } => commands::forget::execute(&name, &settings()?, format),
        Commands::Share { file, base_url } => commands::share::execute(&file, &base_url, format),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "extpack=debug,extpack_cli=debug,extpack_core=debug,extpack_browser=debug,extpack_remote=debug",
        )
    } else {
        EnvFilter::new("extpack=info,extpack_cli=info,extpack_core=info,extpack_browser=info,extpack_remote=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
