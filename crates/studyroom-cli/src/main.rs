use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;

#[derive(Parser)]
#[command(name = "studyroom", version, about = "Studyroom CLI")]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flashcard review
    Card {
        #[command(subcommand)]
        action: commands::card::CardAction,
    },
    /// Repeating tasks
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Focus timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Recent activity
    Log {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Card { action } => commands::card::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Log { limit } => commands::log::run(limit),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "studyroom", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
