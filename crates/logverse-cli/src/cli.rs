use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "logverse")]
#[command(about = "Log your days hour by hour from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign up, log in and out of the remote backend
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Manage activities
    #[command(alias = "activities")]
    Activity {
        #[command(subcommand)]
        command: ActivityCommands,
    },
    /// Tag, clear or inspect a single hour cell
    Cell {
        #[command(subcommand)]
        command: CellCommands,
    },
    /// Show the hour grid of a month
    Grid {
        #[command(subcommand)]
        command: GridCommands,
    },
    /// Show or change the light/dark preference
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },
    /// Export the activity log
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Output file, or a directory to write a timestamped file into
        /// (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account and sign in
    Signup {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Status,
}

#[derive(Subcommand)]
pub enum ActivityCommands {
    /// List activities
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create an activity
    Add {
        /// Activity name
        name: String,
        /// Hex colour, e.g. #3498db
        #[arg(long, default_value = "#3498db")]
        color: String,
    },
    /// Rename or recolour an activity
    Update {
        /// Activity ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Delete an activity and every cell tagged with it
    Delete {
        /// Activity ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CellCommands {
    /// Tag a cell with an activity
    Set {
        /// Day, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Hour, e.g. 9am, 3pm or 15
        #[arg(long)]
        hour: String,
        /// Activity ID
        #[arg(long)]
        activity: String,
        /// Optional note
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Remove the tag from a cell
    Clear {
        #[arg(long)]
        date: String,
        #[arg(long)]
        hour: String,
    },
    /// Show a single cell
    Show {
        #[arg(long)]
        date: String,
        #[arg(long)]
        hour: String,
    },
}

#[derive(Subcommand)]
pub enum GridCommands {
    /// Show tagged hours per day and totals per activity
    Show {
        /// Month, YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ThemeCommands {
    Show,
    Toggle,
    Set {
        #[arg(value_enum)]
        theme: ThemeChoice,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ThemeChoice {
    Light,
    Dark,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
