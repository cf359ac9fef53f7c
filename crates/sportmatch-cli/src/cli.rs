use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use sportmatch_core::SwipeDecision;

#[derive(Parser)]
#[command(name = "sportmatch")]
#[command(about = "Find training partners, match, and chat from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Act as this account instead of the signed-in user
    #[arg(long = "as", global = true, value_name = "ACCOUNT_ID")]
    pub act_as: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign up, sign in, and manage the stored session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Create, show, edit or delete your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Manage profile photos
    Photo {
        #[command(subcommand)]
        command: PhotoCommands,
    },
    /// Show candidates you can swipe on
    Deck {
        /// Number of candidates to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Swipe on another account
    Swipe {
        /// Account to swipe on
        target: String,
        /// Decision to record
        #[arg(value_enum)]
        decision: DecisionArg,
    },
    /// List your matches
    Matches {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Talk inside a match
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },
    /// Sync local replica with remote Turso database
    Sync,
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

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum DecisionArg {
    Like,
    Pass,
    SuperLike,
}

impl From<DecisionArg> for SwipeDecision {
    fn from(value: DecisionArg) -> Self {
        match value {
            DecisionArg::Like => Self::Like,
            DecisionArg::Pass => Self::Pass,
            DecisionArg::SuperLike => Self::SuperLike,
        }
    }
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account and its profile
    Signup {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Birth date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        birth_date: NaiveDate,
    },
    /// Login with email/password and store session in keychain
    Login {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show who is signed in
    Status,
    /// Logout and clear stored session
    Logout,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Create the profile of the current account
    Create {
        #[arg(long)]
        name: String,
        /// Birth date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        birth_date: NaiveDate,
    },
    /// Show a profile (yours by default)
    Show {
        /// Account to show
        id: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit your profile; omitted fields stay unchanged
    Update(ProfileUpdateArgs),
    /// Delete your account, matches, messages and media
    Delete {
        /// Skip the confirmation guard
        #[arg(long)]
        yes: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct ProfileUpdateArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    /// Comma-separated interest tags
    #[arg(long, value_delimiter = ',')]
    pub interests: Option<Vec<String>>,
    #[arg(long)]
    pub experience_level: Option<String>,
    /// Birth date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub birth_date: Option<NaiveDate>,
    /// Gender to see in the deck ("all" for everyone)
    #[arg(long, value_name = "GENDER")]
    pub looking_for: Option<String>,
    /// Maximum candidate distance in kilometres
    #[arg(long, value_name = "KM")]
    pub max_distance: Option<u32>,
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

#[derive(Subcommand)]
pub enum PhotoCommands {
    /// Upload a JPEG into a photo slot (appends when the slot is empty)
    Add {
        /// Image file
        path: PathBuf,
        /// Slot to fill, 0-4
        #[arg(long, default_value = "0")]
        index: usize,
    },
    /// Remove the photo in a slot
    Remove {
        /// Slot to clear, 0-4
        index: usize,
    },
}

#[derive(Subcommand)]
pub enum ChatCommands {
    /// Send a text message
    Send {
        /// Match id
        match_id: String,
        /// Message text
        text: Vec<String>,
    },
    /// Send an image, optionally with a caption
    Image {
        /// Match id
        match_id: String,
        /// Image file
        path: PathBuf,
        #[arg(long)]
        caption: Option<String>,
    },
    /// Print recent messages, oldest first
    History {
        /// Match id
        match_id: String,
        /// Number of messages (defaults to one page)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow a conversation as it changes
    Watch {
        /// Match id
        match_id: String,
        /// Seconds between remote syncs
        #[arg(long, default_value = "5")]
        poll_secs: u64,
    },
    /// Mark received messages as seen
    Seen {
        /// Match id
        match_id: String,
    },
}
