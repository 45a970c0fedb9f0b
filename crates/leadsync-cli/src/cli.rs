use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "leadsync")]
#[command(about = "Sync, triage and report on sheet-sourced leads")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name holding account and lead source settings
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the account's leads from the lead source and store new ones
    Sync {
        /// Output the sync report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored leads
    #[command(alias = "ls")]
    List {
        /// Case-insensitive search over name, comments and number
        #[arg(short, long)]
        search: Option<String>,
        /// Only leads with this status ("all" for any)
        #[arg(long)]
        status: Option<String>,
        /// Only leads from this platform ("all" for any)
        #[arg(long)]
        platform: Option<String>,
        /// Sort order
        #[arg(long, value_enum, default_value_t = SortArg::Newest)]
        sort: SortArg,
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Leads per page
        #[arg(long, default_value = "20")]
        page_size: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one lead in full
    Show {
        /// Lead ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a lead to another pipeline stage
    Status {
        /// Lead ID or unique ID prefix
        id: String,
        /// Built-in or custom stage label
        status: String,
    },
    /// Schedule or clear a follow-up reminder
    FollowUp {
        /// Lead ID or unique ID prefix
        id: String,
        /// When to follow up (RFC 3339, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`, UTC)
        #[arg(long, value_name = "WHEN", required_unless_present = "clear")]
        at: Option<String>,
        /// Reminder text
        #[arg(long)]
        note: Option<String>,
        /// Remove the current follow-up
        #[arg(long, conflicts_with_all = ["at", "note"])]
        clear: bool,
    },
    /// Append a timestamped note to a lead
    Note {
        /// Lead ID or unique ID prefix
        id: String,
        /// Note text
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Set a built-in or custom field on a lead
    SetField {
        /// Lead ID or unique ID prefix
        id: String,
        /// Field name
        field: String,
        /// New value (empty clears a custom field)
        value: String,
    },
    /// Add a lead by hand
    #[command(alias = "new")]
    Add {
        /// Lead name
        #[arg(long)]
        name: String,
        /// WhatsApp/contact number
        #[arg(long)]
        phone: String,
        /// Channel the lead came from
        #[arg(long, default_value = "manual")]
        platform: String,
        /// Initial status
        #[arg(long)]
        status: Option<String>,
        /// Free-form comments
        #[arg(long)]
        comments: Option<String>,
        /// Creation time as reported by the origin (defaults to now)
        #[arg(long)]
        created_time: Option<String>,
    },
    /// Delete a stored lead
    Delete {
        /// Lead ID or unique ID prefix
        id: String,
    },
    /// Import leads from a CSV file
    Import {
        /// CSV file with a header row
        path: PathBuf,
    },
    /// Export leads
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Output path; `-` for stdout (defaults to leads_export_<date>)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Show KPIs and chart series
    Stats {
        /// Days covered by the daily series
        #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=366))]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage custom pipeline stages
    Stages {
        #[command(subcommand)]
        command: StageCommands,
    },
    /// Manage custom lead fields
    Fields {
        #[command(subcommand)]
        command: FieldCommands,
    },
    /// Manage custom KPI cards
    Kpis {
        #[command(subcommand)]
        command: KpiCommands,
    },
    /// Sign the profile in or out of an account
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },
    /// List every account stored locally
    Accounts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
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

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SortArg {
    Newest,
    Oldest,
    Name,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum FieldKindArg {
    Text,
    Number,
    Date,
    Boolean,
}

#[derive(Subcommand)]
pub enum StageCommands {
    /// List built-in and custom stages
    List,
    /// Add a custom stage at the end of the pipeline
    Add {
        label: String,
    },
    /// Remove a custom stage
    Remove {
        label: String,
    },
}

#[derive(Subcommand)]
pub enum FieldCommands {
    /// List custom field definitions
    List,
    /// Define a custom field
    Add {
        name: String,
        #[arg(long, value_enum, default_value_t = FieldKindArg::Text)]
        kind: FieldKindArg,
    },
    /// Remove a custom field definition
    Remove {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum KpiCommands {
    /// List custom KPI cards
    List,
    /// Add a KPI counting leads whose status equals the label
    Add {
        label: String,
        #[arg(long, default_value = "blue")]
        color: String,
        #[arg(long, default_value = "chart")]
        icon: String,
    },
    /// Change a KPI card
    Update {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Remove a KPI card
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Bind the profile to an account phone number
    Login {
        /// Account phone number (10 digits get +91)
        #[arg(long)]
        phone: String,
        /// Display name recorded with each sync
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the profile's account
    Status,
    /// Unbind the profile from its account
    Logout,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Lead source endpoint URL
        #[arg(long, value_name = "URL")]
        leads_endpoint: Option<String>,
        /// Spreadsheet id passed to the lead source
        #[arg(long, value_name = "ID")]
        sheet_id: Option<String>,
        /// Lead source request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Reject inserts whose identity key is already stored
        #[arg(long)]
        unique_leads: Option<bool>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile
    Show,
}
