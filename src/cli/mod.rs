use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod ai;
pub mod config;
pub mod contact;
pub mod dashboard;
pub mod display;
pub mod follow_up;
pub mod interaction;
pub mod search;
pub mod tag;
pub mod ui;

pub use ai::run_ai;
pub use config::run_config;
pub use contact::run_contact;
pub use dashboard::run_dashboard;
pub use follow_up::run_follow_up;
pub use interaction::run_interaction;
pub use search::run_search;
pub use tag::run_tag;

#[derive(Parser)]
#[command(name = "pcrm")]
#[command(about = "Personal CRM for the command line")]
#[command(version)]
pub struct Cli {
    /// Database file (default: $PCRM_DB or the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage contacts
    #[command(subcommand)]
    Contact(ContactCommand),
    /// Log and browse interactions
    #[command(subcommand)]
    Interaction(InteractionCommand),
    /// Manage follow-ups
    #[command(subcommand)]
    Followup(FollowUpCommand),
    /// Manage tags
    #[command(subcommand)]
    Tag(TagCommand),
    /// Overdue follow-ups, recent activity and neglected contacts
    Dashboard(DashboardArgs),
    /// Search in plain language, e.g. "contacts at Acme"
    Search(SearchArgs),
    /// AI summaries, briefings and follow-up suggestions
    #[command(subcommand)]
    Ai(AiCommand),
    /// Show or change AI settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

// ==================== CONTACTS ====================

#[derive(Subcommand)]
pub enum ContactCommand {
    /// Add a contact
    Add(ContactFields),
    /// Change a contact's fields; omitted fields keep their value, "-" clears
    Edit(ContactEditArgs),
    /// Full details with interactions, follow-ups and tags
    Show(IdentifierArgs),
    /// List contacts by name
    List(ContactListArgs),
    /// Delete a contact with its follow-ups
    Delete(DeleteArgs),
    /// Add a tag to a contact (created if missing)
    Tag(ContactTagArgs),
    /// Remove a tag from a contact
    Untag(ContactTagArgs),
}

#[derive(Args)]
pub struct ContactFields {
    /// Full name
    pub name: String,
    #[arg(short, long)]
    pub email: Option<String>,
    #[arg(short, long)]
    pub phone: Option<String>,
    #[arg(short, long)]
    pub company: Option<String>,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct ContactEditArgs {
    /// Contact name, UUID or UUID prefix
    pub identifier: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub email: Option<String>,
    #[arg(short, long)]
    pub phone: Option<String>,
    #[arg(short, long)]
    pub company: Option<String>,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct ContactListArgs {
    /// Only contacts whose name or company contains this text
    #[arg(short, long)]
    pub search: Option<String>,
    /// Only contacts with this tag
    #[arg(short, long)]
    pub tag: Option<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ContactTagArgs {
    /// Contact name, UUID or UUID prefix
    pub identifier: String,
    /// Tag name
    pub tag: String,
}

// ==================== INTERACTIONS ====================

#[derive(Subcommand)]
pub enum InteractionCommand {
    /// Log an interaction with one or more contacts
    Add(InteractionFields),
    /// Replace an interaction's fields and contacts
    Edit(InteractionEditArgs),
    /// Show one interaction
    Show(IdentifierArgs),
    /// Newest interactions first
    List(InteractionListArgs),
    /// Delete an interaction
    Delete(DeleteArgs),
}

#[derive(Args)]
pub struct InteractionFields {
    /// meeting, call, email, message or note
    #[arg(short = 'k', long = "type", default_value = "note")]
    pub interaction_type: String,
    /// Contact involved (name, UUID or prefix); repeat for several
    #[arg(short, long = "with", value_name = "CONTACT", required = true)]
    pub contacts: Vec<String>,
    #[arg(short, long)]
    pub title: Option<String>,
    /// Free-text notes about what happened
    #[arg(short = 'm', long)]
    pub content: Option<String>,
    /// When it happened: YYYY-MM-DD, "YYYY-MM-DD HH:MM", RFC 3339 or "now"
    #[arg(short, long, default_value = "now")]
    pub at: String,
}

#[derive(Args)]
pub struct InteractionEditArgs {
    /// Interaction UUID or prefix
    pub id: String,
    #[command(flatten)]
    pub fields: InteractionFields,
}

#[derive(Args)]
pub struct InteractionListArgs {
    /// Only this type
    #[arg(short = 'k', long = "type")]
    pub interaction_type: Option<String>,
    /// Only interactions with this contact
    #[arg(short, long = "with", value_name = "CONTACT")]
    pub contact: Option<String>,
    #[arg(short, long, default_value = "20")]
    pub limit: u32,
    #[arg(long)]
    pub json: bool,
}

// ==================== FOLLOW-UPS ====================

#[derive(Subcommand)]
pub enum FollowUpCommand {
    /// Schedule a follow-up
    Add(FollowUpFields),
    /// Replace a follow-up's fields
    Edit(FollowUpEditArgs),
    /// Show one follow-up
    Show(IdentifierArgs),
    /// Follow-ups by due date (open only unless --all or --done)
    List(FollowUpListArgs),
    /// Mark a follow-up completed
    Done(IdentifierArgs),
    /// Mark a completed follow-up open again
    Reopen(IdentifierArgs),
    /// Delete a follow-up
    Delete(DeleteArgs),
}

#[derive(Args)]
pub struct FollowUpFields {
    /// Contact (name, UUID or prefix)
    #[arg(short, long = "for", value_name = "CONTACT")]
    pub contact: String,
    /// What to do
    pub title: String,
    /// Due date: YYYY-MM-DD, today, tomorrow or +N (days)
    #[arg(short, long)]
    pub due: String,
    /// low, medium or high
    #[arg(short, long, default_value = "medium")]
    pub priority: String,
    #[arg(short = 'm', long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct FollowUpEditArgs {
    /// Follow-up UUID or prefix
    pub id: String,
    #[command(flatten)]
    pub fields: FollowUpFields,
}

#[derive(Args)]
pub struct FollowUpListArgs {
    /// Include completed follow-ups
    #[arg(short, long, conflicts_with = "done")]
    pub all: bool,
    /// Only completed follow-ups
    #[arg(short, long)]
    pub done: bool,
    #[arg(long)]
    pub json: bool,
}

// ==================== TAGS ====================

#[derive(Subcommand)]
pub enum TagCommand {
    /// Create a tag
    Add(TagAddArgs),
    /// All tags by name
    List,
    /// Delete a tag and remove it from every contact
    Delete(TagDeleteArgs),
}

#[derive(Args)]
pub struct TagAddArgs {
    pub name: String,
    /// Display color, e.g. "#22c55e"
    #[arg(short, long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct TagDeleteArgs {
    pub name: String,
    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

// ==================== OTHER ====================

/// Longest attention window `dashboard --days` accepts (100 years)
pub const MAX_ATTENTION_DAYS: i64 = 36_500;

#[derive(Args)]
pub struct DashboardArgs {
    /// Contacts not seen for this many days need attention
    #[arg(
        short,
        long,
        default_value_t = crate::db::DEFAULT_ATTENTION_DAYS,
        value_parser = clap::value_parser!(u32).range(1..=MAX_ATTENTION_DAYS)
    )]
    pub days: u32,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// What to look for, in plain language
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
    /// Print the query and results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum AiCommand {
    /// Summarize the history with a contact
    Summarize(IdentifierArgs),
    /// Briefing before a call or meeting
    Prep(IdentifierArgs),
    /// Suggest follow-ups for a contact
    Suggest(SuggestArgs),
}

#[derive(Args)]
pub struct SuggestArgs {
    /// Contact name, UUID or UUID prefix
    pub identifier: String,
    /// Save every suggestion as a follow-up without asking
    #[arg(long)]
    pub accept: bool,
    #[arg(long, conflicts_with = "accept")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Effective AI settings (API key masked)
    Show,
    /// Store a setting: ai_provider, ai_api_key, ai_api_url or ai_model
    Set(ConfigSetArgs),
    /// Remove all stored AI settings
    Clear,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

// ==================== SHARED ====================

#[derive(Args)]
pub struct IdentifierArgs {
    /// Name, UUID or UUID prefix
    pub identifier: String,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Name, UUID or UUID prefix
    pub identifier: String,
    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}
