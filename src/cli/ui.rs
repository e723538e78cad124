//! Shared UI primitives for pcrm
//!
//! Conventions:
//! - Feedback: single word when possible: `Saved.`
//! - Errors and warnings go to stderr; data goes to stdout
//! - Interactive prompts only when a choice is ambiguous or destructive

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use inquire::{ui::RenderConfig, Confirm, Select};
use uuid::Uuid;

use crate::db::{Database, RecordTable};
use crate::models::Contact;

/// How many name matches to offer when a name is ambiguous
const NAME_MATCH_LIMIT: u32 = 20;

// ============================================================================
// Layout Primitives
// ============================================================================

/// Truncate a string to max_chars, adding ellipsis if needed.
/// Result will be at most max_chars characters (including ellipsis if truncated).
pub fn truncate(s: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars - 1).collect();
    format!("{}…", kept)
}

/// First 8 characters of a UUID, enough to address a record
pub fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

// ============================================================================
// Message Functions
// ============================================================================

/// Print a status message to stdout
#[inline]
pub fn status(msg: &str) {
    println!("{}", msg);
}

/// Print a warning message to stderr
#[inline]
pub fn warning(msg: &str) {
    eprintln!("Warning: {}", msg);
}

// ============================================================================
// Prompts
// ============================================================================

/// Get a minimal render config for inquire prompts
pub fn minimal_render_config() -> RenderConfig<'static> {
    RenderConfig::default_colored()
        .with_prompt_prefix(inquire::ui::Styled::new(""))
        .with_answered_prompt_prefix(inquire::ui::Styled::new(""))
}

/// Prompt for yes/no confirmation (default: no)
pub fn confirm(prompt: &str) -> Result<bool> {
    let result = Confirm::new(prompt)
        .with_render_config(minimal_render_config())
        .with_default(false)
        .prompt_skippable()?;
    Ok(result.unwrap_or(false))
}

/// `true` when `--yes` was given or the user confirms
pub fn confirm_unless(yes: bool, prompt: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    confirm(prompt)
}

/// "Name (Title at Company)" for pickers
fn format_contact_for_select(contact: &Contact) -> String {
    match contact.headline() {
        Some(h) => format!("{} ({}) [{}]", contact.name, h, short_id(&contact.id)),
        None => format!("{} [{}]", contact.name, short_id(&contact.id)),
    }
}

/// Display a contact selection menu using inquire Select.
/// Returns None if cancelled.
pub fn select_contact(contacts: &[Contact]) -> Result<Option<Contact>> {
    match contacts {
        [] => return Ok(None),
        [only] => return Ok(Some(only.clone())),
        _ => {}
    }

    let options: Vec<String> = contacts.iter().map(format_contact_for_select).collect();
    let result = Select::new("Select:", options.clone())
        .with_render_config(minimal_render_config())
        .with_vim_mode(true)
        .prompt_skippable()?;

    Ok(result.and_then(|selected| {
        options
            .iter()
            .position(|o| *o == selected)
            .map(|idx| contacts[idx].clone())
    }))
}

// ============================================================================
// Record Lookup Helpers
// ============================================================================

/// Find a contact by UUID, UUID prefix or name. A name matching several
/// contacts opens a picker.
pub fn resolve_contact(db: &Database, identifier: &str) -> Result<Contact> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(anyhow!("Identifier cannot be empty."));
    }

    if let Some(id) = db.resolve_id(RecordTable::Contacts, identifier)? {
        if let Some(contact) = db.get_contact(id)? {
            return Ok(contact);
        }
    }

    let matches = db.find_contacts_by_name(identifier, NAME_MATCH_LIMIT)?;
    if let Some(exact) = matches
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(identifier))
        .filter(|_| matches.iter().filter(|c| c.name.eq_ignore_ascii_case(identifier)).count() == 1)
    {
        return Ok(exact.clone());
    }

    match select_contact(&matches)? {
        Some(contact) => Ok(contact),
        None if matches.is_empty() => Err(anyhow!("No contact matches '{}'", identifier)),
        None => Err(anyhow!("Cancelled.")),
    }
}

/// Resolve a full or abbreviated id in `table`, failing if nothing matches
pub fn resolve_record(db: &Database, table: RecordTable, identifier: &str) -> Result<Uuid> {
    db.resolve_id(table, identifier)?
        .ok_or_else(|| anyhow!("No {} record with id '{}'", table.as_str(), identifier.trim()))
}

// ============================================================================
// Date Input
// ============================================================================

/// A calendar date: `YYYY-MM-DD`, `today`, `tomorrow`, `yesterday` or `+N`
/// (days from `today`).
pub fn parse_date_input(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }
    if let Some(days) = input.strip_prefix('+') {
        let days: i64 = days
            .trim_end_matches('d')
            .parse()
            .map_err(|_| anyhow!("Invalid date '{}'", input))?;
        return Duration::try_days(days)
            .and_then(|offset| today.checked_add_signed(offset))
            .ok_or_else(|| anyhow!("Invalid date '{}'", input));
    }
    NaiveDate::parse_from_str(&input, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}'. Use YYYY-MM-DD.", input))
}

/// A point in time: RFC 3339, `YYYY-MM-DD HH:MM` in `tz`, a bare date (noon
/// in `tz`) or `now`.
pub fn parse_datetime_input<Tz: TimeZone>(
    input: &str,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("now") {
        return Ok(now);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| NaiveTime::from_hms_opt(12, 0, 0).map(|t| d.and_time(t)))
        })
        .ok_or_else(|| {
            anyhow!("Invalid date/time '{}'. Use YYYY-MM-DD or \"YYYY-MM-DD HH:MM\".", input)
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("'{}' does not exist in the local time zone", input))
}

/// [`parse_datetime_input`] against the clock and local time zone
pub fn parse_local_datetime(input: &str) -> Result<DateTime<Utc>> {
    parse_datetime_input(input, Utc::now(), &Local)
}

/// Today's date in the local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Render a stored UTC timestamp in local time
pub fn local_time(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
