use anyhow::Result;

use super::display::print_json;
use super::ui::{confirm, resolve_contact, short_id, status, today, truncate, warning};
use super::{AiCommand, SuggestArgs};
use crate::ai::{
    accept_suggestion, prepare_conversation, suggest_follow_ups, summarize_contact, AiConfig,
    AiProvider, FollowUpSuggestion,
};
use crate::db::Database;

pub fn run_ai(db: &Database, command: AiCommand) -> Result<()> {
    let provider = AiConfig::load(db)?.build_provider()?;
    match command {
        AiCommand::Summarize(args) => {
            let contact = resolve_contact(db, &args.identifier)?;
            println!("{}", summarize_contact(provider.as_ref(), db, contact.id)?);
        }
        AiCommand::Prep(args) => {
            let contact = resolve_contact(db, &args.identifier)?;
            println!("{}", prepare_conversation(provider.as_ref(), db, contact.id)?);
        }
        AiCommand::Suggest(args) => suggest(provider.as_ref(), db, args)?,
    }
    Ok(())
}

fn print_suggestion(index: usize, s: &FollowUpSuggestion) {
    println!(
        "{}. {}  (due {}, {})",
        index + 1,
        s.title,
        s.due_date.format("%Y-%m-%d"),
        s.priority
    );
    if !s.reasoning.is_empty() {
        println!("   {}", truncate(&s.reasoning, 100));
    }
}

fn suggest(provider: &dyn AiProvider, db: &Database, args: SuggestArgs) -> Result<()> {
    let contact = resolve_contact(db, &args.identifier)?;
    let suggestions = suggest_follow_ups(provider, db, contact.id, today())?;

    if args.json {
        return print_json(&suggestions);
    }
    if suggestions.is_empty() {
        status("No suggestions.");
        return Ok(());
    }

    let mut saved = 0;
    for (index, suggestion) in suggestions.iter().enumerate() {
        print_suggestion(index, suggestion);
        if suggestion.contact_id != contact.id {
            warning(&format!(
                "Suggestion names another contact; it will be added to {}.",
                contact.name
            ));
        }
        if args.accept || confirm("Add this follow-up?")? {
            let follow_up = accept_suggestion(db, contact.id, suggestion)?;
            tracing::debug!(follow_up_id = %follow_up.id, "accepted suggestion");
            println!("   Added [{}].", short_id(&follow_up.id));
            saved += 1;
        }
    }
    status(&format!("{} of {} added.", saved, suggestions.len()));
    Ok(())
}
