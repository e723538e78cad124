use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};

use super::display::{print_follow_up_detail, print_follow_up_list, print_json};
use super::ui::{
    confirm_unless, parse_date_input, resolve_contact, resolve_record, short_id, status, today,
};
use super::{FollowUpCommand, FollowUpFields, FollowUpListArgs};
use crate::db::{Database, RecordTable};
use crate::models::{FollowUpInput, Priority};

pub fn run_follow_up(db: &Database, command: FollowUpCommand) -> Result<()> {
    match command {
        FollowUpCommand::Add(fields) => {
            let input = to_input(db, fields, today())?;
            let follow_up = db.create_follow_up(&input)?;
            status(&format!(
                "Scheduled for {} [{}].",
                follow_up.due_date.format("%Y-%m-%d"),
                short_id(&follow_up.id)
            ));
            Ok(())
        }
        FollowUpCommand::Edit(args) => {
            let id = resolve_record(db, RecordTable::FollowUps, &args.id)?;
            let input = to_input(db, args.fields, today())?;
            if !db.update_follow_up(id, &input)? {
                return Err(anyhow!("Follow-up not found."));
            }
            status("Saved.");
            Ok(())
        }
        FollowUpCommand::Show(args) => {
            let id = resolve_record(db, RecordTable::FollowUps, &args.identifier)?;
            let follow_up = db
                .get_follow_up(id)?
                .ok_or_else(|| anyhow!("Follow-up not found."))?;
            print_follow_up_detail(&follow_up, today());
            Ok(())
        }
        FollowUpCommand::List(args) => list(db, args),
        FollowUpCommand::Done(args) => {
            let id = resolve_record(db, RecordTable::FollowUps, &args.identifier)?;
            if !db.complete_follow_up(id, Utc::now())? {
                return Err(anyhow!("Follow-up not found."));
            }
            status("Done.");
            Ok(())
        }
        FollowUpCommand::Reopen(args) => {
            let id = resolve_record(db, RecordTable::FollowUps, &args.identifier)?;
            if !db.reopen_follow_up(id)? {
                return Err(anyhow!("Follow-up not found."));
            }
            status("Reopened.");
            Ok(())
        }
        FollowUpCommand::Delete(args) => {
            let id = resolve_record(db, RecordTable::FollowUps, &args.identifier)?;
            if !confirm_unless(args.yes, "Delete this follow-up?")? {
                status("Cancelled.");
                return Ok(());
            }
            if !db.delete_follow_up(id)? {
                return Err(anyhow!("Follow-up not found."));
            }
            status("Deleted.");
            Ok(())
        }
    }
}

fn to_input(db: &Database, fields: FollowUpFields, today: NaiveDate) -> Result<FollowUpInput> {
    let contact = resolve_contact(db, &fields.contact)?;
    let priority: Priority = fields.priority.parse().map_err(|e: String| anyhow!(e))?;
    Ok(FollowUpInput {
        contact_id: Some(contact.id),
        title: fields.title,
        description: fields.description,
        due_date: Some(parse_date_input(&fields.due, today)?),
        priority,
    })
}

fn list(db: &Database, args: FollowUpListArgs) -> Result<()> {
    let completed = match (args.all, args.done) {
        (true, _) => None,
        (false, true) => Some(true),
        (false, false) => Some(false),
    };
    let follow_ups = db.list_follow_ups(completed)?;
    if args.json {
        return print_json(&follow_ups);
    }
    print_follow_up_list(&follow_ups, today());
    Ok(())
}
