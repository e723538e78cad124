use anyhow::{anyhow, Result};
use uuid::Uuid;

use super::display::{
    print_interaction_detail, print_interaction_list, print_interactions, print_json,
};
use super::ui::{
    confirm_unless, parse_local_datetime, resolve_contact, resolve_record, short_id, status,
};
use super::{InteractionCommand, InteractionFields, InteractionListArgs};
use crate::db::{Database, RecordTable};
use crate::models::{InteractionInput, InteractionType};

pub fn run_interaction(db: &Database, command: InteractionCommand) -> Result<()> {
    match command {
        InteractionCommand::Add(fields) => {
            let input = to_input(db, fields)?;
            let interaction = db.create_interaction(&input)?;
            status(&format!(
                "Logged {} [{}].",
                interaction.interaction_type,
                short_id(&interaction.id)
            ));
            Ok(())
        }
        InteractionCommand::Edit(args) => {
            let id = resolve_record(db, RecordTable::Interactions, &args.id)?;
            let input = to_input(db, args.fields)?;
            if !db.update_interaction(id, &input)? {
                return Err(anyhow!("Interaction not found."));
            }
            status("Saved.");
            Ok(())
        }
        InteractionCommand::Show(args) => {
            let id = resolve_record(db, RecordTable::Interactions, &args.identifier)?;
            let interaction = db
                .get_interaction(id)?
                .ok_or_else(|| anyhow!("Interaction not found."))?;
            print_interaction_detail(&interaction);
            Ok(())
        }
        InteractionCommand::List(args) => list(db, args),
        InteractionCommand::Delete(args) => {
            let id = resolve_record(db, RecordTable::Interactions, &args.identifier)?;
            if !confirm_unless(args.yes, "Delete this interaction?")? {
                status("Cancelled.");
                return Ok(());
            }
            if !db.delete_interaction(id)? {
                return Err(anyhow!("Interaction not found."));
            }
            status("Deleted.");
            Ok(())
        }
    }
}

fn to_input(db: &Database, fields: InteractionFields) -> Result<InteractionInput> {
    let interaction_type: InteractionType = fields
        .interaction_type
        .parse()
        .map_err(|e: String| anyhow!(e))?;

    let mut contact_ids: Vec<Uuid> = Vec::with_capacity(fields.contacts.len());
    for identifier in &fields.contacts {
        let id = resolve_contact(db, identifier)?.id;
        if !contact_ids.contains(&id) {
            contact_ids.push(id);
        }
    }

    Ok(InteractionInput {
        interaction_type,
        title: fields.title,
        content: fields.content,
        occurred_at: Some(parse_local_datetime(&fields.at)?),
        contact_ids,
    })
}

fn list(db: &Database, args: InteractionListArgs) -> Result<()> {
    let interaction_type = args
        .interaction_type
        .as_deref()
        .map(str::parse::<InteractionType>)
        .transpose()
        .map_err(|e| anyhow!(e))?;

    if let Some(identifier) = args.contact.as_deref() {
        let contact = resolve_contact(db, identifier)?;
        let interactions: Vec<_> = db
            .get_interactions_for_contact(contact.id, Some(args.limit))?
            .into_iter()
            .filter(|i| interaction_type.map_or(true, |t| i.interaction_type == t))
            .collect();
        if args.json {
            return print_json(&interactions);
        }
        print_interactions(&interactions);
        return Ok(());
    }

    let interactions = db.list_interactions(interaction_type, Some(args.limit))?;
    if args.json {
        return print_json(&interactions);
    }
    print_interaction_list(&interactions);
    Ok(())
}
