use anyhow::{anyhow, Result};

use super::display::{print_contact_detail, print_contact_list, print_json};
use super::ui::{confirm_unless, resolve_contact, short_id, status, today};
use super::{ContactCommand, ContactEditArgs, ContactFields, ContactListArgs, ContactTagArgs};
use crate::db::Database;
use crate::models::{ContactInput, TagInput};

pub fn run_contact(db: &Database, command: ContactCommand) -> Result<()> {
    match command {
        ContactCommand::Add(fields) => add(db, fields),
        ContactCommand::Edit(args) => edit(db, args),
        ContactCommand::Show(args) => show(db, &args.identifier),
        ContactCommand::List(args) => list(db, args),
        ContactCommand::Delete(args) => delete(db, &args.identifier, args.yes),
        ContactCommand::Tag(args) => tag(db, args),
        ContactCommand::Untag(args) => untag(db, args),
    }
}

fn add(db: &Database, fields: ContactFields) -> Result<()> {
    let input = ContactInput {
        name: fields.name,
        email: fields.email,
        phone: fields.phone,
        company: fields.company,
        title: fields.title,
        notes: fields.notes,
    };
    let contact = db.create_contact(&input)?;
    status(&format!("Added {} [{}].", contact.name, short_id(&contact.id)));
    Ok(())
}

/// `None` keeps the current value; "-" clears it
fn edited(new: Option<String>, current: Option<String>) -> Option<String> {
    match new.as_deref() {
        None => current,
        Some("-") => None,
        Some(_) => new,
    }
}

fn edit(db: &Database, args: ContactEditArgs) -> Result<()> {
    let contact = resolve_contact(db, &args.identifier)?;
    let input = ContactInput {
        name: args.name.unwrap_or_else(|| contact.name.clone()),
        email: edited(args.email, contact.email),
        phone: edited(args.phone, contact.phone),
        company: edited(args.company, contact.company),
        title: edited(args.title, contact.title),
        notes: edited(args.notes, contact.notes),
    };

    if !db.update_contact(contact.id, &input)? {
        return Err(anyhow!("Contact not found."));
    }
    status("Saved.");
    Ok(())
}

fn show(db: &Database, identifier: &str) -> Result<()> {
    let contact = resolve_contact(db, identifier)?;
    let detail = db
        .get_contact_detail(contact.id)?
        .ok_or_else(|| anyhow!("Contact not found."))?;
    print_contact_detail(&detail, today());
    Ok(())
}

fn list(db: &Database, args: ContactListArgs) -> Result<()> {
    let tag_id = match args.tag.as_deref() {
        Some(name) => Some(
            db.get_tag_by_name(name)?
                .ok_or_else(|| anyhow!("No tag named '{}'", name))?
                .id,
        ),
        None => None,
    };
    let contacts = db.list_contacts(args.search.as_deref(), tag_id)?;
    if args.json {
        return print_json(&contacts);
    }
    print_contact_list(&contacts);
    Ok(())
}

fn delete(db: &Database, identifier: &str, yes: bool) -> Result<()> {
    let contact = resolve_contact(db, identifier)?;
    let prompt = format!("Delete {} and their follow-ups?", contact.name);
    if !confirm_unless(yes, &prompt)? {
        status("Cancelled.");
        return Ok(());
    }
    db.delete_contact(contact.id)?;
    status("Deleted.");
    Ok(())
}

fn tag(db: &Database, args: ContactTagArgs) -> Result<()> {
    let contact = resolve_contact(db, &args.identifier)?;
    let tag = match db.get_tag_by_name(&args.tag)? {
        Some(tag) => tag,
        None => db.create_tag(&TagInput {
            name: args.tag,
            color: None,
        })?,
    };
    db.assign_tag(contact.id, tag.id)?;
    status(&format!("Tagged {} #{}.", contact.name, tag.name));
    Ok(())
}

fn untag(db: &Database, args: ContactTagArgs) -> Result<()> {
    let contact = resolve_contact(db, &args.identifier)?;
    let tag = db
        .get_tag_by_name(&args.tag)?
        .ok_or_else(|| anyhow!("No tag named '{}'", args.tag))?;
    if db.remove_tag(contact.id, tag.id)? {
        status("Removed.");
    } else {
        status(&format!("{} is not tagged #{}.", contact.name, tag.name));
    }
    Ok(())
}
