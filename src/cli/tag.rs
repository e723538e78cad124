use anyhow::{anyhow, Result};

use super::display::print_tags;
use super::ui::{confirm_unless, status};
use super::TagCommand;
use crate::db::Database;
use crate::models::TagInput;

pub fn run_tag(db: &Database, command: TagCommand) -> Result<()> {
    match command {
        TagCommand::Add(args) => {
            let tag = db.create_tag(&TagInput {
                name: args.name,
                color: args.color,
            })?;
            status(&format!("Created #{}.", tag.name));
        }
        TagCommand::List => print_tags(&db.list_tags()?),
        TagCommand::Delete(args) => {
            let tag = db
                .get_tag_by_name(&args.name)?
                .ok_or_else(|| anyhow!("No tag named '{}'", args.name))?;
            let prompt = format!("Delete #{} from every contact?", tag.name);
            if !confirm_unless(args.yes, &prompt)? {
                status("Cancelled.");
                return Ok(());
            }
            db.delete_tag(tag.id)?;
            status("Deleted.");
        }
    }
    Ok(())
}
