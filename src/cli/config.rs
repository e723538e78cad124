use anyhow::Result;

use super::ui::{confirm, status};
use super::ConfigCommand;
use crate::ai::{validate_setting, AiConfig};
use crate::db::Database;

pub fn run_config(db: &Database, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let config = AiConfig::load(db)?;
            println!("provider  {}", config.provider_type);
            println!("model     {}", config.effective_model());
            println!("api url   {}", config.effective_api_url());
            match config.masked_key() {
                Some(key) => println!("api key   {}", key),
                None => println!("api key   (not set)"),
            }
        }
        ConfigCommand::Set(args) => {
            validate_setting(&args.key, &args.value)?;
            db.set_setting(&args.key, args.value.trim())?;
            status("Saved.");
        }
        ConfigCommand::Clear => {
            if !confirm("Remove all stored AI settings?")? {
                status("Cancelled.");
                return Ok(());
            }
            AiConfig::clear(db)?;
            status("Cleared.");
        }
    }
    Ok(())
}
