use anyhow::Result;

use super::display::{print_json, print_search_outcome};
use super::ui::today;
use super::SearchArgs;
use crate::ai::AiConfig;
use crate::db::Database;
use crate::search::translate_and_search;

pub fn run_search(db: &Database, args: SearchArgs) -> Result<()> {
    let query = args.query.join(" ");
    let provider = AiConfig::load(db)?.build_provider()?;
    tracing::info!(provider = provider.name(), %query, "natural-language search");

    let outcome = translate_and_search(provider.as_ref(), db, &query, today())?;
    if args.json {
        return print_json(&outcome);
    }
    print_search_outcome(&outcome);
    Ok(())
}
