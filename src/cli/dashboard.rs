use anyhow::Result;

use super::display::{print_dashboard, print_json};
use super::ui::today;
use super::DashboardArgs;
use crate::db::Database;

pub fn run_dashboard(db: &Database, args: DashboardArgs) -> Result<()> {
    let dashboard = db.dashboard(today(), args.days)?;
    if args.json {
        return print_json(&dashboard);
    }
    print_dashboard(&dashboard);
    Ok(())
}
