use clap::Parser;
use pcrm::cli::{
    run_ai, run_config, run_contact, run_dashboard, run_follow_up, run_interaction, run_search,
    run_tag, Cli, Commands,
};
use pcrm::db::Database;
use pcrm::logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let db = match cli.db {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };

    match cli.command {
        Commands::Contact(command) => run_contact(&db, command)?,
        Commands::Interaction(command) => run_interaction(&db, command)?,
        Commands::Followup(command) => run_follow_up(&db, command)?,
        Commands::Tag(command) => run_tag(&db, command)?,
        Commands::Dashboard(args) => run_dashboard(&db, args)?,
        Commands::Search(args) => run_search(&db, args)?,
        Commands::Ai(command) => run_ai(&db, command)?,
        Commands::Config(command) => run_config(&db, command)?,
    }

    Ok(())
}
