use clap::Parser;
use color_eyre::Result;
use dueline::cli::{self, Cli, Commands};
use dueline::logging::{self, LogTarget};
use dueline::{BlobStore, Config, Database, MemoryBlobStore, Profile, TaskId, TaskStore};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let command = cli.command.unwrap_or(Commands::Tui);
    let log_target = match command {
        Commands::Tui => LogTarget::File,
        _ => LogTarget::Stderr,
    };
    let _log_guard = logging::init(profile, log_target, cli.verbose);

    // --config overrides the profile's config location
    let (mut config, config_path) = match cli.config {
        Some(path) => {
            let path = PathBuf::from(path);
            (Config::load_from_path_with_profile(&path, profile)?, path)
        }
        None => (
            Config::load_with_profile(profile)?,
            Config::get_config_path(profile)?,
        ),
    };

    let backend: Box<dyn BlobStore> = if cli.ephemeral {
        Box::new(MemoryBlobStore::new())
    } else {
        Box::new(Database::new(&config.get_database_path())?)
    };
    let mut store = TaskStore::load(backend);
    tracing::debug!(tasks = store.len(), "loaded task store");

    match command {
        Commands::Tui => {
            let app = dueline::tui::App::new(config, config_path, store);
            dueline::tui::run_event_loop(app)?;
        }
        Commands::Add { title, date, time, description } => {
            cli::handle_add(title, date, time, description, &mut store)?;
        }
        Commands::List { sort } => {
            cli::handle_list(sort, &mut store)?;
        }
        Commands::Edit { id, title, description, date, time } => {
            cli::handle_edit(TaskId(id), title, description, date, time, &mut store)?;
        }
        Commands::Toggle { id } => {
            cli::handle_toggle(TaskId(id), &mut store)?;
        }
        Commands::Delete { id, yes } => {
            cli::handle_delete(TaskId(id), yes, &mut store)?;
        }
        Commands::Check { force } => {
            cli::handle_check(force, &store, &config)?;
        }
        Commands::Watch => {
            cli::handle_watch(&mut store, &config)?;
        }
        Commands::EnableReminders => {
            cli::handle_set_reminders(true, &mut config, &config_path)?;
        }
        Commands::DisableReminders => {
            cli::handle_set_reminders(false, &mut config, &config_path)?;
        }
    }

    Ok(())
}
