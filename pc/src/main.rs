use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use presetcam::catalog::{self, ImportStatus};
use presetcam::cli::{Cli, Command};
use presetcam::config::Config;
use presetcam::domain::{Preset, PresetOption, PresetPatch};
use presetcam::history::SelectionHistory;
use presetcam::overlay::PresetRepository;
use presetcam::resolve::{AspectRatio, ClockSeed, FixedSeed, PromptResolver, SeedProvider};
use presetstore::{HistoryStore, JsonHistoryStore, JsonlRecordStore, OfflineStore, RecordStore};

/// Imported catalog kept next to the overlay records
const IMPORTED_FILE: &str = "imported_presets.json";

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("presetcam")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = cli_log_level
        .or(config_log_level)
        .map_or(tracing::Level::INFO, parse_log_level);

    let log_file = fs::File::create(log_dir.join("presetcam.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Level names are case-insensitive; "warning" is accepted for WARN
fn parse_log_level(name: &str) -> tracing::Level {
    let name = if name.eq_ignore_ascii_case("warning") { "warn" } else { name };
    name.parse().unwrap_or_else(|_| {
        eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", name);
        tracing::Level::INFO
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(storage = %config.storage.dir.display(), "presetcam starting");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::List { category } => cmd_list(&config, category.as_deref()),
        Command::Show { name } => cmd_show(&config, &name),
        Command::Resolve {
            name,
            seed,
            choice,
            master,
            aspect,
        } => cmd_resolve(&config, &name, seed, choice.as_deref(), master, aspect),
        Command::Add {
            name,
            message,
            category,
            option,
            randomize,
        } => cmd_add(&config, name, message, category, option, randomize),
        Command::Modify {
            name,
            message,
            category,
            randomize,
            rename,
        } => {
            let patch = PresetPatch {
                name: rename,
                category: (!category.is_empty()).then_some(category),
                message,
                options: None,
                randomize_options: randomize,
            };
            cmd_modify(&config, &name, patch)
        }
        Command::Delete { name } => cmd_delete(&config, &name),
        Command::Restore { name } => cmd_restore(&config, &name),
        Command::Import {
            file,
            select,
            filter,
            dry_run,
        } => cmd_import(&config, &file, &select, filter.as_deref(), dry_run),
        Command::Unimport { name, all } => match name {
            Some(name) if !all => cmd_unimport(&config, &name),
            _ => cmd_unimport_all(&config),
        },
        Command::History { name } => cmd_history(&config, &name),
        Command::Reset { factory_only } => cmd_reset(&config, factory_only),
    }
}

fn imported_path(config: &Config) -> PathBuf {
    config.storage.dir.join(IMPORTED_FILE)
}

/// Imported catalog if one exists, else the factory catalog, else empty
fn load_base_catalog(config: &Config) -> Result<Vec<Preset>> {
    let imported = imported_path(config);
    if imported.exists() {
        return catalog::load_catalog_file(&imported).context("Failed to load imported catalog");
    }
    match &config.catalog.factory_path {
        Some(path) => catalog::load_catalog_file(path)
            .context(format!("Failed to load factory catalog from {}", path.display())),
        None => {
            debug!("load_base_catalog: no factory catalog configured");
            Ok(Vec::new())
        }
    }
}

/// Overlay store, or an offline stand-in when the storage dir cannot be opened
fn open_record_store(config: &Config) -> Box<dyn RecordStore> {
    match JsonlRecordStore::open(&config.storage.dir) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "Overlay store unavailable");
            Box::new(OfflineStore::new(config.storage.dir.clone(), e.to_string()))
        }
    }
}

/// Selection history store, or an offline stand-in when the storage dir cannot be opened
fn open_history_store(config: &Config) -> Box<dyn HistoryStore> {
    match JsonHistoryStore::open(&config.storage.dir) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "History store unavailable");
            Box::new(OfflineStore::new(config.storage.dir.clone(), e.to_string()))
        }
    }
}

fn open_repository(config: &Config) -> Result<PresetRepository<Box<dyn RecordStore>>> {
    let mut repo = PresetRepository::new(open_record_store(config));
    let report = repo.load(load_base_catalog(config)?);
    if !report.storage_available {
        eprintln!(
            "{} Storage unavailable at {}; using base catalog only",
            "!".yellow(),
            config.storage.dir.display()
        );
    }
    if report.skipped > 0 {
        eprintln!(
            "{} Skipped {} unreadable overlay record(s)",
            "!".yellow(),
            report.skipped
        );
    }
    debug!(?report, "open_repository: loaded");
    Ok(repo)
}

fn cmd_list(config: &Config, category: Option<&str>) -> Result<()> {
    let repo = open_repository(config)?;
    let presets: Vec<Preset> = repo
        .merged_catalog()
        .into_iter()
        .filter(|p| category.is_none_or(|c| p.has_category(c)))
        .collect();

    if presets.is_empty() {
        println!("No presets found");
        return Ok(());
    }
    for preset in presets {
        let mut line = preset.name.cyan().to_string();
        if !preset.internal {
            line.push_str(&format!(" {}", "[user]".green()));
        } else if repo.is_overridden(&preset.name) {
            line.push_str(&format!(" {}", "[modified]".yellow()));
        }
        if !preset.category.is_empty() {
            line.push_str(&format!(" {}", preset.category.join(", ").dimmed()));
        }
        println!("{}", line);
    }
    Ok(())
}

fn cmd_show(config: &Config, name: &str) -> Result<()> {
    let repo = open_repository(config)?;
    let preset = repo.get(name).ok_or_else(|| eyre!("Preset not found: {}", name))?;
    println!("{}", serde_json::to_string_pretty(&preset)?);
    Ok(())
}

fn cmd_resolve(
    config: &Config,
    name: &str,
    seed: Option<i64>,
    choice: Option<&str>,
    master: Option<String>,
    aspect: Option<AspectRatio>,
) -> Result<()> {
    let repo = open_repository(config)?;
    let preset = repo.get(name).ok_or_else(|| eyre!("Preset not found: {}", name))?;

    let mut settings = config.prompt.settings();
    if let Some(text) = master {
        settings.master_prompt_enabled = true;
        settings.master_prompt_text = text;
    }
    if let Some(aspect) = aspect {
        settings.aspect_ratio = aspect;
    }

    let seed = seed.unwrap_or_else(|| ClockSeed.next_seed());
    let mut resolver = PromptResolver::new(FixedSeed(seed), SelectionHistory::new(open_history_store(config)));
    let resolution = resolver.resolve(&preset, &settings, choice);

    info!(name, seed = resolution.seed, "Resolved preset");
    eprintln!("{} {}", "seed:".dimmed(), resolution.seed);
    println!("{}", resolution.prompt);
    Ok(())
}

fn cmd_add(
    config: &Config,
    name: String,
    message: String,
    category: Vec<String>,
    option: Vec<String>,
    randomize: bool,
) -> Result<()> {
    let mut repo = open_repository(config)?;
    let options = option
        .into_iter()
        .enumerate()
        .map(|(i, text)| PresetOption::new(format!("{:03}", i + 1), text))
        .collect();

    let mut preset = category
        .into_iter()
        .fold(Preset::new(name, message), |p, c| p.with_category(c))
        .with_options(options);
    if randomize {
        preset = preset.randomized();
    }

    let name = preset.name.clone();
    repo.apply_new(preset).context("Failed to save preset")?;
    println!("{} Added preset: {}", "✓".green(), name.cyan());
    Ok(())
}

fn cmd_modify(config: &Config, name: &str, patch: PresetPatch) -> Result<()> {
    if patch.is_empty() {
        return Err(eyre!("Nothing to modify: pass --message, --category, --randomize or --rename"));
    }
    let mut repo = open_repository(config)?;
    if !repo.apply_modification(name, patch).context("Failed to save modification")? {
        return Err(eyre!("Preset not found: {}", name));
    }
    println!("{} Modified preset: {}", "✓".green(), name.cyan());
    Ok(())
}

fn cmd_delete(config: &Config, name: &str) -> Result<()> {
    let mut repo = open_repository(config)?;
    if !repo.apply_deletion(name).context("Failed to save deletion")? {
        return Err(eyre!("Preset not found: {}", name));
    }
    println!("{} Deleted preset: {}", "✓".green(), name.cyan());
    Ok(())
}

fn cmd_restore(config: &Config, name: &str) -> Result<()> {
    let mut repo = open_repository(config)?;
    if repo.restore(name).context("Failed to restore preset")? {
        println!("{} Restored preset: {}", "✓".green(), name.cyan());
    } else {
        println!("Preset {} has no changes to restore", name.cyan());
    }
    Ok(())
}

fn cmd_import(config: &Config, file: &Path, select: &[String], filter: Option<&str>, dry_run: bool) -> Result<()> {
    let mut incoming = catalog::load_catalog_file(file).context(format!("Failed to import {}", file.display()))?;
    if let Some(query) = filter {
        incoming = catalog::filter_by_name(incoming, query);
        debug!(query, matched = incoming.len(), "cmd_import: filtered by name");
    }

    for wanted in select {
        if !incoming.iter().any(|p| &p.name == wanted) {
            warn!(name = %wanted, "cmd_import: selected preset not in file");
            eprintln!("{} Not in {}: {}", "!".yellow(), file.display(), wanted);
        }
    }
    let selected: Vec<Preset> = incoming
        .into_iter()
        .filter(|p| select.is_empty() || select.contains(&p.name))
        .collect();

    let existing = load_base_catalog(config)?;
    for preset in &selected {
        let status = catalog::import_status(&existing, preset);
        let tag = match status {
            ImportStatus::New => status.to_string().green(),
            ImportStatus::Updated => status.to_string().yellow(),
            ImportStatus::Unchanged => status.to_string().dimmed(),
        };
        println!("{} {}", tag, preset.name);
    }

    let (merged, summary) = catalog::merge_import(&existing, &selected);
    if dry_run {
        println!("Dry run: {}", summary.message());
        return Ok(());
    }

    catalog::save_catalog_file(&imported_path(config), &merged).context("Failed to save imported catalog")?;
    println!("{} {}", "✓".green(), summary.message());
    Ok(())
}

fn cmd_unimport(config: &Config, name: &str) -> Result<()> {
    let path = imported_path(config);
    if !path.exists() {
        return Err(eyre!("No imported catalog"));
    }
    let mut imported = catalog::load_catalog_file(&path).context("Failed to load imported catalog")?;
    if !catalog::remove_imported(&mut imported, name) {
        return Err(eyre!("Preset not in imported catalog: {}", name));
    }
    catalog::save_catalog_file(&path, &imported).context("Failed to save imported catalog")?;
    println!("{} Removed imported preset: {}", "✓".green(), name.cyan());
    Ok(())
}

fn cmd_unimport_all(config: &Config) -> Result<()> {
    if catalog::clear_imported(&imported_path(config)).context("Failed to remove imported catalog")? {
        println!("{} Imported catalog removed; using factory catalog", "✓".green());
    } else {
        println!("No imported catalog");
    }
    Ok(())
}

fn cmd_history(config: &Config, name: &str) -> Result<()> {
    let entries = SelectionHistory::new(open_history_store(config)).get_history(name);
    if entries.is_empty() {
        println!("No selections recorded for {}", name.cyan());
        return Ok(());
    }
    for (i, text) in entries.iter().enumerate() {
        println!("{} {}", format!("{}.", i + 1).dimmed(), text);
    }
    Ok(())
}

fn cmd_reset(config: &Config, factory_only: bool) -> Result<()> {
    let mut repo = open_repository(config)?;
    if factory_only {
        repo.clear_factory_overrides().context("Failed to clear overrides")?;
        println!("{} Factory presets restored; user presets kept", "✓".green());
    } else {
        repo.clear_all().context("Failed to clear overlays")?;
        println!("{} All preset changes cleared", "✓".green());
    }
    Ok(())
}
