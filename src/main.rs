//! dirconfig CLI entrypoint.
//!
//! This is the main entrypoint for the dirconfig command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dirconfig::cli::{Cli, Commands, MessageLevel, OutputFormat, OutputFormatter, StateCommands};
use dirconfig::client::ConfigApiClient;
use dirconfig::config::{ConfigParser, ConfigValidator, DeclarationFile, find_config_file, split_address};
use dirconfig::error::{ConfigError, DirConfigError, Result, StateError};
use dirconfig::lifecycle::ResourceManager;
use dirconfig::planner::{DiffEngine, PlanExecutor, refresh_state, schema_for};
use dirconfig::resources;
use dirconfig::state::{
    LocalStateStore, LockInfo, ProviderState, ResourceState, ResourceStatus, StateStore, generate_holder_id,
};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Validate => cmd_validate(config, &formatter),
        Commands::Plan { detailed } => cmd_plan(config, detailed, &formatter).await,
        Commands::Apply { yes, continue_on_error } => cmd_apply(config, yes, continue_on_error, &formatter).await,
        Commands::Refresh => cmd_refresh(config, &formatter).await,
        Commands::Import { address, id } => cmd_import(config, &address, &id, &formatter).await,
        Commands::Destroy { yes } => cmd_destroy(config, yes, &formatter).await,
        Commands::Schema { resource_type } => cmd_schema(resource_type.as_deref(), &formatter),
        Commands::State { command } => cmd_state(config, command, &formatter).await,
    }
}

/// Write a starter declaration file.
fn cmd_init(path: &Path, force: bool) -> Result<()> {
    info!("Initializing dirconfig in: {}", path.display());

    let config_path = path.join("dirconfig.yaml");
    let env_path = path.join(".env.example");
    let gitignore_path = path.join(".gitignore");

    if !force && config_path.exists() {
        eprintln!("Declaration file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    std::fs::write(&config_path, include_str!("../templates/dirconfig.yaml"))?;
    eprintln!("Created: {}", config_path.display());

    std::fs::write(&env_path, include_str!("../templates/.env.example"))?;
    eprintln!("Created: {}", env_path.display());

    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        let missing: Vec<&str> = [".env", ".dirconfig/"]
            .into_iter()
            .filter(|entry| !existing.lines().any(|l| l.trim() == *entry))
            .collect();
        if !missing.is_empty() {
            let mut file = std::fs::OpenOptions::new().append(true).open(&gitignore_path)?;
            writeln!(file, "\n# dirconfig")?;
            for entry in missing {
                writeln!(file, "{entry}")?;
            }
            eprintln!("Updated: {}", gitignore_path.display());
        }
    } else {
        std::fs::write(&gitignore_path, ".env\n.dirconfig/\n")?;
        eprintln!("Created: {}", gitignore_path.display());
    }

    eprintln!("\nNext steps:");
    eprintln!("  1. Copy .env.example to .env and set DIRCONFIG_PASSWORD");
    eprintln!("  2. Edit dirconfig.yaml with your server and resources");
    eprintln!("  3. Run 'dirconfig validate' to check the declarations");
    eprintln!("  4. Run 'dirconfig plan' to see what would change");
    eprintln!("  5. Run 'dirconfig apply' to apply it");

    Ok(())
}

/// Validate declarations without contacting the server.
fn cmd_validate(config_path: Option<&Path>, formatter: &OutputFormatter) -> Result<()> {
    let (file, _) = load_declarations(config_path)?;
    let result = ConfigValidator::new().check(&file);
    println!("{}", formatter.format_validation(&result, file.resources.len()));

    match result.errors.first() {
        None => Ok(()),
        Some(first) => Err(ConfigError::Invalid {
            field: first.field.clone(),
            message: first.message.clone(),
        }
        .into()),
    }
}

/// Refresh state in memory and show the plan.
async fn cmd_plan(config_path: Option<&Path>, detailed: bool, formatter: &OutputFormatter) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let manager = workspace.manager()?;

    let mut state = workspace.load_state().await?;
    let report = refresh_state(&manager, &mut state).await?;
    if report.changed() {
        debug!(
            "Refresh found {} changed and {} removed resources",
            report.updated.len(),
            report.removed.len()
        );
    }

    let plan = DiffEngine::new().compute_plan(&workspace.file, &state)?;
    println!("{}", formatter.format_plan(&plan, detailed));
    Ok(())
}

/// Apply the plan.
async fn cmd_apply(
    config_path: Option<&Path>,
    auto_approve: bool,
    continue_on_error: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let manager = workspace.manager()?;
    let lock = workspace.lock("apply").await?;
    let result = apply(&workspace, &manager, auto_approve, continue_on_error, formatter).await;
    workspace.store.release_lock(&lock.lock_id).await?;
    result
}

async fn apply(
    workspace: &Workspace,
    manager: &ResourceManager<ConfigApiClient>,
    auto_approve: bool,
    continue_on_error: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut state = workspace.load_state().await?;
    if refresh_state(manager, &mut state).await?.changed() {
        workspace.store.save(&state).await?;
    }

    let plan = DiffEngine::new().compute_plan(&workspace.file, &state)?;
    let executor = PlanExecutor::new(manager, &workspace.store).with_continue_on_error(continue_on_error);
    if plan.is_empty() {
        // Records declaration hashes of unchanged resources.
        executor.execute(&plan, &mut state).await?;
        println!("{}", formatter.message(MessageLevel::Success, "No changes to apply."));
        return Ok(());
    }

    println!("{}", formatter.format_plan(&plan, false));
    if !auto_approve && !confirm("Do you want to apply this plan? [y/N]: ", "y")? {
        eprintln!("Apply cancelled.");
        return Ok(());
    }

    let result = executor.execute(&plan, &mut state).await?;
    println!("{}", formatter.format_execution(&result));

    if result.success {
        Ok(())
    } else {
        Err(DirConfigError::internal(format!("Apply failed: {} actions failed", result.failed)))
    }
}

/// Refresh state from the server and save it.
async fn cmd_refresh(config_path: Option<&Path>, formatter: &OutputFormatter) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let manager = workspace.manager()?;
    let lock = workspace.lock("refresh").await?;
    let result = refresh(&workspace, &manager, formatter).await;
    workspace.store.release_lock(&lock.lock_id).await?;
    result
}

async fn refresh(
    workspace: &Workspace,
    manager: &ResourceManager<ConfigApiClient>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut state = workspace.load_state().await?;
    let report = refresh_state(manager, &mut state).await?;
    if report.changed() {
        workspace.store.save(&state).await?;
    }
    println!("{}", formatter.format_refresh(&report));
    Ok(())
}

/// Start tracking an existing object.
async fn cmd_import(config_path: Option<&Path>, address: &str, id: &str, formatter: &OutputFormatter) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let manager = workspace.manager()?;
    let lock = workspace.lock("import").await?;
    let result = import(&workspace, &manager, address, id, formatter).await;
    workspace.store.release_lock(&lock.lock_id).await?;
    result
}

async fn import(
    workspace: &Workspace,
    manager: &ResourceManager<ConfigApiClient>,
    address: &str,
    id: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (resource_type, _) = split_address(address).ok_or_else(|| ConfigError::Invalid {
        field: String::from("address"),
        message: format!("'{address}' is not of the form type.name"),
    })?;
    let schema = schema_for(resource_type)?;

    let mut state = workspace.load_state().await?;
    if state.contains(address) {
        return Err(DirConfigError::internal(format!(
            "{address} is already managed; remove it with 'dirconfig state rm' first"
        )));
    }

    let outcome = manager.import(&schema, id).await?;
    state.upsert(ResourceState::from_model(
        address,
        &schema,
        &outcome.model,
        ResourceStatus::Imported,
        None,
    ));
    workspace.store.save(&state).await?;

    for warning in outcome.diagnostics.warnings() {
        warn!("{}: {}", warning.summary, warning.detail);
    }
    println!(
        "{}",
        formatter.message(MessageLevel::Success, &format!("Imported {address} ({id})"))
    );
    Ok(())
}

/// Delete every tracked object.
async fn cmd_destroy(config_path: Option<&Path>, auto_approve: bool, formatter: &OutputFormatter) -> Result<()> {
    let workspace = Workspace::open(config_path)?;
    let manager = workspace.manager()?;
    let lock = workspace.lock("destroy").await?;
    let result = destroy(&workspace, &manager, auto_approve, formatter).await;
    workspace.store.release_lock(&lock.lock_id).await?;
    result
}

async fn destroy(
    workspace: &Workspace,
    manager: &ResourceManager<ConfigApiClient>,
    auto_approve: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut state = workspace.load_state().await?;
    if state.is_empty() {
        println!("{}", formatter.message(MessageLevel::Success, "Nothing to destroy."));
        return Ok(());
    }

    if formatter.format() == OutputFormat::Text {
        eprintln!("The following resources will be destroyed:");
        for address in state.addresses().into_iter().rev() {
            eprintln!("  - {address}");
        }
    }
    if !auto_approve && !confirm("\nThis action is IRREVERSIBLE. Type 'destroy' to confirm: ", "destroy")? {
        eprintln!("Destroy cancelled.");
        return Ok(());
    }

    let result = PlanExecutor::new(manager, &workspace.store).destroy(&mut state).await?;
    println!("{}", formatter.format_execution(&result));

    if result.success {
        Ok(())
    } else {
        Err(DirConfigError::internal(format!("Destroy failed: {} resources remain", state.len())))
    }
}

/// Describe resource types.
fn cmd_schema(resource_type: Option<&str>, formatter: &OutputFormatter) -> Result<()> {
    match resource_type {
        None => println!("{}", formatter.format_schema_list(resources::catalogue())),
        Some(name) => println!("{}", formatter.format_schema(&schema_for(name)?)),
    }
    Ok(())
}

/// State management commands.
async fn cmd_state(config_path: Option<&Path>, command: StateCommands, formatter: &OutputFormatter) -> Result<()> {
    let workspace = Workspace::open(config_path)?;

    match command {
        StateCommands::Show => {
            let state = workspace.store.load().await?.unwrap_or_default();
            println!("{}", formatter.format_state(&state));
        }
        StateCommands::Rm { address } => {
            let lock = workspace.lock("state rm").await?;
            let result = remove_from_state(&workspace, &address).await;
            workspace.store.release_lock(&lock.lock_id).await?;
            result?;
            println!(
                "{}",
                formatter.message(MessageLevel::Success, &format!("Removed {address} from state"))
            );
        }
        StateCommands::Unlock { force } => match workspace.store.get_lock_info().await? {
            None => println!("{}", formatter.message(MessageLevel::Success, "State is not locked.")),
            Some(lock) if force || lock.is_expired() => {
                workspace.store.force_unlock().await?;
                println!("{}", formatter.message(MessageLevel::Success, &format!("Removed lock {lock}")));
            }
            Some(lock) => {
                println!(
                    "{}",
                    formatter.message(
                        MessageLevel::Warning,
                        &format!("State is locked: {lock}; expires in {}s. Use --force to remove it.", lock.remaining_secs())
                    )
                );
            }
        },
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn remove_from_state(workspace: &Workspace, address: &str) -> Result<()> {
    let mut state = workspace.load_state().await?;
    state.remove(address).ok_or_else(|| StateError::NotTracked {
        address: address.to_string(),
    })?;
    workspace.store.save(&state).await
}

/// Validated declarations and the state store they point at.
struct Workspace {
    file: DeclarationFile,
    store: LocalStateStore,
}

impl Workspace {
    fn open(config_path: Option<&Path>) -> Result<Self> {
        let (file, path) = load_declarations(config_path)?;
        ConfigValidator::new().validate(&file)?;

        let state_dir = base_dir(&path).join(&file.state.path);
        debug!("Using state directory: {}", state_dir.display());
        Ok(Self {
            store: LocalStateStore::new(state_dir),
            file,
        })
    }

    fn manager(&self) -> Result<ResourceManager<ConfigApiClient>> {
        Ok(ResourceManager::new(ConfigApiClient::new(&self.file.provider)?))
    }

    async fn lock(&self, operation: &str) -> Result<LockInfo> {
        self.store.acquire_lock(&generate_holder_id(), operation).await
    }

    async fn load_state(&self) -> Result<ProviderState> {
        Ok(self.store.load().await?.unwrap_or_default())
    }
}

/// Loads declarations with `.env` and environment overrides applied.
fn load_declarations(config_path: Option<&Path>) -> Result<(DeclarationFile, PathBuf)> {
    let path = config_path.map_or_else(|| find_config_file("."), |p| Ok(p.to_path_buf()))?;
    debug!("Loading declarations from: {}", path.display());

    let file = ConfigParser::new().with_base_path(base_dir(&path)).load_with_env(&path)?;
    Ok((file, path))
}

fn base_dir(config_file: &Path) -> PathBuf {
    config_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Asks for confirmation on stderr; true when the answer matches `expected`.
fn confirm(prompt: &str, expected: &str) -> Result<bool> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case(expected))
}
