//! Alfresco Tools CLI - Module management for Alfresco SDK projects

use alfresco_scaffolder::tui::{self, ClackOutput};
use alfresco_scaffolder::{
    FileStore, Location, ModuleDraft, ModuleManager, ModuleOp, ProjectContext, StagedFs,
};
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "alfresco-tools")]
#[command(about = "CLI for managing the modules of Alfresco SDK projects")]
#[command(version)]
pub struct Args {
    /// Project root directory (defaults to the current directory)
    #[arg(long = "project-dir", global = true)]
    pub project_dir: Option<PathBuf>,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a module and wire it into the build
    Add(AddArgs),
    /// Unregister a module and unwire it from the build
    Remove(ModuleArgs),
    /// List registered modules
    List,
    /// Register the SDK's default source modules
    RegisterDefaults,
    /// Remove the SDK's default source modules
    RemoveDefaults,
}

/// Module coordinates; every field is required
#[derive(ClapArgs, Debug)]
pub struct ModuleArgs {
    #[arg(long = "group-id")]
    pub group_id: Option<String>,

    #[arg(long = "artifact-id")]
    pub artifact_id: Option<String>,

    #[arg(long)]
    pub version: Option<String>,

    /// amp or jar
    #[arg(long)]
    pub packaging: Option<String>,

    /// repo or share
    #[arg(long)]
    pub war: Option<String>,

    /// source, local or remote
    #[arg(long)]
    pub location: Option<String>,

    /// Module path relative to the project root
    #[arg(long)]
    pub path: Option<String>,
}

impl From<ModuleArgs> for ModuleDraft {
    fn from(args: ModuleArgs) -> Self {
        ModuleDraft {
            group_id: args.group_id,
            artifact_id: args.artifact_id,
            version: args.version,
            packaging: args.packaging,
            war: args.war,
            location: args.location,
            path: args.path,
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct AddArgs {
    #[command(flatten)]
    pub module: ModuleArgs,

    /// Human readable name written to the module's pom.xml
    #[arg(long)]
    pub name: Option<String>,

    /// Description written to the module's pom.xml
    #[arg(long)]
    pub description: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn add(manager: &mut ModuleManager, args: AddArgs) -> Result<()> {
    let draft = ModuleDraft::from(args.module);
    let is_new = match draft.path.as_deref() {
        Some(path) => {
            let ctx = manager.context();
            !ctx.fs().exists(&ctx.destination_path(path))
        }
        None => false,
    };
    let module = manager.add_module(&draft)?;
    if module.location != Location::Source {
        return Ok(());
    }
    if is_new {
        manager.schedule(ModuleOp::SetupNewModule(module.clone()));
    }
    if args.name.is_some() || args.description.is_some() {
        manager.schedule(ModuleOp::SetProjectDetails {
            module,
            name: args.name,
            description: args.description,
        });
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let root = match args.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    tracing::debug!(root = %root.display(), command = ?args.command, "starting");
    cliclack::intro("Alfresco module manager")?;

    let ctx = ProjectContext::open(&root, Box::new(StagedFs::new()), Box::new(ClackOutput))
        .with_context(|| format!("Failed to open project at {}", root.display()))?;
    let mut manager = ModuleManager::new(ctx);

    match args.command {
        Command::List => {
            tui::show_modules(manager.context().config(), manager.registry().modules())?;
            let count = manager.registry().modules().len();
            cliclack::outro(format!("{} module(s) registered", count))?;
            return Ok(());
        }
        Command::Add(add_args) => add(&mut manager, add_args)?,
        Command::Remove(module_args) => {
            let draft = ModuleDraft::from(module_args);
            let prompt = format!(
                "Remove module {}? Source modules are deleted from disk.",
                draft.artifact_id.as_deref().unwrap_or("")
            );
            if !tui::confirm(&prompt, args.yes)? {
                cliclack::outro_cancel("Nothing removed.")?;
                return Ok(());
            }
            manager.remove_module(&draft)?;
        }
        Command::RegisterDefaults => manager.register_default_modules()?,
        Command::RemoveDefaults => {
            if !tui::confirm("Remove the default modules and their sources?", args.yes)? {
                cliclack::outro_cancel("Nothing removed.")?;
                return Ok(());
            }
            manager.remove_default_modules()?;
        }
    }

    manager.save().context("Failed to update project files")?;
    manager
        .context_mut()
        .fs_mut()
        .commit()
        .context("Failed to write project files")?;

    cliclack::outro(format!("Project updated: {}", root.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    init_tracing();
    let args = Args::parse();
    let result = run(args);

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}
