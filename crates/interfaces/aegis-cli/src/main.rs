use aegis_cli::commands::{self, BatchRequest};
use aegis_cli::profiles::{self, ProfileManager};
use aegis_cli::{CommandOverrideArg, TaskArg};
use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Queue Unreal Engine build, cook and DDC tasks and run them one at a time.
#[derive(Parser)]
#[command(author, version)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage profiles (engine + project pairs)
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Print the command each task would run
    Preview(BatchArgs),
    /// Run the tasks one after another; Ctrl-C cancels after the current task
    Run {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(
            long = "command-override",
            value_name = "N=CMD",
            help = "Replace the command of task N (1-based)"
        )]
        command_overrides: Vec<CommandOverrideArg>,
        #[arg(long, help = "Confirm or edit every command before starting")]
        edit: bool,
    },
    /// List known BuildCookRun switches
    Switches { filter: Option<String> },
    /// Show default configurations and platforms
    Defaults,
}

#[derive(Args)]
struct BatchArgs {
    #[arg(short, long, help = "Profile name, nickname or project name")]
    profile: String,
    #[arg(
        short,
        long = "task",
        value_name = "TAG:CONFIG:PLATFORM[:clean]",
        required = true
    )]
    tasks: Vec<TaskArg>,
    #[arg(
        short,
        long = "override",
        value_name = "SWITCH[=VALUE]",
        help = "Extra switch for cook/stage/package/ddc tasks"
    )]
    overrides: Vec<String>,
}

#[derive(Subcommand)]
enum ProfileCommands {
    List,
    Add {
        engine_root: Utf8PathBuf,
        project_dir: Utf8PathBuf,
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long = "config", help = "Build configuration to offer (repeatable)")]
        configs: Vec<String>,
        #[arg(long = "platform", help = "Target platform to offer (repeatable)")]
        platforms: Vec<String>,
    },
    /// Add a profile from a JSON file
    Import { path: Utf8PathBuf },
    /// Write a profile to a JSON file
    Export { name: String, path: Utf8PathBuf },
    Remove { name: String },
    Show { name: String },
}

fn batch_request(batch: BatchArgs) -> (String, BatchRequest) {
    let req = BatchRequest {
        tasks: batch.tasks,
        overrides: batch.overrides,
        ..Default::default()
    };
    (batch.profile, req)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;

    let mgr = ProfileManager::new();

    match cli.command {
        Commands::Profile { command } => match command {
            ProfileCommands::List => profiles::handle_list(&mgr)?,
            ProfileCommands::Add {
                engine_root,
                project_dir,
                nickname,
                configs,
                platforms,
            } => {
                profiles::handle_add(&mgr, engine_root, project_dir, nickname, configs, platforms)?
            }
            ProfileCommands::Import { path } => profiles::handle_import(&mgr, &path)?,
            ProfileCommands::Export { name, path } => profiles::handle_export(&mgr, &name, &path)?,
            ProfileCommands::Remove { name } => profiles::handle_remove(&mgr, &name)?,
            ProfileCommands::Show { name } => profiles::handle_show(&mgr, &name)?,
        },
        Commands::Preview(batch) => {
            let (name, req) = batch_request(batch);
            commands::cmd_preview(mgr.find(&name)?, &req)?;
        }
        Commands::Run {
            batch,
            command_overrides,
            edit,
        } => {
            let (name, mut req) = batch_request(batch);
            req.command_overrides = command_overrides;
            req.edit = edit;
            let summary = commands::cmd_run(mgr.find(&name)?, &req).await?;
            if summary.cancelled {
                anyhow::bail!("Batch cancelled");
            }
            if summary.failed > 0 {
                anyhow::bail!("{} task(s) failed", summary.failed);
            }
        }
        Commands::Switches { filter } => commands::cmd_switches(filter.as_deref()),
        Commands::Defaults => commands::cmd_defaults(),
    }

    Ok(())
}
