use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "genforge")]
#[command(about = "Turns UI generator responses into installable, repaired projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Enable verbose debug output")]
    verbose: bool,

    #[arg(long, global = true, help = "Perform a dry run without writing files or running tools")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Extract, repair and write a project from a generator response")]
    Build {
        #[arg(help = "File holding the raw generator response")]
        response: PathBuf,

        #[arg(short, long, help = "Parent directory for generated projects")]
        output_dir: Option<PathBuf>,

        #[arg(long, help = "Project name (defaults to the response file stem)")]
        project_name: Option<String>,

        #[arg(long, help = "Component library directory merged into components/ui")]
        ui_kit: Option<PathBuf>,

        #[arg(long = "protect", help = "Additional path the build must never write")]
        protect: Vec<String>,

        #[arg(long = "disable-rule", help = "Repair rule to skip, by name")]
        disable_rule: Vec<String>,

        #[arg(long, help = "Create the base Next.js project before writing files")]
        scaffold: bool,

        #[arg(long, help = "Install detected dependencies with npm")]
        install: bool,

        #[arg(long, help = "Configuration file (defaults to ./genforge.yml)")]
        config: Option<PathBuf>,
    },

    #[command(about = "Print the files extracted from a generator response")]
    Extract {
        response: PathBuf,

        #[arg(long, help = "Print the file set as JSON")]
        json: bool,
    },

    #[command(about = "Run the repair rules over source files on disk")]
    Repair {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, help = "Write repaired content back to the files")]
        write: bool,
    },

    #[command(about = "List the optional packages a project needs")]
    Deps {
        #[arg(help = "Project directory to scan")]
        project: PathBuf,
    },

    #[command(about = "Send a prompt to the generation service and store the raw response")]
    Generate {
        #[arg(long, help = "File holding the prompt")]
        prompt_file: PathBuf,

        #[arg(long, help = "Where to store the response (defaults to <prompt>.response.md)")]
        out: Option<PathBuf>,

        #[arg(long, help = "Build a project from the response right away")]
        build: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli::Config {
        verbose: cli.verbose,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Build {
            response,
            output_dir,
            project_name,
            ui_kit,
            protect,
            disable_rule,
            scaffold,
            install,
            config: config_file,
        } => {
            let args = cli::BuildArgs {
                response,
                project_name,
                config_file,
                overrides: genforge::config::ConfigOverrides {
                    output_dir,
                    ui_kit_path: ui_kit,
                    protected_paths: protect,
                    disabled_rules: disable_rule,
                },
                scaffold,
                install,
            };
            cli::build(args, &config)?;
        }
        Commands::Extract { response, json } => {
            cli::extract(&response, json, &config)?;
        }
        Commands::Repair { files, write } => {
            cli::repair(&files, write, &config)?;
        }
        Commands::Deps { project } => {
            cli::deps(&project, &config)?;
        }
        Commands::Generate {
            prompt_file,
            out,
            build,
        } => {
            cli::generate(&prompt_file, out, build, &config).await?;
        }
    }

    Ok(())
}
