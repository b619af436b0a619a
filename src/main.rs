use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod build;
mod commands;
mod config;
mod theme;
mod util;

use build::BuildMode;

#[derive(Parser)]
#[command(name = "harmonique", version, about)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The command to execute (a prod build when omitted)
    #[command(subcommand)]
    command: Option<HarmoniqueCommand>,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

/// What to do after choosing a mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Build, then serve the output and rebuild on changes
    Serve,
}

#[derive(Parser, Default)]
struct ModeArgs {
    /// Serve the site after building it
    #[arg(value_enum)]
    action: Option<Action>,

    /// The path to the configuration file
    #[arg(short, long, default_value = config::CONFIG_FILE_NAME)]
    config_file: Option<PathBuf>,

    /// The address to bind to (defaults to server.bind)
    #[arg(short, long)]
    bind: Option<String>,

    /// The port to bind to (defaults to server.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Open the site in the default browser
    #[arg(short, long, default_value = "false")]
    open: bool,
}

#[derive(Subcommand)]
enum HarmoniqueCommand {
    /// Initialize a new harmonique project
    Init(InitArgs),

    /// Build with drafts included
    Dev(ModeArgs),

    /// Build without drafts
    Prod(ModeArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if args.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Some(HarmoniqueCommand::Init(args)) => {
            commands::init::run(&args).await?;
        }
        Some(HarmoniqueCommand::Dev(args)) => {
            run_mode(&args, BuildMode::Dev).await?;
        }
        Some(HarmoniqueCommand::Prod(args)) => {
            run_mode(&args, BuildMode::Prod).await?;
        }
        None => {
            run_mode(&ModeArgs::default(), BuildMode::Prod).await?;
        }
    }

    Ok(())
}

async fn run_mode(args: &ModeArgs, mode: BuildMode) -> Result<(), anyhow::Error> {
    match args.action {
        Some(Action::Serve) => commands::serve::run(args, mode).await,
        None => commands::build::run(args, mode).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_is_prod_build() {
        let args = Args::try_parse_from(["harmonique"]).unwrap();
        assert!(args.command.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_dev_serve() {
        let args = Args::try_parse_from(["harmonique", "dev", "serve", "--port", "9000", "-v"]).unwrap();
        let Some(HarmoniqueCommand::Dev(mode)) = args.command else {
            panic!("expected dev");
        };
        assert_eq!(mode.action, Some(Action::Serve));
        assert_eq!(mode.port, Some(9000));
        assert_eq!(mode.config_file, Some(PathBuf::from("harmonique.yaml")));
        assert!(args.verbose);
    }

    #[test]
    fn test_prod_without_action() {
        let args = Args::try_parse_from(["harmonique", "prod", "-c", "site.yaml"]).unwrap();
        let Some(HarmoniqueCommand::Prod(mode)) = args.command else {
            panic!("expected prod");
        };
        assert_eq!(mode.action, None);
        assert_eq!(mode.config_file, Some(PathBuf::from("site.yaml")));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(Args::try_parse_from(["harmonique", "dev", "deploy"]).is_err());
    }
}
