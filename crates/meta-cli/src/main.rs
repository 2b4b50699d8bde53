use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "meta",
    about = "metagrid — register and inspect service deployments",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Directory holding the revision store.
    #[arg(long, global = true, default_value = ".metagrid")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a deployment descriptor.
    Init {
        /// Service name.
        #[arg(short, long)]
        name: String,
        /// Service kind: keyed, unkeyed or singleton.
        #[arg(short, long, default_value = "keyed")]
        kind: String,
        /// Endpoint the deployment serves on.
        #[arg(short, long, default_value = "http://localhost:9080")]
        endpoint: String,
        /// Where to write the descriptor.
        #[arg(short, long, default_value = "deployment.toml")]
        path: PathBuf,
    },
    /// Check a deployment against the registered revisions without
    /// registering it.
    Check {
        /// Deployment descriptor.
        #[arg(short, long, default_value = "deployment.toml")]
        file: PathBuf,
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Check and register a deployment.
    ///
    /// Either every service revision of the deployment is registered, or
    /// none is.
    Register {
        /// Deployment descriptor.
        #[arg(short, long, default_value = "deployment.toml")]
        file: PathBuf,
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect registered services.
    Services {
        #[command(subcommand)]
        action: ServicesAction,
    },
    /// Inspect registered deployments.
    Deployments {
        #[command(subcommand)]
        action: DeploymentsAction,
    },
    /// Show the documentation of an error code, e.g. META0006.
    Explain {
        code: String,
    },
}

#[derive(Subcommand)]
enum ServicesAction {
    /// List the latest revision of every service.
    List,
    /// Describe a service revision.
    Describe {
        /// Service name
        name: String,
        /// Revision to show (default: latest)
        #[arg(short, long)]
        revision: Option<u32>,
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
enum DeploymentsAction {
    /// List registered deployments.
    List,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meta=info".parse()?)
                .add_directive("metagrid_state=info".parse()?)
        )
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Init { name, kind, endpoint, path } => {
            commands::init::init(&name, &kind, &endpoint, &path)
        }
        Commands::Check { file, format } => {
            commands::register::check(&data_dir, &file, &format)
        }
        Commands::Register { file, format } => {
            commands::register::register(&data_dir, &file, &format)
        }
        Commands::Services { action } => match action {
            ServicesAction::List => commands::services::list(&data_dir),
            ServicesAction::Describe { name, revision, format } => {
                commands::services::describe(&data_dir, &name, revision, &format)
            }
        },
        Commands::Deployments { action } => match action {
            DeploymentsAction::List => commands::deployments::list(&data_dir),
        },
        Commands::Explain { code } => commands::explain::explain(&code),
    }
}
