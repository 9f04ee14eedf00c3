//! tfcbind CLI
//!
//! Command-line interface for resolving Terraform Cloud workspaces.
//!
//! # Usage
//!
//! ```bash
//! # Verify the organization exists
//! tfcbind --org acme check-org
//!
//! # Look up a workspace, creating it if missing
//! tfcbind --org acme resolve prod
//!
//! # Delete a workspace by ID
//! tfcbind --org acme delete ws-abc123
//! ```
//!
//! The service address comes from `TF_URL`; tokens come from `TF_TOKEN_<host>`
//! variables or the `terraform login` credentials file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tfcbind_core::{
    CredentialsLoader, CredentialsSource, HttpApi, HttpConnector, WorkspaceClient, WorkspaceId,
    resolve_session,
};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

mod config;

#[derive(Parser)]
#[command(name = "tfcbind")]
#[command(about = "Resolve and manage Terraform Cloud workspaces")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Organization name
    #[arg(short, long, global = true, env = "TFC_ORGANIZATION")]
    org: Option<String>,

    /// Credentials file (defaults to the `terraform login` location)
    #[arg(long, global = true)]
    credentials_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the organization exists
    CheckOrg,

    /// Print the workspace ID, creating the workspace if it does not exist
    Resolve {
        /// Workspace name
        name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Create a workspace with auto-apply enabled
    Create {
        /// Workspace name
        name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Check that a workspace ID still exists
    Check {
        /// Workspace ID
        id: String,
    },

    /// Delete a workspace by ID
    Delete {
        /// Workspace ID
        id: String,
    },

    /// Show the resolved service address and host
    Session,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = config::load_config(cli.config.as_deref())?;
    let credentials = credentials_source(
        cli.credentials_file.clone().or(settings.credentials_file.clone()),
    );

    let organization = cli.org.clone().or(settings.organization.clone());
    let mount_path = settings.secrets_mount_path.clone();

    match cli.command {
        Commands::CheckOrg => {
            let client = connect(&credentials, organization, mount_path).await?;
            client.check_organization().await?;
            println!("organization {} exists", client.organization());
        }
        Commands::Resolve { name, format } => {
            let client = connect(&credentials, organization, mount_path).await?;
            let id = client.resolve_workspace(&name).await?;
            print_workspace(client.organization(), &name, &id, format);
        }
        Commands::Create { name, format } => {
            let client = connect(&credentials, organization, mount_path).await?;
            let id = client.create_workspace(&name).await?;
            print_workspace(client.organization(), &name, &id, format);
        }
        Commands::Check { id } => {
            let client = connect(&credentials, organization, mount_path).await?;
            let id = WorkspaceId::new(id);
            client.check_workspace_by_id(&id).await?;
            println!("workspace {} exists", id);
        }
        Commands::Delete { id } => {
            let client = connect(&credentials, organization, mount_path).await?;
            let id = WorkspaceId::new(id);
            client.delete_workspace(&id).await?;
            println!("workspace {} deleted", id);
        }
        Commands::Session => show_session(&credentials).await?,
    }

    Ok(())
}

async fn connect(
    credentials: &CredentialsSource,
    organization: Option<String>,
    mount_path: String,
) -> Result<WorkspaceClient<HttpApi>> {
    let organization =
        organization.context("no organization given; pass --org or set TFC_ORGANIZATION")?;

    let mut client = WorkspaceClient::new(organization, mount_path);
    client
        .initialize(credentials, &HttpConnector::new())
        .await
        .context("failed to initialize session")?;
    Ok(client)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn credentials_source(file: Option<PathBuf>) -> CredentialsSource {
    match file {
        Some(path) => {
            debug!("using credentials file {:?}", path);
            CredentialsSource::chain(vec![
                CredentialsSource::EnvVars,
                CredentialsSource::file(path),
            ])
        }
        None => CredentialsSource::default(),
    }
}

async fn show_session(credentials: &CredentialsSource) -> Result<()> {
    let store = credentials.load().await?;
    let session = resolve_session(&store)?;
    println!("address: {}", session.address());
    println!("host:    {}", session.host());
    Ok(())
}

fn print_workspace(organization: &str, name: &str, id: &WorkspaceId, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "organization": organization,
                "name": name,
                "id": id,
            });
            println!("{}", value);
        }
        OutputFormat::Text => println!("{}", id),
    }
}
