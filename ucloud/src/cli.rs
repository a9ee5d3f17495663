//! `ucloud-cdn` command line

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::api::{ApiError, Client, DomainStatus};
use crate::config::{redact, ConfigError, ProviderSettings};

#[derive(Debug, Parser)]
#[command(name = "ucloud-cdn", version, about = "Manage UCloud CDN domains and SSL certificates")]
pub struct Cli {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the `UCLOUD_*` environment variables.
#[derive(Args)]
pub struct CredentialArgs {
    #[arg(long, global = true)]
    pub region: Option<String>,
    #[arg(long, global = true)]
    pub zone: Option<String>,
    #[arg(long, global = true)]
    pub project_id: Option<String>,
    #[arg(long, global = true)]
    pub public_key: Option<String>,
    #[arg(long, global = true, hide = true)]
    pub private_key: Option<String>,
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

impl fmt::Debug for CredentialArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialArgs")
            .field("region", &self.region)
            .field("zone", &self.zone)
            .field("project_id", &self.project_id)
            .field("public_key", &self.public_key)
            .field("private_key", &redact(&self.private_key))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// SSL certificate operations
    #[command(subcommand)]
    Cert(CertCommand),
    /// CDN domain operations
    #[command(subcommand)]
    Domain(DomainCommand),
}

#[derive(Debug, Subcommand)]
pub enum CertCommand {
    /// List certificates, optionally only the named ones
    List {
        #[arg(long = "name")]
        names: Vec<String>,
    },
    /// Upload a certificate from PEM files
    Add {
        name: String,
        #[arg(long)]
        cert: PathBuf,
        #[arg(long)]
        key: PathBuf,
        #[arg(long)]
        ca_cert: Option<PathBuf>,
    },
    Delete {
        name: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum DomainCommand {
    /// Print a domain's configuration
    Show { domain_id: String },
    /// Block until the domain reaches one of the given statuses
    Wait {
        domain_id: String,
        #[arg(long = "status", required = true)]
        statuses: Vec<String>,
    },
    /// Enable HTTPS with a certificate, or disable it
    Https {
        domain_id: String,
        #[arg(long, conflicts_with = "disable")]
        cert_name: Option<String>,
        #[arg(long)]
        disable: bool,
    },
    Delete { domain_id: String },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

#[derive(Serialize)]
struct Done<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
}

impl Cli {
    pub fn settings(&self) -> ProviderSettings {
        let creds = &self.credentials;
        ProviderSettings {
            region: creds.region.clone(),
            zone: creds.zone.clone(),
            project_id: creds.project_id.clone(),
            public_key: creds.public_key.clone(),
            private_key: creds.private_key.clone(),
            base_url: creds.endpoint.clone(),
        }
    }

    pub async fn run(self) -> Result<(), CliError> {
        let config = self.settings().resolve()?;
        let client = Client::new(&config)?;
        let output = execute(&client, self.command).await?;
        println!("{output}");
        Ok(())
    }
}

/// Runs one command and returns its JSON output.
pub async fn execute(client: &Client, command: Command) -> Result<String, CliError> {
    match command {
        Command::Cert(CertCommand::List { names }) => {
            let certs = client.certificates().list(&names).await?;
            Ok(serde_json::to_string_pretty(&certs)?)
        }
        Command::Cert(CertCommand::Add {
            name,
            cert,
            key,
            ca_cert,
        }) => {
            let cert = read_pem(cert).await?;
            let key = read_pem(key).await?;
            let ca_cert = match ca_cert {
                Some(path) => Some(read_pem(path).await?),
                None => None,
            };
            client
                .certificates()
                .add(&name, &cert, &key, ca_cert.as_deref())
                .await?;
            done(None)
        }
        Command::Cert(CertCommand::Delete { name }) => {
            client.certificates().delete(&name).await?;
            done(None)
        }
        Command::Domain(DomainCommand::Show { domain_id }) => {
            let config = client
                .domains()
                .get_config(&domain_id)
                .await?
                .ok_or_else(|| ApiError::EmptyConfig(domain_id.clone()))?;
            Ok(serde_json::to_string_pretty(&config)?)
        }
        Command::Domain(DomainCommand::Wait {
            domain_id,
            statuses,
        }) => {
            let targets: Vec<DomainStatus> =
                statuses.iter().map(|s| DomainStatus::from(s.as_str())).collect();
            let status = client.domains().wait_for_status(&domain_id, &targets).await?;
            done(Some(status.as_str()))
        }
        Command::Domain(DomainCommand::Https {
            domain_id,
            cert_name,
            disable,
        }) => {
            let cert_name = match (disable, cert_name) {
                (true, _) => String::new(),
                (false, Some(name)) => name,
                (false, None) => {
                    return Err(CliError::Usage(
                        "either --cert-name or --disable is required".to_string(),
                    ))
                }
            };
            client
                .domains()
                .update_https(&domain_id, !disable, &cert_name)
                .await?;
            done(None)
        }
        Command::Domain(DomainCommand::Delete { domain_id }) => {
            client.domains().delete(&domain_id).await?;
            done(None)
        }
    }
}

async fn read_pem(path: PathBuf) -> Result<String, CliError> {
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| CliError::ReadFile { path, source })
}

fn done(status: Option<&str>) -> Result<String, CliError> {
    Ok(serde_json::to_string(&Done { ok: true, status })?)
}
