// src/main.rs
use anyhow::Context;
use clap::{Parser, Subcommand};
use keyvault_gateway::server::{self, AppState, SecretResponse};
use keyvault_gateway::{ClientLifecycle, SecretGateway, VaultCredentials, VaultSettings};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "keyvault-gateway",
    about = "REST facade for Azure Key Vault secrets",
    version
)]
struct Cli {
    #[command(flatten)]
    vault: VaultSettings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the secret API over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080", env = "LISTEN_ADDR")]
        listen_addr: String,
    },
    /// Fetch one secret and print the response envelope
    Get {
        /// Name of the secret
        name: String,
        /// Build a fresh client for this call instead of the shared one
        #[arg(long)]
        fresh: bool,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // A missing or malformed .env file is not an error.
    dotenvy::dotenv().ok();
    keyvault_gateway::init_logging();

    let cli = Cli::parse();
    let credentials =
        VaultCredentials::load(&cli.vault).context("Invalid Key Vault configuration")?;

    match cli.command {
        Commands::Serve { listen_addr } => {
            let gateway = if credentials.is_enabled() {
                Some(
                    SecretGateway::new(credentials)
                        .context("Failed to initialize Azure Key Vault client")?,
                )
            } else {
                warn!("Key Vault integration disabled; secret endpoints will fail");
                None
            };

            info!("Starting keyvault-gateway on {}", listen_addr);
            server::start_server(&listen_addr, AppState::new(gateway)).await?;
        }
        Commands::Get { name, fresh } => {
            if !credentials.is_enabled() {
                anyhow::bail!("{}", server::DISABLED_MESSAGE);
            }
            let gateway = SecretGateway::new(credentials)
                .context("Failed to initialize Azure Key Vault client")?;
            let lifecycle = if fresh {
                ClientLifecycle::Ephemeral
            } else {
                ClientLifecycle::Shared
            };

            let (status, response) =
                SecretResponse::from_result(gateway.fetch(&name, lifecycle).await);
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.success {
                eprintln!("Error retrieving secret: HTTP {}", status.as_u16());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
