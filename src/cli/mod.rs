// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use std::path::PathBuf;
use tracing::info;

use crate::api::{start_server, Dispatcher};
use crate::config::GatewayConfig;
use crate::crypto::FlowPrivateKey;
use crate::version;

/// Encrypted flow data exchange gateway
#[derive(Parser, Debug)]
#[command(name = "flow-gateway")]
#[command(version = version::VERSION_NUMBER)]
#[command(about = "Serves the encrypted flow data exchange endpoint", long_about = None)]
pub struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true, env = "FLOW_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Listen address (overrides BIND_ADDRESS)
    #[arg(long, global = true)]
    pub bind_address: Option<String>,

    /// Listen port (overrides PORT)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Screen registry JSON file (overrides FLOW_SCREENS_PATH)
    #[arg(long, global = true)]
    pub screens: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP endpoint (default)
    Serve,

    /// Load keys and screens, report, and exit
    CheckConfig,

    /// Print the public key to upload to the platform
    PublicKey,
}

impl Cli {
    /// Apply command-line overrides on top of environment configuration
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(bind_address) = &self.bind_address {
            config.bind_address = bind_address.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(screens) = &self.screens {
            config.screens_path = Some(screens.clone());
        }
    }

    /// Load `.env` (or `--env-file`) into the process environment
    pub fn load_env_file(&self) -> Result<()> {
        match &self.env_file {
            Some(path) => dotenv::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display())),
            None => {
                dotenv::dotenv().ok();
                Ok(())
            }
        }
    }

    /// Environment configuration with command-line overrides
    ///
    /// Not validated; each command checks what it needs.
    pub fn load_config(&self) -> Result<GatewayConfig> {
        let mut config = GatewayConfig::from_env()?;
        self.apply(&mut config);
        Ok(config)
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    cli.load_env_file()?;
    let config = cli.load_config()?;

    match cli.command.clone().unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::CheckConfig => {
            for line in check_config_report(&config)? {
                println!("{}", line);
            }
            Ok(())
        }
        Commands::PublicKey => {
            print!("{}", public_key_pem(&config)?);
            Ok(())
        }
    }
}

async fn serve(config: GatewayConfig) -> Result<()> {
    config.validate()?;
    let dispatcher = build_dispatcher(&config)?;
    let listen_addr = config.listen_addr();

    info!("🚀 API server starting on {}", listen_addr);
    info!("   POST / - Flow data exchange");
    info!("   GET  /health - Health check");

    start_server(&listen_addr, dispatcher)
        .await
        .map_err(|e| anyhow!("Server error: {}", e))
}

/// Load keys and screens and describe the result
///
/// Problems that only matter for `serve` are reported as warnings.
pub fn check_config_report(config: &GatewayConfig) -> Result<Vec<String>> {
    config.validate_keys()?;
    let dispatcher = build_dispatcher(config)?;
    let screens = dispatcher.state_machine().screens();

    let mut report = vec![
        "✅ Configuration OK".to_string(),
        format!("   Listen address: {}", config.listen_addr()),
        format!(
            "   Signature verification: {}",
            if config.keys.app_secret.is_some() {
                "enabled"
            } else {
                "DISABLED"
            }
        ),
        format!(
            "   Screens: {} -> {} -> {}",
            screens.entry.screen, screens.intermediate.screen, screens.success.screen
        ),
        format!("   Required fields: {}", screens.required_fields.join(", ")),
    ];

    if let Err(e) = config.validate() {
        report.push(format!("⚠️  serve will refuse to start: {}", e));
    }

    Ok(report)
}

/// SPKI PEM of the configured key, for upload to the platform
pub fn public_key_pem(config: &GatewayConfig) -> Result<String> {
    config.validate_keys()?;
    let key = FlowPrivateKey::from_pem(&config.keys.private_key_pem, &config.keys.passphrase)?;
    key.public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| anyhow!("Failed to encode public key: {}", e))
}

fn build_dispatcher(config: &GatewayConfig) -> Result<Dispatcher> {
    let screens = config.load_screens()?;
    let dispatcher = Dispatcher::new(&config.keys, screens)
        .context("Failed to load PRIVATE_KEY")?;
    Ok(dispatcher)
}
