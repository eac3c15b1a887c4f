//! Command line and environment configuration for both processes.

use crate::application::conversation::ChatId;
use crate::application::orchestrator::RedirectMode;
use crate::domain::payment::PaymentTemplate;
use crate::error::{PaymentError, Result};
use crate::infrastructure::yookassa::YookassaConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "Payment links with provider checkout and a Telegram admin bot", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the redirect endpoint, the admin API and the provider webhook.
    Api(ApiConfig),
    /// Run the Telegram admin bot against a running API.
    Bot(BotConfig),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GatewayKind {
    Yookassa,
    /// Offline provider that accepts every payment.
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RedirectModeArg {
    /// Hand out the provider's checkout URL.
    Direct,
    /// Hand out `<public-url>/<id>`, which later leads to the resource.
    Indirect,
}

impl From<RedirectModeArg> for RedirectMode {
    fn from(arg: RedirectModeArg) -> Self {
        match arg {
            RedirectModeArg::Direct => RedirectMode::Direct,
            RedirectModeArg::Indirect => RedirectMode::Indirect,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ApiConfig {
    /// Environment type; `local` switches to human-readable debug logs
    #[arg(long, env = "ENV", default_value = "dev")]
    pub env: String,

    #[arg(long, env = "PAYLINK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "PAYLINK_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Externally reachable root of this service, used in generated links
    #[arg(long, env = "PAYLINK_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// JSON file mapping template names to payment templates
    #[arg(long, env = "TEMPLATES_FILE")]
    pub templates: Option<PathBuf>,

    /// Directory of `<payment id>.pdf` files served under `/file/{id}`
    #[arg(long, env = "FILES_DIR")]
    pub files_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "indirect")]
    pub redirect_mode: RedirectModeArg,

    #[arg(long, value_enum, env = "PAYLINK_GATEWAY", default_value = "yookassa")]
    pub gateway: GatewayKind,

    #[arg(long, env = "YOOKASSA_URL", default_value = "https://api.yookassa.ru/v3")]
    pub yookassa_url: String,

    #[arg(long, env = "YOOKASSA_SHOP_ID")]
    pub yookassa_shop_id: Option<String>,

    #[arg(long, env = "YOOKASSA_SECRET_KEY", hide_env_values = true)]
    pub yookassa_secret_key: Option<String>,

    /// Where payers return after checkout; defaults to the public url
    #[arg(long, env = "YOOKASSA_RETURN_URL")]
    pub yookassa_return_url: Option<String>,

    #[arg(long, env = "GATEWAY_TIMEOUT_MS", default_value_t = 2500)]
    pub gateway_timeout_ms: u64,

    /// Required in the `X-Api-Key` header of admin requests when set
    #[arg(long, env = "PAYLINK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl ApiConfig {
    pub fn public_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checks everything that can be checked without touching the network.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.public_url()).map_err(|e| {
            PaymentError::ValidationError(format!("invalid public url {:?}: {e}", self.public_url()))
        })?;
        if self.gateway == GatewayKind::Yookassa {
            self.yookassa()?;
        }
        Ok(())
    }

    pub fn yookassa(&self) -> Result<YookassaConfig> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PaymentError::ValidationError(format!("{name} is required for the yookassa gateway")))
        };

        Ok(YookassaConfig {
            base_url: self.yookassa_url.clone(),
            shop_id: required(&self.yookassa_shop_id, "--yookassa-shop-id")?,
            secret_key: required(&self.yookassa_secret_key, "--yookassa-secret-key")?,
            return_url: self
                .yookassa_return_url
                .clone()
                .unwrap_or_else(|| self.public_url()),
            timeout: Duration::from_millis(self.gateway_timeout_ms),
        })
    }
}

#[derive(Debug, Clone, Args)]
pub struct BotConfig {
    #[arg(long, env = "ENV", default_value = "dev")]
    pub env: String,

    /// Root of the running API
    #[arg(long, env = "PAYLINK_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    pub server_url: String,

    #[arg(long, env = "TG_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Comma-separated chat ids allowed to use the bot
    #[arg(long, env = "TG_ADMIN_IDS", value_delimiter = ',', required = true)]
    pub admin_ids: Vec<ChatId>,

    /// Contact email attached to payments created from chat
    #[arg(long, env = "TG_ADMIN_EMAIL", default_value = "admin@example.com")]
    pub admin_email: String,

    #[arg(long, env = "PAYLINK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Loads named templates from a JSON object of `name -> template`.
pub fn load_templates(path: &Path) -> Result<HashMap<String, PaymentTemplate>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PaymentError::ValidationError(format!("cannot read templates {}: {e}", path.display()))
    })?;
    let templates: HashMap<String, PaymentTemplate> = serde_json::from_str(&raw).map_err(|e| {
        PaymentError::ValidationError(format!("invalid templates {}: {e}", path.display()))
    })?;
    for (name, template) in &templates {
        template
            .validate()
            .map_err(|e| e.context(&format!("template {name:?}")))?;
    }
    Ok(templates)
}
