use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paylink::application::conversation::ConversationService;
use paylink::application::orchestrator::PaymentOrchestrator;
use paylink::config::{ApiConfig, BotConfig, Cli, Command, GatewayKind, load_templates};
use paylink::domain::ports::{FileStore, PaymentGatewayBox, PaymentStoreBox, TemplateStoreBox};
use paylink::infrastructure::admin_client::AdminClient;
use paylink::infrastructure::files::DirectoryFileStore;
use paylink::infrastructure::in_memory::{InMemoryPaymentStore, InMemoryTemplateStore};
use paylink::infrastructure::links::BaseUrlLinkGenerator;
use paylink::infrastructure::mock_gateway::{MockBehavior, MockGateway};
use paylink::infrastructure::yookassa::YookassaGateway;
use paylink::interfaces::http::{AppState, mock_checkout_router, router};
use paylink::{interfaces, telemetry};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Api(config) => run_api(config).await,
        Command::Bot(config) => run_bot(config).await,
    }
}

async fn run_api(config: ApiConfig) -> Result<()> {
    config.validate().into_diagnostic()?;
    telemetry::init(&config.env);

    let (payment_store, template_store) = open_stores(&config)?;

    if let Some(path) = &config.templates {
        for (name, template) in load_templates(path).into_diagnostic()? {
            template_store
                .put_template(&name, template)
                .await
                .into_diagnostic()?;
        }
    }

    let gateway: PaymentGatewayBox = match config.gateway {
        GatewayKind::Yookassa => Box::new(YookassaGateway::new(config.yookassa().into_diagnostic()?)),
        GatewayKind::Mock => Box::new(
            MockGateway::new(&config.public_url(), MockBehavior::Succeed).into_diagnostic()?,
        ),
    };
    let links = BaseUrlLinkGenerator::new(&config.public_url()).into_diagnostic()?;

    let orchestrator = PaymentOrchestrator::new(
        template_store,
        Box::new(links),
        payment_store,
        gateway,
        config.redirect_mode.into(),
    );

    let files = match &config.files_dir {
        Some(dir) => {
            let store: Arc<dyn FileStore> =
                Arc::new(DirectoryFileStore::open(dir).into_diagnostic()?);
            Some(store)
        }
        None => None,
    };

    let mut app = router(AppState {
        orchestrator: Arc::new(orchestrator),
        api_key: config.api_key.clone(),
        files,
    });
    if config.gateway == GatewayKind::Mock {
        app = app.merge(mock_checkout_router());
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .into_diagnostic()?;
    tracing::info!(addr = %config.bind_addr(), gateway = ?config.gateway, "api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    tracing::info!("api stopped");
    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(config: &ApiConfig) -> Result<(PaymentStoreBox, TemplateStoreBox)> {
    use paylink::infrastructure::rocksdb::RocksDBStore;

    if let Some(db_path) = &config.db_path {
        // Use persistent storage (RocksDB)
        let store = RocksDBStore::open(db_path).into_diagnostic()?;
        tracing::info!(path = %db_path.display(), "using rocksdb storage");
        return Ok((Box::new(store.clone()), Box::new(store)));
    }

    Ok(in_memory_stores())
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(config: &ApiConfig) -> Result<(PaymentStoreBox, TemplateStoreBox)> {
    if let Some(db_path) = &config.db_path {
        tracing::warn!(
            path = %db_path.display(),
            "built without the storage-rocksdb feature, falling back to in-memory storage"
        );
    }

    Ok(in_memory_stores())
}

fn in_memory_stores() -> (PaymentStoreBox, TemplateStoreBox) {
    (
        Box::new(InMemoryPaymentStore::new()),
        Box::new(InMemoryTemplateStore::new()),
    )
}

async fn run_bot(config: BotConfig) -> Result<()> {
    telemetry::init(&config.env);

    let admin = AdminClient::new(&config.server_url, config.api_key.clone()).into_diagnostic()?;
    let service = ConversationService::new(
        Box::new(admin),
        config.admin_ids.iter().copied(),
        config.admin_email.clone(),
    );

    let bot = teloxide::Bot::new(&config.bot_token);
    interfaces::telegram::run(bot, Arc::new(service)).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
