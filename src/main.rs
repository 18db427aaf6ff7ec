use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appointpay::config::{Config, DatabaseConfig, LogFormat};
use appointpay::modules::appointments::MySqlAppointmentRepository;
use appointpay::modules::collaborators::CollaboratorClient;
use appointpay::modules::gateways::{CardGatewayClient, PayoutNetworkClient};
use appointpay::modules::health::controllers::health_controller;
use appointpay::modules::jobs::controllers::job_controller;
use appointpay::modules::payments::MySqlLedgerStore;
use appointpay::{EngineDependencies, PaymentEngine, PaymentQueue};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    // Initialize tracing
    let (json_layer, pretty_layer) = match config.app.log_format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("appointpay={},actix_web=info", config.app.log_level).into()
            }),
        )
        .with(json_layer)
        .with(pretty_layer)
        .init();

    tracing::info!("Starting AppointPay payment engine");
    tracing::info!("Environment: {}", config.app.env);

    // Create database connection pool
    let db_pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;
    DatabaseConfig::migrate(&db_pool)
        .await
        .context("Failed to apply migrations")?;

    tracing::info!(
        "Database pool initialized ({} connections)",
        config.database.pool_size
    );

    let collaborators = Arc::new(
        CollaboratorClient::new(&config.collaborators)
            .context("Failed to build collaborator client")?,
    );
    let engine = Arc::new(PaymentEngine::new(EngineDependencies {
        ledger: Arc::new(MySqlLedgerStore::new(db_pool.clone())),
        appointments: Arc::new(MySqlAppointmentRepository::new(
            db_pool.clone(),
            config.payments.default_currency,
        )),
        gateway: Arc::new(
            CardGatewayClient::new(&config.card_gateway)
                .context("Failed to build card gateway client")?,
        ),
        payout_network: Arc::new(
            PayoutNetworkClient::new(&config.payout_network)
                .context("Failed to build payout network client")?,
        ),
        notifications: collaborators.clone(),
        recharger: collaborators.clone(),
        receipts: collaborators,
        settings: config.payments.clone(),
    }));

    // Start the payments worker
    let (queue, receiver) = PaymentQueue::new(config.queue.capacity);
    let worker = tokio::spawn(receiver.run(engine, config.queue.concurrency));

    // Start HTTP server
    let bind_address = config.server.bind_address();
    tracing::info!("Server binding to: {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(queue.clone()))
            .configure(health_controller::configure)
            .configure(job_controller::configure)
    })
    .workers(config.server.workers)
    .bind(&bind_address)?
    .run()
    .await?;

    // Server is down and every queue sender dropped; drain what is left
    worker.await.context("Payments worker panicked")?;
    tracing::info!("Shutdown complete");

    Ok(())
}
