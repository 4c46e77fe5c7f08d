//! Revalidation Platform Server
//!
//! Production server for the revalidation REST APIs:
//! - Auth APIs: register, login
//! - Complaint APIs: submission, approval chain, review queues
//! - Course APIs and evidence downloads under `/uploads`
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RV_API_PORT` | `4000` | HTTP API port |
//! | `RV_STORAGE` | `mongo` | `mongo` or `memory` |
//! | `RV_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `RV_MONGO_DB` | `revalidation` | MongoDB database name |
//! | `RV_JWT_SECRET` | - | URL-safe base64 HMAC key, at least 32 bytes (required outside dev mode) |
//! | `RV_TOKEN_EXPIRY_MINUTES` | `4320` | Access token lifetime |
//! | `RV_UPLOADS_DIR` | `uploads` | Evidence file directory |
//! | `RV_ASSIGNMENT_POLICY` | `random` | `random` or `round_robin` |
//! | `RV_MAIL_RELAY_URL` | - | HTTP mail relay endpoint; mail is only logged when unset |
//! | `RV_MAIL_RELAY_TOKEN` | - | Bearer token for the relay |
//! | `RV_MAIL_SENDER` | `no-reply@revalidation.local` | From address |
//! | `RV_MAIL_TIMEOUT_SECS` | `10` | Per-attempt delivery timeout |
//! | `RV_MAIL_MAX_ATTEMPTS` | `3` | Delivery attempts per notification |
//! | `RV_MAIL_DISPATCH_DEADLINE_SECS` | `15` | Upper bound on all mail for one event |
//! | `RV_DEV_MODE` | `false` | Seed demo data, allow an ephemeral JWT key |
//! | `RV_LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rv_platform::api::PlatformServices;
use rv_platform::config::{LogFormat, PlatformConfig, StorageBackend};
use rv_platform::repository::{
    ensure_indexes, ComplaintRepository, CourseRepository, IdentityRepository,
    MemoryComplaintRepository, MemoryCourseRepository, MemoryIdentityRepository,
    MongoComplaintRepository, MongoCourseRepository, MongoIdentityRepository,
};
use rv_platform::seed::DevDataSeeder;
use rv_platform::service::{HttpMailer, LogMailer, Mailer, PasswordService};

struct Repositories {
    complaints: Arc<dyn ComplaintRepository>,
    courses: Arc<dyn CourseRepository>,
    identities: Arc<dyn IdentityRepository>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = PlatformConfig::from_env()?;
    init_logging(config.log_format);

    info!("Starting Revalidation Platform Server");
    info!(
        port = config.api_port,
        storage = ?config.storage,
        assignment = ?config.assignment_policy,
        uploads = %config.uploads_dir.display(),
        dev_mode = config.dev_mode,
        "Configuration loaded"
    );

    let repos = match config.storage {
        StorageBackend::Mongo => connect_mongo(&config).await?,
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on restart");
            Repositories {
                complaints: Arc::new(MemoryComplaintRepository::new()),
                courses: Arc::new(MemoryCourseRepository::new()),
                identities: Arc::new(MemoryIdentityRepository::new()),
            }
        }
    };

    let passwords = Arc::new(PasswordService::default());

    // Seed development data if in dev mode
    if config.dev_mode {
        let seeder = DevDataSeeder::new(repos.courses.clone(), repos.identities.clone(), passwords.clone());
        if let Err(e) = seeder.seed().await {
            warn!(error = %e, "Dev data seeding failed");
        }
    }

    let mailer: Arc<dyn Mailer> = match &config.mail.relay_url {
        Some(url) => {
            info!(relay = %url, "Mail delivery via HTTP relay");
            Arc::new(HttpMailer::new(url.clone(), &config.mail)?)
        }
        None => {
            warn!("RV_MAIL_RELAY_URL not set; notifications are only logged");
            Arc::new(LogMailer)
        }
    };

    tokio::fs::create_dir_all(&config.uploads_dir).await?;

    let app = PlatformServices::new(
        &config,
        repos.complaints,
        repos.courses,
        repos.identities,
        mailer,
        passwords,
    )
    .router()
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let api_addr = format!("0.0.0.0:{}", config.api_port);
    let listener = TcpListener::bind(&api_addr).await?;
    info!("API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/swagger-ui", api_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Revalidation Platform Server stopped");
    Ok(())
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn connect_mongo(config: &PlatformConfig) -> Result<Repositories> {
    info!("Connecting to MongoDB: {}/{}", config.mongo_url, config.mongo_db);
    let mut options = mongodb::options::ClientOptions::parse(&config.mongo_url).await?;
    options.app_name = Some("rv-platform-server".to_string());
    options.server_selection_timeout = Some(Duration::from_secs(10));
    options.connect_timeout = Some(Duration::from_secs(5));

    let client = mongodb::Client::with_options(options)?;
    let db = client.database(&config.mongo_db);

    ensure_indexes(&db).await?;
    info!("MongoDB indexes ensured");

    Ok(Repositories {
        complaints: Arc::new(MongoComplaintRepository::new(&db)),
        courses: Arc::new(MongoCourseRepository::new(&db)),
        identities: Arc::new(MongoIdentityRepository::new(&db)),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
