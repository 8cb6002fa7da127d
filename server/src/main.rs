//! StockSaga server: wires storage, quotes, identity and the HTTP gateway

use std::sync::Arc;
use std::time::Duration;

use account_service::{AccountRepository, AccountService, RepositoryType};
use api_gateway::config::AppConfig;
use api_gateway::{build_router, AppState};
use clap::Parser;
use common::db::{init_db_pool, run_migrations};
use common::decimal::dec;
use dotenv::dotenv;
use identity_service::{
    IdentityService, InMemoryPendingSignupStore, LogNotifier, PendingSignupStore, PostgresPendingSignupStore,
};
use market_data::{FinnhubQuoteProvider, QuoteProvider, StaticQuoteProvider};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};
use trade_engine::TradeExecutor;

/// How often expired signup requests are swept
const SIGNUP_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// StockSaga brokerage server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address, defaults to 0.0.0.0:$PORT
    #[clap(short, long)]
    addr: Option<String>,

    /// Keep everything in memory instead of PostgreSQL
    #[clap(long)]
    in_memory: bool,

    /// Serve fixed demo quotes instead of calling Finnhub
    #[clap(short, long)]
    demo: bool,
}

fn demo_quotes() -> StaticQuoteProvider {
    StaticQuoteProvider::with_prices([
        ("AAPL", dec!(189.84)),
        ("MSFT", dec!(415.50)),
        ("GOOGL", dec!(172.63)),
        ("AMZN", dec!(186.13)),
        ("TSLA", dec!(177.46)),
        ("NVDA", dec!(121.79)),
    ])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing with debug level if DEBUG=1 in .env
    let env_debug = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env_debug == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug,trade_engine=debug,account_service=debug,identity_service=debug")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    // Only set the global subscriber if it hasn't been set already
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("Tracing initialized");
        if env_debug == "1" {
            debug!("Debug logging enabled");
        }
    }

    info!("Starting StockSaga server...");
    let config = AppConfig::new();

    // Storage
    let (account_service, pending): (Arc<AccountService>, Arc<dyn PendingSignupStore>) = if args.in_memory {
        info!("Using in-memory storage");
        (
            Arc::new(AccountService::with_repository(RepositoryType::InMemory, &config.accounts)),
            Arc::new(InMemoryPendingSignupStore::new()),
        )
    } else {
        let pool = init_db_pool(&config.accounts.database_url, config.accounts.db_pool_size).await?;
        run_migrations(&pool).await?;
        info!("Connected to PostgreSQL");
        (
            Arc::new(AccountService::with_repository(RepositoryType::Postgres(pool.clone()), &config.accounts)),
            Arc::new(PostgresPendingSignupStore::new(pool)),
        )
    };

    // Quotes
    let quotes: Arc<dyn QuoteProvider> = if args.demo {
        info!("Serving demo quotes");
        Arc::new(demo_quotes())
    } else {
        Arc::new(FinnhubQuoteProvider::new(&config.quotes)?)
    };

    let repository: Arc<dyn AccountRepository> = account_service.repository();
    let executor = Arc::new(TradeExecutor::new(repository, quotes).with_quote_timeout(config.quotes.timeout));
    let identity = Arc::new(IdentityService::new(
        account_service.clone(),
        pending,
        Arc::new(LogNotifier),
        config.identity.clone(),
    ));

    // Sweep expired signup requests in the background
    {
        let identity = identity.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SIGNUP_PURGE_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(e) = identity.purge_expired_signups().await {
                    warn!("Failed to purge expired signups: {}", e);
                }
            }
        });
    }

    let state = Arc::new(AppState {
        account_service,
        executor,
        identity,
    });
    let app = build_router(state, log_level);

    // Start the server
    let addr = args.addr.unwrap_or_else(|| format!("0.0.0.0:{}", config.port));
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);

    // Run until interrupt signal
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server shut down");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received, starting graceful shutdown");
}
