//! Operator tool for the notification engine.
//!
//! ```text
//! xsuportal-notifyctl vapid-public-key
//! xsuportal-notifyctl test-push <contestant_id>
//! ```
//!
//! Both commands load the VAPID key at startup and abort if it is missing.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xsuportal_events::{
    load_vapid_key, Notifier, PgNotifierStore, PushConfig, VapidCredentials, VapidKeySource,
    WebPushTransport,
};

const USAGE: &str = "usage: xsuportal-notifyctl <vapid-public-key | test-push CONTESTANT_ID>";

enum Command {
    VapidPublicKey,
    TestPush { contestant_id: String },
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Command> {
    match args.next()?.as_str() {
        "vapid-public-key" => Some(Command::VapidPublicKey),
        "test-push" => Some(Command::TestPush {
            contestant_id: args.next()?,
        }),
        _ => None,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xsuportal_notifyctl=debug,xsuportal_events=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(command) = parse_args(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    // --- Configuration ---
    let config = PushConfig::from_env();
    tracing::info!(
        key_path = %config.vapid_private_key_path,
        workers = config.workers,
        cache_enabled = config.cache_enabled,
        "Loaded push configuration"
    );

    // --- VAPID key ---
    let secret = load_vapid_key(&config.vapid_private_key_path)
        .expect("Failed to load VAPID private key");
    let credentials = VapidCredentials::from_secret_key(&secret, config.subject_claim());
    tracing::info!(subscriber = credentials.subscriber(), "VAPID key loaded");

    match command {
        Command::VapidPublicKey => {
            println!("{}", credentials.public_key_base64url());
        }
        Command::TestPush { contestant_id } => {
            let keys = VapidKeySource::preloaded(&config.vapid_private_key_path, credentials);
            test_push(&config, keys, &contestant_id).await;
        }
    }
}

async fn test_push(config: &PushConfig, keys: VapidKeySource, contestant_id: &str) {
    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = xsuportal_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    xsuportal_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    // --- Notifier ---
    let store = Arc::new(PgNotifierStore::new(pool));
    let transport = Arc::new(WebPushTransport::new(config).expect("Failed to build HTTP client"));
    let (notifier, handle) = Notifier::start_with_keys(config, store, transport, keys);

    match notifier.notify_test(contestant_id).await {
        Ok(row) => tracing::info!(
            contestant_id,
            notification_id = row.id,
            "Test notification stored"
        ),
        Err(e) => tracing::error!(contestant_id, error = %e, "Test notification failed"),
    }

    // Dropping the notifier closes the queue; wait for the push to go out.
    drop(notifier);
    handle.join().await;
}
