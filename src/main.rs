//! keygate entry point.
//!
//! Bootstraps the server:
//! 1. Load server configuration from environment
//! 2. Load auth secrets (salt, signing secret, allow-list); missing secrets
//!    leave auth routes answering 503
//! 3. Build router with API routes
//! 4. Apply CORS and security headers middleware
//! 5. Start Axum server
//!
//! Also supports `hash` and `newkey` subcommands for managing ALLOWED_HASHES.

use base64::{engine::general_purpose, Engine as _};
use keygate::{
    auth::{compute_key_hash, AppState, AuthService},
    config::{AuthConfig, Config},
    middleware::{cors_layer, security_headers},
    routes,
};
use std::sync::Arc;
use std::time::Duration;
use zeroize::Zeroizing;

/// Read SECURE_SALT the same way the server does.
fn salt_from_env() -> Result<Zeroizing<String>, String> {
    let _ = dotenvy::dotenv();
    match std::env::var("SECURE_SALT") {
        Ok(salt) if !salt.is_empty() => Ok(Zeroizing::new(salt)),
        _ => Err("SECURE_SALT must be set to compute key hashes".to_string()),
    }
}

/// Generate a random URL-safe secret key.
fn generate_key() -> Zeroizing<String> {
    let mut bytes = [0u8; 32];
    rand::fill(&mut bytes);
    let key = Zeroizing::new(general_purpose::URL_SAFE_NO_PAD.encode(bytes));
    bytes.fill(0);
    key
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  keygate               Run the server");
    eprintln!("  keygate hash <key>    Print the allow-list hash of <key>");
    eprintln!("  keygate newkey        Generate a key and print it with its hash");
    eprintln!();
    eprintln!("Both subcommands read SECURE_SALT. Add the printed hash to ALLOWED_HASHES:");
    eprintln!("  ALLOWED_HASHES='[\"<hash>\"]'");
}

fn run_subcommand(args: &[String]) -> Result<(), String> {
    match args {
        [cmd, key] if cmd == "hash" => {
            let salt = salt_from_env()?;
            println!("{}", compute_key_hash(key, &salt));
            Ok(())
        }
        [cmd] if cmd == "newkey" => {
            let salt = salt_from_env()?;
            let key = generate_key();
            println!("key:  {}", key.as_str());
            println!("hash: {}", compute_key_hash(&key, &salt));
            Ok(())
        }
        _ => {
            print_usage();
            Err("unknown command".to_string())
        }
    }
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        if let Err(e) = run_subcommand(&args) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting keygate on {}", config.bind_addr);

    // Fail closed: without secrets the server stays up but refuses auth.
    let ttl = Duration::from_secs(config.session_ttl_secs);
    let auth = match AuthConfig::from_env().and_then(|c| AuthService::new(&c, ttl)) {
        Ok(service) => {
            tracing::info!(
                allowed_hashes = service.allow_list_len(),
                session_ttl_secs = config.session_ttl_secs,
                "Auth configured"
            );
            Some(Arc::new(service))
        }
        Err(e) => {
            tracing::error!(error = %e, "Auth configuration missing; auth requests will be refused");
            None
        }
    };

    let state = AppState { auth };

    let app = routes::api_router()
        .layer(axum::extract::DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config))
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
