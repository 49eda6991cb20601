// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Foyer membership server binary.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use foyer_server::{create_app_state, create_router};
use foyer_server_idp::{IdentityProvider, IdpClient, IdpConfig};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Foyer server - invitation-gated membership over an external identity
/// provider.
#[derive(Parser, Debug)]
#[command(name = "foyer-server", about = "Foyer membership server", version)]
struct Args {
	/// Subcommands for foyer-server (e.g., `version`)
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// Parse CLI arguments
	let args = Args::parse();

	// Handle subcommands that should not start the server
	if let Some(Command::Version) = args.command {
		println!("foyer-server {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	// Load configuration
	let config = foyer_server_config::load_config_from_env()?;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting foyer-server"
	);

	// Create database pool and apply migrations
	let pool = foyer_server_db::create_pool(&config.database.url).await?;
	foyer_server_db::run_migrations(&pool).await?;

	// Identity provider client
	let idp_config = IdpConfig::from_env()?;
	let idp: Arc<dyn IdentityProvider> = Arc::new(IdpClient::new(idp_config.clone()));

	let state = create_app_state(pool, &config, idp_config, idp).await;

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	// Start server
	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	// Run server with graceful shutdown
	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
