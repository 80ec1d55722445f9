use std::{path::PathBuf, sync::Arc};

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
	Json, Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use passvault::{
	config::{Config, ConfigError},
	delivery::{Clipboard, CommandClipboard, Delivered, ManualCopy, NoClipboard, Prompt},
	notify::{MenuSignal, Rebuild},
	sessions::Session,
	storage::{FileStore, MemoryStore, Scope},
	Credential, Error, ShareIssuer, Vault, VaultKey, VaultStore,
};

/// Local credential vault with one-time share links
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// TOML config file; every field falls back to its default when omitted
	#[arg(env = "PASSVAULT_CONFIG")]
	config: Option<PathBuf>,
}

impl Args {
	fn config(&self) -> Result<Config, ConfigError> {
		match &self.config {
			Some(path) => Config::load(path),
			None => Ok(Config::default()),
		}
	}
}

struct AppState {
	vault: VaultStore,
	issuer: ShareIssuer,
	clipboard: Box<dyn Clipboard>,
	fallback: Box<dyn ManualCopy>,
	default_ttl_secs: u64,
}

type SharedState = Arc<AppState>;

struct ApiError(Error);

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		Self(err)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = match &self.0 {
			Error::Locked | Error::MissingKey => StatusCode::LOCKED,
			Error::UnknownFolder(_) | Error::UnknownCredential { .. } => StatusCode::NOT_FOUND,
			Error::InvalidKeyLength { .. } | Error::InvalidShareLink(_) => StatusCode::BAD_REQUEST,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};

		if status.is_server_error() {
			error!(error = %self.0, "request failed");
		}

		(status, self.0.to_string()).into_response()
	}
}

#[derive(Deserialize)]
struct Unlock {
	key: VaultKey,
}

async fn unlock(
	State(state): State<SharedState>,
	Json(body): Json<Unlock>,
) -> Result<StatusCode, ApiError> {
	state.vault.session().unlock(&body.key).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn logout(State(state): State<SharedState>) -> Result<StatusCode, ApiError> {
	state.vault.logout().await?;

	Ok(StatusCode::NO_CONTENT)
}

// a fresh durable store gets an empty vault on first read after unlock
async fn get_vault(State(state): State<SharedState>) -> Result<Json<Vault>, ApiError> {
	if let Some(vault) = state.vault.load().await? {
		return Ok(Json(vault));
	}

	if state.vault.session().key().await?.is_none() {
		return Err(Error::Locked.into());
	}

	let vault = Vault::new();
	state.vault.save(&vault).await?;

	Ok(Json(vault))
}

#[derive(Deserialize)]
struct NewFolder {
	name: String,
}

async fn add_folder(
	State(state): State<SharedState>,
	Json(body): Json<NewFolder>,
) -> Result<StatusCode, ApiError> {
	if state.vault.add_folder(&body.name).await? {
		Ok(StatusCode::CREATED)
	} else {
		Ok(StatusCode::OK)
	}
}

#[derive(Serialize)]
struct Added {
	index: usize,
}

async fn add_credential(
	State(state): State<SharedState>,
	Path(folder): Path<String>,
	Json(credential): Json<Credential>,
) -> Result<(StatusCode, Json<Added>), ApiError> {
	let index = state.vault.add_credential(&folder, credential).await?;

	Ok((StatusCode::CREATED, Json(Added { index })))
}

#[derive(Deserialize, Default)]
struct ShareRequest {
	ttl_secs: Option<u64>,
}

#[derive(Serialize)]
struct ShareResponse {
	token: String,
	url: String,
	delivered: Delivered,
}

async fn share(
	State(state): State<SharedState>,
	Path((folder, index)): Path<(String, usize)>,
	body: Option<Json<ShareRequest>>,
) -> Result<Json<ShareResponse>, ApiError> {
	let ttl_secs = body
		.and_then(|Json(body)| body.ttl_secs)
		.unwrap_or(state.default_ttl_secs);
	let entry = state.vault.credential(&folder, index).await?;
	let shared = state
		.issuer
		.share(&entry, ttl_secs, state.clipboard.as_ref(), state.fallback.as_ref())
		.await?;

	Ok(Json(ShareResponse {
		token: shared.token_id.to_string(),
		url: shared.url.to_string(),
		delivered: shared.delivered,
	}))
}

fn router(state: SharedState) -> Router {
	Router::new()
		.route("/unlock", post(unlock))
		.route("/logout", post(logout))
		.route("/vault", get(get_vault))
		.route("/folders", post(add_folder))
		.route("/folders/:name/entries", post(add_credential))
		.route("/folders/:name/entries/:index/share", post(share))
		.with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let config = Args::parse().config()?;

	let env_filter = EnvFilter::builder()
		.with_default_directive(config.log_level.parse()?)
		.from_env_lossy();

	tracing_subscriber::registry()
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.with(env_filter)
		.init();

	let menus = MenuSignal::new();
	let mut rebuilds = menus.subscribe();

	tokio::spawn(async move {
		// lagged receivers still only need one rebuild
		while let Ok(Rebuild) | Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) =
			rebuilds.recv().await
		{
			info!("vault changed, menus are stale");
		}
	});

	let session = Session::new(Arc::new(MemoryStore::new(Scope::Session)))?;
	let durable = Arc::new(FileStore::new(&config.vault_path));
	let clipboard: Box<dyn Clipboard> = match config
		.clipboard_command
		.as_deref()
		.and_then(CommandClipboard::new)
	{
		Some(command) => Box::new(command),
		None => Box::new(NoClipboard),
	};

	let state = Arc::new(AppState {
		vault: VaultStore::new(session, durable)?.with_observer(Arc::new(menus)),
		issuer: ShareIssuer::new(config.share_page()?),
		clipboard,
		fallback: Box::new(Prompt),
		default_ttl_secs: config.default_ttl_secs,
	});

	let listener = TcpListener::bind(config.listen_addr).await?;

	info!(addr = %config.listen_addr, vault = %config.vault_path.display(), "listening");

	axum::serve(listener, router(state)).await?;

	Ok(())
}
