use std::{
	net::{IpAddr, Ipv4Addr, SocketAddr},
	path::{Path, PathBuf},
};

use serde::Deserialize;
use url::Url;

use crate::share::DEFAULT_TTL_SECS;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub listen_addr: SocketAddr,
	// the redemption page share links point at
	pub share_page: String,
	// used when a share request does not name a ttl
	pub default_ttl_secs: u64,
	// the durable store file
	pub vault_path: PathBuf,
	// argv of a program that reads the link on stdin, eg ["wl-copy"];
	// without one links are always presented for manual copy
	pub clipboard_command: Option<Vec<String>>,
	// RUST_LOG takes precedence
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
			share_page: "chrome-extension://passvault/share.html".to_string(),
			default_ttl_secs: DEFAULT_TTL_SECS,
			vault_path: PathBuf::from("vault.json"),
			clipboard_command: None,
			log_level: "info".to_string(),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("invalid share page {url}: {source}")]
	SharePage {
		url: String,
		#[source]
		source: url::ParseError,
	},
}

impl Config {
	pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(s)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;

		Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}

	pub fn share_page(&self) -> Result<Url, ConfigError> {
		Url::parse(&self.share_page).map_err(|source| ConfigError::SharePage {
			url: self.share_page.clone(),
			source,
		})
	}
}
