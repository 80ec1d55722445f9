use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::{
	aes_gcm::VaultKey,
	error::Error,
	storage::{KeyValueStore, Scope, VAULT_CACHE, VAULT_KEY},
	vault::Vault,
};

// The vault key and the plaintext cache of one unlocked session. Every view
// holding a clone of the same store sees the same key and cache
#[derive(Clone)]
pub struct Session {
	store: Arc<dyn KeyValueStore>,
}

impl Session {
	pub fn new(store: Arc<dyn KeyValueStore>) -> Result<Self, Error> {
		store.scope().ensure(Scope::Session)?;

		Ok(Self { store })
	}

	// the hand-off point for a key produced by the login flow; stored as is
	pub async fn unlock(&self, key: &VaultKey) -> Result<(), Error> {
		let value = serde_json::to_value(key).map_err(Error::Encode)?;

		self.store.set(VAULT_KEY, value).await?;

		info!("session unlocked");

		Ok(())
	}

	// None means locked: the caller has to go through unlock first
	pub async fn key(&self) -> Result<Option<VaultKey>, Error> {
		match self.store.get(VAULT_KEY).await? {
			Some(value) => serde_json::from_value(value)
				.map(Some)
				.map_err(|source| Error::Corrupt {
					key: VAULT_KEY,
					source,
				}),
			None => {
				debug!("no vault key in session");

				Ok(None)
			}
		}
	}

	pub async fn cached_vault(&self) -> Result<Option<Vault>, Error> {
		let Some(value) = self.store.get(VAULT_CACHE).await? else {
			return Ok(None);
		};

		let json = match value {
			Value::String(json) => json,
			other => other.to_string(),
		};

		serde_json::from_str(&json)
			.map(Some)
			.map_err(|source| Error::Corrupt {
				key: VAULT_CACHE,
				source,
			})
	}

	pub async fn cache_vault(&self, vault: &Vault) -> Result<(), Error> {
		let json = serde_json::to_string(vault).map_err(Error::Encode)?;

		self.store.set(VAULT_CACHE, Value::String(json)).await
	}

	pub async fn drop_cache(&self) -> Result<(), Error> {
		self.store.remove(VAULT_CACHE).await
	}

	// logout: drops the cache first so no plaintext outlives the key
	pub async fn end(&self) -> Result<(), Error> {
		self.drop_cache().await?;
		self.store.remove(VAULT_KEY).await?;

		info!("session ended");

		Ok(())
	}
}
