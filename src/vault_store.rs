use std::sync::Arc;

use tracing::{debug, info};

use crate::{
	codec,
	encrypted::EncryptedBlob,
	error::Error,
	notify::VaultObserver,
	sessions::Session,
	storage::{KeyValueStore, Scope, VAULT},
	vault::{Credential, Vault},
};

// Concurrent saves from views sharing one session are not isolated: the last
// blob written wins
pub struct VaultStore {
	session: Session,
	durable: Arc<dyn KeyValueStore>,
	observers: Vec<Arc<dyn VaultObserver>>,
}

impl VaultStore {
	pub fn new(session: Session, durable: Arc<dyn KeyValueStore>) -> Result<Self, Error> {
		durable.scope().ensure(Scope::Durable)?;

		Ok(Self {
			session,
			durable,
			observers: Vec::new(),
		})
	}

	pub fn with_observer(mut self, observer: Arc<dyn VaultObserver>) -> Self {
		self.observers.push(observer);
		self
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	// None: locked, or no vault has been saved yet
	pub async fn load(&self) -> Result<Option<Vault>, Error> {
		if let Some(vault) = self.session.cached_vault().await? {
			debug!("vault served from session cache");

			return Ok(Some(vault));
		}

		let Some(key) = self.session.key().await? else {
			return Ok(None);
		};

		let Some(value) = self.durable.get(VAULT).await? else {
			debug!("no durable vault");

			return Ok(None);
		};

		let blob: EncryptedBlob =
			serde_json::from_value(value).map_err(|source| Error::Corrupt { key: VAULT, source })?;
		let vault = codec::decrypt(&blob, &key)?;

		self.session.cache_vault(&vault).await?;

		debug!("vault decrypted from durable storage");

		Ok(Some(vault))
	}

	pub async fn save(&self, vault: &Vault) -> Result<(), Error> {
		let key = self.session.key().await?.ok_or(Error::MissingKey)?;
		let blob = codec::encrypt(vault, &key)?;
		let value = serde_json::to_value(&blob).map_err(Error::Encode)?;

		self.durable.set(VAULT, value).await?;

		// the old cache must not outlive a blob that replaced it
		if let Err(e) = self.session.cache_vault(vault).await {
			self.session.drop_cache().await?;

			return Err(e);
		}

		info!(folders = vault.folders.len(), "vault saved");

		self.notify();

		Ok(())
	}

	// true if the folder was created, false if it already existed
	pub async fn add_folder(&self, name: &str) -> Result<bool, Error> {
		let mut vault = self.load().await?.ok_or(Error::Locked)?;

		if !vault.add_folder(name) {
			return Ok(false);
		}

		self.save(&vault).await?;

		Ok(true)
	}

	pub async fn add_credential(&self, folder: &str, credential: Credential) -> Result<usize, Error> {
		let mut vault = self.load().await?.ok_or(Error::Locked)?;
		let index = vault
			.add_credential(folder, credential)
			.ok_or_else(|| Error::UnknownFolder(folder.to_string()))?;

		self.save(&vault).await?;

		Ok(index)
	}

	pub async fn credential(&self, folder: &str, index: usize) -> Result<Credential, Error> {
		let vault = self.load().await?.ok_or(Error::Locked)?;

		if vault.folder(folder).is_none() {
			return Err(Error::UnknownFolder(folder.to_string()));
		}

		vault
			.credential(folder, index)
			.cloned()
			.ok_or_else(|| Error::UnknownCredential {
				folder: folder.to_string(),
				index,
			})
	}

	pub async fn logout(&self) -> Result<(), Error> {
		self.session.end().await?;
		self.notify();

		Ok(())
	}

	fn notify(&self) {
		for observer in &self.observers {
			observer.vault_changed();
		}
	}
}
