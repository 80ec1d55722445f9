use std::{
	collections::HashMap,
	path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::Error;

// session scope: raw vault key bytes
pub const VAULT_KEY: &str = "vaultKey";
// session scope: the decrypted vault as a json string
pub const VAULT_CACHE: &str = "vaultCache";
// durable scope: { cipher, iv }
pub const VAULT: &str = "vault";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
	// cleared when the session ends
	Session,
	// survives restarts
	Durable,
}

impl Scope {
	pub fn ensure(self, expected: Scope) -> Result<(), Error> {
		if self == expected {
			Ok(())
		} else {
			Err(Error::WrongScope {
				expected,
				actual: self,
			})
		}
	}
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
	fn scope(&self) -> Scope;

	async fn get(&self, key: &str) -> Result<Option<Value>, Error>;

	async fn set(&self, key: &str, value: Value) -> Result<(), Error>;

	async fn remove(&self, key: &str) -> Result<(), Error>;
}

pub struct MemoryStore {
	scope: Scope,
	// { key, value }
	values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
	pub fn new(scope: Scope) -> Self {
		Self {
			scope,
			values: RwLock::new(HashMap::new()),
		}
	}

	// drops everything, as a browser does when the session ends
	pub async fn purge(&self) {
		self.values.write().await.clear();
	}
}

#[async_trait]
impl KeyValueStore for MemoryStore {
	fn scope(&self) -> Scope {
		self.scope
	}

	async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
		Ok(self.values.read().await.get(key).cloned())
	}

	async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
		self.values.write().await.insert(key.to_string(), value);

		Ok(())
	}

	async fn remove(&self, key: &str) -> Result<(), Error> {
		self.values.write().await.remove(key);

		Ok(())
	}
}

// A single json object on disk; every write replaces the file through a rename
pub struct FileStore {
	path: PathBuf,
	// serializes read-modify-write cycles within this process
	lock: Mutex<()>,
}

impl FileStore {
	pub fn new(path: impl AsRef<Path>) -> Self {
		Self {
			path: path.as_ref().to_path_buf(),
			lock: Mutex::new(()),
		}
	}

	async fn read_all(&self) -> Result<Map<String, Value>, Error> {
		match tokio::fs::read(&self.path).await {
			Ok(bytes) => match serde_json::from_slice(&bytes) {
				Ok(Value::Object(map)) => Ok(map),
				Ok(_) => Err(Error::Storage(format!(
					"{} does not hold a json object",
					self.path.display()
				))),
				Err(e) => Err(Error::Storage(format!("{}: {}", self.path.display(), e))),
			},
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
			Err(e) => Err(e.into()),
		}
	}

	async fn write_all(&self, map: Map<String, Value>) -> Result<(), Error> {
		let bytes = serde_json::to_vec(&Value::Object(map)).map_err(Error::Encode)?;
		let tmp = self.path.with_extension("tmp");

		tokio::fs::write(&tmp, bytes).await?;
		tokio::fs::rename(&tmp, &self.path).await?;

		debug!(path = %self.path.display(), "durable store written");

		Ok(())
	}
}

#[async_trait]
impl KeyValueStore for FileStore {
	fn scope(&self) -> Scope {
		Scope::Durable
	}

	async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
		let _guard = self.lock.lock().await;

		Ok(self.read_all().await?.remove(key))
	}

	async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
		let _guard = self.lock.lock().await;
		let mut map = self.read_all().await?;

		map.insert(key.to_string(), value);

		self.write_all(map).await
	}

	async fn remove(&self, key: &str) -> Result<(), Error> {
		let _guard = self.lock.lock().await;
		let mut map = self.read_all().await?;

		if map.remove(key).is_some() {
			self.write_all(map).await
		} else {
			Ok(())
		}
	}
}
