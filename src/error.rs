use crate::{delivery::DeliveryError, storage::Scope};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	// a save was attempted while no vault key is held by the session
	#[error("no vault key in session")]
	MissingKey,
	#[error("vault is locked")]
	Locked,
	// tag mismatch: tampered ciphertext, wrong key or a corrupted iv
	#[error("authentication failed")]
	Authentication,
	#[error("malformed vault encoding: {0}")]
	Decode(#[source] serde_json::Error),
	#[error("failed to encode value: {0}")]
	Encode(#[source] serde_json::Error),
	#[error("encryption failed")]
	Encryption,
	#[error("malformed record stored under `{key}`: {source}")]
	Corrupt {
		key: &'static str,
		#[source]
		source: serde_json::Error,
	},
	#[error("storage error: {0}")]
	Storage(String),
	#[error("expected a {expected:?} store, got a {actual:?} one")]
	WrongScope { expected: Scope, actual: Scope },
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("invalid key length: expected {expected}, got {actual}")]
	InvalidKeyLength { expected: usize, actual: usize },
	#[error("invalid share link: {0}")]
	InvalidShareLink(String),
	#[error("no such folder: {0}")]
	UnknownFolder(String),
	#[error("no credential at index {index} in folder {folder}")]
	UnknownCredential { folder: String, index: usize },
	#[error("share link could not be delivered: {0}")]
	Delivery(#[from] DeliveryError),
}
