use ::aes_gcm::{
	aead::{Aead, KeyInit},
	Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{error::Error, key::key};

pub const KEY_SIZE: usize = 32;
pub const IV_SIZE: usize = 12;

key!(Key);

// protects the whole vault; lives in session scope only
pub struct VaultScope;
// protects a single shared credential; travels inside the share link
pub struct ShareScope;

pub type VaultKey = Key<VaultScope, KEY_SIZE>;
pub type ShareKey = Key<ShareScope, KEY_SIZE>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iv {
	pub bytes: [u8; Self::SIZE],
}

impl Iv {
	pub const SIZE: usize = IV_SIZE;

	// never reuse an iv with the same key: draw a new one for every encryption
	pub fn generate() -> Self {
		let mut bytes = [0u8; Self::SIZE];
		OsRng.fill_bytes(&mut bytes);

		Self { bytes }
	}

	pub fn from_slice(bytes: &[u8]) -> Option<Self> {
		bytes.try_into().ok().map(|bytes| Self { bytes })
	}
}

fn cipher<T>(key: &Key<T, KEY_SIZE>) -> Aes256Gcm {
	Aes256Gcm::new(::aes_gcm::Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

// returns ct || tag
pub fn encrypt<T>(key: &Key<T, KEY_SIZE>, iv: &Iv, pt: &[u8]) -> Result<Vec<u8>, Error> {
	cipher(key)
		.encrypt(Nonce::from_slice(&iv.bytes), pt)
		.map_err(|_| Error::Encryption)
}

pub fn decrypt<T>(key: &Key<T, KEY_SIZE>, iv: &Iv, ct: &[u8]) -> Result<Vec<u8>, Error> {
	cipher(key)
		.decrypt(Nonce::from_slice(&iv.bytes), ct)
		.map_err(|_| Error::Authentication)
}
