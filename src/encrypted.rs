use serde::{Deserialize, Serialize};

use crate::aes_gcm::Iv;

// the only vault representation allowed into durable storage
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct EncryptedBlob {
	// ct || tag
	pub cipher: Vec<u8>,
	pub iv: Iv,
}
