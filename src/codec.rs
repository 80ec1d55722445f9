use zeroize::Zeroizing;

use crate::{
	aes_gcm::{self, Iv, VaultKey},
	encrypted::EncryptedBlob,
	error::Error,
	vault::Vault,
};

pub fn encrypt(vault: &Vault, key: &VaultKey) -> Result<EncryptedBlob, Error> {
	let pt = Zeroizing::new(serde_json::to_vec(vault).map_err(Error::Encode)?);
	let iv = Iv::generate();
	let cipher = aes_gcm::encrypt(key, &iv, &pt)?;

	Ok(EncryptedBlob { cipher, iv })
}

pub fn decrypt(blob: &EncryptedBlob, key: &VaultKey) -> Result<Vault, Error> {
	let pt = Zeroizing::new(aes_gcm::decrypt(key, &blob.iv, &blob.cipher)?);

	serde_json::from_slice(&pt).map_err(Error::Decode)
}
