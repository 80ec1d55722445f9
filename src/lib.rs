pub mod aes_gcm;
pub mod base64_blobs;
pub mod codec;
pub mod config;
pub mod delivery;
pub mod encrypted;
pub mod error;
pub mod id;
mod key;
pub mod notify;
pub mod sessions;
pub mod share;
pub mod storage;
pub mod vault;
pub mod vault_store;

pub use crate::aes_gcm::{Iv, ShareKey, VaultKey};
pub use crate::encrypted::EncryptedBlob;
pub use crate::error::Error;
pub use crate::id::TokenId;
pub use crate::sessions::Session;
pub use crate::share::{ShareIssuer, SharePayload, ShareToken};
pub use crate::vault::{Credential, Vault};
pub use crate::vault_store::VaultStore;
