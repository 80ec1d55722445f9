use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;
use zeroize::Zeroizing;

use crate::{
	aes_gcm::{self, Iv, ShareKey},
	base64_blobs,
	delivery::{self, Clipboard, Delivered, ManualCopy},
	error::Error,
	id::TokenId,
	vault::Credential,
};

pub const DEFAULT_TTL_SECS: u64 = 300;

const TOKEN_PARAM: &str = "token";
const DATA_PARAM: &str = "data";
const IV_PARAM: &str = "iv";
const KEY_PARAM: &str = "key";

pub trait Clock: Send + Sync {
	// milliseconds since the unix epoch
	fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
	fn now_ms(&self) -> i64 {
		chrono::Utc::now().timestamp_millis()
	}
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SharePayload {
	pub login_url: String,
	pub username: String,
	pub password: String,
	pub created: i64,
	pub expires: i64,
}

impl SharePayload {
	// advisory only: nothing in here stops a late redemption
	pub fn is_expired(&self, now_ms: i64) -> bool {
		now_ms >= self.expires
	}
}

// Whoever holds this holds the credential: the key travels with the ciphertext.
// It only leaves the process as a url
#[derive(PartialEq, Debug, Clone)]
pub struct ShareToken {
	pub token_id: TokenId,
	pub cipher: Vec<u8>,
	pub iv: Iv,
	pub key: ShareKey,
}

impl ShareToken {
	pub fn to_url(&self, page: &Url) -> Url {
		let mut url = page.clone();

		url.set_query(None);
		url.set_fragment(None);
		url.query_pairs_mut()
			.append_pair(TOKEN_PARAM, &self.token_id.to_string())
			.append_pair(DATA_PARAM, &base64_blobs::encode(&self.cipher))
			.append_pair(IV_PARAM, &base64_blobs::encode(&self.iv.bytes))
			.append_pair(KEY_PARAM, &base64_blobs::encode(self.key.as_bytes()));

		url
	}

	// all four parameters are required, in any order
	pub fn from_url(url: &Url) -> Result<Self, Error> {
		let mut token = None;
		let mut data = None;
		let mut iv = None;
		let mut key = None;

		for (name, value) in url.query_pairs() {
			match &*name {
				TOKEN_PARAM => token = Some(value),
				DATA_PARAM => data = Some(value),
				IV_PARAM => iv = Some(value),
				KEY_PARAM => key = Some(value),
				_ => {}
			}
		}

		let missing = |name: &str| Error::InvalidShareLink(format!("missing `{}`", name));
		let bad = |name: &str| Error::InvalidShareLink(format!("malformed `{}`", name));

		let token_id = token
			.ok_or_else(|| missing(TOKEN_PARAM))?
			.parse::<TokenId>()
			.map_err(|_| bad(TOKEN_PARAM))?;
		let cipher = base64_blobs::decode(&data.ok_or_else(|| missing(DATA_PARAM))?)
			.map_err(|_| bad(DATA_PARAM))?;
		let iv = base64_blobs::decode(&iv.ok_or_else(|| missing(IV_PARAM))?)
			.ok()
			.and_then(|bytes| Iv::from_slice(&bytes))
			.ok_or_else(|| bad(IV_PARAM))?;
		let key = base64_blobs::decode(&key.ok_or_else(|| missing(KEY_PARAM))?)
			.map_err(|_| bad(KEY_PARAM))
			.and_then(|bytes| ShareKey::try_from(bytes).map_err(|_| bad(KEY_PARAM)))?;

		Ok(Self {
			token_id,
			cipher,
			iv,
			key,
		})
	}

	// the redeemer's side; expiry is left to the caller
	pub fn open(&self) -> Result<SharePayload, Error> {
		let pt = Zeroizing::new(aes_gcm::decrypt(&self.key, &self.iv, &self.cipher)?);

		serde_json::from_slice(&pt).map_err(Error::Decode)
	}
}

#[derive(Debug, Clone)]
pub struct Shared {
	pub token_id: TokenId,
	pub url: Url,
	pub delivered: Delivered,
}

// Keeps no record of what it issued
pub struct ShareIssuer<C = SystemClock> {
	page: Url,
	clock: C,
}

impl ShareIssuer<SystemClock> {
	pub fn new(page: Url) -> Self {
		Self::with_clock(page, SystemClock)
	}
}

impl<C: Clock> ShareIssuer<C> {
	pub fn with_clock(page: Url, clock: C) -> Self {
		Self { page, clock }
	}

	// a fresh token id, key and iv on every call, unrelated to the vault key
	pub fn issue(&self, entry: &Credential, ttl_secs: u64) -> Result<ShareToken, Error> {
		let token_id = TokenId::generate();
		let key = ShareKey::generate();
		let iv = Iv::generate();
		let created = self.clock.now_ms();
		let ttl_ms = i64::try_from(ttl_secs).unwrap_or(i64::MAX).saturating_mul(1000);
		let payload = SharePayload {
			login_url: entry.login_url().to_string(),
			username: entry.username.clone(),
			password: entry.password.clone(),
			created,
			expires: created.saturating_add(ttl_ms),
		};
		let pt = Zeroizing::new(serde_json::to_vec(&payload).map_err(Error::Encode)?);
		let cipher = aes_gcm::encrypt(&key, &iv, &pt)?;

		info!(token_id = %token_id, expires = payload.expires, "share token issued");

		Ok(ShareToken {
			token_id,
			cipher,
			iv,
			key,
		})
	}

	pub fn issue_url(&self, entry: &Credential, ttl_secs: u64) -> Result<Url, Error> {
		Ok(self.issue(entry, ttl_secs)?.to_url(&self.page))
	}

	// clipboard first, manual copy otherwise; fails only if neither worked
	pub async fn share(
		&self,
		entry: &Credential,
		ttl_secs: u64,
		clipboard: &dyn Clipboard,
		fallback: &dyn ManualCopy,
	) -> Result<Shared, Error> {
		let token = self.issue(entry, ttl_secs)?;
		let url = token.to_url(&self.page);
		let delivered = delivery::deliver(url.as_str(), clipboard, fallback).await?;

		info!(token_id = %token.token_id, ?delivered, "share link delivered");

		Ok(Shared {
			token_id: token.token_id,
			url,
			delivered,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::{Clock, ShareIssuer, SharePayload, ShareToken, DEFAULT_TTL_SECS};
	use crate::{
		aes_gcm::{Iv, ShareKey},
		delivery::{tests::Recorder, Delivered, NoClipboard},
		error::Error,
		id::TokenId,
		vault::Credential,
	};
	use std::collections::HashSet;
	use url::Url;

	const T: i64 = 1_700_000_000_000;

	struct FixedClock(i64);

	impl Clock for FixedClock {
		fn now_ms(&self) -> i64 {
			self.0
		}
	}

	fn page() -> Url {
		Url::parse("chrome-extension://abcdefghijklmnop/share.html").unwrap()
	}

	fn issuer() -> ShareIssuer<FixedClock> {
		ShareIssuer::with_clock(page(), FixedClock(T))
	}

	fn alice() -> Credential {
		Credential::new(Some("https://example.com/login"), "alice", "p@ss")
	}

	#[test]
	fn test_share_round_trip() {
		let url = issuer().issue_url(&alice(), 60).unwrap();
		let payload = ShareToken::from_url(&url).unwrap().open().unwrap();

		assert_eq!(
			payload,
			SharePayload {
				login_url: "https://example.com/login".to_string(),
				username: "alice".to_string(),
				password: "p@ss".to_string(),
				created: T,
				expires: T + 60_000,
			}
		);
	}

	#[test]
	fn test_payload_json_shape() {
		let token = issuer().issue(&Credential::new(None, "bob", "pw"), 1).unwrap();
		let pt = crate::aes_gcm::decrypt(&token.key, &token.iv, &token.cipher).unwrap();
		let json: serde_json::Value = serde_json::from_slice(&pt).unwrap();

		assert_eq!(
			json,
			serde_json::json!({
				"loginUrl": "",
				"username": "bob",
				"password": "pw",
				"created": T,
				"expires": T + 1000,
			})
		);
	}

	#[test]
	fn test_expiry_is_ttl() {
		for ttl in [0, 1, DEFAULT_TTL_SECS, 86_400] {
			let payload = issuer().issue(&alice(), ttl).unwrap().open().unwrap();

			assert_eq!(payload.expires - payload.created, ttl as i64 * 1000);
		}
	}

	#[test]
	fn test_huge_ttl_saturates() {
		let payload = issuer().issue(&alice(), u64::MAX).unwrap().open().unwrap();

		assert_eq!(payload.expires, i64::MAX);
	}

	#[test]
	fn test_is_expired_is_advisory() {
		let payload = issuer().issue(&alice(), 60).unwrap().open().unwrap();

		assert!(!payload.is_expired(T));
		assert!(!payload.is_expired(T + 59_999));
		assert!(payload.is_expired(T + 60_000));
	}

	#[test]
	fn test_url_layout() {
		let token = issuer().issue(&alice(), 60).unwrap();
		let url = token.to_url(&page());
		let names: Vec<String> = url.query_pairs().map(|(name, _)| name.into_owned()).collect();

		assert_eq!(url.scheme(), "chrome-extension");
		assert_eq!(url.path(), "/share.html");
		assert_eq!(names, vec!["token", "data", "iv", "key"]);
		assert!(url.as_str().contains(&format!("token={}", token.token_id)));
	}

	#[test]
	fn test_freshness_per_issue() {
		let issuer = issuer();
		let tokens: Vec<ShareToken> = (0..200)
			.map(|_| issuer.issue(&alice(), 60).unwrap())
			.collect();
		let ids: HashSet<TokenId> = tokens.iter().map(|t| t.token_id).collect();
		let ivs: HashSet<Iv> = tokens.iter().map(|t| t.iv).collect();
		let keys: HashSet<[u8; 32]> = tokens.iter().map(|t| *t.key.as_bytes()).collect();

		assert_eq!(ids.len(), 200);
		assert_eq!(ivs.len(), 200);
		assert_eq!(keys.len(), 200);
	}

	#[test]
	fn test_parameters_are_order_independent() {
		let token = issuer().issue(&alice(), 60).unwrap();
		let url = token.to_url(&page());
		let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

		pairs.reverse();

		let mut shuffled = page();
		shuffled.query_pairs_mut().extend_pairs(pairs);

		assert_eq!(ShareToken::from_url(&shuffled).unwrap(), token);
	}

	#[test]
	fn test_standard_base64_links_are_accepted() {
		use base64::{engine::general_purpose::STANDARD, Engine};

		let token = issuer().issue(&alice(), 60).unwrap();
		let mut url = page();

		url.query_pairs_mut()
			.append_pair("token", &token.token_id.to_string())
			.append_pair("data", &STANDARD.encode(&token.cipher))
			.append_pair("iv", &STANDARD.encode(token.iv.bytes))
			.append_pair("key", &STANDARD.encode(token.key.as_bytes()));

		assert_eq!(ShareToken::from_url(&url).unwrap().open().unwrap().username, "alice");
	}

	#[test]
	fn test_missing_parameter() {
		let url = issuer().issue_url(&alice(), 60).unwrap();

		for dropped in ["token", "data", "iv", "key"] {
			let mut partial = page();

			partial
				.query_pairs_mut()
				.extend_pairs(url.query_pairs().filter(|(name, _)| name != dropped));

			assert!(matches!(
				ShareToken::from_url(&partial),
				Err(Error::InvalidShareLink(_))
			));
		}
	}

	#[test]
	fn test_malformed_parameter() {
		let url = issuer().issue_url(&alice(), 60).unwrap();

		for (broken, value) in [("token", "xyz"), ("iv", "AQID"), ("key", "AQID"), ("data", "@@")] {
			let mut partial = page();

			partial.query_pairs_mut().extend_pairs(url.query_pairs().map(|(name, v)| {
				if name == broken {
					(name.into_owned(), value.to_string())
				} else {
					(name.into_owned(), v.into_owned())
				}
			}));

			assert!(matches!(
				ShareToken::from_url(&partial),
				Err(Error::InvalidShareLink(_))
			));
		}
	}

	#[test]
	fn test_tampered_data_fails_authentication() {
		let mut token = issuer().issue(&alice(), 60).unwrap();

		token.cipher[0] ^= 1;

		assert!(matches!(token.open(), Err(Error::Authentication)));
	}

	#[test]
	fn test_foreign_key_fails_authentication() {
		let mut token = issuer().issue(&alice(), 60).unwrap();

		token.key = ShareKey::generate();

		assert!(matches!(token.open(), Err(Error::Authentication)));
	}

	#[test]
	fn test_existing_query_on_page_is_replaced() {
		let page = Url::parse("chrome-extension://abc/share.html?stale=1#frag").unwrap();
		let issuer = ShareIssuer::with_clock(page, FixedClock(T));
		let url = issuer.issue_url(&alice(), 60).unwrap();

		assert!(!url.as_str().contains("stale"));
		assert_eq!(url.fragment(), None);
	}

	#[tokio::test]
	async fn test_share_copies_to_clipboard() {
		let clipboard = Recorder::default();
		let fallback = Recorder::default();
		let shared = issuer()
			.share(&alice(), 60, &clipboard, &fallback)
			.await
			.unwrap();

		assert_eq!(shared.delivered, Delivered::Clipboard);
		assert_eq!(*clipboard.seen.lock().unwrap(), vec![shared.url.to_string()]);
		assert_eq!(
			ShareToken::from_url(&shared.url).unwrap().token_id,
			shared.token_id
		);
	}

	#[tokio::test]
	async fn test_share_falls_back_to_manual_copy() {
		let fallback = Recorder::default();
		let shared = issuer()
			.share(&alice(), 60, &NoClipboard, &fallback)
			.await
			.unwrap();

		assert_eq!(shared.delivered, Delivered::Manual);
		assert_eq!(*fallback.seen.lock().unwrap(), vec![shared.url.to_string()]);
	}

	#[tokio::test]
	async fn test_share_reports_total_delivery_failure() {
		let fallback = Recorder {
			fail: true,
			..Default::default()
		};

		assert!(matches!(
			issuer().share(&alice(), 60, &NoClipboard, &fallback).await,
			Err(Error::Delivery(_))
		));
	}
}
