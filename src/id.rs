use std::{fmt, str::FromStr};

use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const TOKEN_ID_SIZE: usize = 8;

// An opaque label for one share issuance; it grants nothing by itself
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TokenId([u8; TOKEN_ID_SIZE]);

impl TokenId {
	pub fn generate() -> Self {
		let mut bytes = [0u8; TOKEN_ID_SIZE];
		OsRng.fill_bytes(&mut bytes);

		Self(bytes)
	}
}

impl fmt::Display for TokenId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&hex::encode(self.0))
	}
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("expected {} lowercase hex characters", TOKEN_ID_SIZE * 2)]
pub struct ParseTokenIdError;

impl FromStr for TokenId {
	type Err = ParseTokenIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// hex::decode alone would let uppercase through
		let lower_hex = s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));

		if s.len() != TOKEN_ID_SIZE * 2 || !lower_hex {
			return Err(ParseTokenIdError);
		}

		let mut bytes = [0u8; TOKEN_ID_SIZE];
		hex::decode_to_slice(s, &mut bytes).map_err(|_| ParseTokenIdError)?;

		Ok(Self(bytes))
	}
}

impl Serialize for TokenId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for TokenId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;

		s.parse().map_err(serde::de::Error::custom)
	}
}
