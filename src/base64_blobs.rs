use base64::{
	engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD},
	DecodeError, Engine,
};

// url-safe, unpadded: the output can go into a query string as is
pub fn encode(bytes: &[u8]) -> String {
	URL_SAFE_NO_PAD.encode(bytes)
}

// accepts url-safe with or without padding, and the standard alphabet links used to carry
pub fn decode(s: &str) -> Result<Vec<u8>, DecodeError> {
	let trimmed = s.trim_end_matches('=');

	URL_SAFE_NO_PAD
		.decode(trimmed)
		.or_else(|_| URL_SAFE.decode(s))
		.or_else(|_| STANDARD.decode(s))
}

#[cfg(test)]
mod tests {
	use super::{decode, encode};

	#[test]
	fn test_encode_is_url_safe() {
		// 0xfb 0xff encodes to "+/8" in the standard alphabet
		let encoded = encode(&[0xfb, 0xff]);

		assert_eq!(encoded, "-_8");
		assert!(!encoded.contains('='));
	}

	#[test]
	fn test_decode_accepts_all_alphabets() {
		assert_eq!(decode("-_8").unwrap(), vec![0xfb, 0xff]);
		assert_eq!(decode("-_8=").unwrap(), vec![0xfb, 0xff]);
		assert_eq!(decode("+/8=").unwrap(), vec![0xfb, 0xff]);
		assert_eq!(decode("AQID").unwrap(), vec![1, 2, 3]);
		assert!(decode("not base64!").is_err());
	}
}
