// Accepts a type name, outputs a scoped key type, eg Key<VaultScope, 32>, Key<ShareScope, 32>;
// keys of different scopes never compare or convert into each other
macro_rules! key {
	($type: ident) => {
		pub struct $type<T, const SIZE: usize> {
			bytes: [u8; SIZE],
			_marker: std::marker::PhantomData<T>,
		}

		impl<T, const SIZE: usize> $type<T, SIZE> {
			pub fn new(bytes: [u8; SIZE]) -> Self {
				Self {
					bytes,
					_marker: std::marker::PhantomData,
				}
			}

			pub fn generate() -> Self {
				use rand::RngCore;

				let mut bytes = [0u8; SIZE];
				rand::rngs::OsRng.fill_bytes(&mut bytes);

				Self::new(bytes)
			}

			pub fn as_bytes(&self) -> &[u8; SIZE] {
				&self.bytes
			}

			pub fn from_slice(bytes: &[u8]) -> Result<Self, crate::error::Error> {
				let bytes: [u8; SIZE] =
					bytes
						.try_into()
						.map_err(|_| crate::error::Error::InvalidKeyLength {
							expected: SIZE,
							actual: bytes.len(),
						})?;

				Ok(Self::new(bytes))
			}
		}

		impl<T, const SIZE: usize> From<&[u8; SIZE]> for $type<T, SIZE> {
			fn from(bytes: &[u8; SIZE]) -> Self {
				Self::new(*bytes)
			}
		}

		impl<T, const SIZE: usize> TryFrom<Vec<u8>> for $type<T, SIZE> {
			type Error = crate::error::Error;

			fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
				let value = zeroize::Zeroizing::new(value);

				Self::from_slice(value.as_slice())
			}
		}

		impl<T, const SIZE: usize> Clone for $type<T, SIZE> {
			fn clone(&self) -> Self {
				Self::new(self.bytes)
			}
		}

		impl<T, const SIZE: usize> PartialEq for $type<T, SIZE> {
			fn eq(&self, other: &Self) -> bool {
				self.bytes == other.bytes
			}
		}

		impl<T, const SIZE: usize> Eq for $type<T, SIZE> {}

		impl<T, const SIZE: usize> std::fmt::Debug for $type<T, SIZE> {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				write!(f, "{}([REDACTED; {}])", stringify!($type), SIZE)
			}
		}

		impl<T, const SIZE: usize> Drop for $type<T, SIZE> {
			fn drop(&mut self) {
				zeroize::Zeroize::zeroize(&mut self.bytes);
			}
		}

		impl<T, const SIZE: usize> serde::Serialize for $type<T, SIZE> {
			fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
				serializer.serialize_bytes(&self.bytes)
			}
		}

		impl<'de, T, const SIZE: usize> serde::Deserialize<'de> for $type<T, SIZE> {
			fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
			where
				D: serde::Deserializer<'de>,
			{
				struct Visitor<T, const SIZE: usize>(std::marker::PhantomData<T>);

				use serde::de::{self};

				impl<'de, T, const SIZE: usize> serde::de::Visitor<'de> for Visitor<T, SIZE> {
					type Value = $type<T, SIZE>;

					fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
						formatter.write_str(&format!("a byte array of length {}", SIZE))
					}

					fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
					where
						A: de::SeqAccess<'de>,
					{
						let mut bytes = zeroize::Zeroizing::new([0u8; SIZE]);
						for i in 0..SIZE {
							bytes[i] = seq
								.next_element()?
								.ok_or_else(|| de::Error::invalid_length(i, &self))?;
						}

						if seq.next_element::<u8>()?.is_some() {
							return Err(de::Error::invalid_length(SIZE + 1, &self));
						}

						Ok($type::new(*bytes))
					}

					fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
					where
						E: de::Error,
					{
						let bytes: [u8; SIZE] = v
							.try_into()
							.map_err(|_| de::Error::invalid_length(v.len(), &self))?;

						Ok($type::new(bytes))
					}
				}

				deserializer.deserialize_seq(Visitor(std::marker::PhantomData))
			}
		}
	};
}

pub(crate) use key;
