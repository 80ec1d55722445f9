use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub login_url: Option<String>,
	pub username: String,
	pub password: String,
}

impl Credential {
	pub fn new(login_url: Option<&str>, username: &str, password: &str) -> Self {
		Self {
			login_url: login_url.map(str::to_string),
			username: username.to_string(),
			password: password.to_string(),
		}
	}

	// an absent url and an empty one mean the same thing
	pub fn login_url(&self) -> &str {
		self.login_url.as_deref().unwrap_or_default()
	}

	// host + path for parsable urls, the raw string otherwise
	pub fn display_host(&self) -> String {
		let raw = self.login_url();

		match Url::parse(raw) {
			Ok(url) => match url.host_str() {
				Some(host) => format!("{}{}", host, url.path()),
				None => raw.to_string(),
			},
			Err(_) => raw.to_string(),
		}
	}

	pub fn masked_password(&self) -> String {
		"•".repeat(self.password.chars().count())
	}
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct Vault {
	// legacy or fresh vaults may lack the mapping entirely, or carry a null
	#[serde(default, deserialize_with = "nullable")]
	pub folders: BTreeMap<String, Vec<Credential>>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de> + Default,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Vault {
	pub fn new() -> Self {
		Self::default()
	}

	// returns false if the folder already exists; its entries are kept
	pub fn add_folder(&mut self, name: &str) -> bool {
		if self.folders.contains_key(name) {
			false
		} else {
			self.folders.insert(name.to_string(), Vec::new());

			true
		}
	}

	pub fn folder(&self, name: &str) -> Option<&[Credential]> {
		self.folders.get(name).map(Vec::as_slice)
	}

	pub fn folder_names(&self) -> impl Iterator<Item = &str> {
		self.folders.keys().map(String::as_str)
	}

	// duplicates are allowed; returns the index of the new entry
	pub fn add_credential(&mut self, folder: &str, credential: Credential) -> Option<usize> {
		self.folders.get_mut(folder).map(|entries| {
			entries.push(credential);

			entries.len() - 1
		})
	}

	pub fn credential(&self, folder: &str, index: usize) -> Option<&Credential> {
		self.folders.get(folder).and_then(|entries| entries.get(index))
	}
}
