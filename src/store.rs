//! Session-storage persistence for the configuration, ID token claims, and pending flow.
//!
//! Every key is namespaced with [`STORAGE_PREFIX`]. Writes of `None` or empty values remove
//! the entry, mirroring the host contract.

// self
use crate::{_prelude::*, flows::PendingFlow, host::Host};

/// Prefix applied to every session-storage key written by the crate.
pub const STORAGE_PREFIX: &str = "oauth2_redirect.";

const CONFIGURATION_KEY: &str = "configuration";
const ID_TOKEN_KEY: &str = "id_token";
const PENDING_KEY: &str = "pending";

/// Serializable view of a session: the external configuration shape, the ID token claims, and
/// the pending flow record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
	/// Configuration in its external (normalizer input) shape.
	#[serde(default)]
	pub configuration: Value,
	/// Verified ID token claims.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub id_token: ParameterMap,
	/// Transient per-flow secrets.
	#[serde(default, skip_serializing_if = "PendingFlow::is_empty")]
	pub pending: PendingFlow,
}

/// Namespaced view over the host's session storage.
#[derive(Clone)]
pub struct SessionStore {
	host: Arc<dyn Host>,
}
impl SessionStore {
	/// Wraps the host's session storage.
	pub fn new(host: Arc<dyn Host>) -> Self {
		Self { host }
	}

	/// Returns the namespaced key for `name`.
	pub fn key(name: &str) -> String {
		format!("{STORAGE_PREFIX}{name}")
	}

	/// Reads the entry stored under `name`.
	pub fn get(&self, name: &str) -> Option<String> {
		self.host.session_get(&Self::key(name)).filter(|value| !value.is_empty())
	}

	/// Writes `value` under `name`; `None` or an empty value removes the entry.
	pub fn set(&self, name: &str, value: Option<&str>) {
		self.host.session_set(&Self::key(name), value.filter(|value| !value.is_empty()));
	}

	/// Reads and removes the entry stored under `name`.
	pub fn take(&self, name: &str) -> Option<String> {
		let value = self.get(name);

		self.set(name, None);

		value
	}

	/// Persists `snapshot`, removing entries whose section is empty.
	pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
		let configuration = match &snapshot.configuration {
			Value::Null => None,
			Value::Object(map) if map.is_empty() => None,
			value => Some(encode(CONFIGURATION_KEY, value)?),
		};
		let id_token = if snapshot.id_token.is_empty() {
			None
		} else {
			Some(encode(ID_TOKEN_KEY, &snapshot.id_token)?)
		};
		let pending = if snapshot.pending.is_empty() {
			None
		} else {
			Some(encode(PENDING_KEY, &snapshot.pending)?)
		};

		self.set(CONFIGURATION_KEY, configuration.as_deref());
		self.set(ID_TOKEN_KEY, id_token.as_deref());
		self.set(PENDING_KEY, pending.as_deref());

		tracing::debug!("Persisted session snapshot.");

		Ok(())
	}

	/// Loads the persisted snapshot, or `None` when no configuration was stored.
	pub fn load(&self) -> Result<Option<Snapshot>> {
		let Some(configuration) = self.get(CONFIGURATION_KEY) else {
			return Ok(None);
		};
		let configuration = decode(CONFIGURATION_KEY, &configuration)?;
		let id_token = match self.get(ID_TOKEN_KEY) {
			Some(raw) => decode(ID_TOKEN_KEY, &raw)?,
			None => ParameterMap::new(),
		};
		let pending = match self.get(PENDING_KEY) {
			Some(raw) => decode(PENDING_KEY, &raw)?,
			None => PendingFlow::default(),
		};

		Ok(Some(Snapshot { configuration, id_token, pending }))
	}

	/// Removes every persisted entry.
	pub fn clear(&self) {
		for name in [CONFIGURATION_KEY, ID_TOKEN_KEY, PENDING_KEY] {
			self.set(name, None);
		}
	}
}
impl Debug for SessionStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionStore").field("prefix", &STORAGE_PREFIX).finish()
	}
}

fn encode<T>(key: &'static str, value: &T) -> Result<String>
where
	T: ?Sized + Serialize,
{
	serde_json::to_string(value).map_err(|source| storage_error(key, source))
}

fn decode<T>(key: &'static str, raw: &str) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	serde_json::from_str(raw).map_err(|source| storage_error(key, source))
}

fn storage_error(key: &'static str, source: serde_json::Error) -> Error {
	Error::new(Cause::Storage, ErrorKind::Storage { key, source })
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::host::MemoryHost;

	fn store() -> (Arc<MemoryHost>, SessionStore) {
		let host = Arc::new(MemoryHost::new(
			Url::parse("https://app.example.com/").expect("Fixture URL should parse."),
		));

		(host.clone(), SessionStore::new(host))
	}

	#[test]
	fn keys_are_namespaced() {
		let (host, store) = store();

		store.set("state", Some("sealed"));

		assert_eq!(host.session_get("oauth2_redirect.state").as_deref(), Some("sealed"));
		assert_eq!(store.take("state").as_deref(), Some("sealed"));
		assert_eq!(store.get("state"), None);
	}

	#[test]
	fn snapshot_round_trips_and_clears() {
		let (host, store) = store();
		let snapshot = Snapshot {
			configuration: json!({ "parameters": { "client_id": "app" } }),
			id_token: [("sub".to_owned(), json!("user-1"))].into_iter().collect(),
			pending: PendingFlow { code_verifier: Some("verifier".into()) },
		};

		store.save(&snapshot).expect("Snapshot should persist.");

		assert_eq!(store.load().expect("Snapshot should load."), Some(snapshot));

		store.clear();

		assert!(host.session_entries().is_empty());
		assert_eq!(store.load().expect("Empty storage should load."), None);
	}

	#[test]
	fn corrupt_entries_surface_storage_errors() {
		let (host, store) = store();

		host.session_set("oauth2_redirect.configuration", Some("{not json"));

		let err = store.load().expect_err("Corrupt JSON should fail.");

		assert_eq!(err.cause(), Cause::Storage);
		assert!(matches!(err.kind(), ErrorKind::Storage { key: "configuration", .. }));
		assert_eq!(
			err.to_string(),
			"[storage] Persisted session entry `configuration` is unreadable."
		);
	}
}
