//! Redirect state codec.
//!
//! Before a full-page redirect the session snapshot is sealed with AES-256-GCM under a fresh
//! key and IV. The key and IV travel in a same-site-strict cookie; the ciphertext sits in session
//! storage. Neither half alone reconstructs the state, and recovery consumes both.

// crates.io
use aes_gcm::{
	Aes256Gcm, Nonce,
	aead::{Aead, KeyInit},
};
// self
use crate::{
	_prelude::*,
	error::CodecError,
	host::{CookieAttributes, Host},
	store::{SessionStore, Snapshot},
};

/// Name of the cookie holding `hex(key) ‖ hex(iv)`.
pub const STATE_COOKIE: &str = "oauth2_redirect_state";
/// Session-storage entry (under the crate prefix) holding the hex ciphertext.
pub const STATE_ENTRY: &str = "state";
/// Length of the cookie payload in hex characters.
pub const COOKIE_PAYLOAD_LEN: usize = (KEY_LEN + IV_LEN) * 2;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 12;

/// Seals `snapshot` into the cookie and session-storage pair.
pub fn save(host: &dyn Host, snapshot: &Snapshot) -> Result<()> {
	seal(host, snapshot).map_err(|e| Error::new(Cause::SaveState, e))
}

/// Reads and clears both halves, returning the sealed snapshot when they are present and intact.
///
/// A missing half or a cookie of unexpected length yields `Ok(None)`; a second call after a
/// successful one is therefore a no-op.
pub fn recover(host: &dyn Host) -> Result<Option<Snapshot>> {
	let cookie = host.cookie(STATE_COOKIE);

	host.set_cookie(STATE_COOKIE, None, CookieAttributes::expired());

	let ciphertext = host.session_get(&SessionStore::key(STATE_ENTRY));

	host.session_set(&SessionStore::key(STATE_ENTRY), None);

	let (Some(cookie), Some(ciphertext)) = (cookie, ciphertext) else {
		return Ok(None);
	};

	if cookie.len() != COOKIE_PAYLOAD_LEN || !cookie.is_ascii() {
		tracing::warn!(length = cookie.len(), "Ignoring malformed redirect state cookie.");

		return Ok(None);
	}

	unseal(&cookie, &ciphertext).map(Some).map_err(|e| Error::new(Cause::RecoverState, e))
}

fn seal(host: &dyn Host, snapshot: &Snapshot) -> Result<(), CodecError> {
	let plaintext = serde_json::to_vec(snapshot)?;
	let mut key = [0_u8; KEY_LEN];
	let mut iv = [0_u8; IV_LEN];

	host.fill_random(&mut key);
	host.fill_random(&mut iv);

	let cipher = Aes256Gcm::new_from_slice(&key)
		.map_err(|_| CodecError::Cipher { operation: "encrypted" })?;
	let ciphertext = cipher
		.encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
		.map_err(|_| CodecError::Cipher { operation: "encrypted" })?;
	let cookie = format!("{}{}", hex::encode(key), hex::encode(iv));

	host.session_set(&SessionStore::key(STATE_ENTRY), Some(&hex::encode(ciphertext)));
	host.set_cookie(STATE_COOKIE, Some(&cookie), CookieAttributes::strict_session());

	Ok(())
}

fn unseal(cookie: &str, ciphertext: &str) -> Result<Snapshot, CodecError> {
	let (key, iv) = cookie.split_at(KEY_LEN * 2);
	let key = hex::decode(key)?;
	let iv = hex::decode(iv)?;
	let ciphertext = hex::decode(ciphertext)?;
	let cipher = Aes256Gcm::new_from_slice(&key)
		.map_err(|_| CodecError::Cipher { operation: "decrypted" })?;
	let plaintext = cipher
		.decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
		.map_err(|_| CodecError::Cipher { operation: "decrypted" })?;

	Ok(serde_json::from_slice(&plaintext)?)
}
