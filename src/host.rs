//! Host platform contract: page location, navigation, the state cookie, session storage,
//! secure randomness, and the clock.
//!
//! Browser targets implement [`Host`] over their window, document, and storage objects; the
//! bundled [`MemoryHost`] keeps everything in-process for tests and non-browser callers.

pub mod memory;

pub use memory::MemoryHost;

// crates.io
use rand::RngCore;
// self
use crate::_prelude::*;

/// `SameSite` attribute applied to a cookie.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SameSite {
	/// Only sent on same-site requests.
	#[default]
	Strict,
	/// Sent on top-level cross-site navigations.
	Lax,
	/// Always sent (requires `Secure`).
	None,
}
impl SameSite {
	/// Returns the attribute value as written in a `Set-Cookie` header.
	pub const fn as_str(self) -> &'static str {
		match self {
			SameSite::Strict => "Strict",
			SameSite::Lax => "Lax",
			SameSite::None => "None",
		}
	}
}

/// Attributes attached to a cookie write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieAttributes {
	/// Cookie path.
	pub path: String,
	/// `SameSite` policy.
	pub same_site: SameSite,
	/// Restricts the cookie to secure origins.
	pub secure: bool,
	/// Lifetime; `None` keeps a session cookie, zero clears it.
	pub max_age: Option<Duration>,
}
impl CookieAttributes {
	/// Session-lifetime, same-site-strict, secure cookie scoped to `/`.
	pub fn strict_session() -> Self {
		Self { path: "/".into(), same_site: SameSite::Strict, secure: true, max_age: None }
	}

	/// Same attributes as [`strict_session`](Self::strict_session) with `max-age=0`.
	pub fn expired() -> Self {
		Self { max_age: Some(Duration::ZERO), ..Self::strict_session() }
	}

	/// Returns `true` when the write clears the cookie.
	pub fn clears(&self) -> bool {
		self.max_age.is_some_and(|age| age <= Duration::ZERO)
	}

	/// Renders the attributes as a `Set-Cookie` suffix.
	pub fn render(&self) -> String {
		let mut rendered = format!("Path={}; SameSite={}", self.path, self.same_site.as_str());

		if self.secure {
			rendered.push_str("; Secure");
		}
		if let Some(age) = self.max_age {
			rendered.push_str(&format!("; Max-Age={}", age.whole_seconds().max(0)));
		}

		rendered
	}
}
impl Default for CookieAttributes {
	fn default() -> Self {
		Self::strict_session()
	}
}

/// Browser-like environment the session runs in.
///
/// Implementations must be cheap to call repeatedly; the session never caches values read
/// from the host.
pub trait Host
where
	Self: Send + Sync,
{
	/// Current page URL, including query and fragment.
	fn page_url(&self) -> Url;

	/// Replaces the current history entry without navigating.
	fn replace_url(&self, url: &Url);

	/// Performs a full-page navigation.
	fn navigate(&self, url: &Url);

	/// Reads a cookie by name.
	fn cookie(&self, name: &str) -> Option<String>;

	/// Writes a cookie; `None` or [`CookieAttributes::expired`] clears it.
	fn set_cookie(&self, name: &str, value: Option<&str>, attributes: CookieAttributes);

	/// Reads a session-storage entry.
	fn session_get(&self, key: &str) -> Option<String>;

	/// Writes a session-storage entry; `None` or an empty value removes the key.
	fn session_set(&self, key: &str, value: Option<&str>);

	/// Fills `buf` with cryptographically secure random bytes.
	fn fill_random(&self, buf: &mut [u8]) {
		rand::rng().fill_bytes(buf);
	}

	/// Current wall-clock time.
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}
