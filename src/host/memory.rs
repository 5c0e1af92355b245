//! Thread-safe in-memory [`Host`] implementation for tests and non-browser callers.

// self
use crate::{
	_prelude::*,
	host::{CookieAttributes, Host},
};

#[derive(Debug)]
struct HostState {
	page: Url,
	cookies: HashMap<String, (String, CookieAttributes)>,
	session: HashMap<String, String>,
	navigations: Vec<Url>,
	replacements: Vec<Url>,
	clock: Option<OffsetDateTime>,
}

/// In-process host that records navigations and keeps cookies and session storage in maps.
///
/// Navigating moves the page URL, so a test can follow a redirect and then hand the host a
/// callback URL with [`MemoryHost::visit`].
#[derive(Debug)]
pub struct MemoryHost(RwLock<HostState>);
impl MemoryHost {
	/// Creates a host sitting on `page`.
	pub fn new(page: Url) -> Self {
		Self(RwLock::new(HostState {
			page,
			cookies: HashMap::new(),
			session: HashMap::new(),
			navigations: Vec::new(),
			replacements: Vec::new(),
			clock: None,
		}))
	}

	/// Simulates a page load at `url` (cookies and session storage survive).
	pub fn visit(&self, url: Url) {
		self.0.write().page = url;
	}

	/// Freezes the clock at `now`.
	pub fn set_now(&self, now: OffsetDateTime) {
		self.0.write().clock = Some(now);
	}

	/// Every full-page navigation performed so far.
	pub fn navigations(&self) -> Vec<Url> {
		self.0.read().navigations.clone()
	}

	/// Most recent full-page navigation.
	pub fn last_navigation(&self) -> Option<Url> {
		self.0.read().navigations.last().cloned()
	}

	/// Every history replacement performed so far.
	pub fn replacements(&self) -> Vec<Url> {
		self.0.read().replacements.clone()
	}

	/// Attributes of the last write to cookie `name`, if it is still set.
	pub fn cookie_attributes(&self, name: &str) -> Option<CookieAttributes> {
		self.0.read().cookies.get(name).map(|(_, attributes)| attributes.clone())
	}

	/// Snapshot of the session-storage entries.
	pub fn session_entries(&self) -> BTreeMap<String, String> {
		self.0.read().session.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
	}
}
impl Host for MemoryHost {
	fn page_url(&self) -> Url {
		self.0.read().page.clone()
	}

	fn replace_url(&self, url: &Url) {
		let mut state = self.0.write();

		state.replacements.push(url.clone());
		state.page = url.clone();
	}

	fn navigate(&self, url: &Url) {
		let mut state = self.0.write();

		state.navigations.push(url.clone());
		state.page = url.clone();
	}

	fn cookie(&self, name: &str) -> Option<String> {
		self.0.read().cookies.get(name).map(|(value, _)| value.clone())
	}

	fn set_cookie(&self, name: &str, value: Option<&str>, attributes: CookieAttributes) {
		let mut state = self.0.write();

		match value {
			Some(value) if !value.is_empty() && !attributes.clears() => {
				state.cookies.insert(name.to_owned(), (value.to_owned(), attributes));
			},
			_ => {
				state.cookies.remove(name);
			},
		}
	}

	fn session_get(&self, key: &str) -> Option<String> {
		self.0.read().session.get(key).cloned()
	}

	fn session_set(&self, key: &str, value: Option<&str>) {
		let mut state = self.0.write();

		match value {
			Some(value) if !value.is_empty() => {
				state.session.insert(key.to_owned(), value.to_owned());
			},
			_ => {
				state.session.remove(key);
			},
		}
	}

	fn now(&self) -> OffsetDateTime {
		self.0.read().clock.unwrap_or_else(OffsetDateTime::now_utc)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn host() -> MemoryHost {
		MemoryHost::new(Url::parse("https://app.example.com/").expect("Fixture URL should parse."))
	}

	#[test]
	fn empty_writes_remove_entries() {
		let host = host();

		host.session_set("k", Some("v"));

		assert_eq!(host.session_get("k").as_deref(), Some("v"));

		host.session_set("k", Some(""));

		assert_eq!(host.session_get("k"), None);

		host.set_cookie("c", Some("v"), CookieAttributes::strict_session());

		assert_eq!(host.cookie("c").as_deref(), Some("v"));

		host.set_cookie("c", Some("v"), CookieAttributes::expired());

		assert_eq!(host.cookie("c"), None);
	}

	#[test]
	fn navigation_moves_the_page_and_is_recorded() {
		let host = host();
		let target = Url::parse("https://id.example.com/authorize?x=1").expect("URL should parse.");

		host.navigate(&target);

		assert_eq!(host.page_url(), target);
		assert_eq!(host.navigations(), vec![target]);
	}

	#[test]
	fn random_bytes_are_filled() {
		let host = host();
		let mut a = [0_u8; 32];
		let mut b = [0_u8; 32];

		host.fill_random(&mut a);
		host.fill_random(&mut b);

		assert_ne!(a, b);
	}
}
