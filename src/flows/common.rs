//! Shared driver plumbing: requests, deltas, endpoint lookup, and random values.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	config::{Configuration, Options},
	host::Host,
	resolve,
	transport::{self, Headers},
};

const RANDOM_BYTES: usize = 32;

/// Per-call driver input: an optional explicit endpoint URL and inline parameter overrides.
///
/// An inline `null` deletes an otherwise configured parameter.
#[derive(Clone, Debug, Default)]
pub struct DriverRequest {
	/// Explicit endpoint URL; wins over configured metadata.
	pub url: Option<Url>,
	/// Inline parameter overrides.
	pub parameters: ParameterMap,
}
impl DriverRequest {
	/// Creates an empty request.
	pub fn new() -> Self {
		Self::default()
	}

	/// Targets an explicit endpoint URL.
	pub fn with_url(mut self, url: Url) -> Self {
		self.url = Some(url);

		self
	}

	/// Adds or replaces an inline parameter.
	pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.parameters.insert(name.into().to_ascii_lowercase(), value.into());

		self
	}

	/// Deletes a configured parameter for this call.
	pub fn without_parameter(self, name: impl Into<String>) -> Self {
		self.with_parameter(name, Value::Null)
	}
}

/// Changes a driver asks the session to apply.
#[derive(Clone, Debug, Default)]
pub struct Delta {
	/// Parameters merged with the wire-aware update; `null` deletes.
	pub parameters: ParameterMap,
	/// Replacement provider metadata.
	pub metadata: Option<ParameterMap>,
	/// Replacement ID token claims.
	pub id_token: Option<ParameterMap>,
	/// Replacement pending flow record.
	pub pending: Option<crate::flows::PendingFlow>,
}

/// Resolves an endpoint URL: explicit override first, then the metadata field.
pub(crate) fn endpoint_url(
	explicit: Option<&Url>,
	config: &Configuration,
	field: &str,
	endpoint: &'static str,
) -> Result<Url, ErrorKind> {
	if let Some(url) = explicit {
		return Ok(url.clone());
	}

	let raw = config.metadata_str(field).ok_or(ErrorKind::MissingEndpoint { endpoint })?;

	Url::parse(raw)
		.map_err(|e| ErrorKind::InvalidParameter { name: field.to_owned(), reason: e.to_string() })
}

/// Moves client credentials into an HTTP Basic header when `basic_authentication` is on.
///
/// The secret is removed from `payload`; `client_id` stays in the body.
pub(crate) fn client_authentication(options: &Options, payload: &mut ParameterMap) -> Headers {
	let mut headers = Headers::new();

	if !options.basic_authentication() {
		return headers;
	}

	let secret = payload.remove("client_secret");
	let Some(client_id) = resolve::string(payload, "client_id") else {
		tracing::warn!("Basic authentication requested without a client_id.");

		return headers;
	};
	let secret = secret.as_ref().and_then(Value::as_str).unwrap_or_default();

	headers.insert("authorization".into(), transport::basic(client_id, secret));

	headers
}

/// Joins `base` and `path`, defaulting the scheme when `base` carries none.
pub fn mount_url(base: &str, scheme: &str, path: &str) -> Result<Url, url::ParseError> {
	let base = base.trim().trim_end_matches('/');
	let joined = format!("{base}/{}", path.trim_start_matches('/'));

	if base.contains("://") {
		Url::parse(&joined)
	} else {
		Url::parse(&format!("{scheme}://{joined}"))
	}
}

/// Returns 32 secure random bytes, base64url-encoded without padding (43 characters).
pub(crate) fn random_token(host: &dyn Host) -> String {
	let mut bytes = [0_u8; RANDOM_BYTES];

	host.fill_random(&mut bytes);

	URL_SAFE_NO_PAD.encode(bytes)
}

/// Derives a PKCE challenge for `verifier` under `method` (`S256` or `plain`).
pub fn pkce_challenge(verifier: &str, method: &str) -> String {
	if method == "plain" {
		return verifier.to_owned();
	}

	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Milliseconds since the Unix epoch.
pub(crate) fn epoch_millis(at: OffsetDateTime) -> i64 {
	(at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Rewrites a relative `expires_in` (seconds) into an absolute epoch-millisecond timestamp.
///
/// Numeric strings are accepted since redirect-carried values arrive untyped.
pub(crate) fn absolute_expiry(parameters: &mut ParameterMap, now: OffsetDateTime) {
	let seconds = match parameters.get("expires_in") {
		Some(Value::Number(seconds)) => seconds.as_f64(),
		Some(Value::String(seconds)) => seconds.trim().parse::<f64>().ok(),
		_ => None,
	};

	if let Some(seconds) = seconds {
		let expires_at = epoch_millis(now) + (seconds * 1_000.0) as i64;

		parameters.insert("expires_in".into(), Value::from(expires_at));
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn mount_url_adds_scheme_and_single_slash() {
		let url = mount_url("id.example.com/realm/", "https", ".well-known/openid-configuration")
			.expect("Mounted URL should parse.");

		assert_eq!(url.as_str(), "https://id.example.com/realm/.well-known/openid-configuration");

		let url = mount_url("http://localhost:8080", "https", "/.well-known/x")
			.expect("Mounted URL should parse.");

		assert_eq!(url.as_str(), "http://localhost:8080/.well-known/x");
	}

	#[test]
	fn pkce_challenge_matches_rfc7636_vector() {
		let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

		assert_eq!(pkce_challenge(verifier, "S256"), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
		assert_eq!(pkce_challenge(verifier, "plain"), verifier);
	}

	#[test]
	fn basic_authentication_moves_the_secret_into_a_header() {
		let options = Options { basic_authentication: Some(true), ..Default::default() };
		let mut payload: ParameterMap = [
			("client_id".to_owned(), Value::from("app")),
			("client_secret".to_owned(), Value::from("s3cret")),
		]
		.into_iter()
		.collect();
		let headers = client_authentication(&options, &mut payload);

		assert_eq!(
			headers.get("authorization").map(String::as_str),
			Some("Basic YXBwOnMzY3JldA==")
		);
		assert!(!payload.contains_key("client_secret"));
		assert!(payload.contains_key("client_id"));
		assert!(client_authentication(&Options::default(), &mut payload).is_empty());
	}

	#[test]
	fn epoch_millis_truncates_nanos() {
		let at = OffsetDateTime::from_unix_timestamp_nanos(1_700_000_000_123_456_789)
			.expect("Timestamp should be valid.");

		assert_eq!(epoch_millis(at), 1_700_000_000_123);
	}

	#[test]
	fn relative_expiry_becomes_absolute() {
		let now =
			OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("Timestamp should be valid.");
		let mut parameters: ParameterMap =
			[("expires_in".to_owned(), Value::from("3600"))].into_iter().collect();

		absolute_expiry(&mut parameters, now);

		assert_eq!(parameters.get("expires_in"), Some(&Value::from(1_700_003_600_000_i64)));

		let mut parameters: ParameterMap =
			[("expires_in".to_owned(), Value::from(60))].into_iter().collect();

		absolute_expiry(&mut parameters, now);

		assert_eq!(parameters.get("expires_in"), Some(&Value::from(1_700_000_060_000_i64)));

		let mut untouched = ParameterMap::new();

		absolute_expiry(&mut untouched, now);

		assert!(untouched.is_empty());
	}
}
