//! Remote-JWKS verifier built on `jsonwebtoken`.

// crates.io
use jsonwebtoken::{
	Algorithm, DecodingKey, Validation, decode, decode_header,
	jwk::{Jwk, JwkSet},
};
// self
use crate::{
	_prelude::*,
	http::HttpClient,
	transport::{Headers, Transport},
	verify::{JwtVerifier, VerificationOptions, VerifyFuture},
};

const DEFAULT_LEEWAY_SECS: u64 = 60;
const SPEC_CLAIMS: &[&str] = &["exp", "nbf", "aud", "iss", "sub"];

/// Failures specific to key-set verification.
#[derive(Debug, ThisError)]
pub enum JwksError {
	/// No key in the set matches the token header.
	#[error("No JWKS key matches kid {kid:?}.")]
	NoMatchingKey {
		/// `kid` from the token header.
		kid: Option<String>,
	},
	/// The header algorithm is not accepted.
	#[error("Signing algorithm `{algorithm}` is not accepted.")]
	UnsupportedAlgorithm {
		/// Offending algorithm.
		algorithm: String,
	},
	/// The key set document could not be decoded.
	#[error("Key set document is malformed.")]
	MalformedKeySet(#[source] serde_json::Error),
}

/// [`JwtVerifier`] that fetches signing keys from the `jwks_uri` in the verification options.
///
/// Key sets are cached per URI; an unknown `kid` triggers one refetch to follow key rotation.
pub struct JwksVerifier<C>
where
	C: ?Sized + HttpClient,
{
	transport: Transport<C>,
	key_sets: Mutex<HashMap<String, Arc<JwkSet>>>,
}
impl<C> JwksVerifier<C>
where
	C: ?Sized + HttpClient,
{
	/// Creates a verifier sharing the session's HTTP client.
	pub fn new(client: Arc<C>) -> Self {
		Self { transport: Transport::new(client), key_sets: Default::default() }
	}

	async fn key_set(&self, jwks_uri: &str, refresh: bool) -> Result<Arc<JwkSet>> {
		let cached = if refresh { None } else { self.key_sets.lock().get(jwks_uri).cloned() };

		if let Some(cached) = cached {
			return Ok(cached);
		}

		let url = Url::parse(jwks_uri).map_err(|e| {
			Error::new(
				Cause::VerifyToken,
				ErrorKind::InvalidParameter { name: "jwks_uri".into(), reason: e.to_string() },
			)
		})?;
		let document = self
			.transport
			.get(&url, &ParameterMap::new(), &Headers::new())
			.await
			.map_err(|kind| Error::new(Cause::VerifyToken, kind))?;
		let key_set: JwkSet = serde_json::from_value(Value::Object(document.into_iter().collect()))
			.map_err(|e| failure(JwksError::MalformedKeySet(e)))?;
		let key_set = Arc::new(key_set);

		tracing::debug!(jwks_uri, keys = key_set.keys.len(), "Fetched JWKS.");

		self.key_sets.lock().insert(jwks_uri.to_owned(), Arc::clone(&key_set));

		Ok(key_set)
	}

	async fn decoding_key(&self, jwks_uri: &str, kid: Option<&str>) -> Result<DecodingKey> {
		for refresh in [false, true] {
			let key_set = self.key_set(jwks_uri, refresh).await?;

			if let Some(jwk) = select_key(&key_set, kid) {
				return DecodingKey::from_jwk(jwk).map_err(failure);
			}
		}

		Err(failure(JwksError::NoMatchingKey { kid: kid.map(str::to_owned) }))
	}

	async fn verify_now(&self, token: &str, options: &VerificationOptions) -> Result<ParameterMap> {
		let header = decode_header(token).map_err(failure)?;

		if !options.algorithms.is_empty() {
			let accepted = options
				.algorithms
				.iter()
				.filter_map(|name| name.parse::<Algorithm>().ok())
				.any(|algorithm| algorithm == header.alg);

			if !accepted {
				return Err(failure(JwksError::UnsupportedAlgorithm {
					algorithm: format!("{:?}", header.alg),
				}));
			}
		}
		if let Some(expected) = &options.typ {
			let found = header.typ.as_deref();

			if !found.is_some_and(|typ| typ.eq_ignore_ascii_case(expected)) {
				return Err(claim("typ", format!("expected `{expected}`, found {found:?}")));
			}
		}

		let key = self.decoding_key(&options.jwks_uri, header.kid.as_deref()).await?;
		let leeway = options
			.clock_tolerance
			.and_then(|tolerance| u64::try_from(tolerance.whole_seconds()).ok())
			.unwrap_or(DEFAULT_LEEWAY_SECS);
		let mut validation = Validation::new(header.alg);
		let mut required = vec!["exp"];

		required.extend(
			options
				.required_claims
				.iter()
				.map(String::as_str)
				.filter(|name| SPEC_CLAIMS.contains(name)),
		);

		validation.leeway = leeway;
		validation.set_issuer(&[options.issuer.as_str()]);
		validation.set_audience(&options.audience);
		validation.set_required_spec_claims(&required);
		validation.sub = options.subject.clone();

		let claims = decode::<ParameterMap>(token, &key, &validation).map_err(failure)?.claims;

		for name in &options.required_claims {
			if !claims.contains_key(name) {
				return Err(claim("required", format!("`{name}` is missing")));
			}
		}
		if let Some(max_age) = options.max_token_age {
			let issued_at = claims
				.get("iat")
				.and_then(Value::as_i64)
				.ok_or_else(|| claim("iat", "missing while max_token_age is set".into()))?;
			let age = OffsetDateTime::now_utc().unix_timestamp() - issued_at;

			if age > max_age.whole_seconds() + leeway as i64 {
				return Err(claim("iat", format!("token is {age}s old")));
			}
		}

		Ok(claims)
	}
}
impl<C> JwtVerifier for JwksVerifier<C>
where
	C: ?Sized + HttpClient,
{
	fn verify<'a>(&'a self, token: &'a str, options: &'a VerificationOptions) -> VerifyFuture<'a> {
		Box::pin(self.verify_now(token, options))
	}
}
impl<C> Debug for JwksVerifier<C>
where
	C: ?Sized + HttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwksVerifier")
			.field("cached_key_sets", &self.key_sets.lock().keys().collect::<Vec<_>>())
			.finish()
	}
}

fn select_key<'a>(key_set: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
	match kid {
		Some(kid) => key_set.find(kid),
		None if key_set.keys.len() == 1 => key_set.keys.first(),
		None => None,
	}
}

fn failure(e: impl 'static + Send + Sync + StdError) -> Error {
	Error::new(Cause::VerifyToken, ErrorKind::verifier(e))
}

fn claim(claim: &'static str, reason: String) -> Error {
	Error::new(Cause::VerifyToken, ErrorKind::ClaimValidation { claim, reason })
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn key_set(value: Value) -> JwkSet {
		serde_json::from_value(value).expect("JWKS fixture should decode.")
	}

	#[test]
	fn keys_are_selected_by_kid_or_singleton() {
		let single = key_set(json!({ "keys": [{ "kty": "oct", "kid": "a", "k": "c2VjcmV0" }] }));

		assert!(select_key(&single, Some("a")).is_some());
		assert!(select_key(&single, Some("b")).is_none());
		assert!(select_key(&single, None).is_some());

		let pair = key_set(json!({ "keys": [
			{ "kty": "oct", "kid": "a", "k": "c2VjcmV0" },
			{ "kty": "oct", "kid": "b", "k": "c2VjcmV0" }
		] }));

		assert!(select_key(&pair, None).is_none());
	}
}
