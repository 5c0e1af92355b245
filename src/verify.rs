//! ID token verification seam.
//!
//! The verify-token driver assembles [`VerificationOptions`] and hands the compact JWT to a
//! [`JwtVerifier`]. With the `jwt` feature, [`JwksVerifier`] checks signatures against the
//! provider's remote key set.

#[cfg(feature = "jwt")] pub mod jwks;
#[cfg(feature = "jwt")] pub use jwks::JwksVerifier;

// self
use crate::{_prelude::*, resolve};

/// Boxed future returned by [`JwtVerifier::verify`].
pub type VerifyFuture<'a> = Pin<Box<dyn Future<Output = Result<ParameterMap>> + 'a + Send>>;

/// Signature and claims verifier for ID tokens.
pub trait JwtVerifier
where
	Self: Send + Sync,
{
	/// Verifies `token` and returns its claims.
	fn verify<'a>(&'a self, token: &'a str, options: &'a VerificationOptions) -> VerifyFuture<'a>;
}

/// Inputs injected into every verification.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VerificationOptions {
	/// Expected `iss`.
	pub issuer: String,
	/// Accepted `aud` values.
	pub audience: Vec<String>,
	/// Remote key set location.
	pub jwks_uri: String,
	/// Expected `nonce`, when one was issued.
	pub nonce: Option<String>,
	/// Accepted signing algorithms; empty accepts the header's algorithm.
	pub algorithms: Vec<String>,
	/// Leeway applied to time-based claims.
	pub clock_tolerance: Option<Duration>,
	/// Maximum age of `iat`.
	pub max_token_age: Option<Duration>,
	/// Expected `sub`.
	pub subject: Option<String>,
	/// Expected `typ` header.
	pub typ: Option<String>,
	/// Claims that must be present.
	pub required_claims: Vec<String>,
}
impl VerificationOptions {
	/// Fills the optional fields from a resolved verify-token payload.
	pub fn with_parameters(mut self, params: &ParameterMap) -> Self {
		let seconds = |name: &str| params.get(name).and_then(Value::as_i64).map(Duration::seconds);

		self.algorithms = resolve::strings(params, "algorithms");
		self.clock_tolerance = seconds("clock_tolerance");
		self.max_token_age = seconds("max_token_age");
		self.subject = resolve::string(params, "subject").map(str::to_owned);
		self.typ = resolve::string(params, "typ").map(str::to_owned);
		self.required_claims = resolve::strings(params, "required_claims");

		self
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn optional_fields_come_from_parameters() {
		let params: ParameterMap = serde_json::from_value(json!({
			"algorithms": ["RS256", "ES256"],
			"clock_tolerance": 30,
			"max_token_age": 600,
			"typ": "JWT",
			"required_claims": ["sub", "auth_time"]
		}))
		.expect("Fixture should be an object.");
		let options = VerificationOptions::default().with_parameters(&params);

		assert_eq!(options.algorithms, vec!["RS256", "ES256"]);
		assert_eq!(options.clock_tolerance, Some(Duration::seconds(30)));
		assert_eq!(options.max_token_age, Some(Duration::minutes(10)));
		assert_eq!(options.typ.as_deref(), Some("JWT"));
		assert_eq!(options.subject, None);
		assert_eq!(options.required_claims, vec!["sub", "auth_time"]);
	}
}
