//! Static catalogue of OAuth 2.0 / OIDC wire parameters, provider metadata fields, and
//! configuration options.
//!
//! The registry answers two questions for the rest of the crate: which JSON shape a named value
//! must have ([`type_of`]) and which names an endpoint accepts ([`parameters_for`]). Parameters
//! are grouped by the document that defines them (see [`Origin`]).

mod metadata;
mod parameters;

pub use metadata::*;
pub use parameters::*;

// std
use std::sync::LazyLock;
// self
use crate::_prelude::*;

/// Expected JSON shape of a registered value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeTag {
	/// JSON string.
	String,
	/// JSON array of strings; scalars are wrapped, wire values are space-delimited.
	StringArray,
	/// Structured JSON (object/array) or a string holding JSON text.
	Json,
	/// JSON number.
	Number,
	/// JSON boolean.
	Boolean,
	/// Any value, including absent; no type check applies.
	Any,
}
impl TypeTag {
	/// Returns a label suitable for error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			TypeTag::String => "a string",
			TypeTag::StringArray => "an array of strings",
			TypeTag::Json => "JSON",
			TypeTag::Number => "a number",
			TypeTag::Boolean => "a boolean",
			TypeTag::Any => "any value",
		}
	}
}

/// OAuth 2.0 / OIDC endpoints driven by the crate.
///
/// Each endpoint doubles as a configuration section holding static custom parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
	/// OIDC discovery document.
	Discovery,
	/// Authorization endpoint (front channel).
	Authorization,
	/// Token endpoint.
	Token,
	/// Token endpoint with `grant_type=refresh_token`.
	Refresh,
	/// RFC 7009 revocation endpoint.
	Revocation,
	/// Local ID token verification.
	VerifyToken,
}
impl Endpoint {
	/// Every endpoint, in section order.
	pub const ALL: [Endpoint; 6] = [
		Endpoint::Discovery,
		Endpoint::Authorization,
		Endpoint::Token,
		Endpoint::Refresh,
		Endpoint::VerifyToken,
		Endpoint::Revocation,
	];

	/// Configuration section name holding this endpoint's custom parameters.
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::Discovery => "discovery",
			Endpoint::Authorization => "authorization",
			Endpoint::Token => "token",
			Endpoint::Refresh => "refresh",
			Endpoint::Revocation => "revocation",
			Endpoint::VerifyToken => "verify_token",
		}
	}

	/// Looks an endpoint up by its section name.
	pub fn from_section(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|endpoint| endpoint.as_str() == name)
	}

	/// Error origin tag for this endpoint.
	pub const fn cause(self) -> Cause {
		match self {
			Endpoint::Discovery => Cause::Discovery,
			Endpoint::Authorization => Cause::Authorization,
			Endpoint::Token => Cause::Token,
			Endpoint::Refresh => Cause::Refresh,
			Endpoint::Revocation => Cause::Revocation,
			Endpoint::VerifyToken => Cause::VerifyToken,
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Document that defines a registered parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
	/// RFC 6749, the OAuth 2.0 framework.
	Rfc6749,
	/// RFC 7009, token revocation.
	Rfc7009,
	/// RFC 7521/7523, assertion frameworks and JWT client authentication.
	Rfc7523,
	/// RFC 7636, PKCE.
	Rfc7636,
	/// RFC 8628, device authorization grant.
	Rfc8628,
	/// RFC 8693, token exchange.
	Rfc8693,
	/// RFC 8707, resource indicators.
	Rfc8707,
	/// RFC 9101 / RFC 9126, JAR and PAR.
	Rfc9126,
	/// RFC 9207, issuer identification.
	Rfc9207,
	/// RFC 9396, rich authorization requests.
	Rfc9396,
	/// RFC 9449, DPoP.
	Rfc9449,
	/// OpenID Connect Core, Session, and RP-initiated logout.
	OidcCore,
	/// OpenID Connect CIBA.
	OidcCiba,
	/// Provider-specific extensions in wide use.
	Vendor,
	/// ID token verification options consumed by the JWT verifier.
	Verification,
}

/// Registered parameter entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParameterSpec {
	/// Wire name.
	pub name: &'static str,
	/// Expected JSON shape.
	pub tag: TypeTag,
	/// Defining document.
	pub origin: Origin,
}

static CATALOGUE: LazyLock<HashMap<&'static str, ParameterSpec>> = LazyLock::new(|| {
	PARAMETER_GROUPS
		.iter()
		.flat_map(|group| group.iter())
		.map(|param| (param.name, *param))
		.collect()
});

/// Returns the type tag of a registered parameter, or `None` for unknown names.
pub fn type_of(name: &str) -> Option<TypeTag> {
	CATALOGUE.get(name).map(|param| param.tag)
}

/// Returns the full registry entry of a parameter.
pub fn parameter(name: &str) -> Option<&'static ParameterSpec> {
	CATALOGUE.get(name)
}

/// Iterates over every registered parameter.
pub fn parameters() -> impl Iterator<Item = &'static ParameterSpec> {
	PARAMETER_GROUPS.iter().flat_map(|group| group.iter())
}

/// Ordered set of parameter names accepted by `endpoint`.
pub fn parameters_for(endpoint: Endpoint) -> &'static [&'static str] {
	match endpoint {
		Endpoint::Discovery => DISCOVERY_PARAMETERS,
		Endpoint::Authorization => AUTHORIZATION_PARAMETERS,
		Endpoint::Token => TOKEN_PARAMETERS,
		Endpoint::Refresh => REFRESH_PARAMETERS,
		Endpoint::Revocation => REVOCATION_PARAMETERS,
		Endpoint::VerifyToken => VERIFY_TOKEN_PARAMETERS,
	}
}

/// Returns whether `endpoint` accepts the parameter `name`.
pub fn accepts(endpoint: Endpoint, name: &str) -> bool {
	parameters_for(endpoint).contains(&name)
}
