//! Strict internal configuration model.
//!
//! [`Configuration`] is the only shape the drivers ever see. It is produced by [`normalize`] from
//! an untyped external object and serializes back into that same external shape, which is what
//! the redirect codec and session storage persist.

mod normalize;

pub use normalize::*;

// self
use crate::{_prelude::*, registry::Endpoint};

/// Default suffix appended to the issuer when no discovery endpoint is configured.
pub const DEFAULT_WELL_KNOWN_SUFFIX: &str = ".well-known/openid-configuration";
/// Default request body encoding for POST endpoints.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
/// JSON request body encoding for POST endpoints.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Live OAuth 2.0 parameters that mark an in-flight or completed flow.
pub const FLOW_STATE_PARAMETERS: &[&str] =
	&["state", "nonce", "code", "access_token", "refresh_token", "id_token"];

/// Grant family driving `response_type`, PKCE, and nonce derivation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationGrant {
	/// Authorization code (with PKCE unless disabled).
	#[default]
	Code,
	/// Implicit grant: tokens in the fragment.
	Implicit,
	/// OIDC hybrid flow: a code plus front-channel tokens.
	Hybrid,
	/// No derivation; `response_type` is sent as configured.
	Free,
}
impl AuthorizationGrant {
	/// Returns the configuration value for the grant.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthorizationGrant::Code => "code",
			AuthorizationGrant::Implicit => "implicit",
			AuthorizationGrant::Hybrid => "hybrid",
			AuthorizationGrant::Free => "free",
		}
	}
}
impl FromStr for AuthorizationGrant {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"code" => Ok(Self::Code),
			"implicit" => Ok(Self::Implicit),
			"hybrid" => Ok(Self::Hybrid),
			"free" => Ok(Self::Free),
			other => Err(format!("`{other}` is not one of code, implicit, hybrid, free")),
		}
	}
}
impl Display for AuthorizationGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Scalar options. Absent options fall back to fixed defaults at read time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
	/// Grant family (default `code`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authorization_grant: Option<AuthorizationGrant>,
	/// Disables PKCE on the code grant (default `false`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub no_pkce: Option<bool>,
	/// Omits `state` when session storage is enabled (default `false`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub no_state: Option<bool>,
	/// Persists configuration and ID token claims to session storage (default `false`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub storage: Option<bool>,
	/// Suppresses navigation and history rewrites (default `false`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub test: Option<bool>,
	/// Explicit discovery document URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub discovery_endpoint: Option<String>,
	/// Path appended to the issuer to locate the discovery document.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub well_known_suffix: Option<String>,
	/// Request body encoding for POST endpoints.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content_type: Option<String>,
	/// Sends the revoked token as a bearer `Authorization` header (default `false`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bearer_revocation: Option<bool>,
	/// Sends client credentials as HTTP Basic authentication (default `false`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub basic_authentication: Option<bool>,
}
impl Options {
	/// Returns `true` when no option is set.
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}

	/// Effective grant family.
	pub fn grant(&self) -> AuthorizationGrant {
		self.authorization_grant.unwrap_or_default()
	}

	/// Whether PKCE applies to the current grant.
	pub fn pkce(&self) -> bool {
		!self.no_pkce.unwrap_or(false) && self.grant() == AuthorizationGrant::Code
	}

	/// Whether `state` is generated for authorization requests.
	pub fn state(&self) -> bool {
		!(self.no_state.unwrap_or(false) && self.storage())
	}

	/// Whether session storage persistence is enabled.
	pub fn storage(&self) -> bool {
		self.storage.unwrap_or(false)
	}

	/// Whether navigation side effects are suppressed.
	pub fn test(&self) -> bool {
		self.test.unwrap_or(false)
	}

	/// Discovery document suffix.
	pub fn well_known_suffix(&self) -> &str {
		self.well_known_suffix.as_deref().unwrap_or(DEFAULT_WELL_KNOWN_SUFFIX)
	}

	/// POST body encoding.
	pub fn content_type(&self) -> &str {
		self.content_type.as_deref().unwrap_or(FORM_CONTENT_TYPE)
	}

	/// Whether revocation sends the token as a bearer header.
	pub fn bearer_revocation(&self) -> bool {
		self.bearer_revocation.unwrap_or(false)
	}

	/// Whether client credentials travel as HTTP Basic authentication.
	pub fn basic_authentication(&self) -> bool {
		self.basic_authentication.unwrap_or(false)
	}
}

/// Normalized configuration: options, provider metadata, live parameters, and per-endpoint
/// custom parameters.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
	/// Scalar options.
	#[serde(default, skip_serializing_if = "Options::is_empty")]
	pub configuration: Options,
	/// Provider metadata (discovery document).
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub metadata: ParameterMap,
	/// Live OAuth 2.0 parameters, including secrets.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub parameters: ParameterMap,
	/// Custom discovery parameters.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub discovery: ParameterMap,
	/// Custom authorization parameters.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub authorization: ParameterMap,
	/// Custom token parameters.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub token: ParameterMap,
	/// Custom refresh parameters.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub refresh: ParameterMap,
	/// Custom verification options.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub verify_token: ParameterMap,
	/// Custom revocation parameters.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub revocation: ParameterMap,
}
impl Configuration {
	/// Custom parameters configured for `endpoint`.
	pub fn custom(&self, endpoint: Endpoint) -> &ParameterMap {
		match endpoint {
			Endpoint::Discovery => &self.discovery,
			Endpoint::Authorization => &self.authorization,
			Endpoint::Token => &self.token,
			Endpoint::Refresh => &self.refresh,
			Endpoint::Revocation => &self.revocation,
			Endpoint::VerifyToken => &self.verify_token,
		}
	}

	/// Mutable access to the custom parameters of `endpoint`.
	pub fn custom_mut(&mut self, endpoint: Endpoint) -> &mut ParameterMap {
		match endpoint {
			Endpoint::Discovery => &mut self.discovery,
			Endpoint::Authorization => &mut self.authorization,
			Endpoint::Token => &mut self.token,
			Endpoint::Refresh => &mut self.refresh,
			Endpoint::Revocation => &mut self.revocation,
			Endpoint::VerifyToken => &mut self.verify_token,
		}
	}

	/// Returns `true` when every section is empty.
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}

	/// Returns `true` when `parameters` carries flow state (state, nonce, code, or tokens).
	pub fn has_flow_state(&self) -> bool {
		FLOW_STATE_PARAMETERS.iter().any(|name| self.parameters.contains_key(*name))
	}

	/// Reads a metadata string field.
	pub fn metadata_str(&self, name: &str) -> Option<&str> {
		self.metadata.get(name).and_then(Value::as_str).filter(|value| !value.is_empty())
	}

	/// Serializes the configuration into its external shape.
	pub fn to_value(&self) -> Value {
		serde_json::to_value(self).unwrap_or_default()
	}
}
impl Debug for Configuration {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Configuration")
			.field("configuration", &self.configuration)
			.field("metadata", &self.metadata)
			.field("parameters", &self.parameters.keys().collect::<Vec<_>>())
			.field("discovery", &self.discovery)
			.field("authorization", &self.authorization)
			.field("token", &self.token.keys().collect::<Vec<_>>())
			.field("refresh", &self.refresh.keys().collect::<Vec<_>>())
			.field("verify_token", &self.verify_token)
			.field("revocation", &self.revocation.keys().collect::<Vec<_>>())
			.finish()
	}
}
