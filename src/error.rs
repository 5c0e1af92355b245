//! Crate-wide error types tagged with the driver that raised them.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Stable origin tag attached to every [`Error`].
///
/// Callers branch on the cause to decide whether a failure came from discovery, the token
/// endpoint, the redirect interceptor, and so on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
	/// Configuration normalization.
	Configuration,
	/// OIDC discovery driver.
	Discovery,
	/// Authorization redirect driver.
	Authorization,
	/// Token endpoint driver.
	Token,
	/// Refresh driver (token endpoint with `grant_type=refresh_token`).
	Refresh,
	/// Revocation driver.
	Revocation,
	/// ID token verification driver.
	VerifyToken,
	/// Redirect response interceptor.
	Response,
	/// Sealing state before a redirect.
	SaveState,
	/// Restoring state after a redirect.
	RecoverState,
	/// Route guard.
	Guard,
	/// Session storage persistence.
	Storage,
}
impl Cause {
	/// Returns the snake-case label used in logs, spans, and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Cause::Configuration => "configuration",
			Cause::Discovery => "discovery",
			Cause::Authorization => "authorization",
			Cause::Token => "token",
			Cause::Refresh => "refresh",
			Cause::Revocation => "revocation",
			Cause::VerifyToken => "verify_token",
			Cause::Response => "response",
			Cause::SaveState => "save_state",
			Cause::RecoverState => "recover_state",
			Cause::Guard => "guard",
			Cause::Storage => "storage",
		}
	}
}
impl Display for Cause {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
#[error("[{cause}] {kind}")]
pub struct Error {
	cause: Cause,
	#[source]
	kind: ErrorKind,
}
impl Error {
	/// Creates an error for the provided origin.
	pub fn new(cause: Cause, kind: impl Into<ErrorKind>) -> Self {
		Self { cause, kind: kind.into() }
	}

	/// Origin tag of the failure.
	pub fn cause(&self) -> Cause {
		self.cause
	}

	/// Failure classification.
	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	/// Consumes the error, returning its classification.
	pub fn into_kind(self) -> ErrorKind {
		self.kind
	}

	/// Re-tags the error with a new origin, keeping the classification.
	pub fn with_cause(mut self, cause: Cause) -> Self {
		self.cause = cause;

		self
	}
}

/// Failure classification shared by every driver.
#[derive(Debug, ThisError)]
pub enum ErrorKind {
	/// Unknown section/option or malformed section.
	#[error(transparent)]
	ConfigValidation(#[from] ConfigError),
	/// A parameter value does not match its registered type.
	#[error("Parameter `{name}` must be {expected}, found {found}.")]
	ParameterType {
		/// Parameter name.
		name: String,
		/// Expected type label.
		expected: &'static str,
		/// Observed JSON type label.
		found: &'static str,
	},
	/// A parameter value is well-typed but not acceptable.
	#[error("Parameter `{name}` is invalid: {reason}.")]
	InvalidParameter {
		/// Parameter name.
		name: String,
		/// Human-readable reason.
		reason: String,
	},
	/// No URL could be derived for the endpoint.
	#[error("No {endpoint} endpoint is configured.")]
	MissingEndpoint {
		/// Endpoint label.
		endpoint: &'static str,
	},
	/// Token request resolved without a `grant_type`.
	#[error("The token request is missing a grant_type.")]
	MissingGrant,
	/// Revocation could not resolve a token.
	#[error("No {token} is available.")]
	MissingToken {
		/// Which token was looked up.
		token: String,
	},
	/// ID token verification lacks a required input.
	#[error("Token verification requires `{field}`.")]
	MissingVerificationInput {
		/// Missing option name.
		field: &'static str,
	},
	/// The redirect carried a `state` different from the one issued.
	#[error("Illegal state: expected {expected:?}, received {received:?}.")]
	StateMismatch {
		/// State issued before the redirect.
		expected: String,
		/// State carried back by the redirect, if any.
		received: Option<String>,
	},
	/// The provider answered with an OAuth 2.0 error payload.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// A verified claim failed an additional check.
	#[error("Claim `{claim}` is invalid: {reason}.")]
	ClaimValidation {
		/// Claim name.
		claim: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// HTTP transport failure.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// JWT verifier failure, passed through untouched.
	#[error("ID token verification failed.")]
	Verifier(#[source] BoxError),
	/// Sealing or unsealing redirect state failed.
	#[error(transparent)]
	StateCodec(#[from] CodecError),
	/// A persisted session entry could not be encoded or decoded.
	#[error("Persisted session entry `{key}` is unreadable.")]
	Storage {
		/// Storage key, without the namespace prefix.
		key: &'static str,
		/// Underlying JSON failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ErrorKind {
	/// Wraps a verifier failure.
	pub fn verifier(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Verifier(Box::new(src))
	}
}

/// Configuration validation failures raised by the normalizer.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// Top-level configuration is not an object.
	#[error("Configuration must be an object.")]
	NotAnObject,
	/// Section name outside the fixed set.
	#[error("Unknown configuration section `{section}`.")]
	UnknownSection {
		/// Offending section name.
		section: String,
	},
	/// Section present but not an object.
	#[error("Configuration section `{section}` must be an object.")]
	SectionType {
		/// Offending section name.
		section: String,
	},
	/// Option name outside the fixed option list.
	#[error("Unknown configuration option `{option}`.")]
	UnknownOption {
		/// Offending option name.
		option: String,
	},
	/// Option present with the wrong type or an unsupported value.
	#[error("Configuration option `{option}` is invalid: {reason}.")]
	InvalidOption {
		/// Offending option name.
		option: String,
		/// Human-readable reason.
		reason: String,
	},
	/// Custom-parameter section holds a name the endpoint does not accept.
	#[error("Parameter `{parameter}` is not accepted by the {section} endpoint.")]
	UnknownParameter {
		/// Custom-parameter section.
		section: String,
		/// Offending parameter name.
		parameter: String,
	},
}

/// OAuth 2.0 error payload echoed by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("Provider returned `{error}`{}.", .error_description.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
pub struct ProviderError {
	/// OAuth 2.0 `error` code.
	pub error: String,
	/// Optional `error_description`.
	pub error_description: Option<String>,
	/// Optional `error_uri`.
	pub error_uri: Option<String>,
	/// HTTP status, when the error arrived over HTTP.
	pub status: Option<u16>,
}
impl ProviderError {
	/// Extracts an error payload from a decoded parameter map, if it carries an `error` field.
	pub fn from_parameters(params: &ParameterMap, status: Option<u16>) -> Option<Self> {
		let error = params.get("error")?;
		let text = |name: &str| params.get(name).and_then(Value::as_str).map(str::to_owned);

		Some(Self {
			error: error.as_str().map(str::to_owned).unwrap_or_else(|| error.to_string()),
			error_description: text("error_description"),
			error_uri: text("error_uri"),
			status,
		})
	}
}

/// Transport-level failures (network, IO, undecodable bodies).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
	/// HTTP request construction failed.
	#[error(transparent)]
	Request(#[from] oauth2::http::Error),
	/// Provider answered with a non-success status and no OAuth error payload.
	#[error("Provider responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Retry-After hint, when supplied.
		retry_after: Option<Duration>,
		/// Leading part of the response body.
		body: String,
	},
	/// Response body is not a JSON object.
	#[error("Provider returned a malformed JSON body.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Transport reported an error without further detail.
	#[error("HTTP client error: {message}.")]
	Other {
		/// Transport-provided message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures while sealing or unsealing redirect state.
#[derive(Debug, ThisError)]
pub enum CodecError {
	/// State could not be serialized or deserialized.
	#[error("Redirect state could not be (de)serialized.")]
	Serialization(#[from] serde_json::Error),
	/// Stored ciphertext or cookie is not valid hex.
	#[error("Redirect state is not valid hex.")]
	Encoding(#[from] hex::FromHexError),
	/// AEAD encryption or decryption failed (wrong key or tampered ciphertext).
	#[error("Redirect state could not be {operation}.")]
	Cipher {
		/// `encrypted` or `decrypted`.
		operation: &'static str,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn error_display_carries_cause_tag() {
		let err = Error::new(Cause::Revocation, ErrorKind::MissingToken { token: "token".into() });

		assert_eq!(err.cause(), Cause::Revocation);
		assert_eq!(err.to_string(), "[revocation] No token is available.");
	}

	#[test]
	fn provider_error_reads_parameter_map() {
		let mut params = ParameterMap::new();

		params.insert("error".into(), Value::from("access_denied"));
		params.insert("error_description".into(), Value::from("user cancelled"));

		let err = ProviderError::from_parameters(&params, Some(400))
			.expect("Error payload should be detected.");

		assert_eq!(err.error, "access_denied");
		assert_eq!(err.error_description.as_deref(), Some("user cancelled"));
		assert_eq!(err.status, Some(400));
		assert_eq!(err.to_string(), "Provider returned `access_denied`: user cancelled.");
		assert!(ProviderError::from_parameters(&ParameterMap::new(), None).is_none());
	}

	#[test]
	fn with_cause_retags_errors() {
		let err = Error::new(Cause::Token, ErrorKind::MissingGrant).with_cause(Cause::Refresh);

		assert_eq!(err.cause(), Cause::Refresh);
		assert!(matches!(err.kind(), ErrorKind::MissingGrant));
	}
}
