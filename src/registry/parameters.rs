// self
use crate::registry::{
	Origin::{self, *},
	ParameterSpec,
	TypeTag::{self, *},
};

const fn p(name: &'static str, tag: TypeTag, origin: Origin) -> ParameterSpec {
	ParameterSpec { name, tag, origin }
}

/// RFC 6749 request and response parameters.
pub const RFC6749_PARAMETERS: &[ParameterSpec] = &[
	p("client_id", String, Rfc6749),
	p("client_secret", String, Rfc6749),
	p("response_type", StringArray, Rfc6749),
	p("redirect_uri", String, Rfc6749),
	p("scope", StringArray, Rfc6749),
	p("state", String, Rfc6749),
	p("code", String, Rfc6749),
	p("error", String, Rfc6749),
	p("error_description", String, Rfc6749),
	p("error_uri", String, Rfc6749),
	p("grant_type", String, Rfc6749),
	p("access_token", String, Rfc6749),
	p("token_type", String, Rfc6749),
	p("expires_in", Number, Rfc6749),
	p("refresh_token", String, Rfc6749),
	p("username", String, Rfc6749),
	p("password", String, Rfc6749),
];

/// Token revocation, assertion, and PKCE parameters.
pub const CLIENT_EXTENSION_PARAMETERS: &[ParameterSpec] = &[
	p("token", String, Rfc7009),
	p("token_type_hint", String, Rfc7009),
	p("assertion", String, Rfc7523),
	p("client_assertion", String, Rfc7523),
	p("client_assertion_type", String, Rfc7523),
	p("code_verifier", String, Rfc7636),
	p("code_challenge", String, Rfc7636),
	p("code_challenge_method", String, Rfc7636),
];

/// Device grant, token exchange, resource indicator, PAR/JAR, issuer, RAR, and DPoP parameters.
pub const GRANT_EXTENSION_PARAMETERS: &[ParameterSpec] = &[
	p("device_code", String, Rfc8628),
	p("user_code", String, Rfc8628),
	p("verification_uri", String, Rfc8628),
	p("verification_uri_complete", String, Rfc8628),
	p("interval", Number, Rfc8628),
	p("requested_token_type", String, Rfc8693),
	p("subject_token", String, Rfc8693),
	p("subject_token_type", String, Rfc8693),
	p("actor_token", String, Rfc8693),
	p("actor_token_type", String, Rfc8693),
	p("issued_token_type", String, Rfc8693),
	p("audience", StringArray, Rfc8693),
	p("resource", StringArray, Rfc8707),
	p("request", Any, Rfc9126),
	p("request_uri", String, Rfc9126),
	p("iss", String, Rfc9207),
	p("authorization_details", Json, Rfc9396),
	p("dpop_jkt", String, Rfc9449),
];

/// OpenID Connect Core, Session Management, logout, JARM, and CIBA parameters.
pub const OIDC_PARAMETERS: &[ParameterSpec] = &[
	p("nonce", String, OidcCore),
	p("response_mode", String, OidcCore),
	p("display", String, OidcCore),
	p("prompt", StringArray, OidcCore),
	p("max_age", Number, OidcCore),
	p("ui_locales", StringArray, OidcCore),
	p("claims_locales", StringArray, OidcCore),
	p("id_token_hint", String, OidcCore),
	p("login_hint", String, OidcCore),
	p("acr_values", StringArray, OidcCore),
	p("claims", Json, OidcCore),
	p("registration", Json, OidcCore),
	p("id_token", String, OidcCore),
	p("session_state", String, OidcCore),
	p("post_logout_redirect_uri", String, OidcCore),
	p("logout_hint", String, OidcCore),
	p("sid", String, OidcCore),
	p("response", String, OidcCore),
	p("device_secret", String, OidcCore),
	p("login_hint_token", String, OidcCiba),
	p("binding_message", String, OidcCiba),
	p("client_notification_token", String, OidcCiba),
	p("auth_req_id", String, OidcCiba),
	p("requested_expiry", Number, OidcCiba),
];

/// Widely deployed provider-specific parameters (Google, Microsoft, Auth0, Keycloak, GitHub).
pub const VENDOR_PARAMETERS: &[ParameterSpec] = &[
	p("access_type", String, Vendor),
	p("approval_prompt", String, Vendor),
	p("include_granted_scopes", Boolean, Vendor),
	p("hd", String, Vendor),
	p("domain_hint", String, Vendor),
	p("tenant", String, Vendor),
	p("organization", String, Vendor),
	p("invitation", String, Vendor),
	p("connection", String, Vendor),
	p("screen_hint", String, Vendor),
	p("kc_idp_hint", String, Vendor),
	p("kc_action", String, Vendor),
	p("kc_locale", String, Vendor),
	p("appid", String, Vendor),
	p("p", String, Vendor),
	p("refresh_expires_in", Number, Vendor),
	p("ext_expires_in", Number, Vendor),
	p("refresh_token_expires_in", Number, Vendor),
];

/// Options forwarded to the JWT verifier by the verify-token driver.
pub const VERIFICATION_PARAMETERS: &[ParameterSpec] = &[
	p("issuer", String, Verification),
	p("jwks_uri", String, Verification),
	p("algorithms", StringArray, Verification),
	p("clock_tolerance", Number, Verification),
	p("max_token_age", Number, Verification),
	p("subject", String, Verification),
	p("typ", String, Verification),
	p("required_claims", StringArray, Verification),
];

pub(super) const PARAMETER_GROUPS: &[&[ParameterSpec]] = &[
	RFC6749_PARAMETERS,
	CLIENT_EXTENSION_PARAMETERS,
	GRANT_EXTENSION_PARAMETERS,
	OIDC_PARAMETERS,
	VENDOR_PARAMETERS,
	VERIFICATION_PARAMETERS,
];

/// Query parameters sent to the discovery endpoint: the Entra ID application id used to select
/// app-specific signing keys, and the Azure AD B2C user-flow policy.
pub const DISCOVERY_PARAMETERS: &[&str] = &["appid", "p"];

/// Parameters sent on the authorization redirect.
pub const AUTHORIZATION_PARAMETERS: &[&str] = &[
	"response_type",
	"client_id",
	"redirect_uri",
	"scope",
	"state",
	"nonce",
	"code_challenge",
	"code_challenge_method",
	"code_verifier",
	"response_mode",
	"display",
	"prompt",
	"max_age",
	"ui_locales",
	"claims_locales",
	"id_token_hint",
	"login_hint",
	"acr_values",
	"claims",
	"registration",
	"request",
	"request_uri",
	"resource",
	"audience",
	"authorization_details",
	"dpop_jkt",
	"access_type",
	"approval_prompt",
	"include_granted_scopes",
	"hd",
	"domain_hint",
	"organization",
	"invitation",
	"connection",
	"screen_hint",
	"kc_idp_hint",
	"kc_action",
	"kc_locale",
];

/// Parameters posted to the token endpoint.
pub const TOKEN_PARAMETERS: &[&str] = &[
	"grant_type",
	"code",
	"redirect_uri",
	"client_id",
	"client_secret",
	"code_verifier",
	"refresh_token",
	"scope",
	"username",
	"password",
	"assertion",
	"client_assertion",
	"client_assertion_type",
	"device_code",
	"device_secret",
	"auth_req_id",
	"resource",
	"audience",
	"authorization_details",
	"requested_token_type",
	"subject_token",
	"subject_token_type",
	"actor_token",
	"actor_token_type",
];

/// Parameters posted to the token endpoint for a refresh.
pub const REFRESH_PARAMETERS: &[&str] = &[
	"grant_type",
	"refresh_token",
	"redirect_uri",
	"client_id",
	"client_secret",
	"scope",
	"resource",
	"audience",
	"authorization_details",
	"client_assertion",
	"client_assertion_type",
];

/// Parameters posted to the revocation endpoint.
pub const REVOCATION_PARAMETERS: &[&str] = &[
	"token",
	"token_type_hint",
	"client_id",
	"client_secret",
	"client_assertion",
	"client_assertion_type",
];

/// Inputs of ID token verification.
pub const VERIFY_TOKEN_PARAMETERS: &[&str] = &[
	"id_token",
	"nonce",
	"client_id",
	"issuer",
	"audience",
	"jwks_uri",
	"algorithms",
	"clock_tolerance",
	"max_token_age",
	"subject",
	"typ",
	"required_claims",
];
