// self
use crate::registry::TypeTag;

/// Provider metadata fields from RFC 8414, OIDC Discovery, and their registered extensions.
pub const METADATA_FIELDS: &[&str] = &[
	"issuer",
	"authorization_endpoint",
	"token_endpoint",
	"userinfo_endpoint",
	"jwks_uri",
	"registration_endpoint",
	"scopes_supported",
	"response_types_supported",
	"response_modes_supported",
	"grant_types_supported",
	"acr_values_supported",
	"subject_types_supported",
	"id_token_signing_alg_values_supported",
	"id_token_encryption_alg_values_supported",
	"id_token_encryption_enc_values_supported",
	"userinfo_signing_alg_values_supported",
	"userinfo_encryption_alg_values_supported",
	"userinfo_encryption_enc_values_supported",
	"request_object_signing_alg_values_supported",
	"request_object_encryption_alg_values_supported",
	"request_object_encryption_enc_values_supported",
	"token_endpoint_auth_methods_supported",
	"token_endpoint_auth_signing_alg_values_supported",
	"display_values_supported",
	"claim_types_supported",
	"claims_supported",
	"service_documentation",
	"claims_locales_supported",
	"ui_locales_supported",
	"claims_parameter_supported",
	"request_parameter_supported",
	"request_uri_parameter_supported",
	"require_request_uri_registration",
	"op_policy_uri",
	"op_tos_uri",
	"revocation_endpoint",
	"revocation_endpoint_auth_methods_supported",
	"revocation_endpoint_auth_signing_alg_values_supported",
	"introspection_endpoint",
	"introspection_endpoint_auth_methods_supported",
	"introspection_endpoint_auth_signing_alg_values_supported",
	"code_challenge_methods_supported",
	"signed_metadata",
	"device_authorization_endpoint",
	"tls_client_certificate_bound_access_tokens",
	"mtls_endpoint_aliases",
	"pushed_authorization_request_endpoint",
	"require_pushed_authorization_requests",
	"authorization_response_iss_parameter_supported",
	"end_session_endpoint",
	"check_session_iframe",
	"frontchannel_logout_supported",
	"frontchannel_logout_session_supported",
	"backchannel_logout_supported",
	"backchannel_logout_session_supported",
	"backchannel_authentication_endpoint",
	"backchannel_token_delivery_modes_supported",
	"backchannel_authentication_request_signing_alg_values_supported",
	"backchannel_user_code_parameter_supported",
	"dpop_signing_alg_values_supported",
	"authorization_details_types_supported",
];

/// Scalar configuration options and their expected types.
pub const OPTIONS: &[(&str, TypeTag)] = &[
	("authorization_grant", TypeTag::String),
	("no_pkce", TypeTag::Boolean),
	("no_state", TypeTag::Boolean),
	("storage", TypeTag::Boolean),
	("test", TypeTag::Boolean),
	("discovery_endpoint", TypeTag::String),
	("well_known_suffix", TypeTag::String),
	("content_type", TypeTag::String),
	("bearer_revocation", TypeTag::Boolean),
	("basic_authentication", TypeTag::Boolean),
];

/// Returns whether `name` is a registered provider metadata field.
pub fn is_metadata_field(name: &str) -> bool {
	METADATA_FIELDS.contains(&name)
}

/// Returns the expected type of a configuration option, or `None` for unknown options.
pub fn option_type(name: &str) -> Option<TypeTag> {
	OPTIONS.iter().find(|(option, _)| *option == name).map(|(_, tag)| *tag)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn metadata_and_options_lookups() {
		assert!(is_metadata_field("jwks_uri"));
		assert!(is_metadata_field("end_session_endpoint"));
		assert!(!is_metadata_field("x_vendor_flag"));
		assert_eq!(option_type("no_pkce"), Some(TypeTag::Boolean));
		assert_eq!(option_type("authorization_grant"), Some(TypeTag::String));
		assert_eq!(option_type("unknown"), None);
	}
}
