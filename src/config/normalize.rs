// self
use crate::{
	_prelude::*,
	config::{Configuration, Options},
	error::ConfigError,
	registry::{self, Endpoint, TypeTag},
	resolve,
};

/// Fixed top-level section names.
pub const SECTIONS: &[&str] = &[
	"configuration",
	"metadata",
	"parameters",
	"discovery",
	"authorization",
	"token",
	"refresh",
	"verify_token",
	"revocation",
];

/// Converts an untyped external configuration into a [`Configuration`].
///
/// Section and field names are lower-cased. Unknown sections, options, or custom parameters are
/// fatal; unknown metadata fields are logged and kept. When the input is non-empty and carries
/// no `redirect_uri`, the parameter defaults to `page` without its query and fragment. An empty
/// (or `null`) input yields an empty configuration with nothing injected.
pub fn normalize(input: &Value, page: Option<&Url>) -> Result<Configuration> {
	let fail = |e: ConfigError| Error::new(Cause::Configuration, e);
	let sections = match input {
		Value::Null => return Ok(Configuration::default()),
		Value::Object(sections) => sections,
		_ => return Err(fail(ConfigError::NotAnObject)),
	};

	if sections.is_empty() {
		return Ok(Configuration::default());
	}

	let mut config = Configuration::default();

	for (raw_name, raw_section) in sections {
		let name = raw_name.to_ascii_lowercase();

		if !SECTIONS.contains(&name.as_str()) {
			return Err(fail(ConfigError::UnknownSection { section: name }));
		}

		let Value::Object(fields) = raw_section else {
			return Err(fail(ConfigError::SectionType { section: name }));
		};
		let fields: ParameterMap =
			fields.iter().map(|(key, value)| (key.to_ascii_lowercase(), value.clone())).collect();

		match name.as_str() {
			"configuration" => config.configuration = normalize_options(fields).map_err(fail)?,
			"metadata" => config.metadata = normalize_metadata(fields),
			"parameters" =>
				config.parameters = resolve::normalize_types(fields, Cause::Configuration)?,
			section => {
				let Some(endpoint) = Endpoint::from_section(section) else {
					return Err(fail(ConfigError::UnknownSection { section: name }));
				};

				*config.custom_mut(endpoint) = normalize_custom(endpoint, fields)?;
			},
		}
	}

	if let Some(page) = page {
		config
			.parameters
			.entry("redirect_uri".into())
			.or_insert_with(|| Value::from(strip_page_url(page)));
	}

	Ok(config)
}

/// Returns `url` without its query string and fragment.
pub fn strip_page_url(url: &Url) -> String {
	let mut stripped = url.clone();

	stripped.set_query(None);
	stripped.set_fragment(None);

	stripped.to_string()
}

fn normalize_options(fields: ParameterMap) -> Result<Options, ConfigError> {
	let mut options = Options::default();

	for (option, value) in fields {
		let Some(tag) = registry::option_type(&option) else {
			return Err(ConfigError::UnknownOption { option });
		};

		if value.is_null() {
			continue;
		}

		let found = resolve::json_type(&value);
		let invalid =
			|reason: String| ConfigError::InvalidOption { option: option.clone(), reason };

		if tag == TypeTag::Boolean {
			let flag = value
				.as_bool()
				.ok_or_else(|| invalid(format!("expected a boolean, found {found}")))?;
			let slot = match option.as_str() {
				"no_pkce" => &mut options.no_pkce,
				"no_state" => &mut options.no_state,
				"storage" => &mut options.storage,
				"test" => &mut options.test,
				"bearer_revocation" => &mut options.bearer_revocation,
				"basic_authentication" => &mut options.basic_authentication,
				_ => return Err(ConfigError::UnknownOption { option: option.clone() }),
			};

			*slot = Some(flag);

			continue;
		}

		let text = value
			.as_str()
			.ok_or_else(|| invalid(format!("expected a string, found {found}")))?
			.to_owned();

		match option.as_str() {
			"authorization_grant" =>
				options.authorization_grant = Some(text.parse().map_err(invalid)?),
			"discovery_endpoint" => {
				Url::parse(&text).map_err(|e| invalid(e.to_string()))?;

				options.discovery_endpoint = Some(text);
			},
			"well_known_suffix" => options.well_known_suffix = Some(text),
			"content_type" => options.content_type = Some(text.to_ascii_lowercase()),
			_ => return Err(ConfigError::UnknownOption { option: option.clone() }),
		}
	}

	Ok(options)
}

fn normalize_metadata(fields: ParameterMap) -> ParameterMap {
	for name in fields.keys() {
		if !registry::is_metadata_field(name) {
			tracing::warn!(field = %name, "Unexpected provider metadata field; keeping it.");
		}
	}

	fields
}

fn normalize_custom(endpoint: Endpoint, fields: ParameterMap) -> Result<ParameterMap> {
	if let Some(parameter) = fields.keys().find(|name| !registry::accepts(endpoint, name)) {
		return Err(Error::new(
			Cause::Configuration,
			ConfigError::UnknownParameter {
				section: endpoint.as_str().to_owned(),
				parameter: parameter.clone(),
			},
		));
	}

	resolve::normalize_types(fields, Cause::Configuration)
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::config::AuthorizationGrant;

	fn page() -> Url {
		Url::parse("https://app.example.com/callback?code=abc#state=xyz")
			.expect("Page URL fixture should parse.")
	}

	fn config_error(err: Error) -> ConfigError {
		match err.into_kind() {
			ErrorKind::ConfigValidation(e) => e,
			other => panic!("Expected a configuration error, got {other:?}."),
		}
	}

	#[test]
	fn empty_input_stays_empty() {
		let config = normalize(&json!({}), Some(&page())).expect("Empty input should normalize.");

		assert!(config.is_empty());
		assert!(normalize(&Value::Null, None).expect("Null input should normalize.").is_empty());
	}

	#[test]
	fn keys_are_lower_cased_and_redirect_uri_defaults_to_page() {
		let config = normalize(
			&json!({
				"Configuration": { "No_PKCE": true },
				"PARAMETERS": { "Client_ID": "app" }
			}),
			Some(&page()),
		)
		.expect("Mixed-case input should normalize.");

		assert_eq!(config.configuration.no_pkce, Some(true));
		assert_eq!(config.parameters.get("client_id"), Some(&json!("app")));
		assert_eq!(
			config.parameters.get("redirect_uri"),
			Some(&json!("https://app.example.com/callback"))
		);
	}

	#[test]
	fn rejects_unknown_sections_options_and_bad_section_types() {
		let err = normalize(&json!({ "extras": {} }), None).expect_err("Unknown section.");

		assert_eq!(err.cause(), Cause::Configuration);
		assert_eq!(config_error(err), ConfigError::UnknownSection { section: "extras".into() });

		let err = normalize(&json!({ "parameters": "client_id=app" }), None)
			.expect_err("Sections must be objects.");

		assert_eq!(config_error(err), ConfigError::SectionType { section: "parameters".into() });

		let err = normalize(&json!({ "configuration": { "turbo": true } }), None)
			.expect_err("Unknown option.");

		assert_eq!(config_error(err), ConfigError::UnknownOption { option: "turbo".into() });

		let err =
			normalize(&json!({ "configuration": { "authorization_grant": "password" } }), None)
				.expect_err("Unsupported grant.");

		assert!(matches!(config_error(err), ConfigError::InvalidOption { .. }));
		assert!(normalize(&json!([1, 2]), None).is_err());
	}

	#[test]
	fn custom_sections_are_validated_against_the_registry() {
		let err = normalize(&json!({ "revocation": { "prompt": "login" } }), None)
			.expect_err("Revocation does not accept prompt.");

		assert_eq!(
			config_error(err),
			ConfigError::UnknownParameter {
				section: "revocation".into(),
				parameter: "prompt".into()
			}
		);

		let config =
			normalize(&json!({ "authorization": { "ACR_values": "urn:mace:loa:2" } }), None)
				.expect("Known custom parameter should normalize.");

		assert_eq!(config.authorization.get("acr_values"), Some(&json!(["urn:mace:loa:2"])));
	}

	#[test]
	fn parameter_types_are_enforced() {
		let err = normalize(&json!({ "parameters": { "max_age": "never" } }), None)
			.expect_err("max_age must be numeric.");

		assert_eq!(err.cause(), Cause::Configuration);
		assert!(matches!(err.kind(), ErrorKind::ParameterType { .. }));
	}

	#[test]
	fn unknown_metadata_fields_are_kept() {
		let config = normalize(
			&json!({ "metadata": { "issuer": "https://id.example.com", "x_vendor_flag": true } }),
			None,
		)
		.expect("Unknown metadata is a warning only.");

		assert_eq!(config.metadata.get("x_vendor_flag"), Some(&json!(true)));
	}

	#[test]
	fn normalization_is_idempotent() {
		let input = json!({
			"configuration": { "authorization_grant": "Implicit", "storage": true },
			"metadata": { "Issuer": "https://id.example.com" },
			"parameters": { "client_id": "app", "scope": "openid" },
			"token": { "audience": ["api"] }
		});
		let once = normalize(&input, Some(&page())).expect("First pass should succeed.");
		let twice =
			normalize(&once.to_value(), Some(&page())).expect("Second pass should succeed.");

		assert_eq!(once, twice);
		assert_eq!(once.configuration.authorization_grant, Some(AuthorizationGrant::Implicit));
		assert_eq!(once.parameters.get("scope"), Some(&json!(["openid"])));
	}
}
