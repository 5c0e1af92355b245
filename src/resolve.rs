//! Parameter resolution: merges configured, custom, and inline values per endpoint, enforces
//! registry types, and converts between parameter maps and the OAuth 2.0 wire form.

// self
use crate::{
	_prelude::*,
	config::Configuration,
	registry::{self, Endpoint, TypeTag},
};

/// Flat parameter map keyed by lower-case wire names.
pub type ParameterMap = BTreeMap<String, Value>;

/// Builds the request payload for `endpoint`.
///
/// Configured standard parameters are layered under the endpoint's custom section, which is
/// layered under `inline`. A `null` at any layer deletes the key. The result is passed through
/// [`normalize_types`].
pub fn resolve(
	endpoint: Endpoint,
	config: &Configuration,
	inline: &ParameterMap,
) -> Result<ParameterMap> {
	let mut payload = ParameterMap::new();

	for name in registry::parameters_for(endpoint) {
		if let Some(value) = config.parameters.get(*name) {
			payload.insert((*name).to_owned(), value.clone());
		}
	}
	for layer in [config.custom(endpoint), inline] {
		for (name, value) in layer {
			payload.insert(name.to_ascii_lowercase(), value.clone());
		}
	}

	payload.retain(|_, value| !value.is_null());

	normalize_types(payload, endpoint.cause())
}

/// Checks every value against its registered type tag.
///
/// Scalars under an array tag are wrapped into a one-element array; strings under a JSON tag must
/// hold valid JSON text. Unregistered names pass through with a warning.
pub fn normalize_types(params: ParameterMap, cause: Cause) -> Result<ParameterMap> {
	let mut normalized = ParameterMap::new();

	for (name, value) in params {
		let Some(tag) = registry::type_of(&name) else {
			tracing::warn!(parameter = %name, %cause, "Unexpected parameter; passing it through.");

			normalized.insert(name, value);

			continue;
		};
		let value = coerce(&name, tag, value).map_err(|kind| Error::new(cause, kind))?;

		normalized.insert(name, value);
	}

	Ok(normalized)
}

/// Type-aware merge of wire-carried values (token responses, redirect parameters).
///
/// Wire values arrive as strings: array-tagged names are split on whitespace and numeric or
/// boolean names are parsed before [`normalize_types`] runs. `null` deletes the key. Returns the
/// normalized incoming values.
pub fn update(
	target: &mut ParameterMap,
	incoming: ParameterMap,
	cause: Cause,
) -> Result<ParameterMap> {
	let decoded = decode_wire(incoming);
	let (removed, kept): (ParameterMap, ParameterMap) =
		decoded.into_iter().partition(|(_, value)| value.is_null());
	let normalized = normalize_types(kept, cause)?;

	for name in removed.keys() {
		target.remove(name);
	}
	for (name, value) in &normalized {
		target.insert(name.clone(), value.clone());
	}

	Ok(normalized)
}

/// Converts string-encoded wire values into their registered JSON shape where unambiguous.
pub fn decode_wire(params: ParameterMap) -> ParameterMap {
	params
		.into_iter()
		.map(|(name, value)| {
			let name = name.to_ascii_lowercase();
			let decoded = match (registry::type_of(&name), value) {
				(Some(TypeTag::StringArray), Value::String(text)) =>
					Value::Array(text.split_whitespace().map(Value::from).collect()),
				(Some(TypeTag::Number), Value::String(text)) => match text.trim().parse::<i64>() {
					Ok(number) => Value::from(number),
					Err(_) => text
						.trim()
						.parse::<f64>()
						.ok()
						.and_then(serde_json::Number::from_f64)
						.map(Value::Number)
						.unwrap_or(Value::String(text)),
				},
				(Some(TypeTag::Boolean), Value::String(text)) => match text.as_str() {
					"true" => Value::Bool(true),
					"false" => Value::Bool(false),
					_ => Value::String(text),
				},
				(_, value) => value,
			};

			(name, decoded)
		})
		.collect()
}

/// Encodes a payload into wire pairs: arrays are space-joined, JSON values are serialized.
pub fn to_wire_pairs(params: &ParameterMap) -> Vec<(String, String)> {
	params
		.iter()
		.filter_map(|(name, value)| {
			let encoded = match value {
				Value::Null => return None,
				Value::String(text) => text.clone(),
				Value::Array(items)
					if registry::type_of(name) != Some(TypeTag::Json)
						&& items.iter().all(|item| !item.is_object() && !item.is_array()) =>
					items.iter().map(wire_scalar).collect::<Vec<_>>().join(" "),
				Value::Bool(_) | Value::Number(_) => wire_scalar(value),
				other => other.to_string(),
			};

			Some((name.clone(), encoded))
		})
		.collect()
}

/// Reads a string parameter.
pub fn string<'a>(params: &'a ParameterMap, name: &str) -> Option<&'a str> {
	params.get(name).and_then(Value::as_str).filter(|value| !value.is_empty())
}

/// Reads an array-of-strings parameter, accepting a bare string as a one-element list.
pub fn strings(params: &ParameterMap, name: &str) -> Vec<String> {
	match params.get(name) {
		Some(Value::Array(items)) =>
			items.iter().filter_map(Value::as_str).map(str::to_owned).collect(),
		Some(Value::String(text)) if !text.is_empty() => vec![text.clone()],
		_ => Vec::new(),
	}
}

fn wire_scalar(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

fn coerce(name: &str, tag: TypeTag, value: Value) -> Result<Value, ErrorKind> {
	let mismatch = |value: &Value| ErrorKind::ParameterType {
		name: name.to_owned(),
		expected: tag.as_str(),
		found: json_type(value),
	};

	match tag {
		TypeTag::Any => Ok(value),
		TypeTag::String if value.is_string() => Ok(value),
		TypeTag::Number if value.is_number() => Ok(value),
		TypeTag::Boolean if value.is_boolean() => Ok(value),
		TypeTag::StringArray => {
			let items = match value {
				Value::Array(items) => items,
				scalar @ (Value::String(_) | Value::Number(_) | Value::Bool(_)) => vec![scalar],
				other => return Err(mismatch(&other)),
			};

			if let Some(bad) = items.iter().find(|item| !item.is_string()) {
				return Err(mismatch(bad));
			}

			Ok(Value::Array(items))
		},
		TypeTag::Json => match &value {
			Value::String(text) => match serde_json::from_str::<Value>(text) {
				Ok(_) => Ok(value),
				Err(e) => Err(ErrorKind::InvalidParameter {
					name: name.to_owned(),
					reason: format!("not valid JSON ({e})"),
				}),
			},
			Value::Object(_) | Value::Array(_) => Ok(value),
			other => Err(mismatch(other)),
		},
		_ => Err(mismatch(&value)),
	}
}

pub(crate) fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::config;

	fn map(value: Value) -> ParameterMap {
		serde_json::from_value(value).expect("Fixture should be a JSON object.")
	}

	fn configuration(value: Value) -> Configuration {
		config::normalize(&value, None).expect("Fixture configuration should normalize.")
	}

	#[test]
	fn resolve_layers_standard_custom_and_inline() {
		let config = configuration(json!({
			"parameters": { "client_id": "app", "scope": ["openid"], "access_token": "secret" },
			"authorization": { "prompt": "login", "scope": ["email"] }
		}));
		let payload = resolve(
			Endpoint::Authorization,
			&config,
			&map(json!({ "login_hint": "user@example.com" })),
		)
		.expect("Resolution should succeed.");

		assert_eq!(payload.get("client_id"), Some(&json!("app")));
		assert_eq!(payload.get("scope"), Some(&json!(["email"])));
		assert_eq!(payload.get("prompt"), Some(&json!(["login"])));
		assert_eq!(payload.get("login_hint"), Some(&json!("user@example.com")));
		assert!(
			!payload.contains_key("access_token"),
			"Token parameters are not authorization inputs."
		);
	}

	#[test]
	fn inline_null_deletes_configured_values() {
		let config = configuration(json!({
			"parameters": { "client_id": "app", "redirect_uri": "https://app.example.com/" },
			"token": { "audience": "api" }
		}));
		let payload = resolve(
			Endpoint::Token,
			&config,
			&map(json!({ "redirect_uri": null, "audience": null })),
		)
		.expect("Resolution should succeed.");

		assert!(!payload.contains_key("redirect_uri"));
		assert!(!payload.contains_key("audience"));
		assert_eq!(payload.get("client_id"), Some(&json!("app")));
	}

	#[test]
	fn normalize_types_rejects_mismatches() {
		let err = normalize_types(map(json!({ "expires_in": "soon" })), Cause::Token)
			.expect_err("Strings are not numbers.");

		assert_eq!(err.cause(), Cause::Token);
		assert!(matches!(
			err.kind(),
			ErrorKind::ParameterType { name, .. } if name == "expires_in"
		));

		let err = normalize_types(map(json!({ "scope": [{ "a": 1 }] })), Cause::Authorization)
			.expect_err("Arrays must hold strings.");

		assert!(matches!(err.kind(), ErrorKind::ParameterType { .. }));

		let err = normalize_types(map(json!({ "claims": "{not json" })), Cause::Authorization)
			.expect_err("JSON-tagged strings must parse.");

		assert!(matches!(err.kind(), ErrorKind::InvalidParameter { .. }));
	}

	#[test]
	fn normalize_types_wraps_scalars_and_keeps_unknowns() {
		let normalized = normalize_types(
			map(json!({ "scope": "openid", "claims": "{\"id_token\":{}}", "x-custom": 7 })),
			Cause::Authorization,
		)
		.expect("Normalization should succeed.");

		assert_eq!(normalized.get("scope"), Some(&json!(["openid"])));
		assert_eq!(normalized.get("claims"), Some(&json!("{\"id_token\":{}}")));
		assert_eq!(normalized.get("x-custom"), Some(&json!(7)));
	}

	#[test]
	fn update_decodes_wire_values() {
		let mut target = map(json!({ "state": "abc", "code": "old" }));
		let merged = update(
			&mut target,
			map(json!({
				"code": "new",
				"scope": "openid email",
				"expires_in": "3600",
				"include_granted_scopes": "true",
				"state": null
			})),
			Cause::Response,
		)
		.expect("Update should succeed.");

		assert_eq!(target.get("code"), Some(&json!("new")));
		assert_eq!(target.get("scope"), Some(&json!(["openid", "email"])));
		assert_eq!(target.get("expires_in"), Some(&json!(3600)));
		assert_eq!(target.get("include_granted_scopes"), Some(&json!(true)));
		assert!(!target.contains_key("state"));
		assert!(!merged.contains_key("state"));
	}

	#[test]
	fn wire_pairs_join_arrays_and_serialize_json() {
		let pairs = to_wire_pairs(&map(json!({
			"scope": ["openid", "email"],
			"max_age": 60,
			"authorization_details": [{ "type": "payment" }],
			"include_granted_scopes": true
		})));
		let pairs: HashMap<_, _> = pairs.into_iter().collect();

		assert_eq!(pairs.get("scope").map(String::as_str), Some("openid email"));
		assert_eq!(pairs.get("max_age").map(String::as_str), Some("60"));
		assert_eq!(
			pairs.get("authorization_details").map(String::as_str),
			Some("[{\"type\":\"payment\"}]")
		);
		assert_eq!(pairs.get("include_granted_scopes").map(String::as_str), Some("true"));
	}
}
