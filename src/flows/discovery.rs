//! OIDC discovery driver.

// self
use crate::{
	_prelude::*,
	config::Configuration,
	flows::{
		Session,
		common::{self, Delta, DriverRequest},
	},
	http::HttpClient,
	obs::{self, FlowOutcome, FlowSpan},
	registry::{self, Endpoint},
	resolve,
	transport::{Headers, Transport},
};

const CAUSE: Cause = Cause::Discovery;

/// Derives the discovery document URL.
///
/// Explicit URL, then the `discovery_endpoint` option, then the issuer with the well-known
/// suffix mounted on it.
pub fn discovery_url(explicit: Option<&Url>, config: &Configuration) -> Result<Url, ErrorKind> {
	if let Some(url) = explicit {
		return Ok(url.clone());
	}

	let invalid = |name: &str, e: url::ParseError| ErrorKind::InvalidParameter {
		name: name.to_owned(),
		reason: e.to_string(),
	};

	if let Some(endpoint) = &config.configuration.discovery_endpoint {
		return Url::parse(endpoint).map_err(|e| invalid("discovery_endpoint", e));
	}

	let issuer =
		config.metadata_str("issuer").ok_or(ErrorKind::MissingEndpoint { endpoint: "discovery" })?;

	common::mount_url(issuer, "https", config.configuration.well_known_suffix())
		.map_err(|e| invalid("issuer", e))
}

/// Fetches the discovery document; the response replaces the metadata section wholesale.
pub async fn discover<C>(
	transport: &Transport<C>,
	config: &Configuration,
	request: &DriverRequest,
) -> Result<Delta>
where
	C: ?Sized + HttpClient,
{
	let url = discovery_url(request.url.as_ref(), config).map_err(|kind| Error::new(CAUSE, kind))?;
	let params = resolve::resolve(Endpoint::Discovery, config, &request.parameters)?;
	let document = transport
		.get(&url, &params, &Headers::new())
		.await
		.map_err(|kind| Error::new(CAUSE, kind))?;
	let metadata: ParameterMap =
		document.into_iter().map(|(name, value)| (name.to_ascii_lowercase(), value)).collect();

	for name in metadata.keys().filter(|name| !registry::is_metadata_field(name)) {
		tracing::warn!(field = %name, "Unexpected provider metadata field.");
	}

	tracing::debug!(%url, fields = metadata.len(), "Discovered provider metadata.");

	Ok(Delta { metadata: Some(metadata), ..Default::default() })
}

impl<C> Session<C>
where
	C: ?Sized + HttpClient,
{
	/// Fetches the provider's discovery document and replaces the stored metadata with it.
	pub async fn discover(&self, request: DriverRequest) -> Result<ParameterMap> {
		let span = FlowSpan::new(CAUSE, "discover");

		obs::record_flow_outcome(CAUSE, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let (config, _) = self.view();
				let delta = discover(self.transport(), &config, &request).await?;
				let metadata = delta.metadata.clone().unwrap_or_default();

				self.apply(CAUSE, delta)?;

				Ok(metadata)
			})
			.await;

		obs::record_flow_result(CAUSE, &result);

		result
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::config;

	fn configuration(value: Value) -> Configuration {
		config::normalize(&value, None).expect("Fixture configuration should normalize.")
	}

	#[test]
	fn discovery_url_prefers_explicit_then_option_then_issuer() {
		let config = configuration(json!({
			"configuration": { "discovery_endpoint": "https://meta.example.com/doc" },
			"metadata": { "issuer": "id.example.com" }
		}));
		let explicit = Url::parse("https://override.example.com/doc").expect("URL should parse.");

		assert_eq!(
			discovery_url(Some(&explicit), &config).expect("Explicit URL wins."),
			explicit
		);
		assert_eq!(
			discovery_url(None, &config).expect("Option URL wins.").as_str(),
			"https://meta.example.com/doc"
		);

		let config = configuration(json!({
			"configuration": { "well_known_suffix": "/custom/meta" },
			"metadata": { "issuer": "id.example.com/" }
		}));

		assert_eq!(
			discovery_url(None, &config).expect("Issuer mount should work.").as_str(),
			"https://id.example.com/custom/meta"
		);
	}

	#[test]
	fn discovery_section_accepts_query_parameters() {
		let config = configuration(json!({
			"metadata": { "issuer": "https://tenant.b2clogin.com/tenant.onmicrosoft.com/v2.0" },
			"discovery": { "p": "B2C_1_signin" }
		}));
		let params = resolve::resolve(Endpoint::Discovery, &config, &ParameterMap::new())
			.expect("Discovery parameters should resolve.");

		assert_eq!(params.get("p"), Some(&json!("B2C_1_signin")));
		assert!(
			config::normalize(&json!({ "discovery": { "client_id": "app" } }), None).is_err(),
			"Only discovery query parameters are accepted."
		);
	}

	#[test]
	fn discovery_url_requires_a_source() {
		let err = discovery_url(None, &Configuration::default())
			.expect_err("No URL can be derived from an empty configuration.");

		assert!(matches!(err, ErrorKind::MissingEndpoint { endpoint: "discovery" }));
	}
}
