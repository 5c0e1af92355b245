//! Token endpoint driver, shared by the code exchange and the refresh grant.

// self
use crate::{
	_prelude::*,
	config::Configuration,
	flows::{
		PendingFlow, Session,
		common::{self, Delta, DriverRequest},
	},
	http::HttpClient,
	obs::{self, FlowOutcome, FlowSpan},
	registry::Endpoint,
	resolve,
	transport::{Headers, Transport},
};

const AUTHORIZATION_CODE_STRIPPED: &[&str] = &["assertion", "device_code", "refresh_token"];
const REFRESH_TOKEN_STRIPPED: &[&str] = &["assertion", "code", "code_verifier", "device_code"];

/// Token request ready to post.
#[derive(Clone, Debug)]
pub struct TokenExchange {
	/// Token endpoint URL.
	pub url: Url,
	/// Request body.
	pub body: ParameterMap,
	/// Client authentication headers.
	pub headers: Headers,
	/// Whether the staged PKCE verifier was used and must be cleared.
	pub consumes_verifier: bool,
}

/// Builds a token request for `endpoint` ([`Endpoint::Token`] or [`Endpoint::Refresh`]).
///
/// The refresh endpoint forces `grant_type=refresh_token` and drops `redirect_uri` unless the
/// caller supplies one inline.
pub fn prepare(
	endpoint: Endpoint,
	config: &Configuration,
	pending: &PendingFlow,
	request: &DriverRequest,
) -> Result<TokenExchange> {
	let cause = endpoint.cause();
	let url = common::endpoint_url(request.url.as_ref(), config, "token_endpoint", "token")
		.map_err(|kind| Error::new(cause, kind))?;
	let mut inline = request.parameters.clone();

	if endpoint == Endpoint::Refresh {
		inline.insert("grant_type".into(), Value::from("refresh_token"));
		inline.entry("redirect_uri".into()).or_insert(Value::Null);
	}

	let mut body = resolve::resolve(endpoint, config, &inline)?;
	let grant_type = resolve::string(&body, "grant_type")
		.map(str::to_owned)
		.ok_or_else(|| Error::new(cause, ErrorKind::MissingGrant))?;
	let mut consumes_verifier = false;

	match grant_type.as_str() {
		"authorization_code" => {
			for name in AUTHORIZATION_CODE_STRIPPED {
				body.remove(*name);
			}

			if config.configuration.pkce() {
				consumes_verifier = pending.code_verifier.is_some();

				if !body.contains_key("code_verifier") {
					if let Some(verifier) = &pending.code_verifier {
						body.insert("code_verifier".into(), Value::from(verifier.as_str()));
					}
				}
			}
		},
		"refresh_token" => {
			for name in REFRESH_TOKEN_STRIPPED {
				body.remove(*name);
			}
		},
		_ => {},
	}

	let headers = common::client_authentication(&config.configuration, &mut body);

	tracing::debug!(%grant_type, %url, "Prepared token request.");

	Ok(TokenExchange { url, body, headers, consumes_verifier })
}

/// Posts `exchange` and converts the response into a parameter delta.
///
/// `expires_in` is rewritten from relative seconds to an absolute epoch-millisecond timestamp
/// computed from `now`.
pub async fn exchange<C>(
	transport: &Transport<C>,
	config: &Configuration,
	exchange: &TokenExchange,
	now: OffsetDateTime,
	cause: Cause,
) -> Result<Delta>
where
	C: ?Sized + HttpClient,
{
	let response = transport
		.post(
			&exchange.url,
			&exchange.body,
			config.configuration.content_type(),
			&ParameterMap::new(),
			&exchange.headers,
		)
		.await
		.map_err(|kind| Error::new(cause, kind))?;
	let mut parameters = resolve::decode_wire(response);

	common::absolute_expiry(&mut parameters, now);

	Ok(Delta { parameters, ..Default::default() })
}

impl<C> Session<C>
where
	C: ?Sized + HttpClient,
{
	/// Calls the token endpoint and merges the response into the live parameters.
	///
	/// Returns the merged response parameters.
	pub async fn token(&self, request: DriverRequest) -> Result<ParameterMap> {
		self.token_flow(Endpoint::Token, request, "token").await
	}

	/// Refreshes the access token with the stored `refresh_token`.
	pub async fn refresh(&self, request: DriverRequest) -> Result<ParameterMap> {
		self.token_flow(Endpoint::Refresh, request, "refresh").await
	}

	async fn token_flow(
		&self,
		endpoint: Endpoint,
		request: DriverRequest,
		stage: &'static str,
	) -> Result<ParameterMap> {
		let cause = endpoint.cause();
		let span = FlowSpan::new(cause, stage);

		obs::record_flow_outcome(cause, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let (config, pending) = self.view();
				let prepared = prepare(endpoint, &config, &pending, &request)?;

				if prepared.consumes_verifier {
					self.apply(
						cause,
						Delta { pending: Some(PendingFlow::default()), ..Default::default() },
					)?;
				}

				let delta =
					exchange(self.transport(), &config, &prepared, self.host().now(), cause).await?;

				self.apply(cause, delta)
			})
			.await;

		obs::record_flow_result(cause, &result);

		result
	}
}
