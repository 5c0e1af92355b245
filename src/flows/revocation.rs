//! RFC 7009 token revocation driver.

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
	registry::Endpoint,
	resolve,
	transport::{self, Transport},
};

const CAUSE: Cause = Cause::Revocation;

/// Token chosen for revocation and where it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct RevokedToken {
	/// Token value.
	pub value: String,
	/// Live parameter the token was read from; `None` when passed with the request.
	pub source: Option<String>,
}
impl Debug for RevokedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RevokedToken").field("source", &self.source).finish()
	}
}

/// Picks the token to revoke.
///
/// Precedence: explicit `token`, the token named by `token_type_hint`, `access_token`, then
/// `refresh_token`.
pub fn select_token(
	payload: &ParameterMap,
	config: &Configuration,
	request: &DriverRequest,
) -> Result<RevokedToken, ErrorKind> {
	if let Some(token) = resolve::string(payload, "token") {
		return Ok(RevokedToken { value: token.to_owned(), source: None });
	}

	let lookup = |name: &str| match resolve::string(&request.parameters, name) {
		Some(value) => Some(RevokedToken { value: value.to_owned(), source: None }),
		None => resolve::string(&config.parameters, name)
			.map(|value| RevokedToken { value: value.to_owned(), source: Some(name.to_owned()) }),
	};

	if let Some(hint) = resolve::string(payload, "token_type_hint") {
		return lookup(hint).ok_or_else(|| ErrorKind::MissingToken { token: hint.to_owned() });
	}

	lookup("access_token")
		.or_else(|| lookup("refresh_token"))
		.ok_or_else(|| ErrorKind::MissingToken { token: "token".into() })
}

/// Revokes a token; the returned delta clears the revoked live parameter.
pub async fn revoke<C>(
	transport: &Transport<C>,
	config: &Configuration,
	request: &DriverRequest,
) -> Result<Delta>
where
	C: ?Sized + HttpClient,
{
	let url =
		common::endpoint_url(request.url.as_ref(), config, "revocation_endpoint", "revocation")
			.map_err(|kind| Error::new(CAUSE, kind))?;
	let mut body = resolve::resolve(Endpoint::Revocation, config, &request.parameters)?;
	let token = select_token(&body, config, request).map_err(|kind| Error::new(CAUSE, kind))?;

	body.remove("access_token");
	body.remove("refresh_token");

	let mut headers = common::client_authentication(&config.configuration, &mut body);

	if config.configuration.bearer_revocation() {
		body.remove("token");
		headers.insert("authorization".into(), transport::bearer(&token.value));
	} else {
		body.insert("token".into(), Value::from(token.value.as_str()));
	}

	transport
		.post(&url, &body, config.configuration.content_type(), &ParameterMap::new(), &headers)
		.await
		.map_err(|kind| Error::new(CAUSE, kind))?;

	tracing::debug!(source = ?token.source, "Token revoked.");

	let parameters = token.source.into_iter().map(|name| (name, Value::Null)).collect();

	Ok(Delta { parameters, ..Default::default() })
}

impl<C> Session<C>
where
	C: ?Sized + HttpClient,
{
	/// Revokes a token at the provider and forgets it locally.
	pub async fn revoke(&self, request: DriverRequest) -> Result<()> {
		let span = FlowSpan::new(CAUSE, "revoke");

		obs::record_flow_outcome(CAUSE, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let (config, _) = self.view();
				let delta = revoke(self.transport(), &config, &request).await?;

				self.apply(CAUSE, delta).map(|_| ())
			})
			.await;

		obs::record_flow_result(CAUSE, &result);

		result
	}
}
