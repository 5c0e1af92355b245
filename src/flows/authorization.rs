//! Authorization redirect driver.
//!
//! Derivation runs in a fixed order because later steps read what earlier ones produced:
//! scope defaults, then `response_type` for the configured grant, then PKCE, `state`, and
//! finally `nonce` (which depends on the derived response types).

// self
use crate::{
	_prelude::*,
	config::{AuthorizationGrant, Configuration},
	flows::{
		PendingFlow, Session,
		common::{self, Delta, DriverRequest},
	},
	host::Host,
	http::HttpClient,
	obs::{self, FlowOutcome, FlowSpan},
	registry::Endpoint,
	resolve,
};

const CAUSE: Cause = Cause::Authorization;

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPE: &[&str] = &["openid", "email", "profile"];
/// Scopes that ask for end-user identity rather than API access.
pub const IDENTITY_SCOPES: &[&str] = &["openid", "email", "profile"];

const PKCE_PARAMETERS: &[&str] = &["code_challenge", "code_challenge_method", "code_verifier"];

/// Authorization request ready for navigation.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Endpoint URL with the full payload appended as query parameters.
	pub url: Url,
	/// Payload sent to the provider, PKCE challenge included.
	pub payload: ParameterMap,
	/// State and nonce to persist, plus the staged PKCE verifier.
	pub delta: Delta,
}

/// Builds the authorization request and the state it leaves behind.
///
/// `state_payload` is appended to the generated (or configured) `state`.
pub fn authorize(
	host: &dyn Host,
	config: &Configuration,
	request: &DriverRequest,
	state_payload: Option<&str>,
) -> Result<AuthorizationRequest> {
	let endpoint = common::endpoint_url(
		request.url.as_ref(),
		config,
		"authorization_endpoint",
		"authorization",
	)
	.map_err(|kind| Error::new(CAUSE, kind))?;
	let options = &config.configuration;
	let grant = options.grant();
	let mut payload = resolve::resolve(Endpoint::Authorization, config, &request.parameters)?;
	let mut scope = resolve::strings(&payload, "scope");

	if scope.is_empty() {
		scope = DEFAULT_SCOPE.iter().map(|s| (*s).to_owned()).collect();
	}

	let response_type =
		derive_response_type(grant, resolve::strings(&payload, "response_type"), &scope);

	payload.insert("scope".into(), Value::from(scope));

	if let Some(response_type) = &response_type {
		payload.insert("response_type".into(), Value::from(response_type.clone()));
	}

	let pending = if options.pkce() {
		let verifier = stage_pkce(host, &mut payload)?;

		PendingFlow { code_verifier: Some(verifier) }
	} else {
		for name in PKCE_PARAMETERS {
			payload.remove(*name);
		}

		PendingFlow::default()
	};
	let state = if options.state() {
		let mut state =
			explicit(config, request, "state").unwrap_or_else(|| common::random_token(host));

		if let Some(extra) = state_payload {
			state.push_str(extra);
		}

		payload.insert("state".into(), Value::from(state.clone()));

		Some(state)
	} else {
		payload.remove("state");

		None
	};
	let wants_id_token = response_type
		.as_ref()
		.is_some_and(|types| types.iter().any(|response| response == "id_token"));
	let nonce = match grant {
		AuthorizationGrant::Code => true,
		AuthorizationGrant::Implicit => wants_id_token,
		_ => false,
	};
	let nonce = if nonce {
		let nonce =
			explicit(config, request, "nonce").unwrap_or_else(|| common::random_token(host));

		payload.insert("nonce".into(), Value::from(nonce.clone()));

		Some(nonce)
	} else {
		payload.remove("nonce");

		None
	};
	let mut url = endpoint;

	url.query_pairs_mut().extend_pairs(resolve::to_wire_pairs(&payload));

	let parameters = [
		("state".to_owned(), state.map(Value::from).unwrap_or(Value::Null)),
		("nonce".to_owned(), nonce.map(Value::from).unwrap_or(Value::Null)),
	]
	.into_iter()
	.collect();

	Ok(AuthorizationRequest {
		url,
		payload,
		delta: Delta { parameters, pending: Some(pending), ..Default::default() },
	})
}

/// Normalizes `response_type` for `grant`; `None` leaves the configured value untouched.
pub fn derive_response_type(
	grant: AuthorizationGrant,
	mut response_type: Vec<String>,
	scope: &[String],
) -> Option<Vec<String>> {
	let push = |types: &mut Vec<String>, name: &str| {
		if !types.iter().any(|existing| existing == name) {
			types.push(name.to_owned());
		}
	};

	match grant {
		AuthorizationGrant::Free => return None,
		AuthorizationGrant::Code => return Some(vec!["code".into()]),
		AuthorizationGrant::Implicit => response_type.retain(|name| name != "code"),
		AuthorizationGrant::Hybrid => push(&mut response_type, "code"),
	}

	if scope.iter().any(|name| IDENTITY_SCOPES.contains(&name.as_str())) {
		push(&mut response_type, "id_token");
	}
	if scope.iter().any(|name| !IDENTITY_SCOPES.contains(&name.as_str())) {
		push(&mut response_type, "token");
	}
	if response_type.len() > 1 {
		response_type.retain(|name| name != "none");
	}

	Some(response_type)
}

/// Per-call or statically configured value; live values from a previous flow are never reused.
fn explicit(config: &Configuration, request: &DriverRequest, name: &str) -> Option<String> {
	resolve::string(&request.parameters, name)
		.or_else(|| resolve::string(&config.authorization, name))
		.map(str::to_owned)
}

/// Resolves the PKCE method, verifier, and challenge; returns the verifier to stage.
fn stage_pkce(host: &dyn Host, payload: &mut ParameterMap) -> Result<String> {
	let method = match resolve::string(payload, "code_challenge_method") {
		None => "S256",
		Some(method) if method.eq_ignore_ascii_case("s256") => "S256",
		Some(method) if method.eq_ignore_ascii_case("plain") => "plain",
		Some(other) =>
			return Err(Error::new(
				CAUSE,
				ErrorKind::InvalidParameter {
					name: "code_challenge_method".into(),
					reason: format!("`{other}` is not one of plain, S256"),
				},
			)),
	};
	let verifier = match payload.remove("code_verifier") {
		Some(Value::String(verifier)) if !verifier.is_empty() => verifier,
		_ => common::random_token(host),
	};
	let challenge = resolve::string(payload, "code_challenge")
		.map(str::to_owned)
		.unwrap_or_else(|| common::pkce_challenge(&verifier, method));

	payload.insert("code_challenge_method".into(), Value::from(method));
	payload.insert("code_challenge".into(), Value::from(challenge));

	Ok(verifier)
}

impl<C> Session<C>
where
	C: ?Sized + HttpClient,
{
	/// Builds the authorization request, seals the session state, and navigates to the provider.
	///
	/// Returns the navigation target. With the `test` option on, navigation is only logged.
	pub fn authorize(&self, request: DriverRequest, state_payload: Option<&str>) -> Result<Url> {
		let _span = FlowSpan::new(CAUSE, "authorize").entered();

		obs::record_flow_outcome(CAUSE, FlowOutcome::Attempt);

		let result = self.authorize_now(&request, state_payload);

		obs::record_flow_result(CAUSE, &result);

		result
	}

	fn authorize_now(&self, request: &DriverRequest, state_payload: Option<&str>) -> Result<Url> {
		let (config, _) = self.view();
		let prepared = authorize(self.host().as_ref(), &config, request, state_payload)?;

		self.apply(CAUSE, prepared.delta)?;
		self.save_state()?;

		if config.configuration.test() {
			tracing::info!(url = %prepared.url, "Test mode; skipping authorization redirect.");
		} else {
			self.host().navigate(&prepared.url);
		}

		Ok(prepared.url)
	}
}
