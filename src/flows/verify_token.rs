//! ID token verification driver.

// self
use crate::{
	_prelude::*,
	config::Configuration,
	flows::{
		IdToken, Session,
		common::{Delta, DriverRequest},
	},
	http::HttpClient,
	obs::{self, FlowOutcome, FlowSpan},
	registry::Endpoint,
	resolve,
	verify::{JwtVerifier, VerificationOptions},
};

const CAUSE: Cause = Cause::VerifyToken;

/// Assembles the verifier inputs from the resolved payload and provider metadata.
///
/// `jwks_uri` and `issuer` fall back to metadata; `audience` falls back to `client_id`.
pub fn verification_options(
	payload: &ParameterMap,
	config: &Configuration,
) -> Result<VerificationOptions, ErrorKind> {
	let required = |name: &'static str| {
		resolve::string(payload, name)
			.or_else(|| config.metadata_str(name))
			.map(str::to_owned)
			.ok_or(ErrorKind::MissingVerificationInput { field: name })
	};
	let jwks_uri = required("jwks_uri")?;
	let issuer = required("issuer")?;
	let mut audience = resolve::strings(payload, "audience");

	if audience.is_empty() {
		audience.extend(resolve::string(payload, "client_id").map(str::to_owned));
	}
	if audience.is_empty() {
		return Err(ErrorKind::MissingVerificationInput { field: "audience" });
	}

	let options = VerificationOptions {
		issuer,
		audience,
		jwks_uri,
		nonce: resolve::string(payload, "nonce").map(str::to_owned),
		..Default::default()
	};

	Ok(options.with_parameters(payload))
}

/// Checks the `nonce` claim against the expected value, independently of the verifier.
pub fn check_nonce(claims: &ParameterMap, expected: Option<&str>) -> Result<(), ErrorKind> {
	let Some(claimed) = claims.get("nonce") else {
		return Ok(());
	};

	if claimed.as_str() == expected {
		Ok(())
	} else {
		Err(ErrorKind::ClaimValidation {
			claim: "nonce",
			reason: format!("expected {expected:?}, received {claimed}"),
		})
	}
}

/// Verifies the configured (or inline) `id_token` and returns its claims as a delta.
pub async fn verify_token(
	verifier: &dyn JwtVerifier,
	config: &Configuration,
	request: &DriverRequest,
) -> Result<Delta> {
	let payload = resolve::resolve(Endpoint::VerifyToken, config, &request.parameters)?;
	let token = resolve::string(&payload, "id_token")
		.ok_or_else(|| Error::new(CAUSE, ErrorKind::MissingToken { token: "id_token".into() }))?;
	let options = verification_options(&payload, config).map_err(|kind| Error::new(CAUSE, kind))?;
	let claims = verifier.verify(token, &options).await.map_err(|e| e.with_cause(CAUSE))?;

	check_nonce(&claims, options.nonce.as_deref()).map_err(|kind| Error::new(CAUSE, kind))?;

	tracing::debug!(issuer = %options.issuer, claims = claims.len(), "ID token verified.");

	Ok(Delta { id_token: Some(claims), ..Default::default() })
}

impl<C> Session<C>
where
	C: ?Sized + HttpClient,
{
	/// Verifies the ID token and stores its claims; the live parameters are left untouched.
	pub async fn verify_token(&self, request: DriverRequest) -> Result<IdToken> {
		let span = FlowSpan::new(CAUSE, "verify_token");

		obs::record_flow_outcome(CAUSE, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let (config, _) = self.view();
				let delta = verify_token(self.verifier(), &config, &request).await?;
				let claims = delta.id_token.clone().unwrap_or_default();

				self.apply(CAUSE, delta)?;

				Ok(claims)
			})
			.await;

		obs::record_flow_result(CAUSE, &result);

		result
	}
}
