//! Redirect response interceptor.
//!
//! On page load the provider's answer sits in the URL fragment (implicit and hybrid grants) or
//! the query string (code grant). The interceptor lifts it out, scrubs the visible URL, checks
//! the `state` round-trip, and merges the carried values into the live parameters.

// self
use crate::{
	_prelude::*,
	config::Configuration,
	error::ProviderError,
	flows::{
		Session,
		common::{self, Delta},
	},
	http::HttpClient,
	obs::{self, FlowOutcome, FlowSpan},
	resolve,
};

const CAUSE: Cause = Cause::Response;

/// Extracts redirect-carried parameters: the fragment when non-empty, else the query string.
pub fn carried_parameters(url: &Url) -> ParameterMap {
	let raw = match url.fragment().filter(|fragment| !fragment.is_empty()) {
		Some(fragment) => fragment,
		None => url.query().unwrap_or_default(),
	};

	url::form_urlencoded::parse(raw.as_bytes())
		.map(|(name, value)| (name.to_ascii_lowercase(), Value::from(value.into_owned())))
		.collect()
}

/// Validates carried parameters against the issued `state` and turns them into a delta.
///
/// A configured `state` must come back unchanged; a provider `error` fails without merging.
/// A relative `expires_in` is made absolute against `now`, matching token responses.
pub fn intercept(
	config: &Configuration,
	mut carried: ParameterMap,
	now: OffsetDateTime,
) -> Result<Delta> {
	if let Some(expected) = resolve::string(&config.parameters, "state") {
		let received = resolve::string(&carried, "state");

		if received != Some(expected) {
			return Err(Error::new(
				CAUSE,
				ErrorKind::StateMismatch {
					expected: expected.to_owned(),
					received: received.map(str::to_owned),
				},
			));
		}
	}
	if let Some(error) = ProviderError::from_parameters(&carried, None) {
		return Err(Error::new(CAUSE, error));
	}

	common::absolute_expiry(&mut carried, now);

	Ok(Delta { parameters: carried, ..Default::default() })
}

impl<C> Session<C>
where
	C: ?Sized + HttpClient,
{
	/// Intercepts the redirect response carried by the current page URL.
	///
	/// Returns the newly merged parameters, or an empty map when nothing was carried.
	pub fn intercept(&self) -> Result<ParameterMap> {
		let _span = FlowSpan::new(CAUSE, "intercept").entered();

		obs::record_flow_outcome(CAUSE, FlowOutcome::Attempt);

		let result = self.intercept_now();

		obs::record_flow_result(CAUSE, &result);

		result
	}

	fn intercept_now(&self) -> Result<ParameterMap> {
		let page = self.host().page_url();
		let carried = carried_parameters(&page);
		let (config, _) = self.view();

		if page.query().is_some() || page.fragment().is_some() {
			let mut scrubbed = page.clone();

			scrubbed.set_query(None);
			scrubbed.set_fragment(None);

			if config.configuration.test() {
				tracing::info!(url = %scrubbed, "Test mode; keeping the redirect URL.");
			} else {
				self.host().replace_url(&scrubbed);
			}
		}
		if carried.is_empty() {
			return Ok(ParameterMap::new());
		}

		tracing::debug!(
			parameters = ?carried.keys().collect::<Vec<_>>(),
			"Intercepted redirect response."
		);

		let delta = intercept(&config, carried, self.host().now())?;

		self.apply(CAUSE, delta)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::config;

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("Fixture URL should parse.")
	}

	fn now() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_700_000_000)
			.expect("Fixture timestamp should be valid.")
	}

	fn with_state(state: &str) -> Configuration {
		config::normalize(&json!({ "parameters": { "state": state } }), None)
			.expect("Fixture configuration should normalize.")
	}

	#[test]
	fn fragment_wins_over_query() {
		let carried = carried_parameters(&url("https://app.example.com/cb?code=q#access_token=f"));

		assert_eq!(carried.get("access_token"), Some(&json!("f")));
		assert!(!carried.contains_key("code"));

		let carried = carried_parameters(&url("https://app.example.com/cb?code=q&State=s#"));

		assert_eq!(carried.get("code"), Some(&json!("q")));
		assert_eq!(carried.get("state"), Some(&json!("s")));
		assert!(carried_parameters(&url("https://app.example.com/cb")).is_empty());
	}

	#[test]
	fn state_round_trip_is_enforced() {
		let config = with_state("abc");
		let ok = carried_parameters(&url("https://app.example.com/cb?code=c1&state=abc"));
		let delta = intercept(&config, ok, now()).expect("Matching state should pass.");

		assert_eq!(delta.parameters.get("code"), Some(&json!("c1")));

		let bad = carried_parameters(&url("https://app.example.com/cb?code=c1&state=xyz"));
		let err = intercept(&config, bad, now()).expect_err("Mismatched state must fail.");

		assert_eq!(err.cause(), Cause::Response);
		assert!(matches!(
			err.kind(),
			ErrorKind::StateMismatch { expected, received: Some(received) }
				if expected == "abc" && received == "xyz"
		));

		let missing = carried_parameters(&url("https://app.example.com/cb?code=c1"));

		assert!(intercept(&config, missing, now()).is_err());
	}

	#[test]
	fn provider_errors_are_surfaced() {
		let carried = carried_parameters(&url(
			"https://app.example.com/cb?error=access_denied&error_description=denied&state=abc",
		));
		let err =
			intercept(&with_state("abc"), carried, now()).expect_err("Provider error must fail.");

		assert!(matches!(
			err.kind(),
			ErrorKind::Provider(ProviderError { error, .. }) if error == "access_denied"
		));
	}

	#[test]
	fn fragment_expiry_matches_token_responses() {
		let carried = carried_parameters(&url(
			"https://app.example.com/cb#access_token=X&expires_in=3600&state=abc",
		));
		let delta = intercept(&with_state("abc"), carried, now()).expect("Callback should pass.");

		assert_eq!(delta.parameters.get("expires_in"), Some(&json!(1_700_003_600_000_i64)));
	}
}
