//! Redirect-survivable OAuth 2.0 / OpenID Connect client core: strict configuration
//! normalization, per-endpoint parameter pipelines, and sealed cookie+session state for
//! browser-hosted applications.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod codec;
pub mod config;
pub mod error;
pub mod flows;
pub mod guard;
pub mod host;
pub mod http;
pub mod obs;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod transport;
pub mod verify;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		flows::Session,
		host::{Host, MemoryHost},
		http::ReqwestHttpClient,
		verify::{JwtVerifier, VerificationOptions, VerifyFuture},
	};

	/// Session type alias used by reqwest-backed integration tests.
	pub type ReqwestTestSession = Session<ReqwestHttpClient>;

	/// Page URL every test host starts on.
	pub const TEST_PAGE_URL: &str = "https://app.example.com/callback";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Creates a [`MemoryHost`] sitting on [`TEST_PAGE_URL`].
	pub fn test_host() -> Arc<MemoryHost> {
		Arc::new(MemoryHost::new(
			Url::parse(TEST_PAGE_URL).expect("Test page URL fixture should parse."),
		))
	}

	/// Constructs a [`Session`] backed by the provided host, a scripted verifier, and the
	/// reqwest transport used across integration tests.
	pub fn build_reqwest_test_session(
		host: Arc<MemoryHost>,
		verifier: Arc<ScriptedVerifier>,
		config: Value,
	) -> ReqwestTestSession {
		let host: Arc<dyn Host> = host;
		let verifier: Arc<dyn JwtVerifier> = verifier;

		Session::new(host, test_reqwest_http_client(), verifier, &config)
			.expect("Test configuration should normalize.")
	}

	/// [`JwtVerifier`] that returns fixed claims and records the options it was called with.
	#[derive(Debug, Default)]
	pub struct ScriptedVerifier {
		claims: Mutex<ParameterMap>,
		calls: Mutex<Vec<(String, VerificationOptions)>>,
	}
	impl ScriptedVerifier {
		/// Creates a verifier that accepts every token and returns `claims`.
		pub fn returning(claims: Value) -> Self {
			let claims = match claims {
				Value::Object(map) => map.into_iter().collect(),
				_ => ParameterMap::new(),
			};

			Self { claims: Mutex::new(claims), calls: Default::default() }
		}

		/// Returns every `(token, options)` pair seen so far.
		pub fn calls(&self) -> Vec<(String, VerificationOptions)> {
			self.calls.lock().clone()
		}
	}
	impl JwtVerifier for ScriptedVerifier {
		fn verify<'a>(
			&'a self,
			token: &'a str,
			options: &'a VerificationOptions,
		) -> VerifyFuture<'a> {
			self.calls.lock().push((token.to_owned(), options.clone()));

			let claims = self.claims.lock().clone();

			Box::pin(async move { Ok::<_, Error>(claims) })
		}
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::{
		error::{Cause, Error, ErrorKind, Result},
		resolve::ParameterMap,
	};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
