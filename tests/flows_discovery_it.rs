#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use oauth2_redirect::{_preludet::*, flows::DriverRequest, guard::GuardOutcome};

const CLIENT_ID: &str = "client";

fn login_route() -> Url {
	Url::parse("https://app.example.com/login").expect("Login route should parse.")
}

fn oidc_session(verifier: Arc<ScriptedVerifier>, config: Value) -> ReqwestTestSession {
	build_reqwest_test_session(test_host(), verifier, config)
}

#[tokio::test]
async fn discovery_replaces_metadata_from_the_issuer() {
	let server = MockServer::start_async().await;
	let issuer = server.base_url();
	let session = oidc_session(
		Arc::new(ScriptedVerifier::default()),
		json!({
			"metadata": { "issuer": issuer, "token_endpoint": "https://stale.example.com/token" },
			"parameters": { "client_id": CLIENT_ID }
		}),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/openid-configuration");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"issuer": server.base_url(),
				"authorization_endpoint": server.url("/authorize"),
				"jwks_uri": server.url("/jwks"),
				"Vendor_Extension": true
			}));
		})
		.await;
	let metadata = session.discover(DriverRequest::new()).await.expect("Discovery should succeed.");

	mock.assert_async().await;

	let stored = session.configuration().metadata;

	assert_eq!(stored, metadata);
	assert_eq!(stored.get("jwks_uri"), Some(&json!(server.url("/jwks"))));
	assert_eq!(stored.get("vendor_extension"), Some(&json!(true)));
	assert!(!stored.contains_key("token_endpoint"), "Discovery replaces metadata wholesale.");
}

#[tokio::test]
async fn discovery_without_an_issuer_is_rejected() {
	let session = oidc_session(Arc::new(ScriptedVerifier::default()), json!({}));
	let err = session.discover(DriverRequest::new()).await.expect_err("An issuer is required.");

	assert_eq!(err.cause(), Cause::Discovery);
	assert!(matches!(err.kind(), ErrorKind::MissingEndpoint { endpoint: "discovery" }));
}

#[tokio::test]
async fn verified_subject_opens_the_guard() {
	let verifier =
		Arc::new(ScriptedVerifier::returning(json!({ "sub": "user-1", "nonce": "n1" })));
	let session = oidc_session(
		verifier.clone(),
		json!({
			"metadata": {
				"issuer": "https://id.example.com",
				"jwks_uri": "https://id.example.com/jwks"
			},
			"parameters": {
				"client_id": CLIENT_ID,
				"id_token": "header.payload.sig",
				"nonce": "n1"
			}
		}),
	);

	assert_eq!(
		session.guard(&login_route()).expect("Guard should evaluate."),
		GuardOutcome::Redirect(login_route())
	);

	let claims = session.verify_token(DriverRequest::new()).await.expect("Token should verify.");

	assert_eq!(claims.get("sub"), Some(&json!("user-1")));
	assert_eq!(session.id_token(), claims);
	assert!(session.guard(&login_route()).expect("Guard should evaluate.").is_allowed());

	let calls = verifier.calls();
	let (token, options) = calls.first().expect("Verifier should be called once.");

	assert_eq!(calls.len(), 1);
	assert_eq!(token, "header.payload.sig");
	assert_eq!(options.issuer, "https://id.example.com");
	assert_eq!(options.jwks_uri, "https://id.example.com/jwks");
	assert_eq!(options.audience, vec![CLIENT_ID.to_owned()]);
	assert_eq!(options.nonce.as_deref(), Some("n1"));
}

#[tokio::test]
async fn nonce_mismatch_keeps_the_guard_closed() {
	let session = oidc_session(
		Arc::new(ScriptedVerifier::returning(json!({ "sub": "user-1", "nonce": "n2" }))),
		json!({
			"metadata": {
				"issuer": "https://id.example.com",
				"jwks_uri": "https://id.example.com/jwks"
			},
			"parameters": {
				"client_id": CLIENT_ID,
				"id_token": "header.payload.sig",
				"nonce": "n1"
			}
		}),
	);
	let err = session.verify_token(DriverRequest::new()).await.expect_err("Nonce must match.");

	assert_eq!(err.cause(), Cause::VerifyToken);
	assert!(matches!(err.kind(), ErrorKind::ClaimValidation { claim: "nonce", .. }));
	assert!(session.id_token().is_empty());
	assert_eq!(
		session.guard(&login_route()).expect("Guard should evaluate."),
		GuardOutcome::Redirect(login_route())
	);
}

#[tokio::test]
async fn verification_requires_an_id_token() {
	let verifier = Arc::new(ScriptedVerifier::default());
	let session = oidc_session(
		verifier.clone(),
		json!({
			"metadata": {
				"issuer": "https://id.example.com",
				"jwks_uri": "https://id.example.com/jwks"
			},
			"parameters": { "client_id": CLIENT_ID }
		}),
	);
	let err = session.verify_token(DriverRequest::new()).await.expect_err("id_token is required.");

	assert!(matches!(err.kind(), ErrorKind::MissingToken { token } if token == "id_token"));
	assert!(verifier.calls().is_empty());
}
