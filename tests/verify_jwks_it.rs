#![cfg(all(feature = "reqwest", feature = "test", feature = "jwt"))]

// crates.io
use httpmock::prelude::*;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::json;
// self
use oauth2_redirect::{
	_preludet::*,
	flows::{DriverRequest, Session},
	host::Host,
	verify::{JwksVerifier, JwtVerifier, VerificationOptions},
};

const SIGNING_SECRET: &[u8] = b"redirect-state-test-signing-key-0001";
const SIGNING_SECRET_B64: &str = "cmVkaXJlY3Qtc3RhdGUtdGVzdC1zaWduaW5nLWtleS0wMDAx";
const ISSUER: &str = "https://id.example.com";
const CLIENT_ID: &str = "client-jwks";

fn sign(claims: Value) -> String {
	let header = Header { kid: Some("k1".into()), ..Header::new(Algorithm::HS256) };

	jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(SIGNING_SECRET))
		.expect("Fixture token should sign.")
}

fn claims(audience: &str, nonce: &str) -> Value {
	let now = OffsetDateTime::now_utc().unix_timestamp();

	json!({
		"iss": ISSUER,
		"aud": audience,
		"sub": "user-jwks",
		"nonce": nonce,
		"iat": now,
		"exp": now + 600
	})
}

async fn mock_jwks(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path("/jwks");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"keys": [{ "kty": "oct", "kid": "k1", "alg": "HS256", "k": SIGNING_SECRET_B64 }]
			}));
		})
		.await
}

fn options(server: &MockServer) -> VerificationOptions {
	VerificationOptions {
		issuer: ISSUER.into(),
		audience: vec![CLIENT_ID.into()],
		jwks_uri: server.url("/jwks"),
		..Default::default()
	}
}

#[tokio::test]
async fn signed_tokens_verify_against_the_cached_key_set() {
	let server = MockServer::start_async().await;
	let mock = mock_jwks(&server).await;
	let verifier = JwksVerifier::new(Arc::new(test_reqwest_http_client()));
	let options = options(&server);
	let token = sign(claims(CLIENT_ID, "n1"));
	let verified = verifier.verify(&token, &options).await.expect("Token should verify.");

	assert_eq!(verified.get("sub"), Some(&json!("user-jwks")));

	verifier.verify(&token, &options).await.expect("Token should verify again.");
	mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn foreign_audiences_are_rejected() {
	let server = MockServer::start_async().await;
	let _mock = mock_jwks(&server).await;
	let verifier = JwksVerifier::new(Arc::new(test_reqwest_http_client()));
	let token = sign(claims("someone-else", "n1"));
	let err = verifier.verify(&token, &options(&server)).await.expect_err("Audience must match.");

	assert_eq!(err.cause(), Cause::VerifyToken);
	assert!(matches!(err.kind(), ErrorKind::Verifier(_)));
}

#[tokio::test]
async fn session_verification_feeds_the_guard() {
	let server = MockServer::start_async().await;
	let _mock = mock_jwks(&server).await;
	let client = Arc::new(test_reqwest_http_client());
	let host: Arc<dyn Host> = test_host();
	let verifier: Arc<dyn JwtVerifier> = Arc::new(JwksVerifier::new(Arc::clone(&client)));
	let session: ReqwestTestSession = Session::new(
		host,
		client,
		verifier,
		&json!({
			"metadata": { "issuer": ISSUER, "jwks_uri": server.url("/jwks") },
			"parameters": {
				"client_id": CLIENT_ID,
				"id_token": sign(claims(CLIENT_ID, "n1")),
				"nonce": "n1"
			}
		}),
	)
	.expect("Configuration should normalize.");
	let login = Url::parse("https://app.example.com/login").expect("Login route should parse.");

	assert!(!session.guard(&login).expect("Guard should evaluate.").is_allowed());

	let claims = session.verify_token(DriverRequest::new()).await.expect("Token should verify.");

	assert_eq!(claims.get("nonce"), Some(&json!("n1")));
	assert!(session.guard(&login).expect("Guard should evaluate.").is_allowed());
}
