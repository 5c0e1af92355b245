//! JSON GET/POST over an [`HttpClient`], decoding provider responses into parameter maps.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method, Request, StatusCode,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	config::JSON_CONTENT_TYPE,
	error::{ProviderError, TransportError},
	http::{HttpClient, ResponseMetadata, ResponseMetadataSlot},
	resolve,
};

const BODY_SNIPPET_LEN: usize = 256;

/// Extra request headers, keyed by header name.
pub type Headers = BTreeMap<String, String>;

/// Builds a bearer `Authorization` header value.
pub fn bearer(token: &str) -> String {
	format!("Bearer {token}")
}

/// Builds an HTTP Basic `Authorization` header value.
pub fn basic(username: &str, password: &str) -> String {
	format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Provider-facing HTTP helper shared by every driver.
pub struct Transport<C>
where
	C: ?Sized + HttpClient,
{
	client: Arc<C>,
}
impl<C> Transport<C>
where
	C: ?Sized + HttpClient,
{
	/// Wraps a shared HTTP client.
	pub fn new(client: Arc<C>) -> Self {
		Self { client }
	}

	/// Issues a GET with `params` appended to the query string.
	pub async fn get(
		&self,
		url: &Url,
		params: &ParameterMap,
		headers: &Headers,
	) -> Result<ParameterMap, ErrorKind> {
		let request = build(Method::GET, url, params, headers, None)?;

		self.send(request).await
	}

	/// Issues a POST with `body` encoded per `content_type` (form unless JSON is requested).
	pub async fn post(
		&self,
		url: &Url,
		body: &ParameterMap,
		content_type: &str,
		params: &ParameterMap,
		headers: &Headers,
	) -> Result<ParameterMap, ErrorKind> {
		let encoded = if content_type.eq_ignore_ascii_case(JSON_CONTENT_TYPE) {
			serde_json::to_vec(body).map_err(|e| TransportError::Other { message: e.to_string() })?
		} else {
			url::form_urlencoded::Serializer::new(String::new())
				.extend_pairs(resolve::to_wire_pairs(body))
				.finish()
				.into_bytes()
		};
		let request = build(Method::POST, url, params, headers, Some((content_type, encoded)))?;

		self.send(request).await
	}

	async fn send(&self, request: HttpRequest) -> Result<ParameterMap, ErrorKind> {
		let slot = ResponseMetadataSlot::default();
		let handle = self.client.with_metadata(slot.clone());

		tracing::debug!(method = %request.method(), uri = %request.uri(), "Calling provider.");

		let response = handle.call(request).await.map_err(map_http_error)?;

		decode(response, slot.take())
	}
}
impl<C> Clone for Transport<C>
where
	C: ?Sized + HttpClient,
{
	fn clone(&self) -> Self {
		Self { client: Arc::clone(&self.client) }
	}
}
impl<C> Debug for Transport<C>
where
	C: ?Sized + HttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Transport(..)")
	}
}

/// Maps an [`HttpClientError`] emitted by a handle into a [`TransportError`].
pub fn map_http_error<E>(err: HttpClientError<E>) -> TransportError
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner),
		HttpClientError::Http(inner) => TransportError::Request(inner),
		HttpClientError::Io(inner) => TransportError::Io(inner),
		HttpClientError::Other(message) => TransportError::Other { message },
		_ => TransportError::Other { message: "unclassified HTTP client failure".into() },
	}
}

fn build(
	method: Method,
	url: &Url,
	params: &ParameterMap,
	headers: &Headers,
	body: Option<(&str, Vec<u8>)>,
) -> Result<HttpRequest, TransportError> {
	let mut target = url.clone();

	if !params.is_empty() {
		target.query_pairs_mut().extend_pairs(resolve::to_wire_pairs(params));
	}

	let mut builder =
		Request::builder().method(method).uri(target.as_str()).header(ACCEPT, JSON_CONTENT_TYPE);

	for (name, value) in headers {
		builder = builder.header(name.as_str(), value.as_str());
	}

	let body = match body {
		Some((content_type, bytes)) => {
			builder = builder.header(CONTENT_TYPE, content_type);

			bytes
		},
		None => Vec::new(),
	};

	Ok(builder.body(body)?)
}

fn decode(
	response: HttpResponse,
	meta: Option<ResponseMetadata>,
) -> Result<ParameterMap, ErrorKind> {
	let status = response.status();
	let body = response.body();
	let decoded = decode_body(body, status);

	if !status.is_success() {
		let provider = decoded
			.as_ref()
			.ok()
			.and_then(|params| ProviderError::from_parameters(params, Some(status.as_u16())));

		if let Some(err) = provider {
			return Err(err.into());
		}

		let snippet: String =
			String::from_utf8_lossy(body).chars().take(BODY_SNIPPET_LEN).collect();

		return Err(TransportError::Status {
			status: status.as_u16(),
			retry_after: meta.and_then(|meta| meta.retry_after),
			body: snippet,
		}
		.into());
	}

	let params = decoded?;

	if let Some(err) = ProviderError::from_parameters(&params, Some(status.as_u16())) {
		return Err(err.into());
	}

	Ok(params)
}

fn decode_body(body: &[u8], status: StatusCode) -> Result<ParameterMap, TransportError> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(ParameterMap::new());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransportError::Decode { source, status: Some(status.as_u16()) })
}
