//! HTTP transport seam.
//!
//! [`HttpClient`] hands out [`AsyncHttpClient`] handles that publish [`ResponseMetadata`] into a
//! [`ResponseMetadataSlot`], so [`Transport`](crate::transport::Transport) can attach the
//! status code and `Retry-After` hint to failures regardless of the HTTP stack underneath.
//! Implementations call [`ResponseMetadataSlot::take`] before dispatching and
//! [`ResponseMetadataSlot::store`] as soon as a status is known.

pub use oauth2;

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

/// HTTP stack used for discovery, token, revocation, and JWKS requests.
///
/// Implementations are shared behind an `Arc` by the session, so they must be
/// `Send + Sync + 'static`. Handles own whatever they need for their request futures to stay
/// `Send` while a driver awaits them.
pub trait HttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying stack.
	type Error: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<'c, Error = HttpClientError<Self::Error>, Future: 'c + Send>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle that records response metadata in `slot`.
	///
	/// The handle must clear the slot before sending and store the status (and any
	/// `Retry-After` hint) once a response arrives, successful or not.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Metadata captured from the most recent HTTP response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code, if a response arrived.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Shared slot carrying [`ResponseMetadata`] from a handle back to the transport.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns and clears the captured metadata.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// reqwest-backed [`HttpClient`].
///
/// Provider endpoints answer directly, so the default client does not follow redirects. A
/// caller-supplied client passed to [`with_client`](Self::with_client) should be configured
/// the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Default for ReqwestHttpClient {
	fn default() -> Self {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.unwrap_or_default();

		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}
#[cfg(feature = "reqwest")]
impl HttpClient for ReqwestHttpClient {
	type Error = ReqwestError;
	type Handle = InstrumentedHandle;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		InstrumentedHandle(Arc::new((self.0.clone(), slot)))
	}
}

/// Handle returned by [`ReqwestHttpClient`]; records status and `Retry-After` per call.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<(ReqwestClient, ResponseMetadataSlot)>);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let inner = Arc::clone(&self.0);

		Box::pin(async move {
			let (client, slot) = &*inner;

			slot.take();

			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			slot.store(ResponseMetadata {
				status: Some(status.as_u16()),
				retry_after: parse_retry_after(&headers, OffsetDateTime::now_utc()),
			});

			let mut converted =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap, now: OffsetDateTime) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(secs.into()));
	}

	let delta = OffsetDateTime::parse(raw, &Rfc2822).ok()? - now;

	delta.is_positive().then_some(delta)
}
