//! Session context and the endpoint drivers that act on it.
//!
//! A [`Session`] owns the normalized [`Configuration`], the verified ID token claims, and the
//! pending flow record behind one shared context. Drivers never mutate that context directly:
//! each one reads a snapshot, talks to the provider, and returns a [`Delta`] that the session
//! applies in a single merge step before persisting it (when the `storage` option is on).

pub mod authorization;
pub mod common;
pub mod discovery;
pub mod response;
pub mod revocation;
pub mod token;
pub mod verify_token;

pub use common::*;

// self
use crate::{
	_prelude::*,
	codec,
	config::{self, Configuration},
	host::Host,
	http::HttpClient,
	obs::FlowSpan,
	resolve,
	store::{SessionStore, Snapshot},
	transport::Transport,
	verify::JwtVerifier,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Session specialized for the crate's default reqwest transport.
pub type ReqwestSession = Session<ReqwestHttpClient>;

/// Verified ID token claims.
pub type IdToken = ParameterMap;

/// Transient per-flow secrets handed from the authorization redirect to the token exchange.
///
/// The record survives the redirect inside the sealed state and is consumed by the first
/// authorization-code exchange.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFlow {
	/// PKCE verifier staged by the authorization driver.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code_verifier: Option<String>,
}
impl PendingFlow {
	/// Returns `true` when nothing is staged.
	pub fn is_empty(&self) -> bool {
		self.code_verifier.is_none()
	}
}
impl Debug for PendingFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingFlow")
			.field("code_verifier_set", &self.code_verifier.is_some())
			.finish()
	}
}

#[derive(Debug, Default)]
struct Context {
	configuration: Configuration,
	id_token: IdToken,
	pending: PendingFlow,
}
impl Context {
	fn snapshot(&self) -> Snapshot {
		Snapshot {
			configuration: self.configuration.to_value(),
			id_token: self.id_token.clone(),
			pending: self.pending.clone(),
		}
	}

	fn restore_persisted(&mut self, store: &SessionStore) -> Result<()> {
		if !self.configuration.configuration.storage() {
			return Ok(());
		}

		let Some(snapshot) = store.load()? else {
			return Ok(());
		};

		tracing::debug!("Restoring persisted session.");

		self.restore(snapshot).map_err(|e| e.with_cause(Cause::Storage))
	}

	fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
		self.configuration = config::normalize(&snapshot.configuration, None)?;
		self.id_token = snapshot.id_token;
		self.pending = snapshot.pending;

		Ok(())
	}
}

/// OAuth 2.0 / OIDC client session bound to one host page.
///
/// Calls against the same session must be serialized by the caller; the context lock only
/// guards individual merge steps, never a whole driver.
pub struct Session<C>
where
	C: ?Sized + HttpClient,
{
	host: Arc<dyn Host>,
	transport: Transport<C>,
	verifier: Arc<dyn JwtVerifier>,
	store: SessionStore,
	context: Arc<Mutex<Context>>,
}
impl<C> Session<C>
where
	C: ?Sized + HttpClient,
{
	/// Normalizes `config` against the current page and builds a session.
	///
	/// When the `storage` option is on and a previous page persisted a session, the persisted
	/// configuration, ID token, and pending flow replace the static input. Unreadable entries
	/// are logged and cleared, and the static input is used instead.
	pub fn new(
		host: Arc<dyn Host>,
		http_client: impl Into<Arc<C>>,
		verifier: Arc<dyn JwtVerifier>,
		config: &Value,
	) -> Result<Self> {
		let configuration = config::normalize(config, Some(&host.page_url()))?;
		let store = SessionStore::new(Arc::clone(&host));
		let mut context = Context { configuration, ..Default::default() };

		if let Err(e) = context.restore_persisted(&store) {
			tracing::warn!(error = %e, "Discarding unreadable persisted session.");

			store.clear();
		}

		Ok(Self {
			host,
			transport: Transport::new(http_client.into()),
			verifier,
			store,
			context: Arc::new(Mutex::new(context)),
		})
	}

	/// Restores sealed redirect state, then intercepts the redirect response.
	///
	/// Run once per page load before any other driver.
	pub fn initialize(&self) -> Result<ParameterMap> {
		self.recover_state()?;

		self.intercept()
	}

	/// Copy of the current configuration.
	pub fn configuration(&self) -> Configuration {
		self.context.lock().configuration.clone()
	}

	/// Copy of the verified ID token claims.
	pub fn id_token(&self) -> IdToken {
		self.context.lock().id_token.clone()
	}

	/// Copy of the pending flow record.
	pub fn pending(&self) -> PendingFlow {
		self.context.lock().pending.clone()
	}

	/// Host the session runs on.
	pub fn host(&self) -> &Arc<dyn Host> {
		&self.host
	}

	/// Replaces the configuration with a freshly normalized `config`, clearing the ID token and
	/// any pending flow.
	pub fn reset(&self, config: &Value) -> Result<()> {
		let configuration = config::normalize(config, Some(&self.host.page_url()))?;

		{
			let mut context = self.context.lock();

			*context = Context { configuration, ..Default::default() };
		}

		self.store.clear();
		self.persist();

		Ok(())
	}

	/// Seals the current context into the cookie and session-storage pair.
	pub fn save_state(&self) -> Result<()> {
		let snapshot = self.context.lock().snapshot();

		codec::save(self.host.as_ref(), &snapshot)
	}

	/// Consumes sealed redirect state, restoring it only while no flow is live.
	///
	/// Returns `true` when the context was replaced.
	pub fn recover_state(&self) -> Result<bool> {
		let _span = FlowSpan::new(Cause::RecoverState, "recover_state").entered();
		let Some(snapshot) = codec::recover(self.host.as_ref())? else {
			return Ok(false);
		};

		{
			let mut context = self.context.lock();

			if context.configuration.has_flow_state() || !context.id_token.is_empty() {
				tracing::warn!("Live session state present; discarding recovered redirect state.");

				return Ok(false);
			}

			context.restore(snapshot).map_err(|e| e.with_cause(Cause::RecoverState))?;
		}

		self.persist();

		Ok(true)
	}

	pub(crate) fn transport(&self) -> &Transport<C> {
		&self.transport
	}

	pub(crate) fn verifier(&self) -> &dyn JwtVerifier {
		self.verifier.as_ref()
	}

	pub(crate) fn view(&self) -> (Configuration, PendingFlow) {
		let context = self.context.lock();

		(context.configuration.clone(), context.pending.clone())
	}

	/// Applies `delta` in one merge step and persists the result.
	///
	/// Returns the normalized parameters merged by the delta.
	pub(crate) fn apply(&self, cause: Cause, delta: Delta) -> Result<ParameterMap> {
		let merged = {
			let mut context = self.context.lock();
			let merged =
				resolve::update(&mut context.configuration.parameters, delta.parameters, cause)?;

			if let Some(metadata) = delta.metadata {
				context.configuration.metadata = metadata;
			}
			if let Some(id_token) = delta.id_token {
				context.id_token = id_token;
			}
			if let Some(pending) = delta.pending {
				context.pending = pending;
			}

			merged
		};

		self.persist();

		Ok(merged)
	}

	fn persist(&self) {
		let snapshot = {
			let context = self.context.lock();

			if !context.configuration.configuration.storage() {
				return;
			}

			context.snapshot()
		};

		if let Err(e) = self.store.save(&snapshot) {
			tracing::warn!(error = %e, "Failed to persist session state.");
		}
	}
}
impl<C> Clone for Session<C>
where
	C: ?Sized + HttpClient,
{
	fn clone(&self) -> Self {
		Self {
			host: Arc::clone(&self.host),
			transport: self.transport.clone(),
			verifier: Arc::clone(&self.verifier),
			store: self.store.clone(),
			context: Arc::clone(&self.context),
		}
	}
}
impl<C> Debug for Session<C>
where
	C: ?Sized + HttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let context = self.context.lock();

		f.debug_struct("Session")
			.field("configuration", &context.configuration)
			.field("id_token_claims", &context.id_token.keys().collect::<Vec<_>>())
			.field("pending", &context.pending)
			.finish()
	}
}
