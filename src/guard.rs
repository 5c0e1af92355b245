//! Route guard surface.

// self
use crate::{_prelude::*, flows::Session, http::HttpClient, obs::FlowSpan, resolve};

/// Decision returned by [`Session::guard`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
	/// The session holds a verified subject.
	Allow,
	/// No subject; send the user to the contained route.
	Redirect(Url),
}
impl GuardOutcome {
	/// Returns `true` for [`GuardOutcome::Allow`].
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allow)
	}
}

impl<C> Session<C>
where
	C: ?Sized + HttpClient,
{
	/// Recovers sealed redirect state, then allows navigation only when the ID token carries a
	/// `sub` claim.
	pub fn guard(&self, redirect_to: &Url) -> Result<GuardOutcome> {
		let _span = FlowSpan::new(Cause::Guard, "guard").entered();

		self.recover_state().map_err(|e| e.with_cause(Cause::Guard))?;

		if resolve::string(&self.id_token(), "sub").is_some() {
			return Ok(GuardOutcome::Allow);
		}

		tracing::debug!(%redirect_to, "No verified subject; redirecting.");

		Ok(GuardOutcome::Redirect(redirect_to.clone()))
	}
}
