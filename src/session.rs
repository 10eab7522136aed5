//! Session termination signals.
//!
//! The gateway never navigates or prompts by itself. When a refresh episode fails it clears the
//! credential store and notifies a [`SessionListener`] exactly once for that episode, no matter how
//! many requests were waiting on it. Embedders decide what to do next, typically routing the user
//! to a login surface.

// self
use crate::_prelude::*;

/// Why a session ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEndReason {
	/// A refresh was needed but no refresh credential was stored.
	RefreshUnavailable,
	/// The identity endpoint answered the refresh exchange with a non-success status.
	RefreshRejected {
		/// HTTP status returned by the identity endpoint.
		status: u16,
	},
	/// The identity endpoint answered with a body that is not a credential pair.
	RefreshMalformed {
		/// Decoder diagnostics.
		message: String,
	},
	/// The identity endpoint could not be reached.
	RefreshUnreachable {
		/// Transport diagnostics.
		message: String,
	},
	/// The refresh exchange exceeded the configured deadline.
	RefreshTimedOut,
	/// The credential store failed while reading or persisting the pair during a refresh.
	StoreFailure {
		/// Store diagnostics.
		message: String,
	},
	/// The user signed out while requests were still in flight.
	SignedOut,
}
impl SessionEndReason {
	/// Stable label suitable for span or metric fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::RefreshUnavailable => "refresh_unavailable",
			Self::RefreshRejected { .. } => "refresh_rejected",
			Self::RefreshMalformed { .. } => "refresh_malformed",
			Self::RefreshUnreachable { .. } => "refresh_unreachable",
			Self::RefreshTimedOut => "refresh_timed_out",
			Self::StoreFailure { .. } => "store_failure",
			Self::SignedOut => "signed_out",
		}
	}
}
impl Display for SessionEndReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::RefreshUnavailable => f.write_str("no refresh token is available"),
			Self::RefreshRejected { status } =>
				write!(f, "identity endpoint rejected the refresh with status {status}"),
			Self::RefreshMalformed { message } =>
				write!(f, "identity endpoint returned a malformed refresh response ({message})"),
			Self::RefreshUnreachable { message } =>
				write!(f, "identity endpoint is unreachable ({message})"),
			Self::RefreshTimedOut => f.write_str("refresh exchange timed out"),
			Self::StoreFailure { message } => write!(f, "credential store failed ({message})"),
			Self::SignedOut => f.write_str("the user signed out"),
		}
	}
}

/// Receives session-ended notifications.
pub trait SessionListener
where
	Self: Send + Sync,
{
	/// Called once per failed refresh episode, after the credential store was cleared.
	fn session_ended(&self, reason: &SessionEndReason);
}
impl<F> SessionListener for F
where
	F: Fn(&SessionEndReason) + Send + Sync,
{
	fn session_ended(&self, reason: &SessionEndReason) {
		self(reason)
	}
}

/// Listener that ignores notifications.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSessionListener;
impl SessionListener for NoopSessionListener {
	fn session_ended(&self, _: &SessionEndReason) {}
}

/// Listener that records every notification so UIs and tests can poll it.
#[derive(Debug, Default)]
pub struct SessionLog {
	reasons: Mutex<Vec<SessionEndReason>>,
}
impl SessionLog {
	/// Number of session-ended episodes observed so far.
	pub fn episodes(&self) -> usize {
		self.reasons.lock().len()
	}

	/// Most recent reason, if any episode happened.
	pub fn last_reason(&self) -> Option<SessionEndReason> {
		self.reasons.lock().last().cloned()
	}

	/// Every recorded reason, oldest first.
	pub fn reasons(&self) -> Vec<SessionEndReason> {
		self.reasons.lock().clone()
	}
}
impl SessionListener for SessionLog {
	fn session_ended(&self, reason: &SessionEndReason) {
		self.reasons.lock().push(reason.clone());
	}
}
