//! Refresh coordination: at most one refresh exchange in flight per gateway.
//!
//! Every request notes the credential *generation* before it reads the store. When that request
//! later needs a renewal it calls `RefreshCoordinator::settle` with the generation it observed:
//!
//! - if a refresh settled after that generation, the caller joins its outcome without contacting
//!   the identity service;
//! - otherwise the caller becomes the leader, runs the exchange, and publishes the settlement as
//!   the next generation.
//!
//! Leadership is serialized by an async mutex, so a burst of 401s produces one exchange and every
//! waiter receives the same `Settlement`.

// self
use crate::{_prelude::*, auth::CredentialPair, session::SessionEndReason};

/// Observable coordinator phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshPhase {
	/// No refresh exchange is in flight.
	#[default]
	Idle,
	/// A leader is exchanging the refresh credential.
	Refreshing,
}

/// Outcome shared by every waiter of one refresh episode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Settlement {
	Renewed(CredentialPair),
	Ended(SessionEndReason),
}

/// How a caller took part in an episode.
#[derive(Debug)]
pub(crate) enum Turn {
	Led(Settlement),
	Joined(Settlement),
}
impl Turn {
	pub(crate) fn into_settlement(self) -> Settlement {
		match self {
			Turn::Led(settlement) | Turn::Joined(settlement) => settlement,
		}
	}
}

#[derive(Debug, Default)]
struct State {
	generation: u64,
	settled: Option<Settlement>,
	phase: RefreshPhase,
}
impl State {
	fn publish(&mut self, settlement: Settlement) {
		self.generation += 1;
		self.settled = Some(settlement);
	}
}

#[derive(Default)]
pub(crate) struct RefreshCoordinator {
	flight: AsyncMutex<()>,
	state: Mutex<State>,
}
impl RefreshCoordinator {
	/// Generation a request must record before reading the credential store.
	pub(crate) fn generation(&self) -> u64 {
		self.state.lock().generation
	}

	pub(crate) fn phase(&self) -> RefreshPhase {
		self.state.lock().phase
	}

	/// Joins the settlement published after `observed`, or leads a new episode with `lead`.
	pub(crate) async fn settle<F, Fut>(&self, observed: u64, lead: F) -> Turn
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Settlement>,
	{
		let _flight = self.flight.lock().await;

		if let Some(settled) = self.settled_since(observed) {
			return Turn::Joined(settled);
		}

		let settlement = {
			let _phase = PhaseGuard::enter(&self.state);

			lead().await
		};

		self.state.lock().publish(settlement.clone());

		Turn::Led(settlement)
	}

	/// Runs `write` while no refresh is in flight and publishes `settlement` once it succeeds.
	///
	/// Login and logout use this so a credential change they make is ordered against refresh episodes.
	pub(crate) async fn publish<F, Fut, E>(&self, write: F, settlement: Settlement) -> Result<(), E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<(), E>>,
	{
		let _flight = self.flight.lock().await;

		write().await?;
		self.state.lock().publish(settlement);

		Ok(())
	}

	fn settled_since(&self, observed: u64) -> Option<Settlement> {
		let state = self.state.lock();

		if state.generation > observed { state.settled.clone() } else { None }
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("RefreshCoordinator")
			.field("generation", &state.generation)
			.field("phase", &state.phase)
			.finish()
	}
}

/// Marks the coordinator as refreshing until dropped, including when the leader is cancelled.
struct PhaseGuard<'a>(&'a Mutex<State>);
impl<'a> PhaseGuard<'a> {
	fn enter(state: &'a Mutex<State>) -> Self {
		state.lock().phase = RefreshPhase::Refreshing;

		Self(state)
	}
}
impl Drop for PhaseGuard<'_> {
	fn drop(&mut self) {
		self.0.lock().phase = RefreshPhase::Idle;
	}
}
