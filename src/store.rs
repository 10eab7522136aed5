//! Storage contracts and built-in credential stores.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, CredentialPair, TokenSecret},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the current session's credentials.
///
/// A store holds at most one [`CredentialPair`]; an empty store means logged out. Both halves are
/// written and cleared in a single operation so readers never observe a mixed pair.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the stored pair, if any.
	fn fetch(&self) -> StoreFuture<'_, Option<CredentialPair>>;

	/// Persists `pair`, replacing any previous pair.
	fn save(&self, pair: CredentialPair) -> StoreFuture<'_, ()>;

	/// Removes both credentials.
	fn clear(&self) -> StoreFuture<'_, ()>;

	/// Reads a single credential from the stored pair.
	fn get(&self, key: CredentialKey) -> StoreFuture<'_, Option<TokenSecret>> {
		Box::pin(async move { Ok(self.fetch().await?.map(|pair| pair.get(key).clone())) })
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
