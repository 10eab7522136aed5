// std
use std::sync::Arc;
// self
use bearer_gateway::{
	auth::{CredentialKey, CredentialPair},
	store::{CredentialStore, FileStore, MemoryStore},
};

#[tokio::test]
async fn memory_store_clones_share_one_slot() {
	let store = MemoryStore::default();
	let shared: Arc<dyn CredentialStore> = Arc::new(store.clone());

	shared.save(CredentialPair::new("A1", "R1")).await.expect("Save should succeed.");

	assert_eq!(store.snapshot(), Some(CredentialPair::new("A1", "R1")));

	shared.save(CredentialPair::new("A2", "R2")).await.expect("Save should succeed.");

	let access = shared.get(CredentialKey::AccessToken).await.expect("Reads should succeed.");
	let refresh = shared.get(CredentialKey::RefreshToken).await.expect("Reads should succeed.");

	assert_eq!(access.as_ref().map(|secret| secret.expose()), Some("A2"));
	assert_eq!(refresh.as_ref().map(|secret| secret.expose()), Some("R2"));

	shared.clear().await.expect("Clear should succeed.");

	assert!(store.snapshot().is_none());
	assert!(shared.fetch().await.expect("Reads should succeed.").is_none());
}

#[tokio::test]
async fn file_store_clear_removes_the_document() {
	let path = std::env::temp_dir()
		.join(format!("bearer-gateway-store-{}", std::process::id()))
		.join("session.json");
	let store = FileStore::open(&path).expect("File store should open.");

	store.save(CredentialPair::new("A1", "R1")).await.expect("Save should succeed.");

	let document: serde_json::Value =
		serde_json::from_slice(&std::fs::read(&path).expect("Document should exist."))
			.expect("Document should be JSON.");

	assert_eq!(document["accessToken"], "A1");
	assert_eq!(document["refreshToken"], "R1");

	store.clear().await.expect("Clear should succeed.");

	assert!(!path.exists());
	assert!(
		FileStore::open(&path)
			.expect("File store should reopen.")
			.fetch()
			.await
			.expect("Reads should succeed.")
			.is_none()
	);

	store.clear().await.expect("Clearing twice should succeed.");

	if let Some(dir) = path.parent() {
		let _ = std::fs::remove_dir_all(dir);
	}
}
