#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use bearer_gateway::{
	auth::CredentialPair,
	error::Error,
	gateway::{GatewayConfig, RequestOptions, ReqwestGateway},
	identity::Role,
	session::SessionLog,
	store::{CredentialStore, MemoryStore},
	url::Url,
};

fn gateway(server: &MockServer) -> (ReqwestGateway, Arc<MemoryStore>, Arc<SessionLog>) {
	let config = GatewayConfig::builder()
		.api_base(Url::parse(&server.base_url()).expect("Mock server URL should parse."))
		.build()
		.expect("Gateway configuration should build.");
	let backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn CredentialStore> = backend.clone();
	let log = Arc::new(SessionLog::default());
	let gateway = ReqwestGateway::new(config, store).with_session_listener(log.clone());

	(gateway, backend, log)
}

#[tokio::test]
async fn login_stores_the_issued_pair() {
	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/login")
				.json_body(json!({ "username": "admin", "password": "admin123" }));
			then.status(200).json_body(json!({
				"accessToken": "A1",
				"refreshToken": "R1",
				"type": "Bearer",
				"user": {
					"id": 1,
					"username": "admin",
					"email": "admin@example.com",
					"firstName": "System",
					"lastName": "Admin",
					"role": "ADMIN"
				}
			}));
		})
		.await;
	let tasks = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/tasks").header("authorization", "Bearer A1");
			then.status(200).body("[]");
		})
		.await;
	let (gateway, store, _) = gateway(&server);
	let issued = gateway.login("admin", "admin123").await.expect("Login should succeed.");
	let user = issued.user.as_ref().expect("Login should return the account.");

	assert_eq!(user.role, Role::Admin);
	assert_eq!(issued.token_type, "Bearer");
	assert_eq!(store.snapshot(), Some(CredentialPair::new("A1", "R1")));

	let response =
		gateway.get("/api/tasks", RequestOptions::new()).await.expect("Request should succeed.");

	assert!(response.is_success());
	login.assert_calls_async(1).await;
	tasks.assert_calls_async(1).await;
}

#[tokio::test]
async fn rejected_login_leaves_the_store_alone() {
	let server = MockServer::start_async().await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200);
		})
		.await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(401).body("Bad credentials");
		})
		.await;
	let (gateway, store, log) = gateway(&server);
	let err = gateway.login("admin", "wrong").await.expect_err("Bad credentials must fail.");

	assert!(matches!(err, Error::InvalidCredentials), "Unexpected error: {err:?}");
	assert!(store.snapshot().is_none());
	assert_eq!(log.episodes(), 0);
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn throttled_login_surfaces_retry_after() {
	let server = MockServer::start_async().await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(429).header("retry-after", "30");
		})
		.await;
	let (gateway, _, _) = gateway(&server);
	let err = gateway.login("admin", "admin123").await.expect_err("Throttled logins must fail.");

	match err {
		Error::LoginThrottled { retry_after } =>
			assert_eq!(retry_after, Some(time::Duration::seconds(30))),
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn other_login_failures_carry_status_and_body() {
	let server = MockServer::start_async().await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(503).body("maintenance");
		})
		.await;
	let (gateway, _, _) = gateway(&server);
	let err = gateway.login("admin", "admin123").await.expect_err("503 must fail.");

	assert!(
		matches!(err, Error::Api { status: 503, ref body } if body == "maintenance"),
		"Unexpected error: {err:?}"
	);
}

#[tokio::test]
async fn logout_clears_the_store_without_notifying() {
	let server = MockServer::start_async().await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).json_body(json!({ "accessToken": "A2", "refreshToken": "R2" }));
		})
		.await;
	let tasks = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/tasks");
			then.status(401);
		})
		.await;
	let (gateway, store, log) = gateway(&server);

	store.save(CredentialPair::new("A1", "R1")).await.expect("Seeding should succeed.");
	gateway.logout().await.expect("Logout should succeed.");

	assert!(store.snapshot().is_none());
	assert_eq!(log.episodes(), 0);

	// Signed-out requests go out without a credential; a 401 now ends the session.
	let err = gateway
		.get("/api/tasks", RequestOptions::new())
		.await
		.expect_err("A 401 without credentials ends the session.");

	assert!(err.is_session_ended());
	tasks.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn blank_issued_credentials_are_not_stored() {
	let server = MockServer::start_async().await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200).json_body(json!({ "accessToken": "", "refreshToken": "R1" }));
		})
		.await;
	let (gateway, store, log) = gateway(&server);
	let err = gateway.login("admin", "admin123").await.expect_err("Blank tokens must fail.");

	assert!(matches!(err, Error::BlankCredential), "Unexpected error: {err:?}");
	assert!(store.snapshot().is_none());
	assert_eq!(log.episodes(), 0);
}
