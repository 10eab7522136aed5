//! Signs in, lists tasks through the gateway, and shows an expired access token being renewed
//! transparently. A local mock server stands in for the task backend and its identity service.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
use url::Url;
// self
use bearer_gateway::{
	gateway::{Gateway, GatewayConfig, RequestOptions},
	session::{SessionEndReason, SessionListener},
	store::{CredentialStore, MemoryStore},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Task {
	id: u64,
	title: String,
	status: String,
	project_id: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200).header("content-type", "application/json").body(
				r#"{"accessToken":"expired-access","refreshToken":"refresh-1","type":"Bearer"}"#,
			);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).header("content-type", "application/json").body(
				r#"{"accessToken":"fresh-access","refreshToken":"refresh-2","type":"Bearer"}"#,
			);
		})
		.await;
	let _expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/tasks").header("authorization", "Bearer expired-access");
			then.status(401);
		})
		.await;
	let tasks = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/tasks")
				.query_param("status", "TODO")
				.header("authorization", "Bearer fresh-access");
			then.status(200).header("content-type", "application/json").body(
				r#"[{"id":1,"title":"Write release notes","status":"TODO","projectId":3}]"#,
			);
		})
		.await;
	let config = GatewayConfig::builder().api_base(Url::parse(&server.base_url())?).build()?;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let listener: Arc<dyn SessionListener> = Arc::new(|reason: &SessionEndReason| {
		println!("Session ended ({reason}); route the user back to the login screen.");
	});
	let gateway = Gateway::new(config, store).with_session_listener(listener);
	let issued = gateway.login("admin", "admin123").await?;

	println!("Signed in with a {} credential.", issued.token_type);

	let response = gateway.get("/api/tasks", RequestOptions::new().query("status", "TODO")).await?;
	let listed: Vec<Task> = response.parse()?;

	for task in &listed {
		println!("#{} [{}] {} (project {})", task.id, task.status, task.title, task.project_id);
	}

	println!(
		"Refresh exchanges: {}, login calls: {}, refresh calls: {}, task calls: {}.",
		gateway.refresh_metrics().attempts(),
		login.calls_async().await,
		refresh.calls_async().await,
		tasks.calls_async().await,
	);

	Ok(())
}
