#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use yaca_api::password::CredentialHasher;
use yaca_api::{AppStateInner, GatewayAccess, ServiceOptions, router};
use yaca_db::{MemoryStorage, SqliteStorage, Storage, UserRepository};

pub struct TestApp {
    pub router: Router,
    pub storage: Arc<dyn Storage>,
    pub users: UserRepository,
    _dir: Option<TempDir>,
}

pub fn test_app(gateway_access: GatewayAccess) -> TestApp {
    build(Arc::new(MemoryStorage::new()), gateway_access, None)
}

/// Same router over a connected SQLite file in a fresh temp directory.
pub async fn sqlite_test_app(gateway_access: GatewayAccess) -> TestApp {
    let dir = TempDir::new().unwrap();
    let storage = SqliteStorage::new(dir.path().join("yaca.db"));
    storage.connect().await.unwrap();
    build(Arc::new(storage), gateway_access, Some(dir))
}

fn build(storage: Arc<dyn Storage>, gateway_access: GatewayAccess, dir: Option<TempDir>) -> TestApp {
    let state = AppStateInner::build(
        storage.clone(),
        ServiceOptions {
            jwt_secret: "test-secret".to_string(),
            token_ttl: Some(chrono::Duration::hours(1)),
            hasher: CredentialHasher::insecure_fast(),
            gateway_access,
        },
    );
    TestApp {
        router: router(state),
        users: UserRepository::new(storage.clone()),
        storage,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        match body {
            Some(value) => {
                self.send_raw(method, uri, token, Some("application/json"), value.to_string())
                    .await
            }
            None => self.send_raw(method, uri, token, None, String::new()).await,
        }
    }

    /// Send `body` verbatim, with `content_type` if given.
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        content_type: Option<&str>,
        body: String,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let body = Body::from(body);

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn register(&self, username: &str, password: &str, display_name: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/auth/users",
            None,
            Some(json!({
                "username": username,
                "password": password,
                "displayName": display_name,
            })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            &format!("/auth/tokens/{}", username),
            None,
            Some(json!({ "password": password })),
        )
        .await
    }

    /// Register and log in, returning the session token.
    pub async fn sign_up(&self, username: &str, password: &str, display_name: &str) -> String {
        let (status, _) = self.register(username, password, display_name).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK);
        body["payload"]["token"].as_str().unwrap().to_string()
    }

    pub async fn post_message(&self, token: Option<&str>, author: &str, text: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/chat/messages",
            token,
            Some(json!({ "author": author, "text": text })),
        )
        .await
    }
}
