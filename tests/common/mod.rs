//! Common test utilities
//!
//! A fake ticket verification endpoint served by axum on a random local
//! port. It records every request body it receives.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const VERIFY_PATH: &str = "/api/ticket-verify";

/// How the fake endpoint answers
#[derive(Debug, Clone)]
pub enum Answer {
    Json(StatusCode, Value),
    Text(StatusCode, String),
    Delayed(Duration, Value),
    /// Confirms only the listed `ticket_id`s
    Confirming(Vec<String>),
}

impl Answer {
    pub fn confirmed(message: &str) -> Self {
        Answer::Json(
            StatusCode::OK,
            json!({ "status": true, "ticket": { "is_verify": true }, "message": message }),
        )
    }

    pub fn confirming(tickets: &[&str]) -> Self {
        Answer::Confirming(tickets.iter().map(|t| t.to_string()).collect())
    }

    pub fn not_verified(message: &str) -> Self {
        Answer::Json(
            StatusCode::OK,
            json!({ "status": true, "ticket": { "is_verify": false }, "message": message }),
        )
    }
}

struct EndpointState {
    answer: Answer,
    requests: Mutex<Vec<Value>>,
}

pub struct FakeEndpoint {
    pub url: String,
    state: Arc<EndpointState>,
    task: JoinHandle<()>,
}

impl FakeEndpoint {
    pub async fn start(answer: Answer) -> Self {
        let state = Arc::new(EndpointState {
            answer,
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route(VERIFY_PATH, post(verify))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake endpoint");
        let addr = listener.local_addr().expect("local address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{}{}", addr, VERIFY_PATH),
            state,
            task,
        }
    }

    /// Request bodies received so far, in order
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeEndpoint {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn verify(State(state): State<Arc<EndpointState>>, Json(body): Json<Value>) -> Response {
    state.requests.lock().unwrap().push(body.clone());
    match state.answer.clone() {
        Answer::Confirming(tickets) => {
            let ticket = body["ticket_id"].as_str().unwrap_or_default();
            let verified = tickets.iter().any(|t| t == ticket);
            Json(json!({ "status": true, "ticket": { "is_verify": verified } })).into_response()
        }
        Answer::Json(status, value) => (status, Json(value)).into_response(),
        Answer::Text(status, text) => (status, text).into_response(),
        Answer::Delayed(delay, value) => {
            tokio::time::sleep(delay).await;
            Json(value).into_response()
        }
    }
}
