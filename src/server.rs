//! Reference implementation of the remote snippet service.
//!
//! Speaks the same JSON protocol `HttpRemote` expects, so a local instance
//! can stand in for the real service during development.

use crate::error::{Result, SnipError};
use crate::models::Snippet;
use crate::storage::LocalStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::{info, warn};
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Shared state behind every route
#[derive(Clone)]
pub struct ServerState {
    store: LocalStore,
    token: Option<String>,
}

impl ServerState {
    pub fn new(store: LocalStore, token: Option<String>) -> Self {
        ServerState {
            store,
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn authorize(&self, header: Option<&str>) -> std::result::Result<(), Response> {
        let Some(token) = &self.token else {
            return Ok(());
        };

        let expected = format!("Bearer {}", token);
        if header == Some(expected.as_str()) {
            Ok(())
        } else {
            Err(error_reply(
                StatusCode::UNAUTHORIZED,
                "missing or invalid bearer token",
            ))
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&ErrorBody { error: message }), status)
        .into_response()
}

fn with_state(
    state: ServerState,
) -> impl Filter<Extract = (ServerState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// All routes of the snippet service
pub fn routes(
    state: ServerState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let auth = warp::header::optional::<String>("authorization");

    let create_route = warp::path!("snippets")
        .and(warp::post())
        .and(auth.clone())
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(create_snippet);

    let list_route = warp::path!("snippets")
        .and(warp::get())
        .and(auth.clone())
        .and(with_state(state.clone()))
        .and_then(list_snippets);

    let search_route = warp::path!("snippets" / "search")
        .and(warp::get())
        .and(auth.clone())
        .and(warp::query::<SearchParams>())
        .and(with_state(state.clone()))
        .and_then(search_snippets);

    let delete_route = warp::path!("snippets" / String)
        .and(warp::delete())
        .and(auth)
        .and(with_state(state))
        .and_then(delete_snippet);

    // Health check endpoint
    let health_route = warp::path!("health")
        .and(warp::get())
        .map(|| "snipsync API is running");

    create_route
        .or(list_route)
        .or(search_route)
        .or(delete_route)
        .or(health_route)
        .with(warp::trace::request())
}

async fn create_snippet(
    auth: Option<String>,
    mut snippet: Snippet,
    state: ServerState,
) -> std::result::Result<Response, Infallible> {
    if let Err(reply) = state.authorize(auth.as_deref()) {
        return Ok(reply);
    }
    if snippet.title.trim().is_empty() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "title must not be empty"));
    }

    // Identity is always assigned here, whatever the client sent
    snippet.id = Some(Uuid::new_v4().to_string());
    snippet.updated_at = Some(Utc::now());

    match state.store.append(snippet.clone()).await {
        Ok(()) => {
            info!(id = ?snippet.id, title = %snippet.title, "stored snippet");
            let reply = warp::reply::with_status(warp::reply::json(&snippet), StatusCode::CREATED);
            Ok(reply.into_response())
        }
        Err(e) => Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())),
    }
}

async fn list_snippets(
    auth: Option<String>,
    state: ServerState,
) -> std::result::Result<Response, Infallible> {
    if let Err(reply) = state.authorize(auth.as_deref()) {
        return Ok(reply);
    }

    match state.store.list().await {
        Ok(snippets) => Ok(warp::reply::json(&snippets).into_response()),
        Err(e) => Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())),
    }
}

async fn search_snippets(
    auth: Option<String>,
    params: SearchParams,
    state: ServerState,
) -> std::result::Result<Response, Infallible> {
    if let Err(reply) = state.authorize(auth.as_deref()) {
        return Ok(reply);
    }

    let query = params.q.unwrap_or_default();
    match state.store.list().await {
        Ok(snippets) => {
            let found: Vec<Snippet> = snippets
                .into_iter()
                .filter(|s| s.matches(&query))
                .collect();
            Ok(warp::reply::json(&found).into_response())
        }
        Err(e) => Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())),
    }
}

async fn delete_snippet(
    id: String,
    auth: Option<String>,
    state: ServerState,
) -> std::result::Result<Response, Infallible> {
    if let Err(reply) = state.authorize(auth.as_deref()) {
        return Ok(reply);
    }

    let session = state.store.lock().await;
    let mut snippets = match session.list() {
        Ok(snippets) => snippets,
        Err(e) => return Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())),
    };

    let before = snippets.len();
    snippets.retain(|s| s.id.as_deref() != Some(id.as_str()));
    if snippets.len() == before {
        return Ok(error_reply(StatusCode::NOT_FOUND, "snippet not found"));
    }

    match session.replace_all(&snippets) {
        Ok(()) => {
            info!(%id, "deleted snippet");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Err(e) => Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())),
    }
}

/// Serve the snippet API on localhost until Ctrl-C
pub async fn start_api_server(port: u16, state: ServerState) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let server = warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, async {
        tokio::signal::ctrl_c().await.ok();
        warn!("received shutdown signal, stopping API server");
    });

    match server {
        Ok((addr, server)) => {
            info!(%addr, "snippet API server listening");
            server.await;
            Ok(())
        }
        Err(e) => Err(SnipError::Server(format!(
            "Failed to bind to port {}: {}",
            port, e
        ))),
    }
}
