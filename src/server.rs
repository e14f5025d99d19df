//! Axum router, access guard middleware and server setup.
//! Used by: main.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, DefaultBodyLimit, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::access::AccessOutcome;
use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/setaccess",
            get(handlers::admin::set_access).post(handlers::admin::set_access_form),
        )
        .route(
            "/setadmin",
            get(handlers::admin::set_admin).post(handlers::admin::set_admin_form),
        )
        .route(
            "/upload",
            get(handlers::upload::form)
                .post(handlers::upload::upload)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .fallback(handlers::browse::browse)
        .layer(middleware::from_fn_with_state(state.clone(), access_guard))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs every request through the access gate, keyed by the peer's IP.
pub async fn access_guard(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let identity = peer.ip().to_canonical().to_string();
    let decision = state.gate.check(&identity);
    let restore_secs = state.gate.restore_delay().as_secs();

    if decision.outcome == AccessOutcome::Blocked {
        state.metrics.record_auto_block();
        tracing::warn!(client = %identity, restore_secs, "client auto-blocked for accessing too frequently");
    }

    if !decision.allowed {
        state.metrics.record_denied();
        tracing::warn!(%peer, uri = %request.uri(), "access denied");
        let body = format!("Please try again after {restore_secs} second\n");
        return (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    }

    state.metrics.record_allowed();
    next.run(request).await
}

pub async fn run(state: AppState, addr: &str) -> std::io::Result<()> {
    let router = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    state.gate.shutdown().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::state::build_state;

    const CLIENT: [u8; 4] = [10, 0, 0, 5];
    const ADMIN: [u8; 4] = [10, 0, 0, 9];

    fn test_state(file_dir: &std::path::Path) -> AppState {
        build_state(Config {
            file_dir: file_dir.to_path_buf(),
            template_dir: file_dir.join("missing-templates"),
            super_admin_account: "root".into(),
            super_admin_password: "rootpw".into(),
            admin_password: "adminpw".into(),
            ..Config::default()
        })
    }

    fn router_for(state: &AppState, ip: [u8; 4]) -> Router {
        build_router(state.clone()).layer(MockConnectInfo(SocketAddr::from((ip, 40000))))
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_is_reachable() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (status, body) = get(&router_for(&state, CLIENT), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok\n");
    }

    #[tokio::test]
    async fn burst_is_denied_with_restore_hint() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let router = router_for(&state, CLIENT);

        for _ in 0..6 {
            assert_eq!(get(&router, "/health").await.0, StatusCode::OK);
        }
        let (status, body) = get(&router, "/health").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, "Please try again after 60 second\n");

        let other = router_for(&state, ADMIN);
        assert_eq!(get(&other, "/health").await.0, StatusCode::OK);

        let snapshot = state.metrics.snapshot(state.gate.snapshot());
        assert_eq!(snapshot.auto_blocks, 1);
        assert_eq!(snapshot.requests_denied, 1);
        assert_eq!(snapshot.registry.auto_blocked, 1);
    }

    #[tokio::test]
    async fn admin_override_denies_client() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let admin = router_for(&state, ADMIN);
        let client = router_for(&state, CLIENT);

        let (status, body) = get(&admin, "/setaccess?acc=root&pwd=adminpw&usr=10.0.0.5&ok=false").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Change access permission for 10.0.0.5 successfully.\n");
        assert_eq!(get(&client, "/health").await.0, StatusCode::TOO_MANY_REQUESTS);

        get(&admin, "/setaccess?acc=root&pwd=adminpw&usr=10.0.0.5&ok=true").await;
        assert_eq!(get(&client, "/health").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn set_access_accepts_form_body() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let request = Request::builder()
            .method("POST")
            .uri("/setaccess")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("acc=root&pwd=adminpw&usr=10.0.0.5&ok=false"))
            .unwrap();
        let response = router_for(&state, ADMIN).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!state.gate.can_access("10.0.0.5"));
    }

    #[tokio::test]
    async fn bad_credentials_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let admin = router_for(&state, ADMIN);

        let (status, body) = get(&admin, "/setaccess?acc=root&pwd=wrong&usr=10.0.0.5&ok=false").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Incorrect account or password.\n");
        assert!(state.gate.can_access("10.0.0.5"));
        assert_eq!(state.metrics.snapshot(state.gate.snapshot()).admin_failures, 1);
    }

    #[tokio::test]
    async fn protected_client_cannot_be_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (status, _) = get(
            &router_for(&state, ADMIN),
            "/setaccess?acc=root&pwd=adminpw&usr=127.0.0.1&ok=false",
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn new_admin_can_set_access() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let admin = router_for(&state, ADMIN);

        let (status, _) = get(&admin, "/setadmin?acc=root&pwd=rootpw&name=alice&ok=true").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(&admin, "/setaccess?acc=alice&pwd=adminpw&usr=10.0.0.5&ok=false").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!state.gate.can_access("10.0.0.5"));
    }

    #[tokio::test]
    async fn upload_form_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (status, body) = get(&router_for(&state, CLIENT), "/upload").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"name="uploadFile""#));
    }

    const BOUNDARY: &str = "turnstile-boundary";

    fn file_part(filename: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"uploadFile\"; filename=\"{filename}\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             {content}"
        )
    }

    async fn post_upload(router: &Router, body: String) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    /// Uploads one file and returns the path the server reports for it.
    async fn upload_file(router: &Router, filename: &str, content: &str) -> String {
        let body = format!("{}\r\n--{BOUNDARY}--\r\n", file_part(filename, content));
        let (status, text) = post_upload(router, body).await;
        assert_eq!(status, StatusCode::OK);
        text.trim_end()
            .strip_prefix("Upload finished, file's address: ")
            .unwrap()
            .to_owned()
    }

    fn regular_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                files.extend(regular_files(&path));
            } else {
                files.push(path);
            }
        }
        files
    }

    #[tokio::test]
    async fn upload_stores_file_and_serves_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let router = router_for(&state, CLIENT);

        let public_path = upload_file(&router, "notes.txt", "hello turnstile").await;
        assert!(public_path.ends_with(".txt"));
        assert!(public_path.contains("notes#"));

        let stored = dir.path().join(public_path.trim_start_matches('/'));
        assert_eq!(std::fs::read_to_string(stored).unwrap(), "hello turnstile");
        assert_eq!(state.metrics.snapshot(state.gate.snapshot()).uploads, 1);

        let uri = public_path.replace('#', "%23");
        let (status, served) = get(&router, &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(served, "hello turnstile");
    }

    #[tokio::test]
    async fn directories_are_listed_after_upload() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let router = router_for(&state, CLIENT);

        let public_path = upload_file(&router, "notes.txt", "hello turnstile").await;
        let (day, file_name) = public_path.rsplit_once('/').unwrap();
        let year = day.trim_start_matches('/').split('/').next().unwrap();

        let (status, root) = get(&router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(root.contains(&format!("<a href=\"{year}/\">{year}/</a>")), "{root}");

        let (status, listing) = get(&router, &format!("{day}/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(listing.contains(&format!("href=\"{}\"", file_name.replace('#', "%23"))), "{listing}");

        let (status, _) = get(&router, &format!("/{year}")).await;
        assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
    }

    #[tokio::test]
    async fn listing_refuses_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let (status, _) = get(&router_for(&state, CLIENT), "/%2e%2e/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn truncated_upload_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let router = router_for(&state, CLIENT);

        let body = file_part("partial.txt", "first half of the file without a closing boundary");
        let (status, _) = post_upload(&router, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(regular_files(dir.path()).is_empty());
        assert_eq!(state.metrics.snapshot(state.gate.snapshot()).uploads, 0);
    }
}
