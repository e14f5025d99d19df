//! Liveness check.
//! Used by: server.

pub async fn health() -> &'static str {
    "ok\n"
}
