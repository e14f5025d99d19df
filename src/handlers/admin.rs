//! Administrator endpoints: client overrides and administrator accounts.
//! Used by: server.
//!
//! Parameters are accepted either as a query string or as a urlencoded form.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, State};
use axum::Form;
use serde::Deserialize;

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetAccessParams {
    pub acc: String,
    pub pwd: String,
    pub usr: String,
    #[serde(default)]
    pub ok: String,
}

#[derive(Debug, Deserialize)]
pub struct SetAdminParams {
    pub acc: String,
    pub pwd: String,
    pub name: String,
    #[serde(default)]
    pub ok: String,
}

pub async fn set_access(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<SetAccessParams>,
) -> Result<String> {
    apply_set_access(&state, peer, params)
}

pub async fn set_access_form(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Form(params): Form<SetAccessParams>,
) -> Result<String> {
    apply_set_access(&state, peer, params)
}

pub async fn set_admin(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<SetAdminParams>,
) -> Result<String> {
    apply_set_admin(&state, peer, params)
}

pub async fn set_admin_form(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Form(params): Form<SetAdminParams>,
) -> Result<String> {
    apply_set_admin(&state, peer, params)
}

fn apply_set_access(state: &AppState, peer: SocketAddr, params: SetAccessParams) -> Result<String> {
    if let Err(e) = state.admins.authorize_set_access(&params.acc, &params.pwd, &params.usr) {
        state.metrics.record_admin_failure();
        tracing::warn!(%peer, account = %params.acc, target = %params.usr, error = %e, "set access rejected");
        return Err(e);
    }

    let allowed = params.ok == "true";
    state.gate.set_override(&params.usr, allowed);
    state.metrics.record_override_change();
    tracing::info!(%peer, account = %params.acc, target = %params.usr, allowed, "client override changed");
    Ok(format!("Change access permission for {} successfully.\n", params.usr))
}

fn apply_set_admin(state: &AppState, peer: SocketAddr, params: SetAdminParams) -> Result<String> {
    let is_admin = params.ok == "true";
    if let Err(e) = state.admins.set_admin(&params.acc, &params.pwd, &params.name, is_admin) {
        state.metrics.record_admin_failure();
        tracing::warn!(%peer, account = %params.acc, target = %params.name, error = %e, "set admin rejected");
        return Err(e);
    }

    state.metrics.record_admin_change();
    tracing::info!(%peer, account = %params.acc, target = %params.name, is_admin, "administrator changed");
    Ok(format!("Set administrator for {} successfully.\n", params.name))
}
