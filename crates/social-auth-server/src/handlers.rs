use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use social_auth::storage::SESSION_UID_KEY;
use social_auth::{
    ExternalIdentity, ProvisioningContext, SessionStore, StatusMessage, UserStatus, UserStorage,
};
use social_auth_memory::InMemorySession;

use crate::error::ApiError;
use crate::state::AppState;

/// Session key holding messages queued for the next page view.
pub const SESSION_MESSAGES_KEY: &str = "messages";

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub destination: Option<String>,
}

/// Starts a provider login: remembers where to return to afterwards.
pub async fn start_login(
    State(state): State<AppState>,
    Path(plugin_id): Path<String>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    validate_plugin_id(&plugin_id)?;
    let (jar, session) = open_session(&state, jar);

    if let Some(destination) = query.destination.filter(|d| !d.is_empty()) {
        if !is_local_path(&destination) {
            return Err(ApiError::bad_request("destination must be a local path"));
        }
        let ctx = ProvisioningContext::new(plugin_id.clone(), session);
        ctx.set_destination(destination.clone()).await?;
        tracing::debug!(plugin_id = %plugin_id, destination = %destination, "Login destination stored");
    }

    Ok((jar, StatusCode::NO_CONTENT))
}

/// Completes a provider login with the identity returned by the provider.
pub async fn login_callback(
    State(state): State<AppState>,
    Path(plugin_id): Path<String>,
    jar: CookieJar,
    Json(identity): Json<ExternalIdentity>,
) -> Result<(CookieJar, Redirect), ApiError> {
    validate_plugin_id(&plugin_id)?;
    let (jar, session) = open_session(&state, jar);

    let current_user = match session.get(SESSION_UID_KEY).await? {
        Some(Value::String(uid)) => Some(uid),
        _ => None,
    };

    let ctx = ProvisioningContext::new(plugin_id.clone(), session.clone())
        .with_session_keys_to_nullify(state.config.session.keys_to_nullify.clone())
        .with_current_user(current_user);

    let outcome = state.service.authenticate(&ctx, identity).await;
    queue_messages(session.as_ref(), &outcome.messages).await?;

    let location = outcome.redirect.to_path(state.service.routes().as_ref());
    tracing::info!(
        plugin_id = %plugin_id,
        status = %outcome.status,
        user_id = outcome.user_id.as_deref().unwrap_or(""),
        location = %location,
        "Social login handled"
    );

    Ok((jar, Redirect::to(&location)))
}

/// Returns and clears the queued messages of the caller's session.
pub async fn drain_messages(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Vec<StatusMessage>>, ApiError> {
    let Some(session) = existing_session(&state, &jar) else {
        return Ok(Json(Vec::new()));
    };

    let messages = match session.take(SESSION_MESSAGES_KEY) {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| social_auth::AuthError::internal(format!("Corrupt messages: {e}")))?,
        None => Vec::new(),
    };
    Ok(Json(messages))
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub status: UserStatus,
    pub roles: Vec<String>,
}

/// The logged-in account.
pub async fn current_user(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<AccountResponse>, ApiError> {
    let session = existing_session(&state, &jar).ok_or(ApiError::Unauthorized)?;
    let Some(Value::String(uid)) = session.get(SESSION_UID_KEY).await? else {
        return Err(ApiError::Unauthorized);
    };

    let user = state
        .users
        .find_by_id(&uid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User '{uid}'")))?;

    Ok(Json(AccountResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        status: user.status,
        roles: user.roles,
    }))
}

fn existing_session(state: &AppState, jar: &CookieJar) -> Option<Arc<InMemorySession>> {
    jar.get(&state.config.session.cookie_name)
        .and_then(|cookie| state.sessions.get(cookie.value()))
}

/// Resolves the caller's session, starting one when the cookie is missing or
/// stale, and makes sure the response carries its id.
fn open_session(state: &AppState, jar: CookieJar) -> (CookieJar, Arc<InMemorySession>) {
    let cfg = &state.config.session;
    let presented = jar.get(&cfg.cookie_name).map(|c| c.value().to_string());
    let (id, session) = state.sessions.get_or_create(presented.as_deref());

    if presented.as_deref() == Some(id.as_str()) {
        return (jar, session);
    }

    let cookie = Cookie::build((cfg.cookie_name.clone(), id))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.secure_cookie)
        .path("/")
        .build();
    (jar.add(cookie), session)
}

async fn queue_messages(
    session: &dyn SessionStore,
    messages: &[StatusMessage],
) -> Result<(), ApiError> {
    if messages.is_empty() {
        return Ok(());
    }

    let mut queued = match session.get(SESSION_MESSAGES_KEY).await? {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    for message in messages {
        queued.push(
            serde_json::to_value(message)
                .map_err(|e| social_auth::AuthError::internal(e.to_string()))?,
        );
    }
    session
        .set(SESSION_MESSAGES_KEY, Some(Value::Array(queued)))
        .await?;
    Ok(())
}

fn validate_plugin_id(plugin_id: &str) -> Result<(), ApiError> {
    let valid = !plugin_id.is_empty()
        && plugin_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("Invalid plugin id '{plugin_id}'")))
    }
}

/// Only same-site paths are accepted as post-login destinations.
fn is_local_path(destination: &str) -> bool {
    destination.starts_with('/') && !destination.starts_with("//") && !destination.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_plugin_id() {
        assert!(validate_plugin_id("social_auth_google").is_ok());
        assert!(validate_plugin_id("").is_err());
        assert!(validate_plugin_id("../etc").is_err());
    }

    #[test]
    fn test_is_local_path() {
        assert!(is_local_path("/node/5"));
        assert!(!is_local_path("//evil.example.com"));
        assert!(!is_local_path("https://evil.example.com"));
        assert!(!is_local_path("node/5"));
    }

    #[tokio::test]
    async fn test_queue_messages_appends() {
        let session = InMemorySession::new();
        queue_messages(&session, &[StatusMessage::error("first")])
            .await
            .unwrap();
        queue_messages(&session, &[StatusMessage::warning("second")])
            .await
            .unwrap();

        let stored = session.take(SESSION_MESSAGES_KEY).unwrap();
        let messages: Vec<StatusMessage> = serde_json::from_value(stored).unwrap();
        assert_eq!(
            messages,
            vec![StatusMessage::error("first"), StatusMessage::warning("second")]
        );
    }
}
