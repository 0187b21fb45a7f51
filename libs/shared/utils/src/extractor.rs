use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Validates the bearer token and stores the resulting `User` in request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_value = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let user = validate_token(token, &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Admins pass; everyone else must be one of `participants`.
pub fn require_participant(user: &User, participants: &[Uuid]) -> Result<(), AppError> {
    if user.is_admin() {
        return Ok(());
    }

    let is_participant = Uuid::parse_str(&user.id)
        .map(|id| participants.contains(&id))
        .unwrap_or(false);

    if is_participant {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not allowed to act on this resource".to_string()))
    }
}

/// The caller's id as a `Uuid`.
pub fn user_uuid(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id).map_err(|_| AppError::Auth("Invalid user id in token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn user(id: Uuid, role: &str) -> User {
        User {
            id: id.to_string(),
            email: None,
            role: Some(role.to_string()),
            metadata: None,
            created_at: None,
        }
    }

    #[test]
    fn participants_and_admins_pass() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(require_participant(&user(me, "authenticated"), &[other, me]).is_ok());
        assert!(require_participant(&user(Uuid::new_v4(), "admin"), &[me]).is_ok());
    }

    #[test]
    fn strangers_are_forbidden() {
        let err = require_participant(&user(Uuid::new_v4(), "professional"), &[Uuid::new_v4()]).unwrap_err();
        assert_matches!(err, AppError::Forbidden(_));
    }

    #[test]
    fn metadata_role_grants_admin() {
        let mut u = user(Uuid::new_v4(), "authenticated");
        u.role = None;
        u.metadata = Some(json!({ "role": "admin" }));
        assert!(require_participant(&u, &[]).is_ok());
    }
}
