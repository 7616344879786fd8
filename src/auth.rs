//! The dual-guard authentication boundary.
//!
//! Requests are resolved against guards in a fixed order: the admin session
//! realm, then the frontend session realm, then the bearer-token API guard.
//! The first guard whose check passes supplies the principal; a request no
//! guard recognizes is anonymous and protected handlers turn that into 401.

use actix_identity::Identity;
use actix_web::HttpRequest;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::db;
use crate::errors::AppError;
use crate::structs::User;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Session realm a principal logged in through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Realm {
    Admin,
    Web,
}

impl Realm {
    fn prefix(self) -> &'static str {
        match self {
            Realm::Admin => "admin",
            Realm::Web => "web",
        }
    }
}

/// How the current principal was authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    AdminSession,
    WebSession,
    ApiToken,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub guard: Guard,
}

/// Identity string stored in the session cookie: `{realm}:{user_id}`.
pub fn session_value(realm: Realm, user_id: i64) -> String {
    format!("{}:{}", realm.prefix(), user_id)
}

/// Parses a stored identity string back into its realm and user id. Anything
/// that does not match yields `None` (anonymous), never an error.
pub fn parse_session_value(value: &str) -> Option<(Realm, i64)> {
    let (prefix, id) = value.split_once(':')?;
    let realm = match prefix {
        "admin" => Realm::Admin,
        "web" => Realm::Web,
        _ => return None,
    };
    id.parse().ok().map(|id| (realm, id))
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Sequential guard resolution. Session realms are checked in admin-first
/// order so a back-office session on a mixed route keeps its admin guard.
pub async fn authenticate(
    pool: &SqlitePool,
    identity: Option<&Identity>,
    req: &HttpRequest,
) -> Result<Option<AuthUser>, AppError> {
    if let Some(identity) = identity {
        let raw = identity.id()?;
        if let Some((realm, user_id)) = parse_session_value(&raw) {
            if let Some(user) = db::users::find_by_id(pool, user_id).await? {
                let guard = match realm {
                    Realm::Admin => Guard::AdminSession,
                    Realm::Web => Guard::WebSession,
                };
                return Ok(Some(AuthUser { user, guard }));
            }
            log::warn!("Session references missing user {}", user_id);
        }
    }

    if let Some(token) = bearer_token(req) {
        if let Some(user) = db::tokens::find_user_by_hash(pool, &token_hash(&token)).await? {
            return Ok(Some(AuthUser { user, guard: Guard::ApiToken }));
        }
    }

    Ok(None)
}

/// Like [`authenticate`] but anonymous requests become 401.
pub async fn require_user(
    pool: &SqlitePool,
    identity: Option<&Identity>,
    req: &HttpRequest,
) -> Result<AuthUser, AppError> {
    authenticate(pool, identity, req)
        .await?
        .ok_or(AppError::Unauthorized)
}

pub fn has_role(auth: &AuthUser, role: &str) -> bool {
    auth.user.role == role
}

pub async fn has_permission_to(
    pool: &SqlitePool,
    auth: &AuthUser,
    permission: &str,
) -> Result<bool, AppError> {
    Ok(db::permissions::role_has_permission(pool, &auth.user.role, permission).await?)
}

/// Admin-realm routes: the principal must hold the admin role AND have come
/// in through the admin session guard (an API token or a front-office session
/// does not grant the back office).
pub fn require_admin(auth: &AuthUser) -> Result<(), AppError> {
    if auth.guard == Guard::AdminSession && has_role(auth, ROLE_ADMIN) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Verifies credentials against a realm and returns the user on success.
pub async fn check_credentials(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let email = email.to_lowercase();
    match db::users::find_by_email(pool, &email).await? {
        Some(user) if crate::utils::verify_password(password, &user.pwd_hash) => Ok(Some(user)),
        Some(_) | None => Ok(None),
    }
}

/// Plaintext API token: 40 hex characters. Shown to the caller exactly once;
/// only its hash is persisted.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_value_round_trip() {
        assert_eq!(parse_session_value(&session_value(Realm::Admin, 7)), Some((Realm::Admin, 7)));
        assert_eq!(parse_session_value(&session_value(Realm::Web, 12)), Some((Realm::Web, 12)));
    }

    #[test]
    fn garbage_session_values_are_anonymous() {
        assert_eq!(parse_session_value("12"), None);
        assert_eq!(parse_session_value("api:3"), None);
        assert_eq!(parse_session_value("admin:notanumber"), None);
        assert_eq!(parse_session_value(""), None);
    }

    #[test]
    fn tokens_are_forty_hex_chars_and_hash_deterministically() {
        let token = generate_token();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token_hash(&token), token_hash(&token));
        assert_ne!(token_hash(&token), token_hash("other"));
        assert_eq!(token_hash(&token).len(), 64);
    }
}
