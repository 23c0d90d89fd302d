//! Authentication service.
//!
//! Handles account registration, credential login, refresh-token rotation
//! and logout. Passwords are stored as argon2 hashes; refresh tokens are
//! persisted per user so a logout (or rotation) invalidates the old one.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use bazario_core::validation::{validate_password, validate_username};
use bazario_core::{Role, User};

use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::AppState;

/// Authentication service.
pub struct AuthService {
    state: AppState,
}

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// "customer" (default) or "merchant". Admin accounts are seeded.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub store_location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Public view of an account.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub store_name: Option<String>,
    pub store_location: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            store_name: user.store_name.clone(),
            store_location: user.store_location.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserView,
}

// =============================================================================
// Implementation
// =============================================================================

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        AuthService {
            state: state.clone(),
        }
    }

    /// Registers a new customer or merchant account.
    pub async fn register(&self, req: RegisterRequest) -> Result<UserView, ApiError> {
        validate_username(&req.username)?;
        validate_password(&req.password)?;

        let role = match req.role.as_deref() {
            None | Some("customer") => Role::Customer,
            Some("merchant") => Role::Merchant,
            Some("admin") => {
                return Err(ApiError::Forbidden(
                    "Admin accounts cannot be self-registered".to_string(),
                ))
            }
            Some(other) => {
                return Err(ApiError::InvalidArgument(format!("Unknown role: {other}")))
            }
        };

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: req.username.trim().to_string(),
            password_hash: hash_password(&req.password)?,
            role,
            store_name: req.store_name,
            store_location: req.store_location,
            is_active: true,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };

        match self.state.db.users().insert(&user).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation() => {
                return Err(ApiError::Conflict("Username already taken".to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        info!(username = %user.username, role = role.as_str(), "Account registered");
        Ok(UserView::from(&user))
    }

    /// Verifies credentials and issues an access/refresh token pair.
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, ApiError> {
        let user = self
            .state
            .db
            .users()
            .find_by_username(req.username.trim())
            .await?;

        // Same error for unknown user and bad password
        let user = match user {
            Some(u) if verify_password(&req.password, &u.password_hash) => u,
            _ => {
                warn!(username = %req.username, "Login rejected");
                return Err(ApiError::AuthFailed(
                    "Invalid username or password".to_string(),
                ));
            }
        };

        if !user.is_active {
            return Err(ApiError::Forbidden("Account is disabled".to_string()));
        }

        self.issue_tokens(&user).await
    }

    /// Rotates a refresh token into a fresh token pair.
    ///
    /// The presented token must both validate cryptographically and match
    /// the one stored for the user, so a rotated-out token is dead even
    /// before its `exp`.
    pub async fn refresh(&self, req: RefreshRequest) -> Result<TokenResponse, ApiError> {
        let claims = self.state.jwt.validate_refresh_token(&req.refresh_token)?;

        let user = self
            .state
            .db
            .users()
            .find_by_refresh_token(&req.refresh_token)
            .await?
            .filter(|u| u.id == claims.sub)
            .ok_or_else(|| {
                ApiError::AuthFailed("Refresh token is no longer valid".to_string())
            })?;

        if !user.is_active {
            return Err(ApiError::Forbidden("Account is disabled".to_string()));
        }

        self.issue_tokens(&user).await
    }

    /// Clears the stored refresh token (logout).
    pub async fn logout(&self, user_id: &str) -> Result<(), ApiError> {
        self.state.db.users().set_refresh_token(user_id, None).await?;
        info!(user_id, "Logged out");
        Ok(())
    }

    async fn issue_tokens(&self, user: &User) -> Result<TokenResponse, ApiError> {
        let access_token = self.state.jwt.generate_access_token(&user.id, user.role)?;
        let refresh_token = self.state.jwt.generate_refresh_token(&user.id, user.role)?;

        self.state
            .db
            .users()
            .set_refresh_token(&user.id, Some(&refresh_token))
            .await?;

        info!(username = %user.username, "Tokens issued");

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.state.jwt.access_lifetime_secs(),
            user: UserView::from(user),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use bazario_db::{Database, DbConfig};

    async fn test_state() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = AppConfig {
            http_port: 0,
            database_path: ":memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_access_lifetime_secs: 3600,
            jwt_refresh_lifetime_secs: 86400,
        };
        AppState::new(db, config)
    }

    fn register_req(username: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: "secret1".to_string(),
            role: role.map(str::to_string),
            store_name: None,
            store_location: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let state = test_state().await;
        let service = AuthService::new(&state);

        let user = service.register(register_req("asha", None)).await.unwrap();
        assert_eq!(user.role, Role::Customer);

        let tokens = service
            .login(LoginRequest {
                username: "asha".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(tokens.token_type, "Bearer");

        let claims = state.jwt.validate_access_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let state = test_state().await;
        let service = AuthService::new(&state);
        service.register(register_req("asha", None)).await.unwrap();

        let err = service
            .login(LoginRequest {
                username: "asha".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn test_register_admin_rejected() {
        let state = test_state().await;
        let service = AuthService::new(&state);

        let err = service
            .register(register_req("boss", Some("admin")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let state = test_state().await;
        let service = AuthService::new(&state);
        service.register(register_req("dup", None)).await.unwrap();

        let err = service
            .register(register_req("dup", Some("merchant")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_refresh_rotation_invalidates_old_token() {
        let state = test_state().await;
        let service = AuthService::new(&state);
        service.register(register_req("asha", None)).await.unwrap();

        let first = service
            .login(LoginRequest {
                username: "asha".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        let second = service
            .refresh(RefreshRequest {
                refresh_token: first.refresh_token.clone(),
            })
            .await
            .unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        // The rotated-out token no longer matches the stored one
        let err = service
            .refresh(RefreshRequest {
                refresh_token: first.refresh_token,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn test_logout_clears_refresh_token() {
        let state = test_state().await;
        let service = AuthService::new(&state);
        let user = service.register(register_req("asha", None)).await.unwrap();

        let tokens = service
            .login(LoginRequest {
                username: "asha".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        service.logout(&user.id).await.unwrap();

        let err = service
            .refresh(RefreshRequest {
                refresh_token: tokens.refresh_token,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthFailed(_)));
    }
}
