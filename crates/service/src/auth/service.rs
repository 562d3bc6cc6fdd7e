use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, debug, warn, instrument};
use uuid::Uuid;

use super::domain::{AuthSession, AuthUser, ChangePasswordInput, Claims, CreateAdminInput, LoginInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const PASSWORD_ALGORITHM: &str = "argon2";

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self { jwt_secret: jwt_secret.into(), token_ttl: Duration::hours(ttl_hours) }
    }
}

/// Admin auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

fn password_matches(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

fn check_password_strength(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}

/// Verify an HS256 token and return its claims. Expired tokens are rejected.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(err = %e, "token rejected");
            AuthError::InvalidToken
        })
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Create an admin account with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::CreateAdminInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("0123456789abcdef", 12));
    /// let input = CreateAdminInput { email: "Admin@Example.com".into(), name: "Admin".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.create_admin(input)).unwrap();
    /// assert_eq!(user.email, "admin@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_admin(&self, input: CreateAdminInput) -> Result<AuthUser, AuthError> {
        let email = models::admin_user::validate_email(&input.email)?;
        let name = models::admin_user::validate_name(&input.name)?;
        check_password_strength(&input.password)?;
        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            debug!("admin exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.password)?;
        let user = self.repo.create_user(&email, &name, hash, PASSWORD_ALGORITHM).await?;
        info!(user_id = %user.id, email = %user.email, "admin_created");
        Ok(user)
    }

    /// Create the first admin when none exists. Returns `None` if accounts are present.
    pub async fn ensure_bootstrap_admin(&self, email: &str, password: &str, name: &str) -> Result<Option<AuthUser>, AuthError> {
        if self.repo.count_users().await? > 0 {
            return Ok(None);
        }
        let user = self
            .create_admin(CreateAdminInput { email: email.into(), name: name.into(), password: password.into() })
            .await?;
        info!(user_id = %user.id, "bootstrap_admin_created");
        Ok(Some(user))
    }

    /// Authenticate an admin and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{CreateAdminInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("0123456789abcdef", 12));
    /// let _ = tokio_test::block_on(svc.create_admin(CreateAdminInput { email: "u@e.com".into(), name: "N".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !password_matches(&input.password, &cred.password_hash)? {
            warn!(user_id = %user.id, "login_bad_password");
            return Err(AuthError::Unauthorized);
        }

        let (token, expires_at) = self.issue_token(&user)?;
        self.repo.record_login(user.id).await?;
        info!(user_id = %user.id, "admin_logged_in");
        Ok(AuthSession { user, token, expires_at })
    }

    /// Sign a token for `user`; returns the token and its expiry (unix seconds).
    pub fn issue_token(&self, user: &AuthUser) -> Result<(String, i64), AuthError> {
        let now = Utc::now();
        let exp = (now + self.cfg.token_ttl).timestamp();
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id,
            name: user.name.clone(),
            iat: now.timestamp(),
            exp,
        };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok((token, exp))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        verify_token(&self.cfg.jwt_secret, token)
    }

    /// Resolve the account behind verified claims; deleted accounts are rejected.
    pub async fn current_user(&self, claims: &Claims) -> Result<AuthUser, AuthError> {
        self.repo.find_user_by_id(claims.uid).await?.ok_or(AuthError::Unauthorized)
    }

    #[instrument(skip(self, input))]
    pub async fn change_password(&self, user_id: Uuid, input: ChangePasswordInput) -> Result<(), AuthError> {
        let cred = self.repo.get_credentials(user_id).await?.ok_or(AuthError::NotFound)?;
        if !password_matches(&input.current_password, &cred.password_hash)? {
            return Err(AuthError::Unauthorized);
        }
        check_password_strength(&input.new_password)?;
        let hash = hash_password(&input.new_password)?;
        self.repo.set_password(user_id, hash, PASSWORD_ALGORITHM).await?;
        info!(user_id = %user_id, "admin_password_changed");
        Ok(())
    }
}
