use std::sync::Arc;

use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    auth::{hash_password, verify_password, JwtService},
    errors::{AppError, AppResult},
    models::{
        domain::{refresh_token::hash_token, RefreshToken, User},
        dto::{
            request::{parse_date, LoginRequest, RefreshTokenRequest, RegisterRequest},
            response::{AuthResponse, RefreshTokenResponse, UserDto},
        },
    },
    repositories::{RefreshTokenRepository, UserRepository},
};

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        jwt: JwtService,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<UserDto> {
        request.validate()?;
        let dob = parse_date(&request.dob, "date of birth")?;

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "Email '{}' is already registered",
                request.email
            )));
        }

        let user = User::new(
            &request.email,
            request.full_name.trim(),
            Some(request.qualification.trim().to_string()),
            Some(dob),
            hash_password(&request.password)?,
        );
        let user = self.users.create(user).await?;

        log::info!("Registered user {}", user.id);
        Ok(user.into())
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());
        let mut user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&request.password, &user.password_hash)? {
            log::debug!("Password mismatch for user {}", user.id);
            return Err(invalid());
        }

        user.last_login = Some(Utc::now());
        let user = self.users.update(user).await?;

        let (access_token, refresh_token) = self.issue_tokens(&user).await?;
        log::info!("User {} logged in", user.id);

        Ok(AuthResponse {
            access_token,
            refresh_token,
            user: user.into(),
        })
    }

    /// Exchanges a live refresh token for a new pair. The presented token is
    /// revoked, so each refresh token works once.
    pub async fn refresh(&self, request: RefreshTokenRequest) -> AppResult<RefreshTokenResponse> {
        let claims = self.jwt.validate_refresh_token(&request.refresh_token)?;

        let token_hash = hash_token(&request.refresh_token);
        let stored = self
            .refresh_tokens
            .find_by_token_hash(&token_hash)
            .await?
            .filter(RefreshToken::is_valid)
            .ok_or_else(|| AppError::Unauthorized("Refresh token has been revoked".to_string()))?;

        if stored.user_id != claims.sub {
            return Err(AppError::Unauthorized("Refresh token does not match user".to_string()));
        }

        self.refresh_tokens.revoke_by_token_hash(&token_hash).await?;

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        let (access_token, refresh_token) = self.issue_tokens(&user).await?;
        log::info!("Token refreshed for user {}", user.id);

        Ok(RefreshTokenResponse {
            access_token,
            refresh_token,
        })
    }

    pub async fn logout(&self, user_id: &str) -> AppResult<u64> {
        let revoked = self.refresh_tokens.revoke_all_for_user(user_id).await?;
        log::info!("User {} logged out, {} refresh tokens revoked", user_id, revoked);
        Ok(revoked)
    }

    pub async fn me(&self, user_id: &str) -> AppResult<UserDto> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserDto::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn issue_tokens(&self, user: &User) -> AppResult<(String, String)> {
        let access_token = self.jwt.create_token(user)?;
        let refresh_token = self.jwt.create_refresh_token(&user.id)?;

        let expires_at = Utc::now() + Duration::hours(self.jwt.refresh_expiration_hours());
        self.refresh_tokens
            .create(RefreshToken::new(&user.id, &refresh_token, expires_at))
            .await?;

        Ok((access_token, refresh_token))
    }
}
