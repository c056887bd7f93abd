//! User service for sign-up, sign-in and account lookups
//!
//! # Performance Optimizations
//!
//! - Password hashing/verification runs on blocking thread pool
//! - JWT service is passed by reference (pre-computed keys)

use crate::auth::{JwtService, PasswordService};
use crate::error::ApiError;
use crate::repositories::{NewUser, UserRecord, UserStore};
use signgate_shared::validation::{normalize_email, validate_form};
use signgate_shared::{
    AuthResponse, CheckUniqueQuery, CheckUniqueResponse, PublicUser, SignInRequest, SignUpRequest,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Counter label for a sign-up that failed at insert time
fn sign_up_failure_outcome(err: &ApiError) -> &'static str {
    match err {
        ApiError::Conflict(_) => "conflict",
        _ => "error",
    }
}

/// User service for authentication operations
pub struct UserService;

impl UserService {
    fn auth_response(jwt_service: &JwtService, user: &UserRecord) -> Result<AuthResponse, ApiError> {
        // Uses pre-computed keys - fast
        let token = jwt_service.sign(user.id).map_err(ApiError::Internal)?;
        Ok(AuthResponse {
            user: user.to_public(),
            token,
            expires_in: jwt_service.token_expiry_secs(),
        })
    }

    /// Register a new user
    ///
    /// Input is validated before anything touches the store. The uniqueness
    /// pre-check gives a friendly error in the common case; the store's own
    /// constraints decide races.
    #[instrument(skip_all, fields(username = %req.username))]
    pub async fn sign_up(
        users: &dyn UserStore,
        jwt_service: &JwtService,
        req: SignUpRequest,
    ) -> Result<AuthResponse, ApiError> {
        validate_form(&req).map_err(ApiError::Validation)?;

        let email = normalize_email(&req.email);

        let conflicts = users.find_conflicts(&req.username, &email).await?;
        if !conflicts.is_empty() {
            debug!(?conflicts, "Sign-up rejected: duplicate user");
            metrics::counter!("signgate_sign_up_total", "outcome" => "conflict").increment(1);
            return Err(ApiError::Conflict(conflicts));
        }

        // Hash password on blocking thread pool (CPU-intensive)
        let digest = PasswordService::encode_async(req.password)
            .await
            .map_err(ApiError::Internal)?;

        let user = users
            .create(NewUser {
                username: req.username,
                email,
                password_hash: digest.hash,
                password_salt: digest.salt,
            })
            .await
            .map_err(|e| {
                let err = ApiError::from(e);
                metrics::counter!("signgate_sign_up_total", "outcome" => sign_up_failure_outcome(&err))
                    .increment(1);
                err
            })?;

        info!(user_id = %user.id, "User signed up");
        metrics::counter!("signgate_sign_up_total", "outcome" => "success").increment(1);

        Self::auth_response(jwt_service, &user)
    }

    /// Sign in with a username or email and a password
    ///
    /// Unknown accounts and wrong passwords produce the same error, and an
    /// unknown account still pays for one key derivation.
    #[instrument(skip_all, fields(login = %req.login))]
    pub async fn sign_in(
        users: &dyn UserStore,
        jwt_service: &JwtService,
        req: SignInRequest,
    ) -> Result<AuthResponse, ApiError> {
        validate_form(&req).map_err(ApiError::Validation)?;

        let email = normalize_email(&req.login);
        let Some(user) = users.find_by_login(&req.login, &email).await? else {
            PasswordService::dummy_compare_async(req.password)
                .await
                .map_err(ApiError::Internal)?;
            debug!("Sign-in rejected: no matching user");
            metrics::counter!("signgate_sign_in_total", "outcome" => "failure").increment(1);
            return Err(ApiError::invalid_credentials());
        };

        // Verify password on blocking thread pool (CPU-intensive)
        let valid = PasswordService::compare_async(
            req.password,
            user.password_hash.clone(),
            user.password_salt.clone(),
        )
        .await
        .map_err(ApiError::Internal)?;

        if !valid {
            debug!(user_id = %user.id, "Sign-in rejected: wrong password");
            metrics::counter!("signgate_sign_in_total", "outcome" => "failure").increment(1);
            return Err(ApiError::invalid_credentials());
        }

        info!(user_id = %user.id, "User signed in");
        metrics::counter!("signgate_sign_in_total", "outcome" => "success").increment(1);

        Self::auth_response(jwt_service, &user)
    }

    /// Report whether a username or email is already taken
    ///
    /// Only the first taken field is reported, username first.
    #[instrument(skip_all)]
    pub async fn check_unique(
        users: &dyn UserStore,
        query: CheckUniqueQuery,
    ) -> Result<CheckUniqueResponse, ApiError> {
        if let Some(username) = query.username() {
            if users.username_exists(username).await? {
                return Ok(CheckUniqueResponse::username_taken());
            }
        }

        if let Some(email) = query.email() {
            if users.email_exists(&normalize_email(email)).await? {
                return Ok(CheckUniqueResponse::email_taken());
            }
        }

        Ok(CheckUniqueResponse::available())
    }

    /// Public fields of the user a verified token was issued to
    pub async fn current_user(users: &dyn UserStore, user_id: Uuid) -> Result<PublicUser, ApiError> {
        let user = users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        Ok(user.to_public())
    }
}
