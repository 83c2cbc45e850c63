use axum::{extract::State, response::IntoResponse, routing::post, Json};
use garde::Validate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use yamdb_auth::confirmation::AccountSnapshot;
use yamdb_dal::{
    error::OptionalRecord as _,
    user::{ConfirmationState, CreateUser, User, UserRepository},
};
use yamdb_types::{
    claim::Role,
    general::{not_reserved_username, ValidEmail},
};

use crate::{
    error::{ApiError, ApiResult},
    mail::Mail,
    state::AppState,
    validate::Garde,
};

pub mod actor;

pub use actor::require_identity;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SignupRequest {
    #[garde(
        length(min = 1, max = 150),
        pattern(r"^[\w.@+-]+$"),
        custom(not_reserved_username)
    )]
    pub username: String,
    #[garde(dive)]
    pub email: ValidEmail,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TokenRequest {
    #[garde(length(min = 1, max = 150))]
    pub username: String,
    #[garde(length(min = 1, max = 256))]
    pub confirmation_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

const INVALID_CODE: &str = "Invalid or expired confirmation code";

fn snapshot(state: ConfirmationState) -> ApiResult<AccountSnapshot> {
    let role = state
        .role
        .parse::<Role>()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(AccountSnapshot {
        user_id: state.id,
        username: state.username,
        email: state.email,
        role,
        nonce: state.confirmation_nonce,
    })
}

/// Finds the account a signup refers to, creating it when neither username nor email is known
async fn signup_account(users: &UserRepository, request: &SignupRequest) -> ApiResult<User> {
    let by_username = users.find_by_username(&request.username).await.optional()?;
    let by_email = users
        .find_by_email(request.email.as_ref())
        .await
        .optional()?;

    match (by_username, by_email) {
        (Some(user), Some(other)) if user.id == other.id => {
            debug!("Repeated signup of {}", user.username);
            Ok(user)
        }
        (Some(_), _) => Err(ApiError::field(
            "username",
            "User with this username already exists",
        )),
        (None, Some(_)) => Err(ApiError::field(
            "email",
            "User with this email already exists",
        )),
        (None, None) => {
            let user = users
                .create(CreateUser::new(
                    request.username.clone(),
                    request.email.clone(),
                ))
                .await?;
            info!("New user {} signed up", user.username);
            Ok(user)
        }
    }
}

pub async fn signup(
    State(state): State<AppState>,
    users: UserRepository,
    Garde(Json(payload)): Garde<Json<SignupRequest>>,
) -> ApiResult<impl IntoResponse> {
    let user = signup_account(&users, &payload).await?;
    let snapshot = snapshot(users.confirmation_state(user.id).await?)?;
    let code = state.codes().issue(&snapshot)?;
    let token_url = state
        .build_url("v1/auth/token/")
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    state
        .mailer()
        .send(Mail {
            from: state.config().mail_from.clone(),
            to: user.email.clone(),
            subject: "YaMDb confirmation code".to_string(),
            body: format!(
                "Hello {},\n\nConfirmation code: {code}\n\nExchange it for an access token at {token_url}",
                user.username
            ),
        })
        .await?;

    Ok(Json(payload))
}

pub async fn token(
    State(state): State<AppState>,
    users: UserRepository,
    Garde(Json(payload)): Garde<Json<TokenRequest>>,
) -> ApiResult<impl IntoResponse> {
    let user = users.find_by_username(&payload.username).await?;
    let snapshot = snapshot(users.confirmation_state(user.id).await?)?;

    state
        .codes()
        .verify(&snapshot, &payload.confirmation_code)
        .map_err(|e| {
            if e.is_client_error() {
                debug!("Rejected confirmation code for {}: {e}", user.username);
                ApiError::field("confirmation_code", INVALID_CODE)
            } else {
                e.into()
            }
        })?;

    if !users.consume_nonce(user.id, &snapshot.nonce).await? {
        debug!("Confirmation code for {} already used", user.username);
        return Err(ApiError::field("confirmation_code", INVALID_CODE));
    }

    let token = state.tokens().issue(user.id, snapshot.role)?;
    info!("Issued token for {}", user.username);

    Ok(Json(TokenResponse { token }))
}

pub fn auth_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/auth/signup/", post(signup))
        .route("/auth/token/", post(token))
}
