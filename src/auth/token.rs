//! Issuing and verifying the JSON Web Tokens that authenticate API requests.
//!
//! Log in issues a short-lived access token and a long-lived refresh token.
//! Only access tokens are accepted as bearer credentials; presenting a
//! refresh token to a protected route is rejected.

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, user::{User, UserId}};

/// How long an access token stays valid.
const ACCESS_TOKEN_MINUTES: i64 = 15;

/// How long a refresh token stays valid.
const REFRESH_TOKEN_DAYS: i64 = 7;

/// Whether a token grants API access or only a new token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// A short-lived token sent as the bearer credential on API requests.
    Access,
    /// A long-lived token a client holds on to for re-authentication.
    Refresh,
}

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The expiry time of the token.
    pub exp: usize,
    /// The time the token was issued.
    pub iat: usize,
    /// The ID of the user the token belongs to.
    pub sub: UserId,
    /// Email associated with the token.
    pub email: String,
    /// Whether this is an access or a refresh token.
    pub token_type: TokenType,
}

impl<S> FromRequestParts<S> for Claims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::InvalidToken)?;

        let state = AppState::from_ref(state);
        let token_data = decode_token(bearer.token(), state.decoding_key())?;

        if token_data.claims.token_type != TokenType::Access {
            return Err(Error::InvalidToken);
        }

        Ok(token_data.claims)
    }
}

/// Sign a token of the given kind for `user`.
///
/// # Errors
/// This function will return a [Error::TokenCreation] if signing fails.
pub fn encode_token(
    user: &User,
    token_type: TokenType,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = Utc::now();
    let lifetime = match token_type {
        TokenType::Access => Duration::minutes(ACCESS_TOKEN_MINUTES),
        TokenType::Refresh => Duration::days(REFRESH_TOKEN_DAYS),
    };

    let claims = Claims {
        exp: (now + lifetime).timestamp() as usize,
        iat: now.timestamp() as usize,
        sub: user.id,
        email: user.email.clone(),
        token_type,
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|error| {
        tracing::error!("Error signing token: {error}");
        Error::TokenCreation
    })
}

/// Verify a token's signature and expiry and return its claims.
fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<TokenData<Claims>, Error> {
    decode(token, decoding_key, &Validation::default()).map_err(|_| Error::InvalidToken)
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::get};
    use axum_test::TestServer;
    use chrono::Utc;
    use jsonwebtoken::{DecodingKey, EncodingKey};
    use rusqlite::Connection;

    use crate::{AppState, PaginationConfig, build_router, user::User};

    use super::{Claims, TokenType, decode_token, encode_token};

    fn get_test_user() -> User {
        User {
            id: 7,
            username: "alice".to_owned(),
            email: "alice@test.com".to_owned(),
            password_hash: "not a real hash".to_owned(),
            first_name: "Alice".to_owned(),
            last_name: "Smith".to_owned(),
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn decode_gives_back_user_id_and_email() {
        let encoding_key = EncodingKey::from_secret(b"42");
        let decoding_key = DecodingKey::from_secret(b"42");
        let user = get_test_user();

        let token = encode_token(&user, TokenType::Access, &encoding_key).unwrap();
        let claims = decode_token(&token, &decoding_key).unwrap().claims;

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn decode_fails_with_wrong_secret() {
        let encoding_key = EncodingKey::from_secret(b"42");
        let decoding_key = DecodingKey::from_secret(b"43");

        let token = encode_token(&get_test_user(), TokenType::Access, &encoding_key).unwrap();

        assert!(decode_token(&token, &decoding_key).is_err());
    }

    fn get_test_state() -> AppState {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");
        AppState::new(connection, "42", PaginationConfig::default())
            .expect("Could not create app state.")
    }

    async fn handler_with_auth(_: Claims) -> StatusCode {
        StatusCode::OK
    }

    fn create_protected_server(state: AppState) -> TestServer {
        let app = axum::Router::new()
            .route("/protected", get(handler_with_auth))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn protected_route_accepts_access_token() {
        let state = get_test_state();
        let token = encode_token(&get_test_user(), TokenType::Access, state.encoding_key()).unwrap();
        let server = create_protected_server(state);

        server
            .get("/protected")
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn protected_route_rejects_refresh_token() {
        let state = get_test_state();
        let token =
            encode_token(&get_test_user(), TokenType::Refresh, state.encoding_key()).unwrap();
        let server = create_protected_server(state);

        server
            .get("/protected")
            .authorization_bearer(token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_route_rejects_missing_header() {
        let server = create_protected_server(get_test_state());

        server
            .get("/protected")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_route_rejects_garbage_token() {
        let server = create_protected_server(get_test_state());

        server
            .get("/protected")
            .authorization_bearer("not.a.token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn full_router_rejects_unauthenticated_requests() {
        let server = TestServer::new(build_router(get_test_state()));

        server
            .get(crate::endpoints::EXPENSES)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
