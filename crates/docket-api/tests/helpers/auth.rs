use docket_api::auth::SessionClaims;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

/// Shared secret used by the test resolver (must match setup_test_app).
pub const TEST_JWT_SECRET: &str = "test-session-secret-at-least-32-characters";

/// Session headers for one signed-in user.
pub struct TestUser {
    pub username: String,
    pub access_token: String,
    pub id_token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    pub fn cookie(&self) -> String {
        format!("accessToken={}; idToken={}", self.access_token, self.id_token)
    }
}

fn sign(claims: &SessionClaims) -> String {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// Mint an access/id token pair for `username`.
pub fn test_user(username: &str) -> TestUser {
    let exp = chrono::Utc::now().timestamp() + 600;
    let sub = format!("sub-{}", username);

    let access = SessionClaims {
        sub: sub.clone(),
        exp,
        username: Some(username.to_string()),
        cognito_username: None,
        token_use: Some("access".to_string()),
        iss: None,
        aud: None,
    };
    let id = SessionClaims {
        sub,
        exp,
        username: None,
        cognito_username: Some(username.to_string()),
        token_use: Some("id".to_string()),
        iss: None,
        aud: None,
    };

    TestUser {
        username: username.to_string(),
        access_token: sign(&access),
        id_token: sign(&id),
    }
}
