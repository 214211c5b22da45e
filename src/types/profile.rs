use serde::{Deserialize, Serialize};

/// User resolved from an access token by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The billing columns of a `profiles` row. Other columns pass through
/// untyped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingProfile {
    #[serde(default)]
    pub stripe_customer_id: Option<String>,
    #[serde(default)]
    pub stripe_subscription_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsernameUpdate {
    pub chess_username: String,
}

/// Chess.com handles: 3-25 characters of letters, digits, `_` or `-`.
pub fn is_valid_chess_username(name: &str) -> bool {
    (3..=25).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
