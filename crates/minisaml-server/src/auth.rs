//! Demo credential store.
//!
//! A fixed in-memory user list standing in for a real directory. Lookups
//! return the user's profile; failures are reported through the protocol
//! error type so handlers map them to 401 uniformly.

use minisaml_protocol::{SamlError, SamlResult, UserProfile};

struct DemoUser {
    email: &'static str,
    password: &'static str,
    id: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    role: &'static str,
}

const USERS: &[DemoUser] = &[DemoUser {
    email: "user@example.com",
    password: "password123",
    id: "user123",
    first_name: "Test",
    last_name: "User",
    role: "user",
}];

/// Verifies demo credentials, returning the matching profile.
pub fn authenticate(email: &str, password: &str) -> SamlResult<UserProfile> {
    USERS
        .iter()
        .find(|user| user.email == email && user.password == password)
        .map(|user| UserProfile {
            id: user.id.to_string(),
            email: user.email.to_string(),
            first_name: user.first_name.to_string(),
            last_name: user.last_name.to_string(),
            role: Some(user.role.to_string()),
        })
        .ok_or_else(|| SamlError::AuthenticationFailed("invalid credentials".to_string()))
}
