use serde::Serialize;

use gatekeeper_auth::{AccessToken, UserView};

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: AccessToken,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct BlockUserResponse {
    pub message: &'static str,
    pub user: UserView,
}
