use async_trait::async_trait;
use pgwire::api::auth::{AuthSource, LoginInfo, Password};
use pgwire::error::{PgWireError, PgWireResult};
use tracing::warn;

use crate::observability::AUTH_FAILURES_TOTAL;

/// Single fixed login. Any other user name is refused before the password
/// exchange completes.
#[derive(Debug)]
pub struct WallAuthSource {
    user: String,
    password: String,
}

impl WallAuthSource {
    pub fn new(user: String, password: String) -> Self {
        Self { user, password }
    }
}

#[async_trait]
impl AuthSource for WallAuthSource {
    async fn get_password(&self, login: &LoginInfo) -> PgWireResult<Password> {
        let user = login.user().unwrap_or_default();
        if user != self.user {
            warn!("login refused for user {user:?}");
            metrics::counter!(AUTH_FAILURES_TOTAL).increment(1);
            return Err(PgWireError::InvalidPassword(user.to_string()));
        }
        Ok(Password::new(None, self.password.as_bytes().to_vec()))
    }
}
