use super::ApiClient;
use crate::domain::auth::{Credentials, LoginResponse, User};
use crate::domain::error::Result;

impl ApiClient {
    /// Exchanges credentials for a bearer token and the owning user. Sent
    /// without an Authorization header regardless of any stored session.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let builder = self.post("/api/auth/login")?.json(credentials);
        let response = self.execute(builder).await?;
        self.decode(response).await
    }

    pub async fn current_user(&self) -> Result<User> {
        let response = self.send_authorized(self.get("/api/auth/me")?).await?;
        self.decode(response).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.send_authorized(self.post("/api/auth/logout")?).await?;
        Ok(())
    }
}
