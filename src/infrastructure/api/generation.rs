use super::ApiClient;
use crate::domain::entities::{GenerationRequest, GenerationResponse};
use crate::domain::error::Result;

impl ApiClient {
    /// Asks the backend to draft an answer from the question and its
    /// supporting documents.
    pub async fn generate_answer(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let builder = self.post("/api/generation/generate")?.json(request);
        let response = self.send_authorized(builder).await?;
        self.decode(response).await
    }
}
