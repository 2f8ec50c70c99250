use super::ApiClient;
use crate::domain::entities::{SearchRequest, SearchResult, SourcePage};
use crate::domain::error::Result;

impl ApiClient {
    pub async fn search_documents(&self, request: &SearchRequest) -> Result<SearchResult> {
        let builder = self.post("/api/retrieval/search")?.json(request);
        let response = self.send_authorized(builder).await?;
        self.decode(response).await
    }

    pub async fn list_sources(&self, page: usize, limit: usize) -> Result<SourcePage> {
        let path = format!("/api/retrieval/data_sources?page={}&limit={}", page, limit);
        let response = self.send_authorized(self.get(&path)?).await?;
        self.decode(response).await
    }
}
