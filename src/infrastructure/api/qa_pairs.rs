use super::ApiClient;
use crate::domain::entities::{QaPair, QaPairDraft, QaPairUpdate};
use crate::domain::error::Result;

impl ApiClient {
    pub async fn list_qa_pairs(&self, collection_id: &str) -> Result<Vec<QaPair>> {
        let path = format!("/api/collections/{}/qa-pairs", collection_id);
        let response = self.send_authorized(self.get(&path)?).await?;
        self.decode(response).await
    }

    pub async fn get_qa_pair(&self, id: &str) -> Result<QaPair> {
        let path = format!("/api/collections/qa-pairs/{}", id);
        let response = self.send_authorized(self.get(&path)?).await?;
        self.decode(response).await
    }

    pub async fn create_qa_pair(&self, collection_id: &str, draft: &QaPairDraft) -> Result<QaPair> {
        let path = format!("/api/collections/{}/qa-pairs", collection_id);
        let builder = self.post(&path)?.json(draft);
        let response = self.send_authorized(builder).await?;
        self.decode(response).await
    }

    pub async fn update_qa_pair(&self, id: &str, update: &QaPairUpdate) -> Result<QaPair> {
        let path = format!("/api/collections/qa-pairs/{}", id);
        let builder = self.patch(&path)?.json(update);
        let response = self.send_authorized(builder).await?;
        self.decode(response).await
    }

    pub async fn delete_qa_pair(&self, id: &str) -> Result<()> {
        let path = format!("/api/collections/qa-pairs/{}", id);
        self.send_authorized(self.delete(&path)?).await?;
        Ok(())
    }
}
