use super::ApiClient;
use crate::domain::entities::{Collection, CollectionInput};
use crate::domain::error::Result;

impl ApiClient {
    pub async fn list_collections(&self) -> Result<Vec<Collection>> {
        let response = self.send_authorized(self.get("/api/collections")?).await?;
        self.decode(response).await
    }

    pub async fn get_collection(&self, id: &str) -> Result<Collection> {
        let path = format!("/api/collections/{}", id);
        let response = self.send_authorized(self.get(&path)?).await?;
        self.decode(response).await
    }

    pub async fn create_collection(&self, input: &CollectionInput) -> Result<Collection> {
        let builder = self.post("/api/collections")?.json(input);
        let response = self.send_authorized(builder).await?;
        self.decode(response).await
    }

    pub async fn update_collection(&self, id: &str, input: &CollectionInput) -> Result<Collection> {
        let path = format!("/api/collections/{}", id);
        let builder = self.put(&path)?.json(input);
        let response = self.send_authorized(builder).await?;
        self.decode(response).await
    }

    pub async fn delete_collection(&self, id: &str) -> Result<()> {
        let path = format!("/api/collections/{}", id);
        self.send_authorized(self.delete(&path)?).await?;
        Ok(())
    }
}
