//! Task API client methods

use crate::client::{handle_empty_response, handle_response, ApiClient};
use crate::error::ClientError;
use crate::types::{ApiEnvelope, Task, TaskCreate, TaskUpdate};

impl ApiClient {
    /// List the caller's tasks
    pub async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        let response = self.get("/tasks/").await?;
        let envelope: ApiEnvelope<Vec<Task>> = handle_response(response).await?;
        Ok(envelope.data)
    }

    /// Fetch a single task
    pub async fn get_task(&self, id: i64) -> Result<Task, ClientError> {
        let response = self.get(&format!("/tasks/{id}")).await?;
        let envelope: ApiEnvelope<Task> = handle_response(response).await?;
        Ok(envelope.data)
    }

    /// Create a task
    pub async fn create_task(&self, task: &TaskCreate) -> Result<Task, ClientError> {
        let response = self.post("/tasks/", task).await?;
        let envelope: ApiEnvelope<Task> = handle_response(response).await?;
        Ok(envelope.data)
    }

    /// Update an existing task; omitted fields are left as they are
    pub async fn update_task(&self, id: i64, changes: &TaskUpdate) -> Result<Task, ClientError> {
        let response = self.put(&format!("/tasks/{id}"), changes).await?;
        let envelope: ApiEnvelope<Task> = handle_response(response).await?;
        Ok(envelope.data)
    }

    /// Delete a task
    pub async fn delete_task(&self, id: i64) -> Result<(), ClientError> {
        let response = self.delete(&format!("/tasks/{id}")).await?;
        handle_empty_response(response).await
    }
}
