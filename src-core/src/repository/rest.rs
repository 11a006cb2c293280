//! Hosted Row Store
//!
//! `TaskStore` over the PostgREST endpoint of the hosted backend.

use async_trait::async_trait;
use serde_json::Value;
use std::rc::Rc;

use super::traits::TaskStore;
use crate::auth::TokenSlot;
use crate::config::ClientConfig;
use crate::domain::{NewTask, PrincipalId, Task, TaskError, TaskId, TaskPatch, TaskResult};
use crate::http::{self, ErrorBody};

const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

/// Row store client; cheap to clone
#[derive(Clone)]
pub struct RestTaskStore {
    http: reqwest::Client,
    config: Rc<ClientConfig>,
    token: TokenSlot,
}

impl RestTaskStore {
    pub fn new(http: reqwest::Client, config: Rc<ClientConfig>, token: TokenSlot) -> Self {
        Self { http, config, token }
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.config.rest_url());
        http::authorize(builder, &self.config, self.token.get().as_deref())
    }

    async fn rows<T: serde::de::DeserializeOwned>(builder: reqwest::RequestBuilder) -> TaskResult<Vec<T>> {
        let response = builder.send().await.map_err(http::transport)?;
        if !response.status().is_success() {
            let (status, body) = http::failure(response).await;
            return Err(classify(status, &body));
        }
        response.json::<Vec<T>>().await.map_err(http::transport)
    }
}

/// Map a row store failure onto the error taxonomy
pub(crate) fn classify(status: u16, body: &ErrorBody) -> TaskError {
    let code = body.code().unwrap_or_default();
    let jwt_rejected = code == "PGRST301" || code == "PGRST303"
        || body.text().map(|t| t.contains("JWT")).unwrap_or(false);

    if status == 401 || jwt_rejected {
        return TaskError::SessionExpired;
    }
    let text = body.text().unwrap_or_else(|| format!("service responded with status {}", status));
    TaskError::Remote(text)
}

fn id_filter(id: &TaskId) -> [(&'static str, String); 1] {
    [("id", format!("eq.{}", id))]
}

#[async_trait(?Send)]
impl TaskStore for RestTaskStore {
    async fn list(&self, owner: &PrincipalId) -> TaskResult<Vec<Task>> {
        let query = [
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", owner)),
            ("order", "created_at.desc".to_string()),
        ];
        Self::rows(self.request(reqwest::Method::GET).query(&query)).await
    }

    async fn create(&self, owner: &PrincipalId, title: &str) -> TaskResult<Task> {
        if title.trim().is_empty() {
            return Err(TaskError::validation("Task title cannot be empty."));
        }
        let body = [NewTask::new(owner, title)];
        let builder = self.request(reqwest::Method::POST)
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(&body);
        Self::rows::<Task>(builder).await?
            .into_iter()
            .next()
            .ok_or_else(|| TaskError::remote("create returned no row"))
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TaskResult<Task> {
        if patch.is_empty() {
            return Err(TaskError::validation("Nothing to update."));
        }
        let builder = self.request(reqwest::Method::PATCH)
            .query(&id_filter(id))
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1)
            .json(patch);
        // Rows hidden by row-level security come back as an empty result
        Self::rows::<Task>(builder).await?
            .into_iter()
            .next()
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &TaskId) -> TaskResult<()> {
        let builder = self.request(reqwest::Method::DELETE)
            .query(&id_filter(id))
            .header(RETURN_REPRESENTATION.0, RETURN_REPRESENTATION.1);
        let removed = Self::rows::<Value>(builder).await?;
        if removed.is_empty() {
            return Err(TaskError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
