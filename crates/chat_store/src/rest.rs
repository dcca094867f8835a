//! Hosted store speaking the PostgREST dialect (Supabase).

use async_trait::async_trait;
use chat_core::{
    conversation_title, Conversation, ConversationId, Message, MessageId, NewMessage, Response,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreOperation, StoreResult};
use crate::storage::ChatStore;

const REST_PREFIX: &str = "rest/v1";

#[derive(Serialize)]
struct NewConversationRow<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct NewResponseRow<'a> {
    message_id: MessageId,
    content: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Store backed by a hosted PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct RestChatStore {
    client: Client,
    base_url: String,
}

impl RestChatStore {
    /// Build a store for `base_url` authenticating with the anon `api_key`.
    pub fn new(base_url: impl Into<String>, api_key: &str) -> StoreResult<Self> {
        let client = Self::client_builder(api_key)?
            .build()
            .map_err(StoreError::during(StoreOperation::Init))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Client builder carrying the `apikey` and bearer headers.
    pub fn client_builder(api_key: &str) -> StoreResult<ClientBuilder> {
        let op = StoreOperation::Init;
        let key = HeaderValue::from_str(api_key).map_err(StoreError::during(op))?;
        let bearer =
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(StoreError::during(op))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        Ok(Client::builder().default_headers(headers))
    }

    /// Use a preconfigured client; it must already carry the auth headers.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{REST_PREFIX}/{table}", self.base_url))
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        operation: StoreOperation,
        request: RequestBuilder,
    ) -> StoreResult<Vec<T>> {
        let response = request
            .send()
            .await
            .map_err(StoreError::during(operation))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(StoreError::during(operation))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|error| error.message)
                .unwrap_or(body);
            return Err(StoreError::new(operation, format!("{status}: {message}")));
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body).map_err(StoreError::during(operation))
    }

    async fn insert<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        operation: StoreOperation,
        table: &str,
        row: &B,
    ) -> StoreResult<T> {
        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&[row]);
        self.rows(operation, request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::new(operation, "insert returned no row"))
    }

    async fn delete_all(&self, operation: StoreOperation, table: &str) -> StoreResult<()> {
        // PostgREST refuses unfiltered deletes.
        let request = self
            .request(Method::DELETE, table)
            .query(&[("id", "neq.0")]);
        self.rows::<serde_json::Value>(operation, request).await?;
        tracing::info!("cleared {}", table);
        Ok(())
    }
}

#[async_trait]
impl ChatStore for RestChatStore {
    async fn create_conversation(&self, title: &str) -> StoreResult<Conversation> {
        let title = conversation_title(title);
        self.insert(
            StoreOperation::CreateConversation,
            "conversations",
            &NewConversationRow { title: &title },
        )
        .await
    }

    async fn send_message(&self, message: NewMessage) -> StoreResult<Message> {
        let op = StoreOperation::SendMessage;
        if !message.is_consistent() {
            return Err(StoreError::new(op, "is_branch and parent_id disagree"));
        }
        self.insert(op, "messages", &message).await
    }

    async fn save_response(&self, message_id: MessageId, content: &str) -> StoreResult<Response> {
        self.insert(
            StoreOperation::SaveResponse,
            "responses",
            &NewResponseRow {
                message_id,
                content,
            },
        )
        .await
    }

    async fn fetch_conversations(&self) -> StoreResult<Vec<Conversation>> {
        let request = self
            .request(Method::GET, "conversations")
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        self.rows(StoreOperation::FetchConversations, request).await
    }

    async fn fetch_messages(&self, conversation_id: ConversationId) -> StoreResult<Vec<Message>> {
        let conversation_filter = format!("eq.{conversation_id}");
        let request = self.request(Method::GET, "messages").query(&[
            ("select", "*"),
            ("conversation_id", conversation_filter.as_str()),
            ("is_branch", "eq.false"),
            ("order", "created_at.asc,id.asc"),
        ]);
        self.rows(StoreOperation::FetchMessages, request).await
    }

    async fn fetch_children(&self, parent_id: MessageId) -> StoreResult<Vec<Message>> {
        let parent_filter = format!("eq.{parent_id}");
        let request = self
            .request(Method::GET, "messages")
            .query(&[
                ("select", "*"),
                ("parent_id", parent_filter.as_str()),
                ("order", "id.asc"),
            ]);
        self.rows(StoreOperation::FetchChildren, request).await
    }

    async fn fetch_response(&self, message_id: MessageId) -> StoreResult<Option<Response>> {
        let message_filter = format!("eq.{message_id}");
        let request = self.request(Method::GET, "responses").query(&[
            ("select", "*"),
            ("message_id", message_filter.as_str()),
            ("order", "id.asc"),
            ("limit", "1"),
        ]);
        let rows: Vec<Response> = self.rows(StoreOperation::FetchResponse, request).await?;
        Ok(rows.into_iter().next())
    }

    async fn clear_all(&self) -> StoreResult<()> {
        self.delete_all(StoreOperation::ClearResponses, "responses")
            .await?;
        self.delete_all(StoreOperation::ClearMessages, "messages")
            .await?;
        self.delete_all(StoreOperation::ClearConversations, "conversations")
            .await
    }
}
