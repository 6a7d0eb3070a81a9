//! Thin HTTP client for the notes API.
//!
//! Every call is bounded by the configured timeout. Non-2xx responses are
//! turned into [`ClientError::Api`] carrying the server's error message.

use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use pinboard_shared::constants::NOTES_PATH;
use pinboard_shared::protocol::{
    CreateNoteRequest, CreateNoteResponse, DeleteNoteRequest, ErrorResponse, UpdateNoteRequest,
    UpdateNoteResponse,
};
use pinboard_shared::{NoteId, NoteView};

use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    notes_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            notes_url: format!("{}{}", base_url.trim_end_matches('/'), NOTES_PATH),
        })
    }

    pub fn notes_url(&self) -> &str {
        &self.notes_url
    }

    pub async fn list_notes(&self) -> Result<Vec<NoteView>, ClientError> {
        let resp = self.http.get(&self.notes_url).send().await?;
        decode(resp).await
    }

    /// Returns the created note and its edit token.
    ///
    /// Input is sent as given; the server is the authority on validation.
    pub async fn create_note(
        &self,
        content: Option<&str>,
        image_data_url: Option<&str>,
    ) -> Result<(NoteView, String), ClientError> {
        let body = CreateNoteRequest {
            content: content.map(str::to_string),
            image_data_url: image_data_url.map(str::to_string),
        };
        let created: CreateNoteResponse = self.send(Method::POST, &body).await?;
        Ok((created.note, created.token))
    }

    pub async fn update_note(
        &self,
        id: &NoteId,
        token: &str,
        content: Option<&str>,
        image_data_url: Option<&str>,
    ) -> Result<NoteView, ClientError> {
        let body = UpdateNoteRequest {
            id: Some(id.to_string()),
            token: Some(token.to_string()),
            content: content.map(str::to_string),
            image_data_url: image_data_url.map(str::to_string),
        };
        let updated: UpdateNoteResponse = self.send(Method::PUT, &body).await?;
        Ok(updated.note)
    }

    pub async fn delete_note(&self, id: &NoteId, token: &str) -> Result<(), ClientError> {
        let body = DeleteNoteRequest {
            id: Some(id.to_string()),
            token: Some(token.to_string()),
        };
        let _: serde_json::Value = self.send(Method::DELETE, &body).await?;
        Ok(())
    }

    async fn send<B, T>(&self, method: Method, body: &B) -> Result<T, ClientError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let resp = self
            .http
            .request(method, &self.notes_url)
            .json(body)
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
