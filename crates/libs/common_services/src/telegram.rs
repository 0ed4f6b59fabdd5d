use app_state::TelegramSettings;
use async_trait::async_trait;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// Narrow gateway contract the image resolver needs: turn a photo handle
/// into bytes. Fetching is a two-step protocol (resolve the handle to a
/// download path, then retrieve the bytes).
#[async_trait]
pub trait PhotoFetcher: Send + Sync {
    async fn fetch_photo(&self, file_id: &str) -> Result<Vec<u8>>;
}

/// Telegram Bot API client. Constructed once at startup when a bot token is
/// configured; without a token the webhook ingestion path is disabled.
#[derive(Clone)]
pub struct TelegramClient {
    http_client: Client,
    api_base: String,
    bot_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

impl TelegramClient {
    #[must_use]
    pub fn from_settings(http_client: Client, settings: &TelegramSettings) -> Option<Self> {
        let bot_token = settings.bot_token.clone()?;
        Some(Self {
            http_client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            bot_token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    async fn call<T: serde::de::DeserializeOwned>(&self, method: &str, payload: Value) -> Result<T> {
        let response = self
            .http_client
            .post(self.method_url(method))
            .json(&payload)
            .send()
            .await?;
        let body: ApiResponse<T> = response.json().await?;
        if !body.ok {
            return Err(eyre!(
                "telegram {method} failed: {}",
                body.description.unwrap_or_else(|| "unknown error".to_string())
            ));
        }
        body.result
            .ok_or_else(|| eyre!("telegram {method} returned no result"))
    }

    /// Resolves a photo handle to its download path (`getFile`).
    pub async fn resolve_handle(&self, file_id: &str) -> Result<String> {
        let info: FileInfo = self.call("getFile", json!({ "file_id": file_id })).await?;
        info.file_path
            .ok_or_else(|| eyre!("telegram file {file_id} has no download path"))
    }

    /// Retrieves the bytes behind a previously resolved download path.
    pub async fn fetch_bytes(&self, download_path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/file/bot{}/{download_path}", self.api_base, self.bot_token);
        let response = self.http_client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(eyre!("telegram file download failed: {}", response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Points the bot's webhook at the given public URL.
    pub async fn set_webhook(&self, webhook_url: &str) -> Result<()> {
        let _: bool = self.call("setWebhook", json!({ "url": webhook_url })).await?;
        info!(url = webhook_url, "telegram webhook configured");
        Ok(())
    }

    /// Removes the webhook configuration.
    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", json!({})).await?;
        info!("telegram webhook removed");
        Ok(())
    }

    /// Current webhook state, including pending update count and last error.
    pub async fn webhook_info(&self) -> Result<Value> {
        self.call("getWebhookInfo", json!({})).await
    }
}

#[async_trait]
impl PhotoFetcher for TelegramClient {
    async fn fetch_photo(&self, file_id: &str) -> Result<Vec<u8>> {
        let download_path = self.resolve_handle(file_id).await?;
        self.fetch_bytes(&download_path).await
    }
}

/// Incoming webhook payload. Unknown fields are ignored; only photo-bearing
/// messages reach the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    pub photo: Option<Vec<TelegramPhotoSize>>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramPhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

impl TelegramMessage {
    /// Telegram sends several downscaled variants; pick the largest.
    #[must_use]
    pub fn largest_photo(&self) -> Option<&TelegramPhotoSize> {
        self.photo
            .as_deref()?
            .iter()
            .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
    }
}
