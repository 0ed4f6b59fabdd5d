use app_state::StorageSettings;
use async_trait::async_trait;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

/// Blob storage boundary: store bytes under a key, get a public URL back.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String>;
}

/// Supabase-compatible storage REST client. Objects are upserted so a
/// redelivered request overwrites rather than conflicts.
#[derive(Clone)]
pub struct SupabaseStorage {
    http_client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl SupabaseStorage {
    #[must_use]
    pub fn new(http_client: Client, settings: &StorageSettings) -> Self {
        Self {
            http_client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            bucket: settings.bucket.clone(),
            service_key: settings.service_key.clone(),
        }
    }

    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{key}",
            self.base_url, self.bucket
        )
    }
}

#[async_trait]
impl ArtifactStore for SupabaseStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        let url = format!("{}/storage/v1/object/{}/{key}", self.base_url, self.bucket);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header(CONTENT_TYPE, "image/jpeg")
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(eyre!("storage upload of {key} failed: {status}: {error_text}"));
        }

        Ok(self.public_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_state::StorageSettings;

    #[test]
    fn public_url_joins_base_bucket_and_key() {
        let storage = SupabaseStorage::new(
            Client::new(),
            &StorageSettings {
                url: "https://project.supabase.co/".to_string(),
                service_key: "key".to_string(),
                bucket: "violations".to_string(),
            },
        );
        assert_eq!(
            storage.public_url("CAM1/20240101_120000.jpg"),
            "https://project.supabase.co/storage/v1/object/public/violations/CAM1/20240101_120000.jpg"
        );
    }
}
