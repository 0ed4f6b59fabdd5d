use crate::pipeline::ResolveError;
use crate::telegram::PhotoFetcher;
use chrono::{DateTime, Utc};
use common_types::{DecodedImage, SourceContext};
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything the transport layer managed to pull out of one inbound
/// request, before any of it has been validated or decoded.
#[derive(Debug, Default, Clone)]
pub struct ImageRequest {
    /// Photo handle from the messaging gateway, fetched remotely.
    pub telegram_file_id: Option<String>,
    /// Chat the photo arrived from, when it came through the gateway.
    pub chat_id: Option<i64>,
    /// Externally supplied camera identifier.
    pub camera_id: Option<String>,
    /// Bytes of the `image` multipart field.
    pub image_field: Option<Vec<u8>>,
    /// Bytes of the alternatively named `file` multipart field.
    pub file_field: Option<Vec<u8>>,
    /// Raw request body, the last-resort input.
    pub raw_body: Option<Vec<u8>>,
}

/// Where the winning strategy got its bytes from; decides the fallback
/// `source_id` when no camera id was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolvedOrigin {
    Gateway,
    Direct,
}

/// Normalizes the three possible input shapes into one decoded image plus a
/// source context.
///
/// Strategies are tried in a fixed order, stopping at the first that applies:
/// gateway photo handle, `image` field, `file` field, raw body. A gateway
/// fetch error is logged and treated as "not applicable" so an inline copy in
/// the same request can still win; once any strategy yields bytes, a decode
/// failure is final.
pub struct SourceResolver {
    fetcher: Option<Arc<dyn PhotoFetcher>>,
}

impl SourceResolver {
    #[must_use]
    pub fn new(fetcher: Option<Arc<dyn PhotoFetcher>>) -> Self {
        Self { fetcher }
    }

    pub async fn resolve(
        &self,
        request: &ImageRequest,
    ) -> Result<(DecodedImage, SourceContext), ResolveError> {
        self.resolve_at(request, Utc::now()).await
    }

    /// `received_at` is injected so artifact naming stays deterministic in
    /// tests; [`Self::resolve`] captures it once per invocation.
    pub async fn resolve_at(
        &self,
        request: &ImageRequest,
        received_at: DateTime<Utc>,
    ) -> Result<(DecodedImage, SourceContext), ResolveError> {
        let (bytes, origin) = match self.obtain_bytes(request).await {
            Some(found) => found,
            None => return Err(ResolveError::SourceUnavailable),
        };

        let image = DecodedImage::from_bytes(&bytes)?;
        let source = derive_source(request, origin, received_at);
        debug!(
            source_id = %source.source_id,
            width = image.width(),
            height = image.height(),
            "image resolved"
        );
        Ok((image, source))
    }

    async fn obtain_bytes(&self, request: &ImageRequest) -> Option<(Vec<u8>, ResolvedOrigin)> {
        if let (Some(file_id), Some(fetcher)) = (&request.telegram_file_id, &self.fetcher) {
            match fetcher.fetch_photo(file_id).await {
                Ok(bytes) if !bytes.is_empty() => {
                    return Some((bytes, ResolvedOrigin::Gateway));
                }
                Ok(_) => warn!(file_id, "gateway returned an empty photo"),
                Err(e) => warn!(file_id, "gateway photo fetch failed: {e:#}"),
            }
        }

        for field in [&request.image_field, &request.file_field, &request.raw_body] {
            if let Some(bytes) = field
                && !bytes.is_empty()
            {
                return Some((bytes.clone(), ResolvedOrigin::Direct));
            }
        }
        None
    }
}

fn derive_source(
    request: &ImageRequest,
    origin: ResolvedOrigin,
    received_at: DateTime<Utc>,
) -> SourceContext {
    if let Some(camera_id) = request.camera_id.as_deref().filter(|id| !id.trim().is_empty()) {
        return SourceContext::from_camera(camera_id, received_at);
    }
    if origin == ResolvedOrigin::Gateway
        && let Some(chat_id) = request.chat_id
    {
        return SourceContext::from_telegram_chat(chat_id, received_at);
    }
    SourceContext::fallback(received_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use color_eyre::Result;
    use color_eyre::eyre::eyre;
    use common_types::FALLBACK_SOURCE_ID;
    use image::RgbImage;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let image = RgbImage::from_pixel(8, 8, image::Rgb([10, 200, 10]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode");
        bytes
    }

    struct StaticFetcher(Vec<u8>);

    #[async_trait]
    impl PhotoFetcher for StaticFetcher {
        async fn fetch_photo(&self, _file_id: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl PhotoFetcher for FailingFetcher {
        async fn fetch_photo(&self, _file_id: &str) -> Result<Vec<u8>> {
            Err(eyre!("gateway unreachable"))
        }
    }

    #[tokio::test]
    async fn gateway_handle_wins_over_inline_fields() {
        let resolver = SourceResolver::new(Some(Arc::new(StaticFetcher(png_bytes()))));
        let request = ImageRequest {
            telegram_file_id: Some("handle".to_string()),
            chat_id: Some(99),
            image_field: Some(b"junk that would fail to decode".to_vec()),
            ..Default::default()
        };

        let (_, source) = resolver.resolve(&request).await.expect("resolves");
        assert_eq!(source.source_id, "TELEGRAM_99");
    }

    #[tokio::test]
    async fn image_field_wins_over_file_field_and_raw_body() {
        let resolver = SourceResolver::new(None);
        let request = ImageRequest {
            camera_id: Some("CAM1".to_string()),
            image_field: Some(png_bytes()),
            file_field: Some(b"garbage".to_vec()),
            raw_body: Some(b"garbage".to_vec()),
            ..Default::default()
        };

        assert!(resolver.resolve(&request).await.is_ok());
    }

    #[tokio::test]
    async fn file_field_and_raw_body_are_fallbacks() {
        let resolver = SourceResolver::new(None);
        let request = ImageRequest {
            file_field: Some(png_bytes()),
            ..Default::default()
        };
        let (_, source) = resolver.resolve(&request).await.expect("file field resolves");
        assert_eq!(source.source_id, FALLBACK_SOURCE_ID);

        let request = ImageRequest {
            raw_body: Some(png_bytes()),
            ..Default::default()
        };
        assert!(resolver.resolve(&request).await.is_ok());
    }

    #[tokio::test]
    async fn gateway_failure_falls_through_to_inline_bytes() {
        let resolver = SourceResolver::new(Some(Arc::new(FailingFetcher)));
        let request = ImageRequest {
            telegram_file_id: Some("handle".to_string()),
            chat_id: Some(12),
            image_field: Some(png_bytes()),
            ..Default::default()
        };

        let (_, source) = resolver.resolve(&request).await.expect("inline fallback");
        // Bytes did not come through the gateway, so no TELEGRAM_ id.
        assert_eq!(source.source_id, FALLBACK_SOURCE_ID);
    }

    #[tokio::test]
    async fn no_input_is_source_unavailable() {
        let resolver = SourceResolver::new(None);
        let request = ImageRequest {
            telegram_file_id: Some("handle-without-gateway".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            resolver.resolve(&request).await,
            Err(ResolveError::SourceUnavailable)
        ));
    }

    #[tokio::test]
    async fn undecodable_bytes_are_a_decode_error() {
        let resolver = SourceResolver::new(None);
        let request = ImageRequest {
            image_field: Some(b"not an image at all".to_vec()),
            ..Default::default()
        };

        assert!(matches!(
            resolver.resolve(&request).await,
            Err(ResolveError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn camera_id_beats_chat_derived_id() {
        let resolver = SourceResolver::new(Some(Arc::new(StaticFetcher(png_bytes()))));
        let request = ImageRequest {
            telegram_file_id: Some("handle".to_string()),
            chat_id: Some(5),
            camera_id: Some("CAM7".to_string()),
            ..Default::default()
        };

        let (_, source) = resolver.resolve(&request).await.expect("resolves");
        assert_eq!(source.source_id, "CAM7");
    }
}
