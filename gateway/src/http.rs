//! The [`Gateway`] over HTTP.
use async_trait::async_trait;
use primitives::{
    config::GatewayConfig, util::api::ApiUrl, IdentityRecord, SharedDraft, VerificationSource,
};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use slog::{debug, Logger};
use url::Url;

use crate::{
    Error, Gateway, GatewayResult, GenerateCopyRequest, GeneratedCopy, SaveDraftRequest,
    UploadRequest, VerifyIdentityRequest,
};

pub const VERIFY_IDENTITY: &str = "verify-identity";
pub const GENERATE_COPY: &str = "generate-copy";
pub const UPLOAD_ASSET: &str = "upload-asset";
pub const SAVE_DRAFT: &str = "save-draft";

/// Body of a failed request
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "error")]
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct UploadResponse {
    url: Url,
}

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: ApiUrl,
    logger: Logger,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig, logger: Logger) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            logger,
        })
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> GatewayResult<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned + Send,
    {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|error| Error::Rejected(format!("Invalid endpoint {endpoint}: {error}")))?;

        debug!(&self.logger, "POST {}", url; "module" => "gateway");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|error| body_error(endpoint, error))
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn verify_identity(
        &self,
        request: &VerifyIdentityRequest,
    ) -> GatewayResult<IdentityRecord> {
        let record: IdentityRecord = self.post(VERIFY_IDENTITY, request).await?;

        // whatever the service claims, this record comes from it
        Ok(IdentityRecord {
            source: VerificationSource::Remote,
            ..record
        })
    }

    async fn generate_copy(
        &self,
        request: &GenerateCopyRequest,
    ) -> GatewayResult<GeneratedCopy> {
        self.post(GENERATE_COPY, request).await
    }

    async fn upload_asset(&self, request: &UploadRequest) -> GatewayResult<Url> {
        let response: UploadResponse = self.post(UPLOAD_ASSET, request).await?;

        Ok(response.url)
    }

    async fn save_draft(&self, request: &SaveDraftRequest) -> GatewayResult<SharedDraft> {
        self.post(SAVE_DRAFT, request).await
    }

    async fn fetch_asset(&self, url: &Url) -> GatewayResult<Vec<u8>> {
        debug!(&self.logger, "GET {}", url; "module" => "gateway");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(|error| body_error(url.as_str(), error))?;

        Ok(bytes.to_vec())
    }
}

/// Errors before a response was received: the service was not reached,
/// unless the request itself could not be built.
fn transport_error(error: reqwest::Error) -> Error {
    if error.is_builder() {
        Error::Rejected(error.to_string())
    } else {
        Error::Unreachable(error.to_string())
    }
}

fn body_error(resource: &str, error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Unreachable(error.to_string())
    } else {
        Error::Rejected(format!("Invalid response from {resource}: {error}"))
    }
}

/// Passes successful responses through.
///
/// An unavailable upstream (`502`, `503`, `504`) means unreachable, any other status is a rejection
/// with the `message` (or `error`) of the body as reason.
async fn check_status(response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    ) {
        return Err(Error::Unreachable(status.to_string()));
    }

    let reason = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.to_string());

    Err(Error::Rejected(reason))
}

#[cfg(test)]
mod test {
    use super::*;
    use primitives::{
        config::DEFAULT_CONFIG,
        test_util::{discard_logger, DUMMY_IDENTITY},
        InlinePayload,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn setup_gateway(server: &MockServer) -> HttpGateway {
        let config = GatewayConfig {
            base_url: ApiUrl::parse(&format!("{}/api", server.uri())).expect("Should parse"),
            ..DEFAULT_CONFIG.gateway.clone()
        };

        HttpGateway::new(&config, discard_logger()).expect("Should build the client")
    }

    fn verify_request() -> VerifyIdentityRequest {
        VerifyIdentityRequest {
            url: "https://www.facebook.com/ignitemarketing".into(),
            context_url: Some("https://ignite.example".into()),
        }
    }

    #[tokio::test]
    async fn verifies_identity() {
        let server = MockServer::start().await;
        let mut remote = DUMMY_IDENTITY.clone();
        remote.source = VerificationSource::UrlDerived;

        Mock::given(method("POST"))
            .and(path("/api/verify-identity"))
            .and(body_partial_json(json!({
                "url": "https://www.facebook.com/ignitemarketing",
                "contextUrl": "https://ignite.example"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&remote))
            .expect(1)
            .mount(&server)
            .await;

        let record = setup_gateway(&server)
            .verify_identity(&verify_request())
            .await
            .expect("Should verify");

        assert_eq!(*DUMMY_IDENTITY, record, "the source is always Remote");
    }

    #[tokio::test]
    async fn client_errors_are_rejections_with_reason() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/verify-identity"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "error": "Page not found" })),
            )
            .mount(&server)
            .await;

        let error = setup_gateway(&server)
            .verify_identity(&verify_request())
            .await
            .expect_err("Should be rejected");

        assert_eq!(Error::Rejected("Page not found".into()), error);
    }

    #[tokio::test]
    async fn unavailable_upstream_is_unreachable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/upload-asset"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let request = UploadRequest {
            data: InlinePayload::new("data:image/png;base64,iVBORw0KGgo=".into()),
            file_name: "square.png".into(),
            mime: "image/png".into(),
        };
        let error = setup_gateway(&server)
            .upload_asset(&request)
            .await
            .expect_err("Should fail");

        assert!(error.is_unreachable(), "{error:?}");
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let config = GatewayConfig {
            // nothing listens on the tcpmux port
            base_url: ApiUrl::parse("http://127.0.0.1:1/api").expect("Should parse"),
            ..DEFAULT_CONFIG.gateway.clone()
        };
        let gateway = HttpGateway::new(&config, discard_logger()).expect("Should build the client");

        let error = gateway
            .verify_identity(&verify_request())
            .await
            .expect_err("Should fail");

        assert!(error.is_unreachable(), "{error:?}");
    }

    #[tokio::test]
    async fn uploads_and_fetches_assets() {
        let server = MockServer::start().await;
        let asset_url: Url = format!("{}/cdn/square.png", server.uri())
            .parse()
            .expect("Valid url");

        Mock::given(method("POST"))
            .and(path("/api/upload-asset"))
            .and(body_partial_json(json!({ "fileName": "square.png", "mime": "image/png" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "url": asset_url })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cdn/square.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"remote bytes".to_vec()))
            .mount(&server)
            .await;

        let gateway = setup_gateway(&server);
        let request = UploadRequest {
            data: InlinePayload::new("data:image/png;base64,iVBORw0KGgo=".into()),
            file_name: "square.png".into(),
            mime: "image/png".into(),
        };

        let pointer = gateway.upload_asset(&request).await.expect("Should upload");
        assert_eq!(asset_url, pointer);

        let bytes = gateway.fetch_asset(&pointer).await.expect("Should fetch");
        assert_eq!(b"remote bytes".to_vec(), bytes);
    }

    #[tokio::test]
    async fn malformed_success_body_is_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/save-draft"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let draft = primitives::test_util::dummy_draft();
        let snapshot = primitives::ExportSnapshot::new(&draft, chrono::Utc::now());
        let error = setup_gateway(&server)
            .save_draft(&SaveDraftRequest::new(&draft, &snapshot))
            .await
            .expect_err("Should fail");

        assert!(matches!(error, Error::Rejected(_)), "{error:?}");
    }
}
