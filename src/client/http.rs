//! HTTP implementation of the configuration API.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::ProviderConfig;
use crate::error::{ApiError, ConfigError, Result};
use crate::operations::UpdateRequest;

use super::api::ConfigApi;
use super::endpoint::Endpoint;

/// Path of the configuration API below the server's HTTPS address.
const CONFIG_API_PATH: [&str; 2] = ["config", "v2"];

/// JSON error body returned by the configuration API
/// (`{"schemas", "status", "detail"}`); only `detail` is used.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// Configuration API client over HTTPS with basic authentication.
///
/// Requests are sent once; failures are reported to the caller as-is.
#[derive(Debug, Clone)]
pub struct ConfigApiClient {
    /// HTTP client.
    client: Client,
    /// `{https_host}/config/v2`.
    base_url: Url,
    /// Basic auth user.
    username: String,
    /// Basic auth password.
    password: String,
}

impl ConfigApiClient {
    /// Creates a client from provider settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid base URL or the HTTP
    /// client cannot be created.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.insecure_trust_all_tls)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        let mut base_url = Url::parse(&config.https_host).map_err(|e| ConfigError::InvalidProvider {
            message: format!("https_host '{}' is not a valid URL: {e}", config.https_host),
        })?;
        base_url
            .path_segments_mut()
            .map_err(|()| ConfigError::InvalidProvider {
                message: format!("https_host '{}' cannot be used as a base URL", config.https_host),
            })?
            .pop_if_empty()
            .extend(CONFIG_API_PATH);

        if config.insecure_trust_all_tls {
            debug!("TLS certificate verification is disabled");
        }

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Base URL of the configuration API.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(endpoint.segments());
        }
        url
    }

    fn request(&self, method: Method, endpoint: &Endpoint) -> RequestBuilder {
        self.client
            .request(method, self.url(endpoint))
            .basic_auth(&self.username, Some(&self.password))
    }

    /// Sends a request and turns non-success statuses into errors.
    async fn send(&self, builder: RequestBuilder, method: &Method, endpoint: &Endpoint) -> Result<Response> {
        trace!("{method} {endpoint}");

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::network(format!("{method} {endpoint} failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                path: endpoint.to_string(),
            }
            .into());
        }

        let raw = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&raw)
            .ok()
            .and_then(|body| body.detail);

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::AuthenticationFailed {
                message: detail.unwrap_or_else(|| String::from("Invalid username or password")),
            }
            .into());
        }

        let body = if detail.is_some() { None } else { Some(raw) };
        Err(ApiError::RequestFailed {
            summary: format!("{method} {endpoint}"),
            status: status.as_u16(),
            detail,
            body,
        }
        .into())
    }

    async fn read_object(response: Response) -> Result<Value> {
        let value: Value = response
            .json()
            .await
            .map_err(|e| ApiError::invalid_response(format!("Failed to parse response: {e}")))?;
        if !value.is_object() {
            return Err(ApiError::invalid_response("Expected a JSON object").into());
        }
        Ok(value)
    }
}

#[async_trait]
impl ConfigApi for ConfigApiClient {
    async fn add(&self, collection: &Endpoint, body: &Value) -> Result<Value> {
        let builder = self.request(Method::POST, collection).json(body);
        let response = self.send(builder, &Method::POST, collection).await?;
        Self::read_object(response).await
    }

    async fn get(&self, object: &Endpoint) -> Result<Value> {
        let builder = self.request(Method::GET, object);
        let response = self.send(builder, &Method::GET, object).await?;
        Self::read_object(response).await
    }

    async fn update(&self, object: &Endpoint, request: &UpdateRequest) -> Result<Value> {
        let builder = self.request(Method::PATCH, object).json(request);
        let response = self.send(builder, &Method::PATCH, object).await?;
        Self::read_object(response).await
    }

    async fn delete(&self, object: &Endpoint) -> Result<()> {
        let builder = self.request(Method::DELETE, object);
        self.send(builder, &Method::DELETE, object).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirConfigError;
    use crate::operations::Operation;
    use serde_json::json;
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ConfigApiClient {
        let config = ProviderConfig {
            https_host: server.uri(),
            username: String::from("cn=administrator"),
            password: String::from("2FederateM0re"),
            insecure_trust_all_tls: false,
            timeout_secs: 5,
        };
        ConfigApiClient::new(&config).expect("valid settings")
    }

    #[test]
    fn test_base_url() {
        let config = ProviderConfig {
            https_host: String::from("https://localhost:1443/"),
            username: String::from("u"),
            password: String::from("p"),
            insecure_trust_all_tls: true,
            timeout_secs: 5,
        };
        let client = ConfigApiClient::new(&config).expect("valid settings");
        assert_eq!(client.base_url().as_str(), "https://localhost:1443/config/v2");
        assert_eq!(
            client.url(&Endpoint::collection("locations").join("Austin TX")).as_str(),
            "https://localhost:1443/config/v2/locations/Austin%20TX"
        );
    }

    #[test]
    fn test_invalid_host() {
        let config = ProviderConfig {
            https_host: String::from("not a url"),
            username: String::from("u"),
            password: String::from("p"),
            insecure_trust_all_tls: false,
            timeout_secs: 5,
        };
        let err = ConfigApiClient::new(&config).expect_err("invalid host");
        assert!(matches!(err, DirConfigError::Config(ConfigError::InvalidProvider { .. })));
    }

    #[tokio::test]
    async fn test_add_posts_to_collection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/config/v2/locations"))
            .and(header_exists("authorization"))
            .and(body_json(json!({"id": "Austin"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "Austin", "description": "hq"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let object = client
            .add(&Endpoint::collection("locations"), &json!({"id": "Austin"}))
            .await
            .expect("created");
        assert_eq!(object["description"], "hq");
    }

    #[tokio::test]
    async fn test_update_sends_operations() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/config/v2/delegated-admin-rights/admins"))
            .and(body_json(json!({"operations": [
                {"op": "replace", "path": "enabled", "value": "false"}
            ]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "admins", "enabled": false})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = UpdateRequest::new(vec![Operation::replace("enabled", "false")]);
        let object = client
            .update(&Endpoint::collection("delegated-admin-rights").join("admins"), &request)
            .await
            .expect("updated");
        assert_eq!(object["enabled"], false);
    }

    #[tokio::test]
    async fn test_error_detail_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/config/v2/locations"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "schemas": ["urn:ietf:params:scim:api:messages:2.0:Error"],
                "status": "400",
                "detail": "An entry with DN 'cn=Austin' already exists"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .add(&Endpoint::collection("locations"), &json!({"id": "Austin"}))
            .await
            .expect_err("conflict");
        assert_eq!(
            err.to_string(),
            "Configuration API error: POST locations: 400 - Detail: An entry with DN 'cn=Austin' already exists"
        );
    }

    #[tokio::test]
    async fn test_raw_body_kept_when_not_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config/v2/locations/Austin"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .get(&Endpoint::collection("locations").join("Austin"))
            .await
            .expect_err("unavailable");
        match err {
            DirConfigError::Api(ApiError::RequestFailed { status, detail, body, .. }) => {
                assert_eq!(status, 503);
                assert!(detail.is_none());
                assert_eq!(body.as_deref(), Some("maintenance"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config/v2/locations/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .get(&Endpoint::collection("locations").join("gone"))
            .await
            .expect_err("missing");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/config/v2/locations/Austin"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .delete(&Endpoint::collection("locations").join("Austin"))
            .await
            .expect_err("unauthorized");
        assert!(matches!(err, DirConfigError::Api(ApiError::AuthenticationFailed { .. })));
    }

    #[tokio::test]
    async fn test_delete_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/config/v2/locations/Austin"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .delete(&Endpoint::collection("locations").join("Austin"))
            .await
            .expect("deleted");
    }
}
