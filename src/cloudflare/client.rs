use crate::cloudflare::requests::{user_agent, Request, RequestBody};
use crate::errors::SpeedTestError;
use log::debug;
use reqwest::header::{
    HeaderMap, HeaderValue, CONNECTION, REFERER, USER_AGENT,
};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

pub static BASE_URL: &str = "https://speed.cloudflare.com";

/// HTTP client bound to one speed test server.
///
/// Cloning shares the underlying connection pool. Use [`Client::fresh`]
/// when a caller needs its own connection.
#[derive(Debug, Clone)]
pub struct Client {
    client: ReqwestClient,
    base_url: Url,
}

impl Client {
    pub fn new(base_url: Url) -> Result<Self, SpeedTestError> {
        if base_url.host_str().is_none() {
            return Err(SpeedTestError::config(format!(
                "base URL {} has no host",
                base_url
            )));
        }

        let client = ReqwestClient::builder()
            .default_headers(default_headers(&base_url)?)
            .build()
            .map_err(|e| SpeedTestError::from(e).context("building HTTP client"))?;

        Ok(Client { client, base_url })
    }

    /// A client for the same server with its own connection pool.
    pub fn fresh(&self) -> Result<Self, SpeedTestError> {
        Self::new(self.base_url.clone())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    /// Send a request and return the raw response, failing on
    /// non-success status codes.
    pub async fn execute<R: Request>(
        &self,
        request: R,
    ) -> Result<Response, SpeedTestError> {
        let url = request.url(&self.base_url)?;
        debug!("{} {}", R::METHOD, url);

        let response = self
            .client
            .request(R::METHOD, url)
            .headers(request.headers())
            .cloudflare_body(request.body())
            .send()
            .await?
            .error_for_status()?;

        Ok(response)
    }

    /// Time from sending `request` until its response headers arrive.
    ///
    /// The status code is not checked; any answer counts as a round trip.
    pub async fn time_round_trip<R: Request>(
        &self,
        request: R,
    ) -> Result<Duration, SpeedTestError> {
        let url = request.url(&self.base_url)?;
        let builder = self
            .client
            .request(R::METHOD, url)
            .headers(request.headers())
            .cloudflare_body(request.body());

        let start = Instant::now();
        let response = builder.send().await?;
        let elapsed = start.elapsed();

        debug!("{} round trip: {:?} ({})", R::METHOD, elapsed, response.status());

        Ok(elapsed)
    }

    /// Send a request and decode its JSON response.
    pub async fn send<R: Request>(
        &self,
        request: R,
    ) -> Result<R::Response, SpeedTestError> {
        let response = self.execute(request).await?;

        // Cloudflare often returns JSON with a text/plain content-type
        let text = response.text().await?;

        serde_json::from_str::<R::Response>(&text).map_err(|e| {
            SpeedTestError::api(format!("unexpected response body: {}", e))
                .with_source(e)
        })
    }
}

fn default_headers(base_url: &Url) -> Result<HeaderMap, SpeedTestError> {
    let mut headers = HeaderMap::new();

    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    let referer = format!("{}/", base_url.origin().ascii_serialization());
    headers.insert(REFERER, header_value(&referer)?);
    headers.insert(USER_AGENT, header_value(&user_agent())?);

    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, SpeedTestError> {
    HeaderValue::from_str(value).map_err(|e| {
        SpeedTestError::config(format!("invalid header value {:?}", value))
            .with_source(e)
    })
}

trait RequestBuilderExt: Sized {
    fn cloudflare_body(self, body: RequestBody) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn cloudflare_body(self, body: RequestBody) -> Self {
        match body {
            RequestBody::None => self,
            RequestBody::Stream(body) => self.body(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudflare::requests::latency::HttpPing;
    use crate::cloudflare::requests::meta::MetaRequest;
    use crate::errors::ErrorKind;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_default_headers() {
        let url = Url::parse("https://speed.cloudflare.com/some/path").unwrap();
        let headers = default_headers(&url).unwrap();

        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers[REFERER], "https://speed.cloudflare.com/");
        assert!(headers.contains_key(USER_AGENT));
    }

    #[test]
    fn test_rejects_base_without_host() {
        let url = Url::parse("data:text/plain,hello").unwrap();
        let error = Client::new(url).unwrap_err();
        assert_eq!(error.kind, ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_sends_referer_header() {
        let server = MockServer::start().await;
        let referer = format!("{}/", server.uri());

        Mock::given(method("GET"))
            .and(path("/meta"))
            .and(header("referer", referer.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(Url::parse(&server.uri()).unwrap()).unwrap();
        let response = client.execute(MetaRequest {}).await.unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_round_trip_ignores_status() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(Url::parse(&server.uri()).unwrap()).unwrap();
        let elapsed = client.time_round_trip(HttpPing {}).await.unwrap();
        assert!(elapsed < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/meta"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = Client::new(Url::parse(&server.uri()).unwrap()).unwrap();
        let error = client.send(MetaRequest {}).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Api);
    }
}
