use crate::cloudflare::requests::Request;
use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use reqwest::Method;
use std::borrow::Cow;
use url::Url;

/// `HEAD /` against the host root, used to time an HTTP round trip.
///
/// Sent with `Connection: close` so it does not hold a pooled connection
/// open behind the measurement.
pub(crate) struct HttpPing {}

impl Request for HttpPing {
    type Response = ();

    const METHOD: Method = Method::HEAD;

    fn endpoint(&'_ self) -> Cow<'_, str> {
        "/".into()
    }

    fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        base.join(&self.endpoint())
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        headers
    }
}
