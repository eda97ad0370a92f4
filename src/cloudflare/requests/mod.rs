extern crate serde;

pub mod download;
pub mod latency;
pub mod meta;
pub mod upload;

use reqwest::{header::HeaderMap, Body, Method};
use serde::Deserialize;
use std::borrow::Cow;
use url::Url;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const REPO: &str = env!("CARGO_PKG_REPOSITORY");

pub(crate) fn user_agent() -> String {
    format!("{}/{} ({})", NAME, VERSION, REPO)
}

/// Body attached to a request.
pub enum RequestBody {
    None,
    /// Streamed body, produced lazily while the request is in flight
    Stream(Body),
}

pub trait Request {
    /// Decoded response for [`crate::cloudflare::client::Client::send`].
    /// Transfers never decode their response and use `()`.
    type Response: for<'de> Deserialize<'de>;

    const METHOD: Method = Method::GET;

    fn endpoint(&'_ self) -> Cow<'_, str>;

    /// Resolve the endpoint against the configured base URL.
    fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let endpoint = self.endpoint();
        let url = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );

        Url::parse(&url)
    }

    fn headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    fn body(&self) -> RequestBody {
        RequestBody::None
    }
}
