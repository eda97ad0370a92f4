use crate::cloudflare::requests::Request;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use std::borrow::Cow;

/// `GET /__down?bytes=N`, answered with a body of exactly N bytes.
///
/// `bytes: 0` doubles as the connection warm-up request.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Download {
    pub bytes: u64,
}

impl Request for Download {
    type Response = ();

    fn endpoint(&'_ self) -> Cow<'_, str> {
        format!("/__down?bytes={}", self.bytes).into()
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        headers
    }
}
