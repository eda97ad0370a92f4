use serde::Serialize;
use std::fmt;
use tokio::time::Instant;


/// Which way a measurement moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Download,
    Upload,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Download => f.write_str("download"),
            Direction::Upload => f.write_str("upload"),
        }
    }
}

/// True once an optional deadline lies in the past.
pub(crate) fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() > deadline)
}

#[cfg(test)]
pub(crate) mod support {
    //! Mock speed test server shared by the engine tests.

    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Answers `/__down?bytes=N` with N bytes, optionally failing for one
    /// specific size.
    pub(crate) struct DownResponder {
        pub delay: Duration,
        pub fail_bytes: Option<u64>,
    }

    impl Respond for DownResponder {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let bytes = request
                .url
                .query_pairs()
                .find(|(key, _)| key == "bytes")
                .and_then(|(_, value)| value.parse::<u64>().ok())
                .unwrap_or(0);

            if self.fail_bytes == Some(bytes) {
                return ResponseTemplate::new(500);
            }

            ResponseTemplate::new(200)
                .set_body_bytes(vec![b'0'; bytes as usize])
                .set_delay(self.delay)
        }
    }

    /// Start a server with `__down` and `__up` mounted.
    pub(crate) async fn speed_server(delay: Duration) -> MockServer {
        speed_server_failing(delay, None).await
    }

    pub(crate) async fn speed_server_failing(
        delay: Duration,
        fail_bytes: Option<u64>,
    ) -> MockServer {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/__down"))
            .respond_with(DownResponder { delay, fail_bytes })
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/__up"))
            .respond_with(ResponseTemplate::new(200).set_delay(delay))
            .mount(&server)
            .await;

        server
    }

    /// `/__down` requests the server saw, as requested byte counts.
    pub(crate) async fn download_requests(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == "/__down")
            .map(|request| request.url.query().unwrap_or_default().to_string())
            .collect()
    }

    /// Body sizes of every `/__up` request the server saw.
    pub(crate) async fn upload_bodies(server: &MockServer) -> Vec<usize> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == "/__up")
            .map(|request| request.body.len())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_deadline_passed() {
        assert!(!deadline_passed(None));
        assert!(!deadline_passed(Some(Instant::now() + Duration::from_secs(60))));
        assert!(deadline_passed(Some(Instant::now() - Duration::from_millis(5))));
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Download.to_string(), "download");
        assert_eq!(
            serde_json::to_string(&Direction::Upload).unwrap(),
            "\"upload\""
        );
    }
}
