//! The data-collector transmission client.
//!
//! ## Metrics
//!
//! `requests_sent`: Total number of requests sent
//! `request_ok`: Requests the endpoint accepted
//! `request_failure`: Requests refused or never delivered
//! `bytes_written`: Total body bytes delivered
//!
//! The client drains the dispatch channel until the generator closes it. It
//! makes one attempt per event; there is no retry here.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Request, Uri,
    header::{CONTENT_LENGTH, CONTENT_TYPE},
};
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use chef_load_payload::ActionEvent;

/// Header carrying the collector token.
pub const TOKEN_HEADER: &str = "x-data-collector-token";
/// Header carrying the collector protocol version.
pub const AUTH_HEADER: &str = "x-data-collector-auth";

const AUTH_VERSION: &str = "version=1.0";

/// Errors produced by [`DataCollector`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The configured endpoint is not a valid URI
    #[error("Invalid data-collector URI: {0}")]
    Uri(#[from] hyper::http::uri::InvalidUri),
    /// Wrapper around [`hyper::http::Error`].
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::http::Error),
    /// An event could not be encoded to the wire schema
    #[error("Json payload could not be encoded: {0}")]
    Json(#[from] serde_json::Error),
}

/// Totals for a drained run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    /// Events the endpoint accepted
    pub delivered: u64,
    /// Events refused, undeliverable or unencodable
    pub failed: u64,
}

/// The data-collector client.
///
/// Consumes [`ActionEvent`]s from the dispatch channel, serializes each to
/// the "action" wire schema and POSTs it to the configured endpoint.
#[derive(Debug)]
pub struct DataCollector {
    uri: Uri,
    token: String,
}

impl DataCollector {
    /// Create a new [`DataCollector`] instance.
    ///
    /// # Errors
    ///
    /// Creation will fail if `url` does not parse as a URI. This is checked
    /// before any event is generated.
    pub fn new(url: &str, token: &str) -> Result<Self, Error> {
        let uri: Uri = url.parse()?;
        Ok(Self {
            uri,
            token: token.to_string(),
        })
    }

    /// Build the POST request for one event.
    ///
    /// # Errors
    ///
    /// Function will error if the event fails to serialize or the request
    /// cannot be assembled.
    fn request(&self, event: &ActionEvent) -> Result<Request<Full<Bytes>>, Error> {
        let body = serde_json::to_vec(event)?;
        let request = Request::builder()
            .method(hyper::Method::POST)
            .uri(&self.uri)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .header(TOKEN_HEADER, &self.token)
            .header(AUTH_HEADER, AUTH_VERSION)
            .body(Full::new(Bytes::from(body)))?;
        Ok(request)
    }

    /// Drain the dispatch channel to completion.
    ///
    /// Runs until the sending side closes, counting outcomes per event. A
    /// failed delivery never aborts the drain.
    pub async fn drain(self, mut rcv: mpsc::Receiver<ActionEvent>) -> Totals {
        let client = Client::builder(TokioExecutor::new()).build_http::<Full<Bytes>>();

        let mut totals = Totals::default();
        while let Some(event) = rcv.recv().await {
            let name = event.to_string();
            let request = match self.request(&event) {
                Ok(request) => request,
                Err(err) => {
                    error!(action = %name, "failed to encode action: {err}");
                    counter!("request_failure").increment(1);
                    totals.failed += 1;
                    continue;
                }
            };
            let body_length = request
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0);

            counter!("requests_sent").increment(1);
            match client.request(request).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        counter!("request_ok").increment(1);
                        counter!("bytes_written").increment(body_length);
                        totals.delivered += 1;
                        debug!(action = %name, status = %status, "delivered");
                    } else {
                        warn!(action = %name, status = %status, "endpoint refused action");
                        counter!("request_failure").increment(1);
                        totals.failed += 1;
                    }
                }
                Err(err) => {
                    error!("Failed to send HTTP request to {uri}: {err}", uri = self.uri);
                    counter!("request_failure").increment(1);
                    totals.failed += 1;
                }
            }
        }
        totals
    }
}

#[cfg(test)]
mod test {
    use rand::{SeedableRng, rngs::SmallRng};
    use time::OffsetDateTime;

    use super::{AUTH_HEADER, DataCollector, TOKEN_HEADER};
    use chef_load_payload::{ChefAction, EntityKind, facts};

    #[test]
    fn invalid_endpoint_is_rejected_at_construction() {
        assert!(DataCollector::new("not a valid uri", "token").is_err());
    }

    #[test]
    fn requests_carry_the_collector_headers() {
        let mut rng = SmallRng::seed_from_u64(11);
        let action = ChefAction::new(&facts::Config::default(), true)
            .expect("default facts must validate");
        let event = action.build(EntityKind::Role, OffsetDateTime::now_utc(), &mut rng);

        let collector = DataCollector::new("http://localhost:9611/data-collector/v0/", "secret")
            .expect("uri must parse");
        let request = collector.request(&event).expect("request must build");

        assert_eq!(request.method(), hyper::Method::POST);
        assert_eq!(request.uri().path(), "/data-collector/v0/");
        assert_eq!(
            request.headers().get(TOKEN_HEADER).map(|v| v.as_bytes()),
            Some(b"secret".as_slice())
        );
        assert_eq!(
            request.headers().get(AUTH_HEADER).map(|v| v.as_bytes()),
            Some(b"version=1.0".as_slice())
        );

        let expected_length = serde_json::to_vec(&event)
            .expect("event must serialize")
            .len()
            .to_string();
        assert_eq!(
            request
                .headers()
                .get(hyper::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok()),
            Some(expected_length.as_str())
        );
    }
}
