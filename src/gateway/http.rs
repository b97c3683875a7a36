/// HTTP implementation of the [`Gateway`] backed by the synchronous `ureq`
/// client.
///
/// One `HttpGateway` is built from the resolved config and shared (behind an
/// `Arc`) by every worker thread of a view runtime. It holds only the agent
/// and the base URL, so concurrent calls never interfere.
///
/// Besides the list/detail/create operations of the trait it exposes the
/// typed endpoints the shell needs directly: user config, today, card dates,
/// courses, vault status and the daily map.
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::wire::{
    CardDates, CardsResponse, ChartDetail, ChartsResponse, CourseDetail, CoursesResponse,
    CreatedCard, FleetingCardInput, HarborFileDetail, HarborResponse, MapData, TemplatesResponse,
    TodayData, UserConfig,
};
use super::{Gateway, GatewayError};
use crate::analytics::logger;
use crate::config::schema::ApiConfig;
use crate::filter::Filter;
use crate::model::{Record, Resource, split_identity};

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous Compass API client.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    agent: ureq::Agent,
    base_url: String,
    log_requests: bool,
}

impl HttpGateway {
    /// Build a client for `base_url` with no request timeout.
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, None)
    }

    /// Build a client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            base_url: base_url.trim_end_matches('/').to_string(),
            log_requests: false,
        }
    }

    /// Build a client from the `[api]` config section.
    pub fn from_config(config: &ApiConfig, log_requests: bool) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        Self::with_timeout(&config.base_url, timeout).with_request_log(log_requests)
    }

    /// Append one line per call to `~/.compass/requests.jsonl`.
    pub fn with_request_log(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- Typed endpoints --

    /// `GET /config/user`
    pub fn user_config(&self) -> Result<UserConfig, GatewayError> {
        self.get("/config/user", &[])
    }

    /// `GET /status` — free-form vault status.
    pub fn status(&self) -> Result<serde_json::Value, GatewayError> {
        self.get("/status", &[])
    }

    /// `GET /today`
    pub fn today(&self) -> Result<TodayData, GatewayError> {
        self.get("/today", &[])
    }

    /// `GET /cards/dates` — newest first.
    pub fn card_dates(&self) -> Result<Vec<String>, GatewayError> {
        let resp: CardDates = self.get("/cards/dates", &[])?;
        Ok(resp.dates)
    }

    /// `GET /courses`
    pub fn courses(&self) -> Result<CoursesResponse, GatewayError> {
        self.get("/courses", &[])
    }

    /// `GET /courses/:date`
    pub fn course(&self, date: &str) -> Result<CourseDetail, GatewayError> {
        self.get(&format!("/courses/{}", urlencoding::encode(date)), &[])
    }

    /// `GET /map?date=`
    pub fn map(&self, date: Option<&str>) -> Result<MapData, GatewayError> {
        match date {
            Some(date) => self.get("/map", &[("date", date)]),
            None => self.get("/map", &[]),
        }
    }

    // -- Request plumbing --

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let mut request = self.agent.get(&self.url(path));
        for (key, value) in query {
            request = request.query(key, value);
        }
        self.execute("GET", path, || request.call())
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let request = self.agent.post(&self.url(path));
        self.execute("POST", path, || request.send_json(body))
    }

    /// Run one request, decode its body, and log the outcome.
    fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        send: impl FnOnce() -> Result<ureq::Response, ureq::Error>,
    ) -> Result<T, GatewayError> {
        let started = Instant::now();

        let result = match send() {
            Ok(response) => {
                let status = response.status();
                decode(path, response).map(|value| (status, value))
            }
            Err(err) => Err(transport_error(err)),
        };

        if self.log_requests {
            let (status, error) = match &result {
                Ok((status, _)) => (Some(*status), None),
                Err(err) => (err.status(), Some(err.to_string())),
            };
            logger::log_request(method, path, status, started.elapsed(), error);
        }

        result.map(|(_, value)| value)
    }

    /// Look up one entry in a list response for resources without a detail
    /// endpoint of their own.
    fn find_in_list(
        &self,
        resource: Resource,
        filter: &Filter,
        identity: &str,
    ) -> Result<Record, GatewayError> {
        self.fetch_list(resource, filter)?
            .into_iter()
            .find(|record| record.identity == identity)
            .ok_or_else(|| GatewayError::transport(format!("{resource} entry not found: {identity}")))
    }
}

impl Gateway for HttpGateway {
    fn fetch_list(&self, resource: Resource, filter: &Filter) -> Result<Vec<Record>, GatewayError> {
        match resource {
            Resource::Cards => {
                let mut query = Vec::new();
                if let Some(date) = &filter.date {
                    query.push(("date", date.as_str()));
                }
                if let Some(card_type) = filter.card_type {
                    query.push(("type", card_type.as_str()));
                }
                let resp: CardsResponse = self.get("/cards", &query)?;
                Ok(resp.cards.into_iter().map(Record::from).collect())
            }
            Resource::Charts => {
                let resp: ChartsResponse = self.get("/charts", &[])?;
                Ok(resp
                    .charts
                    .into_iter()
                    .filter(|chart| filter.date.as_ref().is_none_or(|d| *d == chart.date))
                    .map(Record::from)
                    .collect())
            }
            Resource::HarborFiles => {
                let resp: HarborResponse = self.get("/harbor", &[])?;
                Ok(resp
                    .harbor
                    .into_files(filter.category)
                    .into_iter()
                    .map(Record::from)
                    .collect())
            }
            Resource::Templates => {
                let resp: TemplatesResponse = self.get("/templates", &[])?;
                Ok(resp.templates.into_iter().map(Record::from).collect())
            }
        }
    }

    fn fetch_detail(&self, resource: Resource, identity: &str) -> Result<Record, GatewayError> {
        match resource {
            Resource::Charts => {
                let detail: ChartDetail =
                    self.get(&format!("/charts/{}", urlencoding::encode(identity)), &[])?;
                Ok(Record::from(detail))
            }
            Resource::HarborFiles => {
                let (category, filename) = split_identity(identity).ok_or_else(|| {
                    GatewayError::transport(format!("invalid harbor identity: {identity}"))
                })?;
                let path = format!(
                    "/harbor/{}/{}",
                    urlencoding::encode(category),
                    urlencoding::encode(filename)
                );
                let detail: HarborFileDetail = self.get(&path, &[])?;
                Ok(Record::from(detail))
            }
            Resource::Cards => {
                let (date, _) = split_identity(identity).ok_or_else(|| {
                    GatewayError::transport(format!("invalid card identity: {identity}"))
                })?;
                let filter = Filter::default().with_date(date);
                self.find_in_list(resource, &filter, identity)
            }
            Resource::Templates => self.find_in_list(resource, &Filter::default(), identity),
        }
    }

    fn submit_create(&self, input: &FleetingCardInput) -> Result<CreatedCard, GatewayError> {
        self.post("/cards/fleeting", input)
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

/// Parse a 2xx body as `T`. Anything unparseable is a decode failure.
fn decode<T: DeserializeOwned>(path: &str, response: ureq::Response) -> Result<T, GatewayError> {
    let body = response.into_string().map_err(|e| GatewayError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Normalize a `ureq` failure into a transport error.
fn transport_error(err: ureq::Error) -> GatewayError {
    match err {
        ureq::Error::Status(code, response) => {
            let status_text = response.status_text().to_string();
            let body = response.into_string().unwrap_or_default();
            GatewayError::Transport {
                status: Some(code),
                message: error_message(code, &status_text, &body),
            }
        }
        ureq::Error::Transport(transport) => GatewayError::transport(transport.to_string()),
    }
}

/// Message for a non-2xx response: the server's `detail` when the body is
/// the JSON error envelope, else the raw body, else the status text.
pub fn error_message(code: u16, status_text: &str, body: &str) -> String {
    let body = body.trim();
    if !body.is_empty() {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body)
            && let Some(serde_json::Value::String(detail)) = map.get("detail")
        {
            return detail.clone();
        }
        return body.to_string();
    }
    if !status_text.trim().is_empty() {
        return status_text.trim().to_string();
    }
    format!("Request failed: {code}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail_envelope() {
        let body = r#"{"detail":"Sounding not found for 2024-05-01."}"#;
        assert_eq!(
            error_message(404, "Not Found", body),
            "Sounding not found for 2024-05-01."
        );
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(error_message(500, "Internal", "boom"), "boom");
        assert_eq!(error_message(502, "Bad Gateway", r#"{"error":"x"}"#), r#"{"error":"x"}"#);
    }

    #[test]
    fn error_message_uses_status_text_then_code() {
        assert_eq!(error_message(503, "Service Unavailable", "  "), "Service Unavailable");
        assert_eq!(error_message(503, "", ""), "Request failed: 503");
    }

    #[test]
    fn client_strips_trailing_slash() {
        let gateway = HttpGateway::new("http://127.0.0.1:8000/api/");
        assert_eq!(gateway.base_url(), "http://127.0.0.1:8000/api");
    }

    #[test]
    fn malformed_identity_is_a_transport_error() {
        let gateway = HttpGateway::new("http://127.0.0.1:9");
        let err = gateway
            .fetch_detail(Resource::HarborFiles, "no-slash")
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport { status: None, .. }));
    }
}
