/// Integration tests for `HttpGateway` against a stub Compass API.
///
/// Each test starts a `tiny_http` server on an ephemeral port that answers
/// from a fixed route table and records every request it sees, then points
/// a real `HttpGateway` at it. Nothing here needs a live Compass server.
///
/// Covered here:
///
/// - Query parameters sent for card lists
/// - Harbor flattening and category filtering
/// - Detail endpoints and list-lookup fallbacks
/// - Error normalization (JSON `detail`, status text, decode failures)
/// - Fleeting card creation
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use compass::filter::Filter;
use compass::gateway::{FleetingCardInput, Gateway, GatewayError, HttpGateway};
use compass::model::{CardType, HarborCategory, Resource};
use tiny_http::{Header, Response, Server};

// ---------------------------------------------------------------------------
// Stub server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Seen {
    method: String,
    url: String,
    body: String,
}

struct StubApi {
    base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl StubApi {
    /// Serve `routes`, keyed by `"METHOD /path"` (query string ignored).
    fn start(routes: &[(&str, u16, &str)]) -> Self {
        let routes: HashMap<String, (u16, String)> = routes
            .iter()
            .map(|(key, status, body)| (key.to_string(), (*status, body.to_string())))
            .collect();

        let server = Server::http("127.0.0.1:0").expect("bind stub server");
        let port = server
            .server_addr()
            .to_ip()
            .expect("stub server has an IP address")
            .port();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let method = request.method().to_string();
                let url = request.url().to_string();
                let path = url.split('?').next().unwrap_or_default().to_string();

                log.lock().unwrap().push(Seen {
                    method: method.clone(),
                    url: url.clone(),
                    body,
                });

                let (status, payload) = routes
                    .get(&format!("{method} {path}"))
                    .cloned()
                    .unwrap_or((404, r#"{"detail":"Not Found"}"#.to_string()));
                let header =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let response = Response::from_string(payload)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}/api"),
            seen,
        }
    }

    fn gateway(&self) -> HttpGateway {
        HttpGateway::new(&self.base_url)
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

const CARDS: &str = r##"{
  "date": "2024-05-01",
  "cards": [
    {"name": "a", "filename": "a.md", "type": "insights", "date": "2024-05-01",
     "content": "# A\n\nFirst insight.", "preview": "First insight."},
    {"name": "b", "filename": "b.md", "type": "insights", "date": "2024-05-01",
     "content": "# B", "preview": "B"}
  ]
}"##;

const HARBOR: &str = r#"{
  "harbor": {
    "concepts": [
      {"name": "flow", "filename": "flow.md", "category": "concepts",
       "description": "Flow state", "preview": "..."}
    ],
    "frameworks": [],
    "companies": [],
    "people": [
      {"name": "ada", "filename": "ada.md", "category": "people",
       "description": "", "preview": "Ada Lovelace"}
    ],
    "skills": [
      {"name": "rust", "filename": "rust.md", "category": "skills",
       "description": "Systems language", "preview": ""}
    ]
  }
}"#;

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

#[test]
fn card_list_sends_date_and_type() {
    let api = StubApi::start(&[("GET /api/cards", 200, CARDS)]);
    let filter = Filter::default()
        .with_date("2024-05-01")
        .with_card_type(CardType::Insights);

    let records = api.gateway().fetch_list(Resource::Cards, &filter).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].identity, "2024-05-01/a.md");
    assert_eq!(records[0].category.as_deref(), Some("insights"));
    assert_eq!(records[0].preview_text, "First insight.");
    assert!(records[0].has_content());

    let seen = api.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].url, "/api/cards?date=2024-05-01&type=insights");
}

#[test]
fn unconstrained_card_list_sends_no_query() {
    let api = StubApi::start(&[("GET /api/cards", 200, CARDS)]);
    api.gateway()
        .fetch_list(Resource::Cards, &Filter::default())
        .unwrap();
    assert_eq!(api.seen()[0].url, "/api/cards");
}

#[test]
fn harbor_list_flattens_in_tab_order() {
    let api = StubApi::start(&[("GET /api/harbor", 200, HARBOR)]);
    let records = api
        .gateway()
        .fetch_list(Resource::HarborFiles, &Filter::default())
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.identity.as_str()).collect();
    assert_eq!(ids, ["concepts/flow.md", "people/ada.md", "skills/rust.md"]);
    // description wins over preview when present
    assert_eq!(records[0].preview_text, "Flow state");
    assert_eq!(records[1].preview_text, "Ada Lovelace");
    assert!(records.iter().all(|r| !r.has_content()));
}

#[test]
fn harbor_list_applies_category_filter() {
    let api = StubApi::start(&[("GET /api/harbor", 200, HARBOR)]);
    let filter = Filter::default().with_category(HarborCategory::People);
    let records = api
        .gateway()
        .fetch_list(Resource::HarborFiles, &filter)
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identity, "people/ada.md");
}

#[test]
fn chart_list_filters_by_date_client_side() {
    let charts = r##"{"charts": [
        {"date": "2024-05-02", "filename": "2024-05-02.md", "content": "# Two", "preview": "Two"},
        {"date": "2024-05-01", "filename": "2024-05-01.md", "content": "# One", "preview": "One"}
    ]}"##;
    let api = StubApi::start(&[("GET /api/charts", 200, charts)]);
    let gateway = api.gateway();

    let all = gateway
        .fetch_list(Resource::Charts, &Filter::default())
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].identity, "2024-05-02");

    let one = gateway
        .fetch_list(Resource::Charts, &Filter::default().with_date("2024-05-01"))
        .unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].display_name, "2024-05-01");
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

#[test]
fn harbor_detail_encodes_filename_and_derives_preview() {
    let detail = r##"{"category": "concepts", "filename": "deep work.md", "name": "deep work",
                     "content": "# Deep Work\n\nLong focus blocks."}"##;
    let api = StubApi::start(&[("GET /api/harbor/concepts/deep%20work.md", 200, detail)]);

    let record = api
        .gateway()
        .fetch_detail(Resource::HarborFiles, "concepts/deep work.md")
        .unwrap();

    assert_eq!(record.identity, "concepts/deep work.md");
    assert_eq!(record.preview_text, "Deep Work");
    assert_eq!(
        record.full_content.as_deref(),
        Some("# Deep Work\n\nLong focus blocks.")
    );
}

#[test]
fn detail_paths_escape_reserved_characters() {
    let detail = r##"{"category": "people", "filename": "ana #1?.md", "name": "ana",
                     "content": "Ana"}"##;
    let course = r##"{"date": "2024-05-01", "title": "Sailing", "content": "", "note": ""}"##;
    let api = StubApi::start(&[
        ("GET /api/harbor/people/ana%20%231%3F.md", 200, detail),
        ("GET /api/courses/2024-05-01", 200, course),
    ]);
    let gateway = api.gateway();

    let record = gateway
        .fetch_detail(Resource::HarborFiles, "people/ana #1?.md")
        .unwrap();
    assert_eq!(record.full_content.as_deref(), Some("Ana"));

    gateway.course("2024-05-01").unwrap();
    let urls: Vec<String> = api.seen().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        ["/api/harbor/people/ana%20%231%3F.md", "/api/courses/2024-05-01"]
    );
}

#[test]
fn chart_detail_uses_date_endpoint() {
    let detail = r##"{"date": "2024-05-01", "content": "# Sounding\n\nCalm seas."}"##;
    let api = StubApi::start(&[("GET /api/charts/2024-05-01", 200, detail)]);

    let record = api
        .gateway()
        .fetch_detail(Resource::Charts, "2024-05-01")
        .unwrap();
    assert_eq!(record.identity, "2024-05-01");
    assert!(record.full_content.unwrap().contains("Calm seas."));
}

#[test]
fn card_detail_falls_back_to_dated_list() {
    let api = StubApi::start(&[("GET /api/cards", 200, CARDS)]);

    let record = api
        .gateway()
        .fetch_detail(Resource::Cards, "2024-05-01/b.md")
        .unwrap();
    assert_eq!(record.full_content.as_deref(), Some("# B"));
    assert_eq!(api.seen()[0].url, "/api/cards?date=2024-05-01");
}

#[test]
fn missing_template_is_a_transport_error_without_status() {
    let templates = r#"{"templates": [{"name": "daily", "filename": "daily.md", "content": "x", "preview": "x"}]}"#;
    let api = StubApi::start(&[("GET /api/templates", 200, templates)]);

    let err = api
        .gateway()
        .fetch_detail(Resource::Templates, "weekly.md")
        .unwrap_err();
    assert_eq!(err.status(), None);
    assert!(err.to_string().contains("weekly.md"));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn server_detail_message_is_surfaced() {
    let api = StubApi::start(&[("GET /api/charts", 503, r#"{"detail":"vault offline"}"#)]);

    let err = api
        .gateway()
        .fetch_list(Resource::Charts, &Filter::default())
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::Transport {
            status: Some(503),
            message: "vault offline".to_string(),
        }
    );
}

#[test]
fn not_found_detail_reports_server_message() {
    let api = StubApi::start(&[]);
    let err = api
        .gateway()
        .fetch_detail(Resource::HarborFiles, "people/ghost.md")
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Not Found");
}

#[test]
fn malformed_json_is_a_decode_error() {
    let api = StubApi::start(&[("GET /api/templates", 200, "<html>oops</html>")]);
    let err = api
        .gateway()
        .fetch_list(Resource::Templates, &Filter::default())
        .unwrap_err();
    match err {
        GatewayError::Decode { path, .. } => assert_eq!(path, "/templates"),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn wrong_shape_is_a_decode_error() {
    let api = StubApi::start(&[("GET /api/harbor", 200, r#"{"harbor": "none"}"#)]);
    let err = api
        .gateway()
        .fetch_list(Resource::HarborFiles, &Filter::default())
        .unwrap_err();
    assert!(matches!(err, GatewayError::Decode { .. }));
    assert!(err.is_transport());
}

#[test]
fn unreachable_server_is_a_transport_error() {
    // Port 9 (discard) is not served by anything in the test environment.
    let gateway = HttpGateway::new("http://127.0.0.1:9/api");
    let err = gateway
        .fetch_list(Resource::Charts, &Filter::default())
        .unwrap_err();
    assert!(matches!(err, GatewayError::Transport { status: None, .. }));
}

// ---------------------------------------------------------------------------
// Create + typed endpoints
// ---------------------------------------------------------------------------

#[test]
fn submit_create_posts_json_body() {
    let created = r#"{"path": "logbook/2024-05-01/fleeting/idea.md", "message": "Card created"}"#;
    let api = StubApi::start(&[("POST /api/cards/fleeting", 200, created)]);

    let input = FleetingCardInput {
        title: "idea".to_string(),
        content: "Try tickets.".to_string(),
        tags: Some(vec!["rust".to_string()]),
    };
    let result = api.gateway().submit_create(&input).unwrap();
    assert_eq!(result.message, "Card created");
    assert!(result.path.ends_with("idea.md"));

    let seen = api.seen();
    assert_eq!(seen[0].method, "POST");
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body["title"], "idea");
    assert_eq!(body["content"], "Try tickets.");
    assert_eq!(body["tags"][0], "rust");
}

#[test]
fn create_without_tags_omits_the_field() {
    let created = r#"{"path": "p.md", "message": "ok"}"#;
    let api = StubApi::start(&[("POST /api/cards/fleeting", 200, created)]);

    let input = FleetingCardInput {
        title: "t".to_string(),
        content: "c".to_string(),
        tags: None,
    };
    api.gateway().submit_create(&input).unwrap();

    let body: serde_json::Value = serde_json::from_str(&api.seen()[0].body).unwrap();
    assert!(body.get("tags").is_none());
}

#[test]
fn typed_endpoints_decode() {
    let api = StubApi::start(&[
        ("GET /api/cards/dates", 200, r#"{"dates": ["2024-05-02", "2024-05-01"]}"#),
        (
            "GET /api/today",
            200,
            r#"{"date": "2024-05-02", "task": "Ship", "focus": "Tests",
                "sounding": null, "sounding_exists": false,
                "cards": {"insights": ["a.md"], "fleeting": []}}"#,
        ),
        ("GET /api/config/user", 200, r#"{"name": "Ada", "version": "1.0"}"#),
    ]);
    let gateway = api.gateway();

    assert_eq!(gateway.card_dates().unwrap(), ["2024-05-02", "2024-05-01"]);

    let today = gateway.today().unwrap();
    assert_eq!(today.focus, "Tests");
    assert_eq!(today.cards.insights.len(), 1);
    assert!(today.sounding.is_none());

    assert_eq!(gateway.user_config().unwrap().name, "Ada");
}
