//! Integration tests running the row pipeline over real HTTP sessions.

use std::sync::Arc;

use access_checker_core::checker::CheckerFactory;
use access_checker_core::{
    AccessResult, CheckError, Checker, CheckerRegistry, FALLBACK_MESSAGE, HttpSession, Pipeline,
    PipelineError, PipelineOptions, ProxyCredentials, ProxyLogin, ProxySession, ResultKind,
    Session, build_default_checker_registry,
};
use async_trait::async_trait;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

const EMBARGOED: ResultKind = ResultKind::no_access("Embargoed");

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

/// A site checker defined outside the crate, with its own result kind.
#[derive(Default)]
struct EmbargoChecker;

#[async_trait]
impl Checker for EmbargoChecker {
    fn name(&self) -> &'static str {
        "Embargo watcher"
    }

    async fn verify(
        &mut self,
        session: &mut dyn Session,
    ) -> Result<Option<AccessResult>, CheckError> {
        if session.has_content("ACCESS_OK") {
            return Ok(Some(AccessResult::new(ResultKind::FULL_ACCESS)));
        }
        if let Some(until) = session.select_text(".embargo")? {
            return Ok(Some(AccessResult::with_message(EMBARGOED, until)));
        }
        Ok(None)
    }
}

async fn run(
    registry: &CheckerRegistry,
    provider: &str,
    input: &str,
    session: &mut dyn Session,
) -> (Result<access_checker_core::PipelineStats, PipelineError>, String) {
    let entry = registry.lookup(provider).unwrap().clone();
    let mut output = Vec::new();
    let stats = Pipeline::new(entry, PipelineOptions::default())
        .run(input.as_bytes(), &mut output, session)
        .await;
    (stats, String::from_utf8(output).unwrap())
}

#[tokio::test]
async fn test_pipeline_springer_rows_over_http() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/book/full"))
        .respond_with(html("<button>Download book PDF</button>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/book/paywalled"))
        .respond_with(html(r#"<div data-test="buybox">Buy eBook</div>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/book/plain"))
        .respond_with(html("<p>Nothing recognisable here</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/book/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let base = server.uri();
    let input = format!(
        "title;url\nFull;{base}/book/full\nPaid;{base}/book/paywalled\n\
         Plain;{base}/book/plain\nGone;{base}/book/gone\n"
    );
    let registry = build_default_checker_registry().unwrap();
    let mut session = HttpSession::new().unwrap();
    let (stats, output) = run(&registry, "springer", &input, &mut session).await;
    let stats = stats.unwrap();

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "title;url;result;message");
    assert_eq!(
        lines[1],
        format!("Full;{base}/book/full;FullAccess;Book PDF download offered")
    );
    assert_eq!(
        lines[2],
        format!("Paid;{base}/book/paywalled;NoAccess;Purchase options shown")
    );
    assert_eq!(
        lines[3],
        format!("Plain;{base}/book/plain;NoRuleMatched;{FALLBACK_MESSAGE}")
    );
    assert!(lines[4].starts_with(&format!("Gone;{base}/book/gone;PageNotFound;HTTP 404")));

    assert_eq!(stats.checked, 4);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.no_access, 1);
    assert_eq!(stats.error, 2);
    assert!(!stats.interrupted);
}

#[tokio::test]
async fn test_pipeline_with_externally_registered_checker() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html("<p>ACCESS_OK</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html(r#"<span class="embargo">until 2027</span>"#))
        .mount(&server)
        .await;

    let mut registry = build_default_checker_registry().unwrap();
    let factory: CheckerFactory = Arc::new(|| Box::new(EmbargoChecker) as Box<dyn Checker>);
    registry
        .register_factory("embargo", "Embargo watcher", factory)
        .unwrap();

    let base = server.uri();
    let input = format!("link;note\n{base}/a;first\n{base}/b;second\n");
    let mut session = HttpSession::new().unwrap();
    let (stats, output) = run(&registry, "embargo", &input, &mut session).await;
    let stats = stats.unwrap();

    assert_eq!(
        output,
        format!(
            "link;note;result;message\n{base}/a;first;FullAccess;\n\
             {base}/b;second;Embargoed;until 2027\n"
        )
    );
    assert_eq!(stats.success, 1);
    assert_eq!(stats.no_access, 1);
}

#[tokio::test]
async fn test_pipeline_unreachable_url_aborts_after_flushing_earlier_rows() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("<p>Download book PDF</p>"))
        .mount(&server)
        .await;

    let base = server.uri();
    // Port 9 on localhost is not served by the mock; the connection is refused.
    let input = format!("title;url\nOk;{base}/ok\nDown;http://127.0.0.1:9/item\nLater;{base}/ok\n");
    let registry = build_default_checker_registry().unwrap();
    let mut session = HttpSession::new().unwrap();
    let (stats, output) = run(&registry, "springer", &input, &mut session).await;

    let err = stats.unwrap_err();
    assert!(matches!(err, PipelineError::CheckFailed { line: 3, .. }), "got {err}");
    assert_eq!(err.line(), Some(3));
    assert_eq!(
        output,
        format!("title;url;result;message\nOk;{base}/ok;FullAccess;Book PDF download offered\n")
    );
}

async fn mount_guarded_item(server: &MockServer) {
    let target = format!("{}/item/7", server.uri());
    let login_url =
        Url::parse_with_params(&format!("{}/login", server.uri()), [("qurl", &target)]).unwrap();

    Mock::given(method("GET"))
        .and(path("/item/7"))
        .and(header("cookie", "ezproxy=granted"))
        .respond_with(html("<p>Download book EPUB</p>"))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/7"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", login_url.as_str()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(html(
            r#"<form method="post" action="/login">
                 <input name="user"><input type="password" name="pass">
               </form>"#,
        ))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("set-cookie", "ezproxy=granted; Path=/")
                .insert_header("location", target.as_str()),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pipeline_through_proxy_session_logs_in_once() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_guarded_item(&server).await;

    let base = server.uri();
    let input = format!("title;url\nFirst;{base}/item/7\nAgain;{base}/item/7\n");
    let registry = build_default_checker_registry().unwrap();
    let login = ProxyLogin::new(ProxyCredentials::new("alice", "s3cret"));
    let mut session = ProxySession::new(HttpSession::new().unwrap(), login);
    let (stats, output) = run(&registry, "springer", &input, &mut session).await;

    assert_eq!(stats.unwrap().success, 2);
    assert_eq!(session.login_count(), 1);
    assert!(!output.contains("/login"));
    assert_eq!(
        output.lines().nth(1).unwrap(),
        format!("First;{base}/item/7;FullAccess;Book EPUB download offered")
    );
}
