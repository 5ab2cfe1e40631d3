//! End-to-end tests over a real HTTP server.

use std::time::Duration;

use encore::{Error, Policy};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quick_policy() -> Policy {
    Policy::builder().interval(Duration::from_millis(2)).build()
}

#[tokio::test]
async fn single_successful_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut attempts = encore::get(&format!("{}/health", server.uri()), quick_policy());
    let outcome = attempts.next().await.unwrap();
    assert!(outcome.is_ok());
    let response = outcome.into_response().unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
    assert!(attempts.next().await.is_none());
}

#[tokio::test]
async fn recovers_after_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&server)
        .await;

    let mut attempts = encore::get(&format!("{}/flaky", server.uri()), quick_policy());
    let mut statuses = Vec::new();
    let mut last_body = None;
    while let Some(outcome) = attempts.next().await {
        let response = outcome.into_response().unwrap();
        statuses.push(response.status().as_u16());
        last_body = Some(response.text().await.unwrap());
    }
    assert_eq!(statuses, vec![500, 500, 200]);
    assert_eq!(last_body.as_deref(), Some("recovered"));
}

#[tokio::test]
async fn post_body_is_resent_on_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string("payload"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string("payload"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut attempts = encore::post(
        &format!("{}/upload", server.uri()),
        "payload",
        quick_policy(),
    );
    let mut yielded = 0;
    while attempts.next().await.is_some() {
        yielded += 1;
    }
    assert_eq!(yielded, 2);
}

#[tokio::test]
async fn post_form_encodes_pairs_and_forces_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/form"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("a=1&b=2&b=3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut attempts = encore::post_form(
        &format!("{}/form", server.uri()),
        [("a", "1"), ("b", "2"), ("b", "3")],
        quick_policy(),
    );
    assert!(attempts.next().await.unwrap().is_ok());
    assert!(attempts.next().await.is_none());
}

#[tokio::test]
async fn client_error_stops_after_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut attempts = encore::get(&format!("{}/missing", server.uri()), quick_policy());
    let outcome = attempts.next().await.unwrap();
    assert!(outcome
        .error
        .as_ref()
        .is_some_and(Error::is_client_error_termination));
    assert_eq!(outcome.status().unwrap().as_u16(), 404);
    assert!(attempts.next().await.is_none());
}

#[tokio::test]
async fn too_many_requests_is_retried_not_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut attempts = encore::get(&format!("{}/busy", server.uri()), quick_policy());
    assert_eq!(attempts.next().await.unwrap().status().unwrap().as_u16(), 429);
    assert_eq!(attempts.next().await.unwrap().status().unwrap().as_u16(), 200);
    assert!(attempts.next().await.is_none());
}

#[tokio::test]
async fn unbuffered_responses_stream_to_the_caller() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live"))
        .respond_with(ResponseTemplate::new(200).set_body_string("live"))
        .mount(&server)
        .await;

    let policy = Policy::builder()
        .interval(Duration::from_millis(2))
        .buffer_response_body(false)
        .build();
    let mut attempts = encore::get(&format!("{}/live", server.uri()), policy);
    let response = attempts.next().await.unwrap().into_response().unwrap();
    assert_eq!(response.text().await.unwrap(), "live");
}

#[tokio::test]
async fn head_requests_carry_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/probe"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut attempts = encore::head(&format!("{}/probe", server.uri()), quick_policy());
    assert!(attempts.next().await.unwrap().is_ok());
    assert!(attempts.next().await.is_none());
}

#[tokio::test]
async fn stream_adaptor_yields_every_outcome() {
    use futures::StreamExt;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/seq"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/seq"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let outcomes: Vec<_> = encore::get(&format!("{}/seq", server.uri()), quick_policy())
        .into_stream()
        .collect()
        .await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[1].is_ok());
}
