use super::*;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> PlacesClient {
    PlacesClient::with_base_url("test-key", 30, base_url)
        .expect("client construction should not fail")
}

#[test]
fn build_url_appends_endpoint_and_key() {
    let client = test_client("https://maps.example.com/api/place");
    let url = client
        .build_url("details/json", &[("place_id", "abc123")])
        .expect("should build");
    assert_eq!(
        url.as_str(),
        "https://maps.example.com/api/place/details/json?place_id=abc123&key=test-key"
    );
}

#[test]
fn build_url_handles_a_host_root_base() {
    // A base with no path component must not yield a double-slash path.
    let client = test_client("http://127.0.0.1:9000");
    let url = client
        .build_url("details/json", &[("place_id", "abc123")])
        .expect("should build");
    assert_eq!(url.path(), "/details/json");
}

#[test]
fn build_url_strips_trailing_slash() {
    let client = test_client("https://maps.example.com/api/place/");
    let url = client
        .build_url("findplacefromtext/json", &[("input", "Sushi Bar")])
        .expect("should build");
    assert!(url
        .as_str()
        .starts_with("https://maps.example.com/api/place/findplacefromtext/json?"));
}

#[test]
fn build_url_encodes_special_characters() {
    let client = test_client("https://maps.example.com/api/place");
    let url = client
        .build_url("findplacefromtext/json", &[("input", "Fish & Chips 4th Ave")])
        .expect("should build");
    assert!(
        url.as_str().contains("Fish+%26+Chips") || url.as_str().contains("Fish%20%26%20Chips"),
        "query param should be percent-encoded: {url}"
    );
}

#[test]
fn redacted_drops_query_string() {
    let url = Url::parse("https://maps.example.com/api?key=secret").expect("valid url");
    let clean = redacted(&url);
    assert!(!clean.contains("secret"));
}

#[tokio::test]
async fn search_returns_first_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/findplacefromtext/json"))
        .and(query_param("input", "Nico Sushi 4th Ave"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "candidates": [{ "place_id": "pid-1" }, { "place_id": "pid-2" }]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.search("Nico Sushi", "4th Ave").await.expect("search ok");
    assert_eq!(result.as_deref(), Some("pid-1"));
}

#[tokio::test]
async fn search_zero_results_is_none_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/findplacefromtext/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ZERO_RESULTS",
            "candidates": []
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.search("Ghost Kitchen", "Nowhere").await.expect("search ok");
    assert!(result.is_none());
}

#[tokio::test]
async fn over_query_limit_classifies_as_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/details/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OVER_QUERY_LIMIT",
            "error_message": "You have exceeded your daily request quota"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch_details("pid-1").await.expect_err("should fail");
    assert!(matches!(err, PlacesError::RateLimited { .. }), "got: {err:?}");
}

#[tokio::test]
async fn details_not_found_classifies_as_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/details/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "NOT_FOUND"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch_details("gone").await.expect_err("should fail");
    assert!(matches!(err, PlacesError::NotFound { .. }), "got: {err:?}");
}

#[tokio::test]
async fn details_parses_tracked_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/details/json"))
        .and(query_param("place_id", "pid-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "result": {
                "formatted_address": "123 Main St",
                "formatted_phone_number": "(604) 555-0100",
                "website": "https://nicosushi.example.com",
                "rating": 4.4,
                "opening_hours": {
                    "weekday_text": ["Monday: 11:00 AM - 9:00 PM"]
                }
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let details = client.fetch_details("pid-1").await.expect("details ok");
    assert_eq!(details.formatted_address.as_deref(), Some("123 Main St"));
    assert_eq!(details.rating, Some(4.4));
    assert_eq!(
        details.hours_text().as_deref(),
        Some("Monday: 11:00 AM - 9:00 PM")
    );
}

#[tokio::test]
async fn http_429_classifies_as_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/details/json"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch_details("pid-1").await.expect_err("should fail");
    assert!(matches!(err, PlacesError::RateLimited { .. }), "got: {err:?}");
}

#[tokio::test]
async fn http_500_classifies_as_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/details/json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.fetch_details("pid-1").await.expect_err("should fail");
    assert!(
        matches!(err, PlacesError::UnexpectedStatus { status: 500, .. }),
        "got: {err:?}"
    );
}
