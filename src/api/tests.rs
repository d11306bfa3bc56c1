//! Tests for the VK API client

use super::*;
use crate::engine::{BatchSource, Friends, LookupSource, PageSource, WallPosts};
use crate::error::{Error, VK_TOO_MANY_REQUESTS};
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::{BackoffType, OwnerId};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> VkApi {
    let config = HttpClientConfig::builder()
        .base_url(format!("{}/method", server.uri()))
        .max_retries(2)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build();
    VkApi::new(HttpClient::with_config(config).unwrap(), "secret")
}

#[tokio::test]
async fn test_call_attaches_token_and_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/method/account.getProfileInfo"))
        .and(query_param("access_token", "secret"))
        .and(query_param("v", "5.131"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"first_name": "Pavel", "last_name": "D", "screen_name": "id1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = api_for(&server).verify().await.unwrap();
    assert_eq!(profile.first_name, "Pavel");
    assert_eq!(profile.screen_name.as_deref(), Some("id1"));
}

#[tokio::test]
async fn test_error_envelope_becomes_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/method/account.getProfileInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"error_code": 5, "error_msg": "User authorization failed"}
        })))
        .mount(&server)
        .await;

    let err = api_for(&server).verify().await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(matches!(
        err,
        Error::Api { code: 5, ref method, .. } if method == "account.getProfileInfo"
    ));
}

#[tokio::test]
async fn test_too_many_requests_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/method/friends.get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"error_code": VK_TOO_MANY_REQUESTS, "error_msg": "Too many requests per second"}
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/method/friends.get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"count": 1, "items": [{"id": 2, "first_name": "A", "last_name": "B"}]}
        })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let page = api
        .fetch_page(&Friends { user_id: 1 }, 0, 100)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.records[0].id, 2);
}

#[tokio::test]
async fn test_too_many_requests_gives_up() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/method/friends.get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"error_code": 6, "error_msg": "Too many requests per second"}
        })))
        .expect(3)
        .mount(&server)
        .await;

    let err = api_for(&server)
        .fetch_page(&Friends { user_id: 1 }, 0, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { code: 6, .. }));
}

#[tokio::test]
async fn test_missing_response_is_unexpected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/method/account.getProfileInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;

    let err = api_for(&server).verify().await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedResponse { .. }));
}

#[tokio::test]
async fn test_wall_page_sends_negative_owner_and_offset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/method/wall.get"))
        .and(query_param("owner_id", "-42"))
        .and(query_param("offset", "200"))
        .and(query_param("count", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "count": 350,
                "items": [{
                    "id": 9,
                    "owner_id": -42,
                    "from_id": -42,
                    "text": "hi",
                    "date": 1_600_000_000,
                    "likes": {"count": 3},
                    "comments": {"count": 1}
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api_for(&server)
        .fetch_page(&WallPosts::community(42), 200, 100)
        .await
        .unwrap();

    assert_eq!(page.total, 350);
    assert_eq!(page.records[0].likes, 3);
    assert_eq!(page.records[0].text, "hi");
}

#[tokio::test]
async fn test_fetch_batch_posts_script_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/method/execute"))
        .and(body_string_contains("ownerId=-42"))
        .and(body_string_contains("offset=100"))
        .and(body_string_contains("access_token=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "posts": {
                    "ids": [[5, 4], [3]],
                    "likes": [[{"count": 1}, {"count": 2}], [{"count": 3}]],
                    "comments": [[{"count": 0}, {"count": 0}], [{"count": 7}]],
                    "date": [[1_600_000_300, 1_600_000_200], [1_600_000_100]],
                    "text": [["e", "d"], ["c"]],
                    "from_id": [[-42, 11], [-42]]
                },
                "offset": 2600
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let batch = api_for(&server)
        .fetch_batch(OwnerId::community(42), 100)
        .await
        .unwrap();

    assert_eq!(batch.record_count(), 3);
    assert_eq!(batch.offset_reached, 2600);

    let posts = batch.into_posts(OwnerId::community(42)).unwrap();
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![5, 4, 3]);
    assert_eq!(posts[2].comments, 7);
    assert_eq!(posts[1].from_id, Some(11));
}

#[tokio::test]
async fn test_fetch_batch_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/method/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"posts": {"ids": [[1]], "likes": [], "comments": [[0]], "date": [[1]]}}
        })))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .with_script(WallScript::counters_only())
        .fetch_batch(OwnerId::community(1), 100)
        .await
        .unwrap_err();
    assert!(err.is_contract_violation());
}

#[tokio::test]
async fn test_lookups_join_ids() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/method/groups.getById"))
        .and(query_param("group_ids", "1,2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": [
                {"id": 1, "name": "One", "screen_name": "one", "is_closed": 0},
                {"id": 2, "name": "Two", "screen_name": "two", "is_closed": 1}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/method/users.get"))
        .and(query_param("user_ids", "7"))
        .and(query_param("fields", "domain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": [{"id": 7, "first_name": "Ann", "last_name": "Lee", "domain": "ann"}]
        })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let groups = api.groups_by_id(&[-1, 2]).await.unwrap();
    assert_eq!(groups.len(), 2);
    assert!(!groups[1].is_public());

    let users = api.users_by_id(&[7]).await.unwrap();
    assert_eq!(users[0].domain.as_deref(), Some("ann"));

    assert!(api.users_by_id(&[]).await.unwrap().is_empty());
}

#[test]
fn test_connect_from_config() {
    let config = crate::config::Config::from_toml(
        "access_token = \"t\"\n[api]\nversion = \"5.199\"",
    )
    .unwrap();
    let api = connect(&config).unwrap();
    assert_eq!(api.version(), "5.199");
}

#[tokio::test]
async fn test_connection_error_hides_token() {
    let config = HttpClientConfig::builder()
        .base_url("http://127.0.0.1:1/method")
        .max_retries(0)
        .no_rate_limit()
        .build();
    let api = VkApi::new(HttpClient::with_config(config).unwrap(), "SUPERSECRETTOKEN");

    let err = api
        .fetch_page(&Friends { user_id: 1 }, 0, 100)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(_)));
    assert!(!err.to_string().contains("SUPERSECRETTOKEN"));
    assert!(!format!("{err:?}").contains("SUPERSECRETTOKEN"));
}

#[tokio::test]
async fn test_undecodable_body_hides_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/method/friends.get"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .fetch_page(&Friends { user_id: 1 }, 0, 100)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http(_)));
    assert!(!err.to_string().contains("secret"));
}
