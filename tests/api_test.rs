use std::{sync::Arc, time::Duration};

use axum::{
    Extension,
    body::to_bytes,
    extract::Query,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use mockito::{Matcher, Server, ServerGuard};
use reqwest::Url;
use serde_json::{Value, json};
use spotproxy::api::{self, LOGIN_SUCCESS, PLAYBACK_STARTED};
use spotproxy::config::Config;
use spotproxy::management::AppState;
use spotproxy::types::{CallbackParams, PlayParams, SearchParams, Token};
use spotproxy::utils;

// Helper function to create shared state pointed at the mock server
fn create_test_state(server: &ServerGuard) -> Arc<AppState> {
    let config = Config {
        server_address: "127.0.0.1:0".parse().unwrap(),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_uri: "http://127.0.0.1:3050/callback".to_string(),
        scopes: vec!["user-modify-playback-state".to_string()],
        auth_url: format!("{}/authorize", server.url()),
        token_url: format!("{}/api/token", server.url()),
        api_url: format!("{}/v1", server.url()),
    };
    Arc::new(AppState::from_config(config).unwrap())
}

fn fresh_token(access: &str) -> Token {
    Token {
        access_token: access.to_string(),
        refresh_token: "refresh-1".to_string(),
        scope: String::new(),
        expires_in: 3600,
        obtained_at: utils::now_timestamp(),
    }
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn state_param(response: &Response) -> String {
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    Url::parse(location)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

#[tokio::test]
async fn test_login_redirects_to_spotify() {
    let server = Server::new_async().await;
    let state = create_test_state(&server);

    let response = api::login(Extension(state)).await.into_response();

    assert!(response.status().is_redirection());
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with(&format!("{}/authorize?", server.url())));
    assert!(location.contains("response_type=code"));
    assert_eq!(state_param(&response).len(), utils::STATE_LENGTH);
}

#[tokio::test]
async fn test_callback_with_error() {
    let server = Server::new_async().await;
    let state = create_test_state(&server);

    let params = CallbackParams {
        error: Some("access_denied".to_string()),
        ..Default::default()
    };
    let response = api::callback(Query(params), Extension(state))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Callback Error: access_denied");
}

#[tokio::test]
async fn test_callback_without_pending_login() {
    let server = Server::new_async().await;
    let state = create_test_state(&server);

    let params = CallbackParams {
        code: Some("the-code".to_string()),
        state: Some("forged".to_string()),
        ..Default::default()
    };
    let response = api::callback(Query(params), Extension(Arc::clone(&state)))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!state.tokens.is_authenticated().await);
}

#[tokio::test]
async fn test_callback_token_exchange_fails() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/token")
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant"}"#)
        .create_async()
        .await;
    let state = create_test_state(&server);

    let login = api::login(Extension(Arc::clone(&state))).await.into_response();
    let params = CallbackParams {
        code: Some("stale".to_string()),
        state: Some(state_param(&login)),
        ..Default::default()
    };
    let response = api::callback(Query(params), Extension(Arc::clone(&state)))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_text(response).await, "Error getting tokens");
    assert!(!state.tokens.is_authenticated().await);
}

#[tokio::test]
async fn test_login_search_flow() {
    let mut server = Server::new_async().await;
    let token_mock = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded("code".into(), "the-code".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "access_token": "access-1",
                "token_type": "Bearer",
                "scope": "user-modify-playback-state",
                "expires_in": 3600,
                "refresh_token": "refresh-1"
            })
            .to_string(),
        )
        .create_async()
        .await;
    let search_mock = server
        .mock("GET", "/v1/search")
        .match_header("authorization", "Bearer access-1")
        .match_query(Matcher::UrlEncoded("q".into(), "bohemian".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"tracks":{"items":[{"id":"7tFiyTwD0nx5a1eklYtX2J","name":"Bohemian Rhapsody","uri":"spotify:track:7tFiyTwD0nx5a1eklYtX2J"}]}}"#,
        )
        .create_async()
        .await;
    let state = create_test_state(&server);

    let login = api::login(Extension(Arc::clone(&state))).await.into_response();
    let params = CallbackParams {
        code: Some("the-code".to_string()),
        state: Some(state_param(&login)),
        ..Default::default()
    };
    let response = api::callback(Query(params), Extension(Arc::clone(&state)))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, LOGIN_SUCCESS);
    token_mock.assert_async().await;

    let health = api::health(Extension(Arc::clone(&state))).await.0;
    assert_eq!(health["authenticated"], Value::Bool(true));

    let params = SearchParams {
        q: Some("bohemian".to_string()),
    };
    let response = api::search(Query(params), Extension(Arc::clone(&state)))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body, json!({ "uri": "spotify:track:7tFiyTwD0nx5a1eklYtX2J" }));
    search_mock.assert_async().await;

    state.tokens.stop().await;
}

#[tokio::test]
async fn test_search_requires_login() {
    let server = Server::new_async().await;
    let state = create_test_state(&server);

    let params = SearchParams {
        q: Some("anything".to_string()),
    };
    let response = api::search(Query(params), Extension(state))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Error occurred during search");
}

#[tokio::test]
async fn test_play_requires_login() {
    let server = Server::new_async().await;
    let state = create_test_state(&server);

    let params = PlayParams {
        uri: Some("spotify:track:1".to_string()),
        device_id: None,
    };
    let response = api::play(Query(params), Extension(state))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Error occurred during playback");
}

#[tokio::test]
async fn test_search_without_query() {
    let server = Server::new_async().await;
    let state = create_test_state(&server);
    state.tokens.set(fresh_token("access-1")).await;

    let response = api::search(Query(SearchParams { q: None }), Extension(state))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Error occurred during search");
}

#[tokio::test]
async fn test_play_without_uri() {
    let server = Server::new_async().await;
    let state = create_test_state(&server);
    state.tokens.set(fresh_token("access-1")).await;

    let params = PlayParams {
        uri: None,
        device_id: None,
    };
    let response = api::play(Query(params), Extension(state))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Error occurred during playback");
}

#[tokio::test]
async fn test_health_before_login() {
    let server = Server::new_async().await;
    let state = create_test_state(&server);

    let health = api::health(Extension(state)).await.0;

    assert_eq!(health["status"], "ok");
    assert_eq!(health["authenticated"], Value::Bool(false));
}

#[tokio::test]
async fn test_callback_without_code() {
    let server = Server::new_async().await;
    let state = create_test_state(&server);

    let login = api::login(Extension(Arc::clone(&state))).await.into_response();
    let params = CallbackParams {
        state: Some(state_param(&login)),
        ..Default::default()
    };
    let response = api::callback(Query(params), Extension(Arc::clone(&state)))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Callback Error: missing code");
    assert!(!state.tokens.is_authenticated().await);
}

#[tokio::test]
async fn test_forged_callback_does_not_cancel_login() {
    let mut server = Server::new_async().await;
    let token_mock = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded("code".into(), "real-code".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"access-1","refresh_token":"refresh-1","expires_in":3600}"#)
        .expect(1)
        .create_async()
        .await;
    let state = create_test_state(&server);

    let login = api::login(Extension(Arc::clone(&state))).await.into_response();

    let forged = CallbackParams {
        code: Some("forged-code".to_string()),
        state: Some("not-the-state".to_string()),
        ..Default::default()
    };
    let response = api::callback(Query(forged), Extension(Arc::clone(&state)))
        .await
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let real = CallbackParams {
        code: Some("real-code".to_string()),
        state: Some(state_param(&login)),
        ..Default::default()
    };
    let response = api::callback(Query(real), Extension(Arc::clone(&state)))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, LOGIN_SUCCESS);
    token_mock.assert_async().await;

    state.tokens.stop().await;
}

#[tokio::test]
async fn test_search_no_results() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v1/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"tracks":{"items":[]}}"#)
        .create_async()
        .await;
    let state = create_test_state(&server);
    state.tokens.set(fresh_token("access-1")).await;

    let params = SearchParams {
        q: Some("zzzz".to_string()),
    };
    let response = api::search(Query(params), Extension(state))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Error occurred during search");
}

#[tokio::test]
async fn test_play_starts_playback() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/v1/me/player/play")
        .match_header("authorization", "Bearer access-1")
        .match_body(Matcher::Json(json!({ "uris": ["spotify:track:1"] })))
        .with_status(204)
        .create_async()
        .await;
    let state = create_test_state(&server);
    state.tokens.set(fresh_token("access-1")).await;

    let params = PlayParams {
        uri: Some("spotify:track:1".to_string()),
        device_id: None,
    };
    let response = api::play(Query(params), Extension(state))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, PLAYBACK_STARTED);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_play_upstream_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("PUT", "/v1/me/player/play")
        .with_status(404)
        .with_body(r#"{"error":{"status":404,"message":"No active device found"}}"#)
        .create_async()
        .await;
    let state = create_test_state(&server);
    state.tokens.set(fresh_token("access-1")).await;

    let params = PlayParams {
        uri: Some("spotify:track:1".to_string()),
        device_id: None,
    };
    let response = api::play(Query(params), Extension(state))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_text(response).await, "Error occurred during playback");
}

#[tokio::test]
async fn test_expired_token_is_refreshed_on_demand() {
    let mut server = Server::new_async().await;
    let refresh_mock = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"access-2","expires_in":3600}"#)
        .create_async()
        .await;
    let state = create_test_state(&server);
    let mut stale = fresh_token("access-1");
    stale.obtained_at = 0;
    state.tokens.set(stale).await;

    let access = state.tokens.valid_access_token(&state.client).await.unwrap();

    refresh_mock.assert_async().await;
    assert_eq!(access, "access-2");
    let current = state.tokens.current().await.unwrap();
    assert_eq!(current.refresh_token, "refresh-1");
}

#[tokio::test]
async fn test_refresh_timer_replaces_access_token() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded("refresh_token".into(), "refresh-1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"access-2","expires_in":3600}"#)
        .create_async()
        .await;
    let state = create_test_state(&server);

    // expires_in of 2 seconds schedules the first refresh after 1 second
    let mut token = fresh_token("access-1");
    token.expires_in = 2;
    state.tokens.install(token, state.client.clone()).await;

    tokio::time::sleep(Duration::from_millis(1_800)).await;

    let current = state.tokens.current().await.unwrap();
    assert_eq!(current.access_token, "access-2");
    assert_eq!(current.expires_in, 3600);

    state.tokens.stop().await;
}

#[tokio::test]
async fn test_refresh_timer_keeps_token_on_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/token")
        .with_status(500)
        .create_async()
        .await;
    let state = create_test_state(&server);

    let mut token = fresh_token("access-1");
    token.expires_in = 2;
    state.tokens.install(token, state.client.clone()).await;

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let current = state.tokens.current().await.unwrap();
    assert_eq!(current.access_token, "access-1");

    state.tokens.stop().await;
}

#[tokio::test]
async fn test_second_login_replaces_refresh_timer() {
    let mut server = Server::new_async().await;
    let old_mock = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded("refresh_token".into(), "refresh-old".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"from-old","expires_in":3600}"#)
        .expect(0)
        .create_async()
        .await;
    let new_mock = server
        .mock("POST", "/api/token")
        .match_body(Matcher::UrlEncoded("refresh_token".into(), "refresh-new".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"from-new","expires_in":3600}"#)
        .expect(1)
        .create_async()
        .await;
    let state = create_test_state(&server);

    let mut first = fresh_token("access-old");
    first.refresh_token = "refresh-old".to_string();
    first.expires_in = 2;
    state.tokens.install(first, state.client.clone()).await;

    let mut second = fresh_token("access-new");
    second.refresh_token = "refresh-new".to_string();
    second.expires_in = 2;
    state.tokens.install(second, state.client.clone()).await;

    tokio::time::sleep(Duration::from_millis(1_800)).await;

    let current = state.tokens.current().await.unwrap();
    assert_eq!(current.access_token, "from-new");
    assert_eq!(current.refresh_token, "refresh-new");
    old_mock.assert_async().await;
    new_mock.assert_async().await;

    state.tokens.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_refresh_does_not_block_health() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body_from_request(|_| {
            std::thread::sleep(Duration::from_secs(2));
            br#"{"access_token":"access-2","expires_in":3600}"#.to_vec()
        })
        .create_async()
        .await;
    let state = create_test_state(&server);
    let mut stale = fresh_token("access-1");
    stale.obtained_at = 0;
    state.tokens.set(stale).await;

    let refreshing_state = Arc::clone(&state);
    let refresh = tokio::spawn(async move {
        refreshing_state
            .tokens
            .valid_access_token(&refreshing_state.client)
            .await
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let health = tokio::time::timeout(
        Duration::from_millis(500),
        api::health(Extension(Arc::clone(&state))),
    )
    .await
    .expect("health answered while a refresh was in flight");
    assert_eq!(health.0["authenticated"], Value::Bool(true));

    assert_eq!(refresh.await.unwrap().unwrap(), "access-2");
}
