use serde_json::{Value, json};
use tracing_test::traced_test;
use yamdb_e2e_tests::launch_env;
use yamdb_types::claim::Role;

#[tokio::test]
#[traced_test]
async fn test_signup_and_token() {
    let (server, _config_guard) = launch_env("test_signup_and_token").await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .post(server.api("auth/signup/"))
        .json(&json!({"username": "alice", "email": "alice@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(json!({"username": "alice", "email": "alice@example.com"}), body);

    let code = server.read_code("alice@example.com").await.unwrap();

    let response = client
        .post(server.api("auth/token/"))
        .json(&json!({"username": "alice", "confirmation_code": "not-a-code"}))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["confirmation_code"].is_array());

    let response = client
        .post(server.api("auth/token/"))
        .json(&json!({"username": "alice", "confirmation_code": code}))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    // code is single use
    let response = client
        .post(server.api("auth/token/"))
        .json(&json!({"username": "alice", "confirmation_code": code}))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    let alice = server.client_with_token(&token).unwrap();
    let response = alice.get(server.api("users/me/")).send().await.unwrap();
    assert_eq!(200, response.status().as_u16());
    let me: Value = response.json().await.unwrap();
    assert_eq!("alice", me["username"]);
    assert_eq!("user", me["role"]);
}

#[tokio::test]
#[traced_test]
async fn test_signup_conflicts() {
    let (server, _config_guard) = launch_env("test_signup_conflicts").await.unwrap();
    let client = reqwest::Client::new();
    let signup = |username: &str, email: &str| {
        client
            .post(server.api("auth/signup/"))
            .json(&json!({"username": username, "email": email}))
            .send()
    };

    let response = signup("bob", "bob@example.com").await.unwrap();
    assert_eq!(200, response.status().as_u16());

    // repeated signup issues a new code
    let response = signup("bob", "bob@example.com").await.unwrap();
    assert_eq!(200, response.status().as_u16());

    let response = signup("bob", "other@example.com").await.unwrap();
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["username"].is_array());

    let response = signup("robert", "bob@example.com").await.unwrap();
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["email"].is_array());

    let response = signup("me", "me@example.com").await.unwrap();
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["username"].is_array());

    let response = signup("carol", "not-an-email").await.unwrap();
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["email"].is_array());

    let response = client
        .post(server.api("auth/signup/"))
        .json(&json!({"username": "dave"}))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
#[traced_test]
async fn test_token_errors() {
    let (server, _config_guard) = launch_env("test_token_errors").await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .post(server.api("auth/token/"))
        .json(&json!({"username": "ghost", "confirmation_code": "whatever"}))
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());

    let response = client
        .get(server.api("users/me/"))
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());

    let bogus = server.client_with_token("not.a.token").unwrap();
    let response = bogus.get(server.api("titles/")).send().await.unwrap();
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
#[traced_test]
async fn test_role_change_invalidates_code() {
    let (server, _config_guard) = launch_env("test_role_change_invalidates_code")
        .await
        .unwrap();
    let admin = server.user_client("admin", Role::Admin).await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .post(server.api("auth/signup/"))
        .json(&json!({"username": "erin", "email": "erin@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let code = server.read_code("erin@example.com").await.unwrap();

    let response = admin
        .patch(server.api("users/erin/"))
        .json(&json!({"role": "moderator"}))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());

    let response = client
        .post(server.api("auth/token/"))
        .json(&json!({"username": "erin", "confirmation_code": code}))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
#[traced_test]
async fn test_deleted_user_token_rejected() {
    let (server, _config_guard) = launch_env("test_deleted_user_token_rejected")
        .await
        .unwrap();
    let admin = server.user_client("admin", Role::Admin).await.unwrap();
    let frank = server.user_client("frank", Role::User).await.unwrap();

    let response = frank.get(server.api("users/me/")).send().await.unwrap();
    assert_eq!(200, response.status().as_u16());

    let response = admin
        .delete(server.api("users/frank/"))
        .send()
        .await
        .unwrap();
    assert_eq!(204, response.status().as_u16());

    let response = frank.get(server.api("users/me/")).send().await.unwrap();
    assert_eq!(401, response.status().as_u16());
}
