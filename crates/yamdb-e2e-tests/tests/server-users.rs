use serde_json::{Value, json};
use tracing::info;
use tracing_test::traced_test;
use yamdb_e2e_tests::launch_env;
use yamdb_types::claim::Role;

#[tokio::test]
#[traced_test]
async fn test_admin_manages_users() {
    let (server, _config_guard) = launch_env("test_admin_manages_users").await.unwrap();
    let admin = server.user_client("admin", Role::Admin).await.unwrap();

    let response = admin
        .post(server.api("users/"))
        .json(&json!({"username": "mod", "email": "mod@example.com", "role": "moderator", "bio": "Watches everything"}))
        .send()
        .await
        .unwrap();
    assert_eq!(201, response.status().as_u16());
    let created: Value = response.json().await.unwrap();
    assert_eq!("moderator", created["role"]);
    assert!(created.get("id").is_none());

    let response = admin
        .post(server.api("users/"))
        .json(&json!({"username": "mod2", "email": "mod@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["email"].is_array());

    let response = admin
        .post(server.api("users/"))
        .json(&json!({"username": "Me", "email": "me@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    let response = admin
        .post(server.api("users/"))
        .json(&json!({"username": "x", "email": "x@example.com", "role": "superuser"}))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    let response = admin.get(server.api("users/")).send().await.unwrap();
    assert_eq!(200, response.status().as_u16());
    let page: Value = response.json().await.unwrap();
    info!("Users: {page:#?}");
    assert_eq!(2, page["count"]);
    assert_eq!(1, page["page"]);
    assert_eq!(1, page["total_pages"]);

    let response = admin.get(server.api("users/mod/")).send().await.unwrap();
    assert_eq!(200, response.status().as_u16());
    let user: Value = response.json().await.unwrap();
    assert_eq!("Watches everything", user["bio"]);

    let response = admin.get(server.api("users/nobody/")).send().await.unwrap();
    assert_eq!(404, response.status().as_u16());

    let response = admin.delete(server.api("users/mod/")).send().await.unwrap();
    assert_eq!(204, response.status().as_u16());
    let response = admin.get(server.api("users/mod/")).send().await.unwrap();
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
#[traced_test]
async fn test_users_forbidden_for_non_admin() {
    let (server, _config_guard) = launch_env("test_users_forbidden_for_non_admin")
        .await
        .unwrap();
    let moderator = server.user_client("mod", Role::Moderator).await.unwrap();
    let anonymous = reqwest::Client::new();

    let response = moderator.get(server.api("users/")).send().await.unwrap();
    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].is_string());

    let response = anonymous.get(server.api("users/")).send().await.unwrap();
    assert_eq!(401, response.status().as_u16());

    let response = moderator
        .patch(server.api("users/mod/"))
        .json(&json!({"role": "admin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
#[traced_test]
async fn test_me_cannot_change_role() {
    let (server, _config_guard) = launch_env("test_me_cannot_change_role").await.unwrap();
    let user = server.user_client("grace", Role::User).await.unwrap();

    let response = user
        .patch(server.api("users/me/"))
        .json(&json!({"role": "admin", "first_name": "Grace"}))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let me: Value = response.json().await.unwrap();
    assert_eq!("user", me["role"]);
    assert_eq!("Grace", me["first_name"]);

    let response = user.get(server.api("users/")).send().await.unwrap();
    assert_eq!(403, response.status().as_u16());

    let response = user
        .patch(server.api("users/me/"))
        .json(&json!({"role": "superuser", "bio": "Compilers"}))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let me: Value = response.json().await.unwrap();
    assert_eq!("user", me["role"]);
    assert_eq!("Compilers", me["bio"]);

    let response = user
        .patch(server.api("users/me/"))
        .json(&json!({"role": {"name": "admin"}, "last_name": "Hopper"}))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let me: Value = response.json().await.unwrap();
    assert_eq!("user", me["role"]);
    assert_eq!("Hopper", me["last_name"]);

    let response = user
        .patch(server.api("users/me/"))
        .json(&json!({"username": "me"}))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    let response = user
        .patch(server.api("users/me/"))
        .json(&json!({"username": "grace_hopper"}))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let me: Value = response.json().await.unwrap();
    assert_eq!("grace_hopper", me["username"]);

    // identity follows user id, not the old name
    let response = user.get(server.api("users/me/")).send().await.unwrap();
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
#[traced_test]
async fn test_role_change_applies_immediately() {
    let (server, _config_guard) = launch_env("test_role_change_applies_immediately")
        .await
        .unwrap();
    let admin = server.user_client("admin", Role::Admin).await.unwrap();
    let henry = server.user_client("henry", Role::User).await.unwrap();

    let response = henry
        .post(server.api("categories/"))
        .json(&json!({"name": "Books", "slug": "books"}))
        .send()
        .await
        .unwrap();
    assert_eq!(403, response.status().as_u16());

    let response = admin
        .patch(server.api("users/henry/"))
        .json(&json!({"role": "admin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());

    let response = henry
        .post(server.api("categories/"))
        .json(&json!({"name": "Books", "slug": "books"}))
        .send()
        .await
        .unwrap();
    assert_eq!(201, response.status().as_u16());
}
