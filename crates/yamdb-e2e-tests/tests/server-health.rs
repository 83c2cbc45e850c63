use tracing::info;
use tracing_test::traced_test;
use yamdb_e2e_tests::launch_env;

#[tokio::test]
#[traced_test]
async fn test_health() {
    let (server, _config_guard) = launch_env("test_health").await.unwrap();

    let client = reqwest::Client::new();

    let url = server.base_url.join("health").unwrap();
    let response = client.get(url).send().await.unwrap();
    info! {"Response: {:#?}", response};
    assert!(response.status().is_success());
    assert_eq!("OK", response.text().await.unwrap());
}

#[tokio::test]
#[traced_test]
async fn test_unsupported_method() {
    let (server, _config_guard) = launch_env("test_unsupported_method").await.unwrap();
    let client = reqwest::Client::new();

    let response = client.put(server.api("categories/")).send().await.unwrap();
    assert_eq!(405, response.status().as_u16());

    let response = client.get(server.api("genres/drama/")).send().await.unwrap();
    assert_eq!(405, response.status().as_u16());

    let response = client.delete(server.api("users/me/")).send().await.unwrap();
    assert_eq!(405, response.status().as_u16());
}
