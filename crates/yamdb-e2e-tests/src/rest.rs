use anyhow::{Result, anyhow};
use serde_json::{Value, json};

use crate::TestServer;

async fn post_created(client: &reqwest::Client, url: reqwest::Url, payload: Value) -> Result<Value> {
    let response = client.post(url).json(&payload).send().await?;
    let status = response.status();
    if status.as_u16() != 201 {
        return Err(anyhow!("Expected 201, got {status}: {}", response.text().await?));
    }
    Ok(response.json().await?)
}

pub async fn create_category(
    server: &TestServer,
    client: &reqwest::Client,
    name: &str,
    slug: &str,
) -> Result<Value> {
    post_created(
        client,
        server.api("categories/"),
        json!({"name": name, "slug": slug}),
    )
    .await
}

pub async fn create_genre(
    server: &TestServer,
    client: &reqwest::Client,
    name: &str,
    slug: &str,
) -> Result<Value> {
    post_created(
        client,
        server.api("genres/"),
        json!({"name": name, "slug": slug}),
    )
    .await
}

pub async fn create_title(
    server: &TestServer,
    client: &reqwest::Client,
    name: &str,
    year: i32,
    category: &str,
    genre: &[&str],
) -> Result<i64> {
    let title = post_created(
        client,
        server.api("titles/"),
        json!({"name": name, "year": year, "category": category, "genre": genre}),
    )
    .await?;
    title["id"].as_i64().ok_or_else(|| anyhow!("Missing title id"))
}

pub async fn create_review(
    server: &TestServer,
    client: &reqwest::Client,
    title_id: i64,
    text: &str,
    score: i64,
) -> Result<i64> {
    let review = post_created(
        client,
        server.api(&format!("titles/{title_id}/reviews/")),
        json!({"text": text, "score": score}),
    )
    .await?;
    review["id"].as_i64().ok_or_else(|| anyhow!("Missing review id"))
}

pub async fn create_comment(
    server: &TestServer,
    client: &reqwest::Client,
    title_id: i64,
    review_id: i64,
    text: &str,
) -> Result<i64> {
    let comment = post_created(
        client,
        server.api(&format!("titles/{title_id}/reviews/{review_id}/comments/")),
        json!({"text": text}),
    )
    .await?;
    comment["id"].as_i64().ok_or_else(|| anyhow!("Missing comment id"))
}
