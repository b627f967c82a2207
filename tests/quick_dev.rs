use anyhow::Result;
use serde_json::json;

/// Smoke run against a server started with `cargo run`.
#[tokio::test]
#[ignore]
async fn quick_dev() -> Result<()> {
    let hc = httpc_test::new_client("http://localhost:8080")?;

    hc.do_get("/").await?.print().await?;
    hc.do_get("/about/author/").await?.print().await?;

    hc.do_post(
        "/v1/api-token-auth/",
        json!({
          "username": "admin",
          "password": "change-me-please",
        }),
    )
    .await?
    .print()
    .await?;

    hc.do_get("/v1/posts/").await?.print().await?;
    hc.do_get("/v1/groups/").await?.print().await?;

    // hc.do_post("/v1/posts/", json!({"text": "needs a token"}))
    //     .await?
    //     .print()
    //     .await?;

    Ok(())
}
