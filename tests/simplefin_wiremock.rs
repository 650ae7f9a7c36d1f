use std::time::Duration;

use anyhow::Result;
use networth::sync::{AccountSource, FetchError, SimpleFinClient};
use secrecy::SecretString;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn access_url(server: &MockServer) -> SecretString {
    let uri = server.uri().replacen("http://", "http://demo:s3cret@", 1);
    SecretString::from(format!("{uri}/simplefin"))
}

async fn mount_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/simplefin/accounts"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetches_balances_with_basic_auth() -> Result<()> {
    let server = MockServer::start().await;

    let body = r#"{
        "errors": ["<b>First Bank</b> needs you to log in again", "<br>"],
        "accounts": [
            {
                "org": {"domain": "firstbank.example", "sfin-url": "https://sfin.example"},
                "id": "ACT-1",
                "name": "Checking",
                "currency": "USD",
                "balance": "1000.00",
                "available-balance": "950.00",
                "balance-date": 1772366400
            },
            {
                "id": "ACT-2",
                "name": "Rewards",
                "currency": "https://rewards.example/points",
                "balance": "5000",
                "balance-date": 1772366400
            },
            {
                "id": "ACT-3",
                "name": "Card",
                "balance": "-250.10",
                "balance-date": 1772366400
            }
        ]
    }"#;

    // demo:s3cret
    Mock::given(method("GET"))
        .and(path("/simplefin/accounts"))
        .and(query_param("balances-only", "1"))
        .and(header("authorization", "Basic ZGVtbzpzM2NyZXQ="))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SimpleFinClient::new(&access_url(&server))?;
    assert!(!client.base_url().contains("s3cret"));

    let set = client.fetch_accounts().await?;
    assert_eq!(set.accounts.len(), 3);
    assert_eq!(set.accounts[0].name, "Checking");
    assert_eq!(set.accounts[0].balance, "1000.00");
    assert_eq!(set.accounts[1].currency, "https://rewards.example/points");
    assert_eq!(set.accounts[2].currency, "USD");
    assert_eq!(
        set.warnings,
        vec!["First Bank needs you to log in again".to_string()]
    );

    Ok(())
}

#[tokio::test]
async fn forbidden_is_an_auth_error() -> Result<()> {
    let server = MockServer::start().await;
    mount_status(&server, 403).await;

    let client = SimpleFinClient::new(&access_url(&server))?;
    let err = client.fetch_accounts().await.unwrap_err();
    assert!(matches!(err, FetchError::Auth));
    assert!(err.needs_operator());
    Ok(())
}

#[tokio::test]
async fn payment_required_is_a_quota_error() -> Result<()> {
    let server = MockServer::start().await;
    mount_status(&server, 402).await;

    let client = SimpleFinClient::new(&access_url(&server))?;
    let err = client.fetch_accounts().await.unwrap_err();
    assert!(matches!(err, FetchError::Quota));
    assert!(!err.needs_operator());
    Ok(())
}

#[tokio::test]
async fn other_failures_carry_the_status() -> Result<()> {
    let server = MockServer::start().await;
    mount_status(&server, 503).await;

    let client = SimpleFinClient::new(&access_url(&server))?;
    let err = client.fetch_accounts().await.unwrap_err();
    assert!(matches!(err, FetchError::Upstream { status: 503 }));
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_reported() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simplefin/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>oops</html>", "text/html"))
        .mount(&server)
        .await;

    let client = SimpleFinClient::new(&access_url(&server))?;
    let err = client.fetch_accounts().await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidResponse(_)));
    Ok(())
}

#[tokio::test]
async fn slow_responses_time_out() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/simplefin/accounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"accounts": []}"#, "application/json")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = SimpleFinClient::with_timeout(&access_url(&server), Duration::from_millis(200))?;
    let err = client.fetch_accounts().await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    Ok(())
}
