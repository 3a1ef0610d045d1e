use alloy_primitives::Address;
use drip_faucet::ClaimStatus;
use eyre::Result;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use crate::common::{claimer, init_test_logging, TOKEN};

fn address() -> Address {
    Address::repeat_byte(0x42)
}

async fn mount_solver(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/solver"))
        .and(query_param("key", "test-api-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "solution": { "javascriptReturn": [TOKEN] } })),
        )
        .mount(server)
        .await;
}

fn faucet_reply(status: u16, body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

#[tokio::test]
async fn successful_claim_returns_hash() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    mount_solver(&server).await;
    Mock::given(method("POST"))
        .and(path("/claim"))
        .and(header("h-captcha-response", TOKEN))
        .and(body_json(json!({ "address": address().to_checksum(None) })))
        .respond_with(faucet_reply(200, json!({ "msg": "Txhash: 0xabc123" })))
        .expect(1)
        .mount(&server)
        .await;

    let status = claimer(&server).claim(address()).await;
    assert_eq!(
        status,
        ClaimStatus::Claimed {
            tx_hash: "0xabc123".into()
        }
    );
    assert!(status.is_done());
    Ok(())
}

#[tokio::test]
async fn cooldown_is_done_without_retry() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    mount_solver(&server).await;
    Mock::given(method("POST"))
        .and(path("/claim"))
        .respond_with(faucet_reply(400, json!({ "error": "please wait 6 hours" })))
        .expect(1)
        .mount(&server)
        .await;

    let status = claimer(&server).claim(address()).await;
    assert_eq!(
        status,
        ClaimStatus::RateLimited {
            reason: "please wait 6 hours".into()
        }
    );
    assert!(status.is_done());
    Ok(())
}

#[tokio::test]
async fn rejected_captcha_is_not_done() -> Result<()> {
    let server = MockServer::start().await;
    mount_solver(&server).await;
    Mock::given(method("POST"))
        .and(path("/claim"))
        .respond_with(faucet_reply(400, json!({ "error": "Invalid Captcha" })))
        .expect(1)
        .mount(&server)
        .await;

    let status = claimer(&server).claim(address()).await;
    assert_eq!(status, ClaimStatus::InvalidCaptcha);
    assert!(!status.is_done());
    Ok(())
}

#[tokio::test]
async fn unexpected_body_is_not_done() -> Result<()> {
    let server = MockServer::start().await;
    mount_solver(&server).await;
    Mock::given(method("POST"))
        .and(path("/claim"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<html>denied</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let status = claimer(&server).claim(address()).await;
    assert_eq!(
        status,
        ClaimStatus::Unexpected {
            body: "<html>denied</html>".into()
        }
    );
    Ok(())
}

#[tokio::test]
async fn faucet_server_errors_are_retried() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    mount_solver(&server).await;
    Mock::given(method("POST"))
        .and(path("/claim"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/claim"))
        .respond_with(faucet_reply(200, json!({ "msg": "0xfeed" })))
        .expect(1)
        .mount(&server)
        .await;

    let status = claimer(&server).claim(address()).await;
    assert_eq!(
        status,
        ClaimStatus::Claimed {
            tx_hash: "0xfeed".into()
        }
    );
    Ok(())
}

#[tokio::test]
async fn faucet_never_answering_is_no_response() -> Result<()> {
    let server = MockServer::start().await;
    mount_solver(&server).await;
    Mock::given(method("POST"))
        .and(path("/claim"))
        .respond_with(ResponseTemplate::new(504))
        .expect(3)
        .mount(&server)
        .await;

    let status = claimer(&server).claim(address()).await;
    assert_eq!(status, ClaimStatus::NoResponse);
    assert!(!status.is_done());
    Ok(())
}

#[tokio::test]
async fn missing_token_gives_up_after_three_solves() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/solver"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "solution": { "token": "short" } })),
        )
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/claim"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let status = claimer(&server).claim(address()).await;
    assert_eq!(status, ClaimStatus::NoCaptcha);
    Ok(())
}

#[tokio::test]
async fn solver_outage_is_retried() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/solver"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_solver(&server).await;
    Mock::given(method("POST"))
        .and(path("/claim"))
        .respond_with(faucet_reply(200, json!({ "msg": "Txhash: 0x01" })))
        .expect(1)
        .mount(&server)
        .await;

    let status = claimer(&server).claim(address()).await;
    assert!(status.is_done());
    Ok(())
}

#[tokio::test]
async fn token_unfit_for_a_header_is_never_sent() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/solver"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({ "solution": { "javascriptReturn": ["P1_token_with\nnewline_inside"] } }),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/claim"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let status = claimer(&server).claim(address()).await;
    assert_eq!(status, ClaimStatus::NoCaptcha);
    assert!(!status.is_done());
    Ok(())
}
