use drip_request::{
    header::{HeaderName, HeaderValue},
    EndpointKind, Failure, Outcome, ProxyEndpoint, ProxyPool, Reply, RequestSpec, SoftReason,
};
use eyre::Result;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use crate::common::{closed_port, executor, executor_with, init_test_logging, url, zero_budget};

#[tokio::test]
async fn retries_server_errors_until_success() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::post(url(&server, "/api"), EndpointKind::Generic);
    let execution = executor().execute(&spec, &zero_budget(5), None).await;

    assert_eq!(execution.outcome, Outcome::Success(Reply::new(200, "ok")));
    assert_eq!(execution.attempts, 2);
    Ok(())
}

#[tokio::test]
async fn exhausted_budget_returns_last_failure() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(3)
        .mount(&server)
        .await;

    let spec = RequestSpec::post(url(&server, "/api"), EndpointKind::Generic);
    let execution = executor().execute(&spec, &zero_budget(3), None).await;

    assert_eq!(
        execution.outcome,
        Outcome::RetryableFailure(Failure::Status(Reply::new(503, "busy")))
    );
    assert_eq!(execution.attempts, 3);
    Ok(())
}

#[tokio::test]
async fn zero_attempts_still_sends_once() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::post(url(&server, "/api"), EndpointKind::Generic);
    let execution = executor().execute(&spec, &zero_budget(0), None).await;
    assert_eq!(execution.attempts, 1);
    Ok(())
}

#[tokio::test]
async fn unreachable_host_is_no_response() -> Result<()> {
    init_test_logging();
    let target = format!("http://127.0.0.1:{}/api", closed_port()).parse()?;
    let spec = RequestSpec::post(target, EndpointKind::Generic);

    let execution = executor().execute(&spec, &zero_budget(2), None).await;
    assert!(matches!(
        execution.outcome,
        Outcome::RetryableFailure(Failure::NoResponse(_))
    ));
    assert_eq!(execution.attempts, 2);
    Ok(())
}

#[tokio::test]
async fn faucet_wait_message_is_soft_success() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({ "msg": "please wait 24 hours" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::post(url(&server, "/claim"), EndpointKind::FaucetClaim);
    let execution = executor().execute(&spec, &zero_budget(5), None).await;

    assert!(matches!(
        execution.outcome,
        Outcome::SoftSuccess(_, SoftReason::RateLimited)
    ));
    assert_eq!(execution.attempts, 1);
    Ok(())
}

#[tokio::test]
async fn client_errors_are_terminal() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::post(url(&server, "/api"), EndpointKind::Generic);
    let execution = executor().execute(&spec, &zero_budget(5), None).await;

    assert_eq!(execution.outcome, Outcome::Success(Reply::new(404, "missing")));
    assert_eq!(execution.attempts, 1);
    Ok(())
}

#[tokio::test]
async fn sends_query_headers_and_body() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(query_param("key", "secret"))
        .and(header("x-client", "drip"))
        .and(body_json(json!({ "hello": "world" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let spec = RequestSpec::post(url(&server, "/api"), EndpointKind::Generic)
        .query("key", "secret")
        .header(
            HeaderName::from_static("x-client"),
            HeaderValue::from_static("drip"),
        )
        .json(json!({ "hello": "world" }));
    let execution = executor().execute(&spec, &zero_budget(1), None).await;

    assert_eq!(execution.outcome.reply().map(|r| r.status), Some(200));
    Ok(())
}

#[tokio::test]
async fn solver_requests_bypass_transport_proxy() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dead = ProxyEndpoint::new(format!("127.0.0.1:{}", closed_port()));
    let executor = executor_with(ProxyPool::new(vec![dead.clone()]));
    let spec = RequestSpec::post(url(&server, "/solver"), EndpointKind::CaptchaSolver);

    let execution = executor
        .execute(&spec, &zero_budget(1), Some(dead.clone()))
        .await;
    assert!(matches!(execution.outcome, Outcome::Success(_)));
    assert_eq!(execution.proxy, Some(dead));
    Ok(())
}

#[tokio::test]
async fn faucet_requests_go_through_the_proxy() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dead = ProxyEndpoint::new(format!("127.0.0.1:{}", closed_port()));
    let executor = executor_with(ProxyPool::new(vec![dead.clone()]));
    let spec = RequestSpec::post(url(&server, "/claim"), EndpointKind::FaucetClaim);

    let execution = executor.execute(&spec, &zero_budget(2), Some(dead)).await;
    assert!(matches!(
        execution.outcome,
        Outcome::RetryableFailure(Failure::NoResponse(_))
    ));
    Ok(())
}

#[tokio::test]
async fn retry_rotates_to_a_pool_proxy() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    // The only pool member refuses connections, so a retry that really went
    // through it never reaches the server again
    let member = ProxyEndpoint::new(format!("127.0.0.1:{}", closed_port()));
    let executor = executor_with(ProxyPool::new(vec![member.clone()]));
    let spec = RequestSpec::post(url(&server, "/api"), EndpointKind::Generic);

    let execution = executor.execute(&spec, &zero_budget(2), None).await;
    assert_eq!(execution.proxy, Some(member));
    assert_eq!(execution.attempts, 2);
    assert_eq!(
        execution.outcome,
        Outcome::RetryableFailure(Failure::Status(Reply::new(503, "")))
    );
    Ok(())
}

#[tokio::test]
async fn solver_retries_keep_their_proxy() -> Result<()> {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let payload_proxy = ProxyEndpoint::new("10.0.0.1:3128");
    let other = ProxyEndpoint::new(format!("127.0.0.1:{}", closed_port()));
    let executor = executor_with(ProxyPool::new(vec![other]));
    let spec = RequestSpec::post(url(&server, "/solver"), EndpointKind::CaptchaSolver);

    let execution = executor
        .execute(&spec, &zero_budget(3), Some(payload_proxy.clone()))
        .await;
    assert_eq!(execution.attempts, 3);
    assert_eq!(execution.proxy, Some(payload_proxy));
    assert!(matches!(
        execution.outcome,
        Outcome::RetryableFailure(Failure::Status(_))
    ));
    Ok(())
}
