mod common;

use axum::http::StatusCode;
use common::{body_json, get, setup_with};
use tower::ServiceExt;

#[tokio::test]
async fn test_rate_limiting_per_client() {
    let test = setup_with(|config| {
        config.rate_limit.requests = 3;
        config.rate_limit.window_seconds = 60;
    });

    for i in 1..=4 {
        let response = test.app.clone().oneshot(get("/v1/voices")).await.unwrap();

        if i <= 3 {
            assert_eq!(response.status(), StatusCode::OK, "Request {} should succeed", i);
        } else {
            assert_eq!(
                response.status(),
                StatusCode::TOO_MANY_REQUESTS,
                "Request {} should be rate limited",
                i
            );
            let retry_after: u64 = response.headers()["retry-after"]
                .to_str()
                .unwrap()
                .parse()
                .unwrap();
            assert!((1..=60).contains(&retry_after));

            let json = body_json(response).await;
            assert_eq!(
                json["detail"],
                "Rate limit exceeded. Maximum 3 requests per 60 seconds."
            );
        }
    }
}

#[tokio::test]
async fn forwarded_clients_have_separate_buckets() {
    let test = setup_with(|config| config.rate_limit.requests = 1);

    let forwarded = |ip: &str| {
        let mut req = get("/v1/voices");
        req.headers_mut()
            .insert("x-forwarded-for", format!("{}, 10.0.0.1", ip).parse().unwrap());
        req
    };

    let first = test.app.clone().oneshot(forwarded("198.51.100.1")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let second = test.app.clone().oneshot(forwarded("198.51.100.1")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let other = test.app.clone().oneshot(forwarded("198.51.100.2")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);

    // The socket peer is its own client.
    let direct = test.app.clone().oneshot(get("/v1/voices")).await.unwrap();
    assert_eq!(direct.status(), StatusCode::OK);
}

#[tokio::test]
async fn requests_without_peer_share_one_bucket() {
    let test = setup_with(|config| config.rate_limit.requests = 2);

    let bare = || {
        axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap()
    };

    assert_eq!(
        test.app.clone().oneshot(bare()).await.unwrap().status(),
        StatusCode::OK
    );
    assert_eq!(
        test.app.clone().oneshot(bare()).await.unwrap().status(),
        StatusCode::OK
    );
    assert_eq!(
        test.app.clone().oneshot(bare()).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn unauthenticated_requests_do_not_consume_quota() {
    let test = setup_with(|config| {
        config.server.api_key = Some("secret".to_string());
        config.rate_limit.requests = 1;
    });

    for _ in 0..3 {
        let response = test.app.clone().oneshot(get("/v1/voices")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let mut req = get("/v1/voices");
    req.headers_mut()
        .insert("x-api-key", "secret".parse().unwrap());
    let response = test.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
