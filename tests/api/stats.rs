use chrono::Utc;

use crate::helpers::{TestApp, STATS_TOKEN};

#[tokio::test]
async fn stats_without_a_valid_token_are_rejected_with_401() {
    let app = TestApp::spawn_app().await;

    let test_cases = vec![(None, "missing token"), (Some("wrong-token"), "wrong token")];

    for (token, description) in test_cases {
        let response = app.get_stats(token).await;

        assert_eq!(
            401,
            response.status().as_u16(),
            "The API did not fail with 401 status with {}",
            description
        );

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Unauthorized" }));
    }
}

#[tokio::test]
async fn stats_stay_hidden_without_a_valid_token_when_subscribers_exist() {
    let app = TestApp::spawn_app().await;
    app.mock_email_api(200).await;
    app.create_subscriber().await;
    app.create_subscriber().await;

    for token in [None, Some("wrong-token")] {
        let response = app.get_stats(token).await;

        assert_eq!(response.status().as_u16(), 401);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Unauthorized" }));
        assert!(body.get("total").is_none());
        assert!(body.get("recentSubscriptions").is_none());
    }
}

#[tokio::test]
async fn stats_report_totals_and_masked_recent_subscriptions() {
    let app = TestApp::spawn_app().await;
    app.mock_email_api(200).await;

    app.post_subscription(serde_json::json!({ "email": "alice@example.com" }))
        .await;
    app.post_subscription(serde_json::json!({ "email": "bob@example.com" }))
        .await;
    let token = app
        .read_subscribers()
        .await
        .into_iter()
        .find(|subscriber| subscriber.email.as_ref() == "alice@example.com")
        .unwrap()
        .token;
    app.get_confirm(&[("token", token.as_ref())])
        .await
        .error_for_status()
        .unwrap();

    let response = app.get_stats(Some(STATS_TOKEN)).await;

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["verified"], 1);
    assert_eq!(body["unverified"], 1);

    let recent = body["recentSubscriptions"].as_array().unwrap();
    assert_eq!(recent.len(), 2);
    for entry in recent {
        let email = entry["email"].as_str().unwrap();
        assert!(email == "al***@example.com" || email == "bo***@example.com");
    }

    let daily = body["dailyStats"].as_array().unwrap();
    assert_eq!(daily.len(), 7);
    assert_eq!(
        daily[6]["date"],
        Utc::now().date_naive().format("%Y-%m-%d").to_string()
    );
    assert_eq!(daily[6]["count"], 2);
}

#[tokio::test]
async fn stats_return_500_when_the_store_is_unreadable() {
    let app = TestApp::spawn_app().await;

    std::fs::write(&app.store_path, "not json").unwrap();

    let response = app.get_stats(Some(STATS_TOKEN)).await;

    assert_eq!(response.status(), 500);
}
