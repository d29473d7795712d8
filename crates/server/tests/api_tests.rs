use std::sync::Arc;

use axum_test::TestServer;
use crew::{BusSeverityFeed, CrewConfig, PhaseEngine};
use events::EventBus;
use heist_core::{Offer, Role};
use offers::{Catalog, OfferService, OfferServiceConfig};
use serde_json::{json, Value};
use server::state::{CrewState, LesterState};
use server::{crew_router, lester_router};

fn lester_server(catalog: Catalog, miss_chance_percent: u32) -> (TestServer, LesterState) {
    let service = OfferService::new(
        catalog,
        OfferServiceConfig {
            miss_chance_percent,
            seed: Some(1),
            ..Default::default()
        },
    )
    .expect("Failed to build offer service");
    let state = LesterState::new(service, EventBus::new());
    let server = TestServer::new(lester_router(state.clone())).expect("Failed to create test server");
    (server, state)
}

fn crew_server(role: Role) -> (TestServer, EventBus) {
    let bus = EventBus::new();
    let mut config = CrewConfig::new(role).with_seed(1);
    config.distraction_failure_percent = 0;
    let engine = PhaseEngine::spawn(config, Arc::new(BusSeverityFeed::new(bus.clone())))
        .expect("Failed to spawn phase engine");
    let server = TestServer::new(crew_router(CrewState::new(engine))).expect("Failed to create test server");
    (server, bus)
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoints() {
        let (lester, _state) = lester_server(Catalog::default(), 0);
        let response = lester.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");

        let (trevor, _bus) = crew_server(Role::Trevor);
        trevor.get("/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_openapi_documents() {
        let (lester, _state) = lester_server(Catalog::default(), 0);
        let body: Value = lester.get("/api/openapi.json").await.json();
        assert!(body["paths"]["/api/offers/propose"].is_object());
        assert!(body["paths"]["/api/feed"].is_object());

        let (franklin, _bus) = crew_server(Role::Franklin);
        let body: Value = franklin.get("/api/openapi.json").await.json();
        assert!(body["paths"]["/api/phases/hit"].is_object());
    }
}

mod offers_api {
    use super::*;

    #[tokio::test]
    async fn test_propose_returns_catalog_offer() {
        let catalog = Catalog::new(vec![Offer::new(1_500_000, 50, 80, 20)]);
        let (server, _state) = lester_server(catalog, 0);

        let response = server.post("/api/offers/propose").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(
            body["offer"],
            json!({
                "loot": 1500000,
                "police_risk": 50,
                "trevor_success": 80,
                "franklin_success": 20
            })
        );
    }

    #[tokio::test]
    async fn test_propose_missed_round_is_null() {
        let (server, _state) = lester_server(Catalog::default(), 100);

        let body: Value = server.post("/api/offers/propose").await.json();
        assert!(body["offer"].is_null());
    }

    #[tokio::test]
    async fn test_decision_updates_streak() {
        let (server, state) = lester_server(Catalog::default(), 0);

        server
            .post("/api/offers/decision")
            .json(&json!({ "accepted": false }))
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);
        server
            .post("/api/offers/decision")
            .json(&json!({ "accepted": false }))
            .await;
        assert_eq!(state.service.rejection_streak(), 2);

        server
            .post("/api/offers/decision")
            .json(&json!({ "accepted": true }))
            .await;
        assert_eq!(state.service.rejection_streak(), 0);
    }

    #[tokio::test]
    async fn test_verify_settlement() {
        let (server, _state) = lester_server(Catalog::default(), 0);

        let body: Value = server
            .post("/api/settlement/verify")
            .json(&json!({ "loot": 1000001, "extra_loot": 0, "share": 250001 }))
            .await
            .json();
        assert_eq!(body["ok"], true);

        let body: Value = server
            .post("/api/settlement/verify")
            .json(&json!({ "loot": 1000001, "extra_loot": 0, "share": 250000 }))
            .await
            .json();
        assert_eq!(body["ok"], false);
        assert_eq!(body["message"], "That's not what we agreed on...");
    }
}

mod feed_api {
    use super::*;

    #[tokio::test]
    async fn test_start_and_stop_feed() {
        let (server, state) = lester_server(Catalog::default(), 0);

        server
            .post("/api/feed/start")
            .json(&json!({ "frequency": 50 }))
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);
        assert!(state.producer.is_running());

        server
            .post("/api/feed/stop")
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);
        assert!(!state.producer.is_running());

        server
            .post("/api/feed/stop")
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_zero_frequency_rejected() {
        let (server, state) = lester_server(Catalog::default(), 0);

        let response = server
            .post("/api/feed/start")
            .json(&json!({ "frequency": 0 }))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "bad_request");
        assert!(!state.producer.is_running());
    }
}

mod phases_api {
    use super::*;

    #[tokio::test]
    async fn test_status_before_any_phase() {
        let (server, _bus) = crew_server(Role::Trevor);

        let body: Value = server.get("/api/phases/status").await.json();
        assert_eq!(body["status"], "awaiting_orders");
        assert_eq!(body["total_loot"], 0);

        let body: Value = server.get("/api/loot").await.json();
        assert_eq!(body, json!({ "loot": 0, "extra_loot": 0 }));
    }

    #[tokio::test]
    async fn test_start_distraction_accepted_then_busy() {
        let (server, _bus) = crew_server(Role::Trevor);

        let response = server
            .post("/api/phases/distraction")
            .json(&json!({ "turns_needed": 5000 }))
            .await;
        response.assert_status(axum::http::StatusCode::ACCEPTED);
        let body: Value = response.json();
        assert_eq!(body["phase"], "distraction");
        assert_eq!(body["accepted"], true);

        let body: Value = server.get("/api/phases/status").await.json();
        assert_eq!(body["status"], "in_progress");

        let response = server
            .post("/api/phases/hit")
            .json(&json!({ "turns_needed": 10, "loot": 100 }))
            .await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "phase_busy");
    }

    #[tokio::test]
    async fn test_zero_turn_hit_records_loot() {
        let (server, _bus) = crew_server(Role::Franklin);

        server
            .post("/api/phases/hit")
            .json(&json!({ "turns_needed": 0, "loot": 1500000 }))
            .await
            .assert_status(axum::http::StatusCode::ACCEPTED);

        let body: Value = server.get("/api/phases/status").await.json();
        assert_eq!(body["status"], "success");

        let body: Value = server.get("/api/loot").await.json();
        assert_eq!(body, json!({ "loot": 1500000, "extra_loot": 0 }));
    }

    #[tokio::test]
    async fn test_confirm_cut() {
        let (server, _bus) = crew_server(Role::Franklin);

        let body: Value = server
            .post("/api/cut/confirm")
            .json(&json!({ "loot": 1000000, "extra_loot": 0, "share": 250000 }))
            .await
            .json();
        assert_eq!(body["ok"], true);
        assert_eq!(body["message"], "Just what I expected");
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let (server, _bus) = crew_server(Role::Trevor);

        let response = server
            .post("/api/phases/distraction")
            .json(&json!({ "turns": "many" }))
            .await;
        assert!(response.status_code().is_client_error());
    }
}
