// Command routing tests for `Backend` using wiremock.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigil_core::model::{CameraRequest, ZoneRequest};
use vigil_core::{Backend, BackendConfig, Command, CommandResult, CoreError, StaticToken};

async fn setup() -> (MockServer, Backend) {
    let server = MockServer::start().await;
    let config = BackendConfig::new(
        Url::parse(&format!("{}/api", server.uri())).unwrap(),
        Url::parse(&server.uri()).unwrap(),
    );
    let tokens = StaticToken::new(SecretString::from("core-token".to_string()));
    let backend = Backend::connect(&config, &tokens).await.unwrap();
    (server, backend)
}

#[tokio::test]
async fn test_connect_without_token_is_unauthorized() {
    let config = BackendConfig::new(
        Url::parse("http://localhost:1/api").unwrap(),
        Url::parse("http://localhost:1").unwrap(),
    );
    let result = Backend::connect(&config, &StaticToken::none()).await;
    assert!(matches!(result, Err(CoreError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_create_zone_routes_to_zones_endpoint() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/device-zone/zones"))
        .and(header("authorization", "Bearer core-token"))
        .and(body_json(json!({ "name": "Garden" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": "z9", "name": "Garden" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = backend
        .execute(Command::CreateZone(ZoneRequest {
            name: Some("Garden".into()),
            ..ZoneRequest::default()
        }))
        .await
        .unwrap();

    let CommandResult::Zone(zone) = result else {
        panic!("expected zone result, got {result:?}");
    };
    assert_eq!(zone.id, "z9");
}

#[tokio::test]
async fn test_sensor_notification_toggle() {
    let (server, backend) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/device-zone/sensors/s3/notification"))
        .and(body_json(json!({ "enabled": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "s3", "name": "Window", "notificationEnabled": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = backend
        .execute(Command::SetSensorNotification {
            id: "s3".into(),
            enabled: true,
        })
        .await
        .unwrap();
    assert!(matches!(result, CommandResult::Sensor(s) if s.notification_enabled));
}

#[tokio::test]
async fn test_camera_update_uses_device_command() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/device/command"))
        .and(body_json(json!({
            "commandType": "UPDATE_CAMERA",
            "deviceId": "c2",
            "payload": { "location": "Back yard" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "updated": true })))
        .expect(1)
        .mount(&server)
        .await;

    let result = backend
        .execute(Command::UpdateCamera {
            id: "c2".into(),
            update: CameraRequest {
                location: Some("Back yard".into()),
                ..CameraRequest::default()
            },
        })
        .await
        .unwrap();
    assert!(matches!(result, CommandResult::Response(v) if v["updated"] == true));
}

#[tokio::test]
async fn test_activate_and_delete_mode() {
    let (server, backend) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/device-mode/modes/night/activate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/device-mode/modes/old"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let activated = backend
        .execute(Command::ActivateMode { id: "night".into() })
        .await
        .unwrap();
    assert!(matches!(activated, CommandResult::Ok));

    let deleted = backend
        .execute(Command::DeleteMode { id: "old".into() })
        .await
        .unwrap();
    assert!(matches!(deleted, CommandResult::Ok));
}

#[tokio::test]
async fn test_api_errors_become_core_errors() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/device-zone/zones/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Zone not found" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/device-mode/modes"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = backend.zone("gone").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));

    let err = backend.modes().await.unwrap_err();
    match err {
        CoreError::Api { status, message } => {
            assert_eq!(status, Some(502));
            assert_eq!(message, "HTTP 502: bad gateway");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_device_alerts_read() {
    let (server, backend) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/alert/device/cam-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": 1, "type": "theft", "message": "Tamper detected" },
                { "id": 2, "type": "motion" }
            ]
        })))
        .mount(&server)
        .await;

    let alerts = backend.device_alerts("cam-1").await.unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].id, "1");
    assert_eq!(alerts[0].message.as_deref(), Some("Tamper detected"));
}
