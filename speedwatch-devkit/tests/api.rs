/*!
Tests d'intégration de l'API REST SpeedWatch

Pilote le routeur complet via le harness du devkit : journal filtré,
poller ESP32 (temps tokio en pause), panneau de trafic, caméras,
rapports, réglages et clé API.
*/

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use speedwatch_devkit::fixtures::{records_with_speeds, RecordBuilder};
use speedwatch_devkit::{ScriptedProbe, TestHarness};
use std::time::Duration;

fn plates(response: &speedwatch_devkit::TestResponse) -> Vec<String> {
    response
        .records()
        .iter()
        .filter_map(|r| r["plate"].as_str().map(str::to_owned))
        .collect()
}

#[tokio::test]
async fn test_violations_unfiltered() -> Result<()> {
    let harness = TestHarness::new();
    let response = harness.get("/violations").await?;
    response
        .assert_status(StatusCode::OK)?
        .assert_field_equals("count", &json!(8))?
        .assert_field_equals("outcome", &json!("matches"))?
        .assert_field_equals("filters.speed_bucket", &json!("all"))?
        .assert_field_equals("filters.selected_date", &json!(null))?;

    // ordre source conservé
    assert_eq!(plates(&response)[0], "KA-01-AB-1234");
    assert_eq!(plates(&response)[7], "KA-08-OP-9012");
    response.assert_field_equals("records.0.location", &json!("Lane 2"))?;
    response.assert_field_equals("records.0.date", &json!("2023-03-15"))?;
    Ok(())
}

#[tokio::test]
async fn test_violations_query_overrides() -> Result<()> {
    let harness = TestHarness::new();

    let by_date = harness.get("/violations?date=2023-03-15").await?;
    by_date.assert_field_equals("count", &json!(3))?;
    assert_eq!(plates(&by_date), vec!["KA-01-AB-1234", "KA-02-CD-5678", "KA-03-EF-9012"]);

    // "+" doit être encodé dans une URL
    let fast = harness.get("/violations?speed=30%2B").await?;
    fast.assert_field_equals("count", &json!(3))?;
    assert!(fast.records().iter().all(|r| r["speed_kmh"].as_u64() >= Some(30)));

    let both = harness.get("/violations?date=2023-03-14&speed=25-30").await?;
    assert_eq!(plates(&both), vec!["KA-04-GH-3456", "KA-05-IJ-7890", "KA-06-KL-1234"]);

    // la surcharge de requête ne modifie pas l'état de la vue
    harness
        .get("/violations/filters")
        .await?
        .assert_field_equals("speed_bucket", &json!("all"))?;
    Ok(())
}

#[tokio::test]
async fn test_lenient_inputs_fall_back() -> Result<()> {
    let harness = TestHarness::new();

    let bad_date = harness.get("/violations?date=2023-13-45").await?;
    bad_date
        .assert_status(StatusCode::OK)?
        .assert_field_equals("count", &json!(8))?
        .assert_field_equals("filters.selected_date", &json!(null))?;

    let bad_bucket = harness.get("/violations?speed=fast").await?;
    bad_bucket
        .assert_field_equals("count", &json!(8))?
        .assert_field_equals("filters.speed_bucket", &json!("all"))?;
    Ok(())
}

#[tokio::test]
async fn test_no_matches_outcome() -> Result<()> {
    let harness = TestHarness::new();
    let response = harness.get("/violations?date=2023-03-16").await?;
    response
        .assert_status(StatusCode::OK)?
        .assert_field_equals("outcome", &json!("no_matches"))?
        .assert_field_equals("count", &json!(0))?;
    assert!(response.records().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_filter_state_lifecycle() -> Result<()> {
    let harness = TestHarness::new();

    harness
        .put_json("/violations/filters", json!({ "date": "2023-03-14", "speed": "25-30" }))
        .await?
        .assert_status(StatusCode::OK)?
        .assert_field_equals("selected_date", &json!("2023-03-14"))?
        .assert_field_equals("speed_bucket", &json!("25-30"))?;

    let filtered = harness.get("/violations").await?;
    filtered.assert_field_equals("count", &json!(3))?;

    // effacer la date garde la tranche
    harness
        .delete("/violations/filters/date")
        .await?
        .assert_field_equals("selected_date", &json!(null))?
        .assert_field_equals("speed_bucket", &json!("25-30"))?;

    let by_bucket = harness.get("/violations").await?;
    assert_eq!(
        plates(&by_bucket),
        vec!["KA-03-EF-9012", "KA-04-GH-3456", "KA-05-IJ-7890", "KA-06-KL-1234", "KA-08-OP-9012"]
    );
    Ok(())
}

#[tokio::test]
async fn test_bucket_boundaries_on_custom_store() -> Result<()> {
    let harness = TestHarness::with_records(records_with_speeds(&[19, 20, 25, 29, 30, 31]));

    let low = harness.get("/violations?speed=20-25").await?;
    assert_eq!(plates(&low), vec!["TEST-01", "TEST-02"]);

    let mid = harness.get("/violations?speed=25-30").await?;
    assert_eq!(plates(&mid), vec!["TEST-02", "TEST-03", "TEST-04"]);

    let high = harness.get("/violations?speed=30%2B").await?;
    assert_eq!(plates(&high), vec!["TEST-04", "TEST-05"]);
    Ok(())
}

#[tokio::test]
async fn test_empty_store() -> Result<()> {
    let harness = TestHarness::with_records(Vec::new());
    harness
        .get("/violations")
        .await?
        .assert_field_equals("outcome", &json!("no_matches"))?;

    let one = TestHarness::with_records(vec![RecordBuilder::new("KA-11-QQ-1111")
        .speed(33)
        .on_iso("2023-03-12")?
        .build()]);
    one.get("/violations?date=2023-03-12&speed=30%2B")
        .await?
        .assert_field_equals("records.0.plate", &json!("KA-11-QQ-1111"))?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_device_refresh_cycle() -> Result<()> {
    let probe = ScriptedProbe::new();
    probe.push_connected(42, 91);
    let harness = TestHarness::with_probe(probe, Duration::from_millis(1500));

    harness
        .get("/device")
        .await?
        .assert_field_equals("phase", &json!("idle"))?
        .assert_field_equals("status.connected", &json!(false))?
        .assert_field_equals("delay_ms", &json!(1500))?;

    harness
        .post("/device/refresh")
        .await?
        .assert_status(StatusCode::ACCEPTED)?
        .assert_field_equals("outcome", &json!("started"))?
        .assert_field_equals("generation", &json!(1))?;

    // un second appel pendant le sondage ne relance rien
    harness
        .post("/device/refresh")
        .await?
        .assert_status(StatusCode::CONFLICT)?
        .assert_field_equals("outcome", &json!("already_polling"))?;

    harness
        .get("/device")
        .await?
        .assert_field_equals("phase", &json!("polling"))?;

    tokio::time::sleep(Duration::from_millis(1600)).await;

    harness
        .get("/device")
        .await?
        .assert_field_equals("phase", &json!("idle"))?
        .assert_field_equals("status.connected", &json!(true))?
        .assert_field_equals("status.address", &json!("192.168.1.42"))?
        .assert_field_equals("status.signal_quality", &json!(91))?
        .assert_field_equals("polls_completed", &json!(1))?;
    assert_eq!(harness.probe.calls(), 1);

    // script épuisé : repli déconnecté, les champs optionnels disparaissent
    harness.post("/device/refresh").await?.assert_status(StatusCode::ACCEPTED)?;
    tokio::time::sleep(Duration::from_millis(1600)).await;
    let offline = harness.get("/device").await?;
    offline.assert_field_equals("status.connected", &json!(false))?;
    assert!(offline.field("status.address").is_none());
    assert_eq!(harness.probe.calls(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_device_refresh_after_shutdown() -> Result<()> {
    let harness = TestHarness::new();
    harness.post("/device/refresh").await?.assert_status(StatusCode::ACCEPTED)?;
    harness.app.poller.shutdown();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(harness.probe.calls(), 0);

    harness
        .post("/device/refresh")
        .await?
        .assert_status(StatusCode::SERVICE_UNAVAILABLE)?
        .assert_field_equals("outcome", &json!("shut_down"))?;
    Ok(())
}

#[tokio::test]
async fn test_traffic_panel_modes() -> Result<()> {
    let harness = TestHarness::new();

    harness
        .get("/traffic")
        .await?
        .assert_field_equals("level.id", &json!("moderate"))?
        .assert_field_equals("mode", &json!("auto"))?;

    // réglage manuel refusé en mode auto
    harness
        .put_json("/traffic/level", json!({ "level": "high" }))
        .await?
        .assert_status(StatusCode::CONFLICT)?;

    // relevé capteur appliqué en auto
    harness
        .post_json("/traffic/sensor", json!({ "value": 85 }))
        .await?
        .assert_field_equals("classified", &json!("high"))?
        .assert_field_equals("applied", &json!(true))?
        .assert_field_equals("current.level.id", &json!("high"))?;

    harness
        .post("/traffic/mode")
        .await?
        .assert_field_equals("mode", &json!("manual"))?;

    harness
        .put_json("/traffic/level", json!({ "level": "low" }))
        .await?
        .assert_status(StatusCode::OK)?
        .assert_field_equals("level.id", &json!("low"))?;

    // en manuel le capteur est classé mais ignoré
    harness
        .post_json("/traffic/sensor", json!({ "value": 50 }))
        .await?
        .assert_field_equals("classified", &json!("moderate"))?
        .assert_field_equals("applied", &json!(false))?
        .assert_field_equals("current.level.id", &json!("low"))?;

    harness
        .post_json("/traffic/sensor", json!({ "value": 101 }))
        .await?
        .assert_status(StatusCode::BAD_REQUEST)?;

    let levels = harness.get("/traffic/levels").await?;
    levels
        .assert_field_equals("0.id", &json!("low"))?
        .assert_field_equals("2.microcontroller_pin", &json!("D4"))?;
    Ok(())
}

#[tokio::test]
async fn test_camera_selection() -> Result<()> {
    let harness = TestHarness::new();

    harness
        .get("/cameras")
        .await?
        .assert_field_equals("selected", &json!("CAM-001"))?
        .assert_field_equals("cameras.0.traffic", &json!("high"))?;

    harness
        .post("/cameras/CAM-003/select")
        .await?
        .assert_status(StatusCode::OK)?
        .assert_field_equals("id", &json!("CAM-003"))?
        .assert_field_equals("avg_speed_kmh", &json!(65))?;

    harness
        .get("/cameras")
        .await?
        .assert_field_equals("selected", &json!("CAM-003"))?;

    let missing = harness.post("/cameras/CAM-999/select").await?;
    missing
        .assert_status(StatusCode::NOT_FOUND)?
        .assert_field_equals("status", &json!(404))?;
    Ok(())
}

#[tokio::test]
async fn test_reports() -> Result<()> {
    let harness = TestHarness::new();

    let weekly = harness.get("/reports/weekly").await?;
    weekly
        .assert_field_equals("timeframe", &json!("weekly"))?
        .assert_field_equals("x_axis_key", &json!("day"))?;
    assert_eq!(weekly.field("points").and_then(|p| p.as_array()).map(Vec::len), Some(7));

    // période inconnue -> journalier
    harness
        .get("/reports/yearly")
        .await?
        .assert_field_equals("timeframe", &json!("daily"))?
        .assert_field_equals("total_violations", &json!(55))?;
    Ok(())
}

#[tokio::test]
async fn test_settings_updates() -> Result<()> {
    let harness = TestHarness::new();

    harness
        .get("/settings")
        .await?
        .assert_field_equals("lanes.1.speed_limit_kmh", &json!(20))?
        .assert_field_equals("notifications.camera_offline", &json!(false))?;

    harness
        .put_json("/settings/lanes/2", json!({ "value": "45" }))
        .await?
        .assert_status(StatusCode::OK)?
        .assert_field_equals("lane", &json!("Lane 2"))?
        .assert_field_equals("speed_limit_kmh", &json!(45))?;

    harness
        .put_json("/settings/lanes/3", json!({ "value": 60 }))
        .await?
        .assert_field_equals("speed_limit_kmh", &json!(60))?;

    harness
        .put_json("/settings/lanes/2", json!({ "value": "abc" }))
        .await?
        .assert_status(StatusCode::BAD_REQUEST)?;
    harness
        .put_json("/settings/lanes/2", json!({ "value": "500" }))
        .await?
        .assert_status(StatusCode::BAD_REQUEST)?;
    harness
        .put_json("/settings/lanes/9", json!({ "value": "45" }))
        .await?
        .assert_status(StatusCode::NOT_FOUND)?;

    // les saisies refusées n'ont rien changé
    harness
        .get("/settings")
        .await?
        .assert_field_equals("lanes.1.speed_limit_kmh", &json!(45))?
        .assert_field_equals("lanes.2.speed_limit_kmh", &json!(60))?;

    harness
        .post("/settings/notifications/camera_offline")
        .await?
        .assert_field_equals("kind", &json!("camera_offline"))?
        .assert_field_equals("enabled", &json!(true))?;

    harness
        .post("/settings/notifications/sms")
        .await?
        .assert_status(StatusCode::BAD_REQUEST)?;
    Ok(())
}

#[tokio::test]
async fn test_api_key_guard() -> Result<()> {
    let harness = TestHarness::new().with_api_key("secret");

    harness.get("/health").await?.assert_status(StatusCode::OK)?;
    // seul /health* est ouvert, /system/health reste protégé
    harness
        .get("/system/health")
        .await?
        .assert_status(StatusCode::UNAUTHORIZED)?;
    harness
        .get_with_key("/system/health", "secret")
        .await?
        .assert_status(StatusCode::OK)?;
    harness.get("/violations").await?.assert_status(StatusCode::UNAUTHORIZED)?;
    harness
        .get_with_key("/violations", "wrong")
        .await?
        .assert_status(StatusCode::UNAUTHORIZED)?;
    harness
        .get_with_key("/violations", "secret")
        .await?
        .assert_status(StatusCode::OK)?
        .assert_field_equals("count", &json!(8))?;
    Ok(())
}

#[tokio::test]
async fn test_system_health_and_ports() -> Result<()> {
    let harness = TestHarness::new();
    harness.get("/violations").await?;
    harness.get("/violations?speed=30%2B").await?;

    harness
        .get("/system/health")
        .await?
        .assert_field_equals("records_loaded", &json!(8))?
        .assert_field_equals("violation_queries", &json!(2))?
        .assert_field_equals("device_connected", &json!(false))?
        .assert_field_equals("poller_phase", &json!("idle"))?
        .assert_field_equals("traffic_level", &json!("moderate"))?;

    harness
        .get("/ports")
        .await?
        .assert_field_equals("0.name", &json!("violations"))?
        .assert_field_equals("0.backend", &json!("fixture"))?
        .assert_field_equals("1.backend", &json!("scripted"))?;
    Ok(())
}
