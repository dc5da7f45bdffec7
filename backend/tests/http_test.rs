//! HTTP API tests
//!
//! Routes are driven in-process with `tower::ServiceExt::oneshot` over a
//! temporary database and storage directory. Outbound clients are fakes.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use nabtati::advice_proxy::AdviceRequest;
use nabtati::app::AppState;
use nabtati::commands;
use nabtati::database::{create_pool, Repository};
use nabtati::error::Result;
use nabtati::services::AdviceClient;
use nabtati::storage::BlobStore;
use nabtati::weather::openweather::{
    CurrentConditions, Forecast, ForecastCity, ForecastEntry, GeoLocation, MainReadings,
    WeatherCondition,
};
use nabtati::weather::WeatherApi;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "nabtati-test-boundary";

struct CannedAdvice {
    calls: AtomicUsize,
}

#[async_trait]
impl AdviceClient for CannedAdvice {
    async fn request_advice(&self, req: &AdviceRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Arrosez {} le matin.", req.plant_name))
    }
}

/// Weather provider recording geocoding queries
#[derive(Default)]
struct FakeWeather {
    queries: Mutex<Vec<String>>,
}

fn readings(temp: f64) -> MainReadings {
    MainReadings { temp, humidity: 40 }
}

fn clear_sky() -> Vec<WeatherCondition> {
    vec![WeatherCondition {
        id: 800,
        description: "ciel dégagé".to_string(),
    }]
}

#[async_trait]
impl WeatherApi for FakeWeather {
    async fn geocode(&self, query: &str) -> Result<Option<GeoLocation>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(Some(GeoLocation {
            name: query.split(',').next().unwrap_or_default().to_string(),
            lat: 36.8,
            lon: 10.18,
            country: Some("TN".to_string()),
        }))
    }

    async fn current(&self, _lat: f64, _lon: f64) -> Result<CurrentConditions> {
        Ok(CurrentConditions {
            main: readings(29.6),
            weather: clear_sky(),
            timezone: 3600,
        })
    }

    async fn forecast(&self, _lat: f64, _lon: f64) -> Result<Forecast> {
        let now = chrono::Utc::now().timestamp();
        let list = (0..40)
            .map(|i| ForecastEntry {
                dt: now + i * 3 * 3600,
                main: readings(if (8..=24).contains(&i) { 38.2 } else { 30.0 }),
                weather: clear_sky(),
            })
            .collect();
        Ok(Forecast {
            list,
            city: ForecastCity { timezone: 3600 },
        })
    }
}

struct TestApp {
    router: Router,
    advice: Arc<CannedAdvice>,
    weather: Arc<FakeWeather>,
    _dir: TempDir,
}

async fn test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let pool = create_pool(&dir.path().join("nabtati.db")).await.unwrap();

    let blobs = BlobStore::new(dir.path().join("storage"), "http://localhost/storage");
    blobs.initialize().await.unwrap();

    let advice = Arc::new(CannedAdvice {
        calls: AtomicUsize::new(0),
    });
    let weather = Arc::new(FakeWeather::default());

    let state = AppState::new(
        Repository::new(pool),
        Arc::new(blobs),
        advice.clone(),
        weather.clone(),
    );

    TestApp {
        router: commands::router(state),
        advice,
        weather,
        _dir: dir,
    }
}

impl TestApp {
    async fn send(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn json(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(req).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }
}

fn get(uri: &str, user: &str) -> Request<Body> {
    Request::get(uri)
        .header("x-user-id", user)
        .body(Body::empty())
        .unwrap()
}

fn send_json(method: &str, uri: &str, user: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart body with a `plant` JSON field and `photo` files
fn multipart(plant: Option<Value>, photos: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(plant) = plant {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"plant\"\r\n\r\n{}\r\n",
                BOUNDARY, plant
            )
            .as_bytes(),
        );
    }

    for (filename, content_type, data) in photos {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn post_multipart(uri: &str, user: &str, body: Vec<u8>) -> Request<Body> {
    Request::post(uri)
        .header("x-user-id", user)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn create_tomato(app: &TestApp, user: &str) -> Value {
    let body = multipart(
        Some(json!({
            "name": "Tomate",
            "variety_id": "var-tomate-cerise",
            "planting_date": "2024-04-10",
            "location": "Balcon"
        })),
        &[
            ("tomate.png", "image/png", &b"\x89PNG first"[..]),
            ("tomate-2.jpg", "image/jpeg", &b"second"[..]),
        ],
    );
    let (status, created) = app.json(post_multipart("/api/plants", user, body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    created
}

#[tokio::test]
async fn test_health_needs_no_user() {
    let app = test_app().await;

    let (status, body) = app
        .json(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let app = test_app().await;

    let (status, body) = app
        .json(Request::get("/api/plants").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentification requise");
}

#[tokio::test]
async fn test_create_plant_with_photos() {
    let app = test_app().await;
    let created = create_tomato(&app, "user-1").await;

    assert_eq!(created["name"], "Tomate");
    assert_eq!(created["failed_uploads"], 0);
    let photos = created["photos"].as_array().unwrap();
    assert_eq!(photos.len(), 2);
    assert_eq!(
        photos.iter().filter(|p| p["is_primary"] == true).count(),
        1
    );

    let (status, cards) = app.json(get("/api/plants", "user-1")).await;
    assert_eq!(status, StatusCode::OK);
    let cards = cards.as_array().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["variety"], "Tomate cerise");
    assert_eq!(cards[0]["photo_count"], 2);
    assert!(cards[0]["primary_photo_url"].is_string());

    let (_, others) = app.json(get("/api/plants", "user-2")).await;
    assert!(others.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_stored_photo_is_served() {
    let app = test_app().await;
    let created = create_tomato(&app, "user-1").await;

    let png = created["photos"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["storage_key"].as_str().unwrap().ends_with(".png"))
        .unwrap()
        .clone();
    let key = png["storage_key"].as_str().unwrap();
    assert_eq!(
        png["photo_url"].as_str().unwrap(),
        format!("http://localhost/storage/{}", key)
    );

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get(format!("/storage/{}", key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let data = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&data[..], b"\x89PNG first");

    let (status, _) = app
        .send(Request::get("/storage/user-1/nope.jpg").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_plant_validation() {
    let app = test_app().await;

    let body = multipart(Some(json!({ "name": "Tomate" })), &[]);
    let (status, error) = app.json(post_multipart("/api/plants", "user-1", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "variety");

    let body = multipart(None, &[("a.jpg", "image/jpeg", &b"a"[..])]);
    let (status, error) = app.json(post_multipart("/api/plants", "user-1", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "name");

    let (_, cards) = app.json(get("/api/plants", "user-1")).await;
    assert!(cards.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_other_users_plant_is_not_found() {
    let app = test_app().await;
    let created = create_tomato(&app, "user-1").await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = app.json(get(&format!("/api/plants/{}", id), "user-1")).await;
    assert_eq!(status, StatusCode::OK);

    for uri in [
        format!("/api/plants/{}", id),
        format!("/api/plants/{}/photos", id),
        format!("/api/plants/{}/measurements", id),
        format!("/api/plants/{}/advice", id),
    ] {
        let (status, body) = app.json(get(&uri, "user-2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"], "Plante introuvable");
    }
}

#[tokio::test]
async fn test_measurements_and_waterings() {
    let app = test_app().await;
    let created = create_tomato(&app, "user-1").await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/api/plants/{}/measurements", id);

    let (status, history) = app
        .json(send_json("POST", &uri, "user-1", json!({ "height": 15, "width": 8 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(history[0]["height"], 15.0);
    assert_eq!(history[0]["width"], 8.0);

    let (status, error) = app
        .json(send_json("POST", &uri, "user-1", json!({ "notes": "rien" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["field"], "height");

    let (_, listed) = app.json(get(&uri, "user-1")).await;
    assert_eq!(listed, history);

    app.json(send_json("POST", &uri, "user-1", json!({ "height": 18 })))
        .await;
    let (status, latest) = app.json(get(&format!("{}?limit=1", uri), "user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest.as_array().unwrap().len(), 1);

    let uri = format!("/api/plants/{}/waterings", id);
    let (status, waterings) = app
        .json(send_json("POST", &uri, "user-1", json!({ "amount": 250 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(waterings.as_array().unwrap().len(), 1);
    assert_eq!(waterings[0]["amount"], 250.0);
}

#[tokio::test]
async fn test_advice_is_cached_until_new_measurement() {
    let app = test_app().await;
    let created = create_tomato(&app, "user-1").await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/api/plants/{}/advice?temperature=31.5", id);

    let (status, first) = app.json(get(&uri, "user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["state"], "ready");
    assert_eq!(first["advice"], "Arrosez Tomate le matin.");

    let (_, second) = app.json(get(&uri, "user-1")).await;
    assert_eq!(first, second);
    assert_eq!(app.advice.calls.load(Ordering::SeqCst), 1);

    app.json(send_json(
        "POST",
        &format!("/api/plants/{}/measurements", id),
        "user-1",
        json!({ "height": 20 }),
    ))
    .await;

    app.json(get(&uri, "user-1")).await;
    assert_eq!(app.advice.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_taxonomy_routes() {
    let app = test_app().await;

    let (status, categories) = app.json(get("/api/taxonomy/categories", "user-1")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = categories
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Légumes"));

    let (status, varieties) = app
        .json(get("/api/taxonomy/categories/cat-legumes/varieties", "user-1"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(varieties
        .as_array()
        .unwrap()
        .iter()
        .all(|v| v["category_id"] == "cat-legumes"));
}

#[tokio::test]
async fn test_profile_drives_weather_location() {
    let app = test_app().await;

    let (status, profile) = app.json(get("/api/profile", "user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(profile.is_null());

    let (status, _) = app.json(get("/api/weather", "user-1")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, profile) = app
        .json(send_json(
            "PUT",
            "/api/profile",
            "user-1",
            json!({ "full_name": "Yasmine", "address": "Route de Tunis, Sfax, Tunisie" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["full_name"], "Yasmine");

    let (status, report) = app.json(get("/api/weather", "user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["location"], "Sfax, Tunisie");
    assert_eq!(report["forecast"].as_array().unwrap().len(), 4);

    let (_, report) = app
        .json(get("/api/weather?city=Sousse&country=Tunisie", "user-1"))
        .await;
    assert_eq!(report["location"], "Sousse, Tunisie");

    let queries = app.weather.queries.lock().unwrap().clone();
    assert_eq!(
        queries,
        vec!["Tunis,Tunisie", "Sfax,Tunisie", "Sousse,Tunisie"]
    );
}

#[tokio::test]
async fn test_heat_alerts_in_report() {
    let app = test_app().await;

    let (status, report) = app
        .json(get("/api/weather?city=Kairouan&country=Tunisie", "user-1"))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Every forecast step between +24h and +72h is at 38.2°C
    let forecast = report["forecast"].as_array().unwrap();
    assert_eq!(forecast[0]["alert"], false);
    assert_eq!(forecast[2]["day"], "Après-demain");
    assert_eq!(forecast[2]["alert"], true);
    assert_eq!(forecast[2]["temperature"], 39);

    let alerts = report["alerts"].as_array().unwrap();
    let alert_days = forecast.iter().filter(|d| d["alert"] == true).count();
    assert_eq!(alerts.len(), alert_days);
    for alert in alerts {
        assert!(alert.as_str().unwrap().contains("à Kairouan (+39°C)"));
    }
}
