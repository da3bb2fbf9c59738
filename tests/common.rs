use coaching_booking::{
    api::router::create_router,
    state::AppState,
    config::Config,
    infra::{
        clock::FixedClock,
        factory::seed_admin,
        repositories::{
            sqlite_booking_repo::SqliteBookingRepo,
            sqlite_dependent_repo::SqliteDependentRepo,
            sqlite_slot_repo::SqliteSlotRepo,
            sqlite_user_repo::SqliteUserRepo,
        },
    },
};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
    Router,
};
use std::str::FromStr;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const ADMIN_EMAIL: &str = "admin@gym.test";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const USER_PASSWORD: &str = "password123";

/// 2025-06-01 08:00 in Paris, the Sunday before the reference Monday 2025-06-02.
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap()
}

#[derive(Clone)]
pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
    pub user_id: String,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub clock: Arc<FixedClock>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let priv_key_pem = include_str!("../tests/keys/test_private.pem");
        let pub_key_pem = include_str!("../tests/keys/test_public.pem");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_secret_key: priv_key_pem.to_string(),
            jwt_public_key: pub_key_pem.to_string(),
            auth_issuer: "test-issuer".to_string(),
            timezone: chrono_tz::Europe::Paris,
            default_group_capacity: 5,
            slot_cache_ttl_secs: 60,
            completion_sweep_secs: 300,
            admin_email: Some(ADMIN_EMAIL.to_string()),
            admin_password: Some(ADMIN_PASSWORD.to_string()),
        };

        let clock = Arc::new(FixedClock::new(reference_now()));

        let state = AppState::new(
            config,
            Arc::new(SqliteUserRepo::new(pool.clone())),
            Arc::new(SqliteDependentRepo::new(pool.clone())),
            Arc::new(SqliteSlotRepo::new(pool.clone())),
            Arc::new(SqliteBookingRepo::new(pool.clone())),
            clock.clone(),
        );
        seed_admin(&state).await.expect("Failed to seed admin");

        let state = Arc::new(state);
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            clock,
        }
    }

    pub async fn request(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", &auth.csrf_token);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    /// Sends the request and returns the status with the JSON body (`Null` when empty).
    pub async fn send(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, auth, body).await;
        let status = response.status();
        (status, parse_body(response).await)
    }

    pub async fn register(&self, email: &str, display_name: &str) -> AuthHeaders {
        let payload = json!({ "email": email, "password": USER_PASSWORD, "display_name": display_name });
        let response = self.request("POST", "/api/v1/auth/register", None, Some(payload)).await;
        if response.status() != StatusCode::CREATED {
            panic!("Register failed in test helper: status {}", response.status());
        }
        auth_from_response(response).await
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthHeaders {
        let payload = json!({ "email": email, "password": password });
        let response = self.request("POST", "/api/v1/auth/login", None, Some(payload)).await;
        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }
        auth_from_response(response).await
    }

    pub async fn admin(&self) -> AuthHeaders {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn create_slot(&self, admin: &AuthHeaders, date: &str, time: &str, service_type: &str, capacity: i32) -> String {
        let (status, body) = self.send(
            "POST",
            "/api/v1/admin/slots",
            Some(admin),
            Some(json!({ "date": date, "time": time, "service_type": service_type, "capacity": capacity })),
        ).await;
        assert_eq!(status, StatusCode::CREATED, "slot creation failed: {}", body);
        body["slot"]["id"].as_str().unwrap().to_string()
    }

    pub async fn book(&self, auth: &AuthHeaders, date: &str, time: &str, service_type: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/api/v1/bookings",
            Some(auth),
            Some(json!({ "date": date, "time": time, "service_type": service_type })),
        ).await
    }

    pub async fn booked_count(&self, slot_id: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT booked_count FROM slots WHERE id = ?")
            .bind(slot_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn confirmed_count(&self, slot_id: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE slot_id = ? AND status = 'CONFIRMED'")
            .bind(slot_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

async fn auth_from_response(response: Response) -> AuthHeaders {
    let cookies: Vec<String> = response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|h| h.to_str().unwrap().to_string())
        .collect();

    let access_token_cookie = cookies.iter()
        .find(|c| c.contains("access_token="))
        .expect("No access_token cookie returned");

    let start = access_token_cookie.find("access_token=").unwrap() + 13;
    let end = access_token_cookie[start..].find(';').unwrap_or(access_token_cookie.len() - start);
    let access_token = access_token_cookie[start..start + end].to_string();

    let body_json = parse_body(response).await;
    let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();
    let user_id = body_json["user"]["id"].as_str().expect("No user id in body").to_string();

    AuthHeaders {
        access_token,
        csrf_token,
        user_id,
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
