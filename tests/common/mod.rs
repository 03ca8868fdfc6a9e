#![allow(dead_code)]

use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use hospital_recruitment::{config::Config, database::pool::create_pool, routes, AppState};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test_secret_key";
const BOUNDARY: &str = "----hospital-recruitment-boundary";

pub struct TestApp {
    pub app: Router,
    pub pool: PgPool,
    pub state: AppState,
}

/// `None` when no database is configured; callers return early.
pub async fn setup() -> Option<TestApp> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database-backed test");
        return None;
    };

    let config = Config {
        server_address: "127.0.0.1:0".to_string(),
        database_url,
        jwt_secret: SECRET.to_string(),
        db_max_connections: 5,
        db_statement_timeout_ms: 15_000,
        uploads_dir: env::temp_dir()
            .join(format!("recruitment-it-{}", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned(),
        page_size: 10,
        display_utc_offset_minutes: -180,
        max_upload_bytes: 10 * 1024 * 1024,
    };

    let pool = create_pool(&config).await.expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let state = AppState::new(pool.clone(), &config);
    let app = routes::router(state.clone());
    Some(TestApp { app, pool, state })
}

impl TestApp {
    pub async fn principal(&self, role: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO principals (id, role, first_name, last_name, email) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(role)
        .bind(format!("{role}-first"))
        .bind("Teste")
        .bind(format!("{role}-{id}@example.com"))
        .execute(&self.pool)
        .await
        .expect("seed principal");
        id
    }

    pub async fn hospital(&self) -> Uuid {
        sqlx::query_scalar(
            "INSERT INTO hospitals (name, city, state) VALUES ($1, 'Campinas', 'SP') RETURNING id",
        )
        .bind(format!("Hospital {}", Uuid::new_v4()))
        .fetch_one(&self.pool)
        .await
        .expect("seed hospital")
    }

    pub async fn vacancy(&self, recruiter: Uuid, positions: i32) -> Uuid {
        let hospital = self.hospital().await;
        sqlx::query_scalar(
            r#"
            INSERT INTO vacancies (title, hospital_id, recruiter_id, status, positions)
            VALUES ($1, $2, $3, 'open', $4)
            RETURNING id
            "#,
        )
        .bind(format!("Enfermeiro {}", Uuid::new_v4()))
        .bind(hospital)
        .bind(recruiter)
        .bind(positions)
        .fetch_one(&self.pool)
        .await
        .expect("seed vacancy")
    }

    pub async fn vacancy_status(&self, vacancy: Uuid) -> (String, bool) {
        sqlx::query_as("SELECT status, filled_date IS NOT NULL FROM vacancies WHERE id = $1")
            .bind(vacancy)
            .fetch_one(&self.pool)
            .await
            .expect("vacancy status")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        principal: Option<Uuid>,
        body: Option<JsonValue>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = principal {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(id)));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, bytes.to_vec())
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        principal: Uuid,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let (status, bytes) = self.send(method, uri, Some(principal), body).await;
        let value = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    pub async fn apply_with(
        &self,
        candidate: Uuid,
        vacancy: Uuid,
        resume: Option<(&str, &[u8])>,
    ) -> (StatusCode, JsonValue) {
        self.apply_form(candidate, vacancy, "Quero trabalhar no hospital", resume)
            .await
    }

    /// Submits through the multipart form, optionally attaching a résumé.
    pub async fn apply_form(
        &self,
        candidate: Uuid,
        vacancy: Uuid,
        cover_letter: &str,
        resume: Option<(&str, &[u8])>,
    ) -> (StatusCode, JsonValue) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cover_letter\"\r\n\r\n{cover_letter}\r\n"
            )
            .as_bytes(),
        );
        if let Some((file_name, data)) = resume {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/applications/apply/{vacancy}"))
            .header(header::AUTHORIZATION, format!("Bearer {}", token(candidate)))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");

        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    pub async fn apply(&self, candidate: Uuid, vacancy: Uuid) -> (StatusCode, JsonValue) {
        self.apply_with(candidate, vacancy, None).await
    }

    /// Applies and returns the new application id.
    pub async fn submitted(&self, candidate: Uuid, vacancy: Uuid) -> Uuid {
        let (status, body) = self.apply(candidate, vacancy).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().expect("id").parse().expect("uuid")
    }

    pub async fn set_status(&self, actor: Uuid, application: Uuid, status: &str) -> (StatusCode, JsonValue) {
        self.json(
            Method::POST,
            &format!("/applications/detail/{application}"),
            actor,
            Some(json!({"action": "update_status", "status": status})),
        )
        .await
    }

    pub async fn evaluate(&self, evaluator: Uuid, application: Uuid, score: i32) -> StatusCode {
        let (status, _) = self
            .json(
                Method::POST,
                &format!("/applications/evaluations/{application}"),
                evaluator,
                Some(json!({
                    "technical_score": score,
                    "experience_score": score,
                    "cultural_fit_score": score
                })),
            )
            .await;
        status
    }

    pub async fn list_ids(&self, actor: Uuid, query: &str) -> Vec<String> {
        let (status, body) = self
            .json(Method::GET, &format!("/applications/list?{query}"), actor, None)
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        ids(&body["items"])
    }
}

pub fn ids(items: &JsonValue) -> Vec<String> {
    items
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["id"].as_str().expect("id").to_string())
        .collect()
}

pub fn token(principal: Uuid) -> String {
    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
    }
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
    encode(
        &Header::default(),
        &Claims {
            sub: principal.to_string(),
            exp,
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("sign token")
}
