use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, FixedOffset, TimeZone};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{AppState, create_router};
use spendbee_core::currency::{ExchangeRateProvider, RateFetchError, RateSource, RateTable};
use spendbee_db::entities::{expense_shares, expenses, group_members, groups, settlements, users};
use spendbee_shared::types::UserId;
use spendbee_shared::{JwtConfig, JwtService};

struct FixedRates;

#[async_trait]
impl RateSource for FixedRates {
    async fn fetch(&self) -> Result<RateTable, RateFetchError> {
        Ok([("EUR", dec!(1)), ("USD", dec!(1.25))].into_iter().collect())
    }
}

fn ts() -> sea_orm::prelude::DateTimeWithTimeZone {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .unwrap()
}

fn app(db: DatabaseConnection) -> (Router, Arc<JwtService>) {
    let jwt = Arc::new(JwtService::new(JwtConfig {
        secret: "test-secret-that-is-long-enough".into(),
        token_expires_days: 30,
    }));
    let state = AppState {
        db: Arc::new(db),
        jwt_service: jwt.clone(),
        rates: Arc::new(ExchangeRateProvider::new(
            Box::new(FixedRates),
            Duration::hours(24),
        )),
        secure_cookie: false,
        public_url: Arc::from("http://localhost:5173"),
    };
    (create_router(state), jwt)
}

fn get(uri: &str, jwt: &JwtService) -> Request<Body> {
    let token = jwt
        .generate_token(UserId::new(1), "ana@example.com")
        .unwrap();
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn group(archived: bool) -> groups::Model {
    groups::Model {
        id: 1,
        uuid: "g-1".into(),
        name: "Trip".into(),
        description: None,
        base_currency: Some("EUR".into()),
        archived,
        created_by: Some(1),
        created_at: ts(),
    }
}

fn member(id: i32, user_id: Option<i32>, name: Option<&str>) -> group_members::Model {
    group_members::Model {
        id,
        group_id: 1,
        user_id,
        name: name.map(str::to_string),
        joined_at: ts(),
    }
}

fn ana() -> users::Model {
    users::Model {
        id: 1,
        email: "ana@example.com".into(),
        password: "hash".into(),
        name: "Ana".into(),
        avatar_url: None,
        created_at: ts(),
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (app, _) = app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(Request::get("/api/groups").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "missing_token");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (app, _) = app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(
            Request::post("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("token=;"));
}

#[tokio::test]
async fn test_unknown_group_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<groups::Model>::new()])
        .into_connection();
    let (app, jwt) = app(db);

    let response = app
        .oneshot(get("/api/groups/1/balances", &jwt))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_member_is_forbidden() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![group(false)]])
        .append_query_results([Vec::<group_members::Model>::new()])
        .into_connection();
    let (app, jwt) = app(db);

    let response = app
        .oneshot(get("/api/groups/1/balances", &jwt))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["error"], "forbidden");
}

#[tokio::test]
async fn test_balances_in_base_currency() {
    // Ana pays 100 USD split with Bo: +50 USD each way, 40 EUR at USD 1.25.
    let expense = expenses::Model {
        id: 10,
        group_id: 1,
        description: "Dinner".into(),
        note: None,
        amount: dec!(100),
        currency: Some("USD".into()),
        exchange_rate: dec!(0.8),
        paid_by: 1,
        receipt_image_url: None,
        receipt_items: None,
        attachments: None,
        created_at: ts(),
    };
    let shares = vec![
        expense_shares::Model {
            id: 1,
            expense_id: 10,
            member_id: 1,
            share: dec!(50),
        },
        expense_shares::Model {
            id: 2,
            expense_id: 10,
            member_id: 2,
            share: dec!(50),
        },
    ];

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![group(false)]])
        .append_query_results([vec![member(1, Some(1), None)]])
        .append_query_results([vec![group(false)]])
        .append_query_results([vec![
            (member(1, Some(1), None), Some(ana())),
            (member(2, None, Some("Bo")), None),
        ]])
        .append_query_results([vec![expense]])
        .append_query_results([shares])
        .append_query_results([Vec::<settlements::Model>::new()])
        .into_connection();
    let (app, jwt) = app(db);

    let response = app
        .oneshot(get("/api/groups/1/balances", &jwt))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["memberName"], "Ana");
    assert_eq!(body[0]["balanceInBaseCurrency"], 40.0);
    assert_eq!(body[0]["balanceByCurrency"][0]["currency"], "USD");
    assert_eq!(body[1]["balanceInBaseCurrency"], -40.0);
    assert_eq!(body[1]["isGuest"], true);
}

#[tokio::test]
async fn test_archived_group_rejects_expenses() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![group(true)]])
        .append_query_results([vec![member(1, Some(1), None)]])
        .into_connection();
    let (app, jwt) = app(db);
    let token = jwt
        .generate_token(UserId::new(1), "ana@example.com")
        .unwrap();

    let request = Request::post("/api/groups/1/expenses")
        .header(header::COOKIE, format!("token={token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "description": "Taxi", "amount": 20.5, "sharedWith": [1] }).to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["message"], "Group is archived");
}

fn send_json(method: &str, uri: &str, body: &Value, jwt: &JwtService) -> Request<Body> {
    let token = jwt
        .generate_token(UserId::new(1), "ana@example.com")
        .unwrap();
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_create_group_rejects_currency_without_rate() {
    // RUB is a listed code, but the rate table only quotes EUR and USD.
    let (app, jwt) = app(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/groups",
            &json!({ "name": "Moscow", "baseCurrency": "RUB" }),
            &jwt,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "No exchange rate available for RUB"
    );
}

#[tokio::test]
async fn test_change_currency_rejects_currency_without_rate() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![group(false)]])
        .append_query_results([vec![member(1, Some(1), None)]])
        .into_connection();
    let (app, jwt) = app(db);

    let response = app
        .oneshot(send_json(
            "PATCH",
            "/api/groups/1/currency",
            &json!({ "baseCurrency": "rub" }),
            &jwt,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        "No exchange rate available for RUB"
    );
}

#[tokio::test]
async fn test_sub_cent_settlement_is_a_bad_request() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![group(false)]])
        .append_query_results([vec![member(1, Some(1), None)]])
        .append_query_results([vec![member(1, Some(1), None), member(2, None, Some("Bo"))]])
        .into_connection();
    let (app, jwt) = app(db);

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/groups/1/settlements",
            &json!({ "fromMemberId": 2, "toMemberId": 1, "amount": 0.004 }),
            &jwt,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "validation_error");
}
