mod common;

use axum::http::StatusCode;
use querycrate::{
    ApiError, ModelCatalog, ModelDefinition, ModelRegistry, ParentScope, RawQuery, fetch_all,
    fetch_page, prepare,
};
use sea_orm::DatabaseConnection;
use serde_json::Value as JsonValue;

async fn run(raw: RawQuery) -> Result<Vec<JsonValue>, ApiError> {
    run_scoped(raw, None).await
}

async fn run_scoped(raw: RawQuery, scope: Option<&ParentScope>) -> Result<Vec<JsonValue>, ApiError> {
    common::init_tracing();
    let db = common::setup_test_db().await.expect("test database");
    let catalog = common::catalog();
    let user = catalog.model("User").expect("fixture model");

    let (_, builder) = prepare(&catalog, "User", &raw, scope, false)?;
    fetch_all(&db, user, &builder).await
}

fn ids(rows: &[JsonValue]) -> Vec<i64> {
    rows.iter()
        .map(|row| row["id"].as_i64().expect("integer id"))
        .collect()
}

fn filter(q: &str) -> RawQuery {
    RawQuery {
        q: Some(q.to_string()),
        sort: Some("id".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_fetch_all_presents_rows() {
    let rows = run(filter("")).await.unwrap();
    assert_eq!(ids(&rows), [1, 2, 3, 4, 5]);

    let ada = &rows[0];
    assert_eq!(ada["name"], "Ada");
    assert_eq!(ada["email"], "ada@example.com");
    assert!(ada.get("password").is_none());
}

#[tokio::test]
async fn test_comparison_and_sorting() {
    let raw = RawQuery {
        q: Some(r#"{"age.$gte":30}"#.into()),
        sort: Some("-age".into()),
        ..Default::default()
    };
    let rows = run(raw).await.unwrap();
    let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap_or_default()).collect();
    assert_eq!(names, ["Grace", "Edsger", "Ada"]);
}

#[tokio::test]
async fn test_null_checks() {
    assert_eq!(ids(&run(filter(r#"{"status":null}"#)).await.unwrap()), [3]);
    assert_eq!(
        ids(&run(filter(r#"{"status.$not":null}"#)).await.unwrap()),
        [1, 2, 4, 5]
    );
}

#[tokio::test]
async fn test_like_in_and_between() {
    assert_eq!(ids(&run(filter(r#"{"name.$like":"*a*"}"#)).await.unwrap()), [1, 2, 4]);
    assert_eq!(ids(&run(filter(r#"{"id.$in":"2,3"}"#)).await.unwrap()), [2, 3]);
    assert_eq!(ids(&run(filter(r#"{"id.$notIn":[1,2,3]}"#)).await.unwrap()), [4, 5]);
    assert_eq!(ids(&run(filter(r#"{"age.$between":"18:40"}"#)).await.unwrap()), [1, 3]);
    assert_eq!(
        ids(&run(filter(r#"{"age.$notBetween":[18,80]}"#)).await.unwrap()),
        [2, 4]
    );
}

#[tokio::test]
async fn test_or_and_precedence() {
    assert_eq!(
        ids(&run(filter(r#"{"$or.age.$lt":18,"$or.age.$gt":80}"#)).await.unwrap()),
        [2, 4]
    );
    assert_eq!(
        ids(&run(filter(r#"[{"status":"active"},{"$or.age.$lt":18,"$or.age.$gt":80}]"#)).await.unwrap()),
        [1, 2, 4, 5]
    );
}

#[tokio::test]
async fn test_group_prefix_from_first_predicate_is_literal() {
    // status = banned OR (name = Ada AND age = 36)
    assert_eq!(
        ids(&run(filter(r#"[{"status":"banned"},[{"$or.name":"Ada"},{"age":36}]]"#)).await.unwrap()),
        [1, 4]
    );
}

#[tokio::test]
async fn test_filter_through_to_one_relation() {
    assert_eq!(ids(&run(filter(r#"{"profile.city":"Bern"}"#)).await.unwrap()), [2]);
    assert_eq!(
        ids(&run(filter(r#"{"profile.city.$like":"*o*","profile.bio":null}"#)).await.unwrap()),
        [3]
    );
    assert_eq!(
        ids(&run(filter(r#"{"country.code":"CH","$or.profile.city":"London"}"#)).await.unwrap()),
        [1, 2, 4]
    );
}

#[tokio::test]
async fn test_joined_rows_keep_primary_columns_only() {
    let rows = run(filter(r#"{"profile.city":"Bern"}"#)).await.unwrap();
    let keys: Vec<_> = rows[0].as_object().expect("row object").keys().cloned().collect();
    assert_eq!(keys, ["id", "name", "email", "age", "status", "profile_id", "country_id"]);
}

#[tokio::test]
async fn test_projection_includes_relation_keys() {
    let raw = RawQuery {
        fields: Some("id,name".into()),
        with: Some("profile".into()),
        sort: Some("id".into()),
        ..Default::default()
    };
    let rows = run(raw).await.unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[1]["profile_id"], 2);
    assert!(rows[1].get("email").is_none());
}

#[tokio::test]
async fn test_parent_scope() {
    let scope = ParentScope::new("country_id", 1_i64);
    let rows = run_scoped(filter(""), Some(&scope)).await.unwrap();
    assert_eq!(ids(&rows), [2, 4]);

    let rows = run_scoped(filter(r#"{"age.$gt":50}"#), Some(&scope)).await.unwrap();
    assert_eq!(ids(&rows), [2]);
}

async fn page(db: &DatabaseConnection, raw: &RawQuery) -> querycrate::PaginatedResponse<JsonValue> {
    let catalog = common::catalog();
    let user = catalog.model("User").expect("fixture model");
    let (query, builder) = prepare(&catalog, "User", raw, None, true).expect("valid query");
    fetch_page(db, user, &builder, &query).await.expect("page fetched")
}

#[tokio::test]
async fn test_fetch_page_window_and_totals() {
    common::init_tracing();
    let db = common::setup_test_db().await.expect("test database");

    let raw = RawQuery {
        page: Some("2".into()),
        per_page: Some("2".into()),
        sort: Some("id".into()),
        ..Default::default()
    };
    let response = page(&db, &raw).await;
    assert_eq!(ids(&response.data), [3, 4]);
    assert_eq!(response.total, 5);
    assert_eq!(response.per_page, 2);
    assert_eq!(response.current_page, 2);
    assert_eq!(response.last_page, 3);
    assert_eq!((response.from, response.to), (3, 4));
}

#[tokio::test]
async fn test_fetch_page_counts_filtered_rows() {
    common::init_tracing();
    let db = common::setup_test_db().await.expect("test database");

    let raw = RawQuery {
        per_page: Some("2".into()),
        q: Some(r#"{"status":"active","profile.city.$not":"Bern"}"#.into()),
        ..Default::default()
    };
    let response = page(&db, &raw).await;
    assert_eq!(response.total, 1);
    assert_eq!(ids(&response.data), [1]);

    let raw = RawQuery {
        page: Some("9".into()),
        per_page: Some("2".into()),
        ..Default::default()
    };
    let response = page(&db, &raw).await;
    assert!(response.data.is_empty());
    assert_eq!(response.total, 5);
    assert_eq!((response.from, response.to), (0, 0));
}

#[tokio::test]
async fn test_fetch_page_with_huge_page_numbers() {
    common::init_tracing();
    let db = common::setup_test_db().await.expect("test database");

    let too_far = (i64::MAX / 10 + 1).to_string();
    for (page_number, per_page) in [("9223372036854775807", "25"), (too_far.as_str(), "10000")] {
        let raw = RawQuery {
            page: Some(page_number.into()),
            per_page: Some(per_page.into()),
            sort: Some("id".into()),
            ..Default::default()
        };
        let response = page(&db, &raw).await;
        assert_eq!(response.current_page, 1, "page={page_number}");
        assert_eq!(ids(&response.data), [1, 2, 3, 4, 5]);
    }

    let raw = RawQuery {
        page: Some(querycrate::filtering::MAX_PAGE.to_string()),
        per_page: Some("10000".into()),
        ..Default::default()
    };
    let response = page(&db, &raw).await;
    assert_eq!(response.current_page, querycrate::filtering::MAX_PAGE);
    assert!(response.data.is_empty());
    assert_eq!(response.total, 5);
    assert_eq!((response.from, response.to), (0, 0));
}

#[tokio::test]
async fn test_string_membership_binds_numbers() {
    assert_eq!(ids(&run(filter(r#"{"id.$in":"5,1"}"#)).await.unwrap()), [1, 5]);
    assert_eq!(ids(&run(filter(r#"{"age.$notBetween":"18:80"}"#)).await.unwrap()), [2, 4]);
    assert_eq!(ids(&run(filter(r#"{"name.$in":"Ada,Grace"}"#)).await.unwrap()), [1, 2]);
}

#[tokio::test]
async fn test_rejected_queries_are_bad_requests() {
    let catalog = common::catalog();

    let raw = RawQuery {
        fields: Some("id;--".into()),
        ..Default::default()
    };
    let err = prepare(&catalog, "User", &raw, None, false).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.user_message(), "Unacceptable field name: id;--");

    let err = prepare(&catalog, "Ghost", &RawQuery::default(), None, false).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.user_message(), "Undefined model name: Ghost");
}

#[tokio::test]
async fn test_database_failures_are_sanitized() {
    common::init_tracing();
    let db = common::setup_test_db().await.expect("test database");
    let catalog = ModelRegistry::new().register(ModelDefinition::new("Ghost", "ghosts").columns(["id"]));
    let ghost = catalog.model("Ghost").expect("fixture model");

    let (_, builder) = prepare(&catalog, "Ghost", &RawQuery::default(), None, false).unwrap();
    let err = fetch_all(&db, ghost, &builder).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.user_message(), "A database error occurred");
    assert!(matches!(err, ApiError::Database { .. }));
}
