use crate::infra::AppState;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use competency_insights::analytics::domain::ClassRecord;
use competency_insights::analytics::{ProfileDefinition, Scope};
use competency_insights::error::AppError;
use competency_insights::import::{RecordFormat, RecordImporter};
use competency_insights::narrative::{Narrative, OverrideKey, OverrideRecord, OverrideStore};
use competency_insights::report::{CrossSubjectReport, InsightsReport};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;

/// Class records supplied with a request; preloaded records are used when
/// both fields are absent.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecordSource {
    #[serde(default)]
    pub(crate) records: Option<Vec<ClassRecord>>,
    #[serde(default)]
    pub(crate) records_csv: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportRequest {
    pub(crate) subject: String,
    #[serde(default)]
    pub(crate) level: Option<String>,
    #[serde(default)]
    pub(crate) scope: Scope,
    #[serde(flatten)]
    pub(crate) source: RecordSource,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CrossSubjectRequest {
    pub(crate) first_subject: String,
    pub(crate) second_subject: String,
    #[serde(default)]
    pub(crate) first_level: Option<String>,
    #[serde(default)]
    pub(crate) second_level: Option<String>,
    #[serde(default)]
    pub(crate) scope: Scope,
    #[serde(default)]
    pub(crate) include_pairs: bool,
    #[serde(flatten)]
    pub(crate) source: RecordSource,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverrideQuery {
    #[serde(default)]
    pub(crate) subject: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverrideUpsert {
    #[serde(flatten)]
    pub(crate) key: OverrideKey,
    pub(crate) narrative: Narrative,
}

pub(crate) fn application_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/insights/report", post(report_endpoint))
        .route(
            "/api/v1/insights/cross-subject",
            post(cross_subject_endpoint),
        )
        .route("/api/v1/insights/profiles", get(profiles_endpoint))
        .route(
            "/api/v1/insights/overrides",
            get(list_overrides_endpoint)
                .put(put_override_endpoint)
                .delete(delete_override_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn resolve_records(
    state: &AppState,
    source: RecordSource,
) -> Result<Arc<Vec<ClassRecord>>, AppError> {
    let RecordSource {
        records,
        records_csv,
    } = source;

    if let Some(records) = records {
        return Ok(Arc::new(records));
    }
    if let Some(csv) = records_csv {
        let reader = Cursor::new(csv.into_bytes());
        return Ok(Arc::new(RecordImporter::from_reader(
            reader,
            RecordFormat::Csv,
        )?));
    }
    if state.insights.records.is_empty() {
        return Err(AppError::BadRequest(
            "no class records supplied and none preloaded".to_string(),
        ));
    }
    Ok(state.insights.records.clone())
}

pub(crate) async fn report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<InsightsReport>, AppError> {
    let ReportRequest {
        subject,
        level,
        scope,
        source,
    } = payload;

    let profile = state.insights.catalog.get(&subject, level.as_deref())?;
    let records = resolve_records(&state, source)?;
    let report = InsightsReport::build(
        &records,
        &profile,
        &scope,
        &state.insights.narratives(),
    )?;

    info!(
        subject = profile.subject(),
        %scope,
        students = report.students,
        "insights report served"
    );
    Ok(Json(report))
}

pub(crate) async fn cross_subject_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CrossSubjectRequest>,
) -> Result<Json<CrossSubjectReport>, AppError> {
    let CrossSubjectRequest {
        first_subject,
        second_subject,
        first_level,
        second_level,
        scope,
        include_pairs,
        source,
    } = payload;

    let catalog = &state.insights.catalog;
    let first = catalog.get(&first_subject, first_level.as_deref())?;
    let second = catalog.get(&second_subject, second_level.as_deref())?;
    let records = resolve_records(&state, source)?;

    let report = CrossSubjectReport::build(
        &records,
        &scope,
        &first,
        &second,
        &state.insights.narratives(),
        include_pairs,
    );
    Ok(Json(report))
}

pub(crate) async fn profiles_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<Vec<ProfileDefinition>> {
    let definitions = state
        .insights
        .catalog
        .profiles()
        .map(|profile| profile.definition().clone())
        .collect();
    Json(definitions)
}

pub(crate) async fn list_overrides_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<OverrideQuery>,
) -> Result<Json<Vec<OverrideRecord>>, AppError> {
    let records = state.insights.overrides.list(query.subject.as_deref())?;
    Ok(Json(records))
}

pub(crate) async fn put_override_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<OverrideUpsert>,
) -> Result<Json<OverrideRecord>, AppError> {
    let OverrideUpsert { key, narrative } = payload;
    let key = key.normalized();
    if key.subject.is_empty() {
        return Err(AppError::BadRequest("override subject is empty".to_string()));
    }

    let record = state.insights.overrides.put(key, narrative)?;
    info!(
        subject = %record.key.subject,
        paired = ?record.key.paired_subject,
        scope = %record.key.scope,
        context = record.key.context.label(),
        "narrative override saved"
    );
    Ok(Json(record))
}

pub(crate) async fn delete_override_endpoint(
    Extension(state): Extension<AppState>,
    Json(key): Json<OverrideKey>,
) -> Result<Response, AppError> {
    let key = key.normalized();
    let response = match state.insights.overrides.remove(&key)? {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no override for this view" })),
        )
            .into_response(),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{sample_records, test_state};
    use competency_insights::analytics::{ProfileCatalog, SubjectProfile};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn router(records: Vec<ClassRecord>) -> Router {
        application_routes().layer(Extension(test_state(records)))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&body).expect("serialize request"),
            ))
            .expect("request")
    }

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn report_uses_preloaded_records() {
        let router = router(sample_records().expect("sample data"));
        let request = json_request(
            "POST",
            "/api/v1/insights/report",
            json!({
                "subject": "arabic",
                "scope": { "level": "school", "school": "Ibn Khaldoun" }
            }),
        );

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["students"], 8);
        assert_eq!(body["classes"], 2);
        assert_eq!(body["overall"]["points"], 61);
        assert_eq!(body["scope_label"], "school Ibn Khaldoun");
        assert_eq!(body["narratives"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn report_accepts_inline_csv() {
        let router = router(Vec::new());
        let csv = "school,class,level,subject,student,competency,criterion,grade\n\
                   Al Farabi,3A,3,math,Hiba Chaabane,numbers,1,A\n\
                   Al Farabi,3A,3,math,Hiba Chaabane,numbers,2,B\n\
                   Al Farabi,3A,3,math,Anis Dridi,numbers,1,D\n";
        let request = json_request(
            "POST",
            "/api/v1/insights/report",
            json!({ "subject": "math", "records_csv": csv }),
        );

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["students"], 2);
        assert_eq!(body["overall"]["points"], 5);
        assert_eq!(body["overall"]["max_points"], 9);
    }

    #[tokio::test]
    async fn report_without_records_is_a_bad_request() {
        let router = router(Vec::new());
        let request = json_request(
            "POST",
            "/api/v1/insights/report",
            json!({ "subject": "math" }),
        );

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_subject_is_not_found() {
        let router = router(sample_records().expect("sample data"));
        let request = json_request(
            "POST",
            "/api/v1/insights/report",
            json!({ "subject": "history" }),
        );

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = read_json(response).await;
        assert!(body["error"]
            .as_str()
            .is_some_and(|message| message.contains("history")));
    }

    #[tokio::test]
    async fn cross_subject_links_students() {
        let router = router(sample_records().expect("sample data"));
        let request = json_request(
            "POST",
            "/api/v1/insights/cross-subject",
            json!({
                "first_subject": "arabic",
                "second_subject": "math",
                "include_pairs": true
            }),
        );

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["linked"], 11);
        assert_eq!(body["unmatched"], 1);
        assert_eq!(body["pairs"].as_array().map(Vec::len), Some(11));
        assert_eq!(body["narrative"]["context"], "cross_subject");
    }

    #[tokio::test]
    async fn cross_subject_resolves_each_subject_at_its_own_level() {
        let mut state = test_state(Vec::new());
        let mut catalog = ProfileCatalog::standard().expect("built-in profiles are valid");
        let mut definition = catalog
            .get("math", Some("3"))
            .expect("math profile")
            .definition()
            .clone();
        definition.taxonomy.level = "4".to_string();
        catalog.register(SubjectProfile::from_definition(definition).expect("profile compiles"));
        state.insights.catalog = Arc::new(catalog);
        let router = application_routes().layer(Extension(state));

        let records = json!([
            {
                "school": "Al Farabi", "class": "A", "level": "3", "subject": "arabic",
                "students": [
                    { "full_name": "Hiba Chaabane", "results": { "reading": { "1": "A" } } },
                    { "full_name": "Anis Dridi", "results": { "reading": { "1": "D" } } }
                ]
            },
            {
                "school": "Al Farabi", "class": "A", "level": "4", "subject": "math",
                "students": [
                    { "full_name": "Hiba Chaabane", "results": { "numbers": { "1": "B" } } },
                    { "full_name": "Anis Dridi", "results": { "numbers": { "1": "C" } } }
                ]
            },
            {
                "school": "Al Farabi", "class": "A", "level": "3", "subject": "math",
                "students": [
                    { "full_name": "Hiba Chaabane", "results": { "numbers": { "1": "D" } } }
                ]
            }
        ]);
        let request = json_request(
            "POST",
            "/api/v1/insights/cross-subject",
            json!({
                "first_subject": "arabic",
                "first_level": "3",
                "second_subject": "math",
                "second_level": "4",
                "records": records,
                "include_pairs": true
            }),
        );

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        assert_eq!(body["linked"], 2);
        assert_eq!(body["unmatched"], 0);
        let hiba = body["pairs"]
            .as_array()
            .expect("pairs")
            .iter()
            .find(|pair| pair["key"]["full_name"] == "Hiba Chaabane")
            .cloned()
            .expect("Hiba linked");
        assert!((hiba["y_pct"].as_f64().expect("y pct") - 200.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn profiles_lists_the_catalog() {
        let router = router(Vec::new());
        let request = Request::builder()
            .uri("/api/v1/insights/profiles")
            .body(Body::empty())
            .expect("request");

        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;
        let subjects: Vec<&str> = body
            .as_array()
            .expect("array body")
            .iter()
            .filter_map(|profile| profile["taxonomy"]["subject"].as_str())
            .collect();
        assert_eq!(subjects, vec!["arabic", "math"]);
    }

    #[tokio::test]
    async fn overrides_round_trip_through_reports() {
        let router = router(sample_records().expect("sample data"));
        let narrative = json!({
            "reading": "Assessment was delayed in two classes.",
            "diagnosis": "Results understate mastery.",
            "recommendation": "Reassess after the holidays."
        });

        let put = json_request(
            "PUT",
            "/api/v1/insights/overrides",
            json!({
                "subject": " arabic ",
                "scope": { "level": "district" },
                "context": "mastery",
                "narrative": narrative
            }),
        );
        let response = router.clone().oneshot(put).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let saved = read_json(response).await;
        assert_eq!(saved["key"]["subject"], "arabic");

        let report = json_request(
            "POST",
            "/api/v1/insights/report",
            json!({ "subject": "arabic" }),
        );
        let response = router
            .clone()
            .oneshot(report)
            .await
            .expect("router dispatch");
        let body = read_json(response).await;
        let mastery = body["narratives"]
            .as_array()
            .expect("narratives")
            .iter()
            .find(|entry| entry["context"] == "mastery")
            .cloned()
            .expect("mastery narrative");
        assert_eq!(mastery["source"], "override");
        assert_eq!(mastery["reading"], narrative["reading"]);

        let list = Request::builder()
            .uri("/api/v1/insights/overrides?subject=arabic")
            .body(Body::empty())
            .expect("request");
        let response = router.clone().oneshot(list).await.expect("router dispatch");
        let listed = read_json(response).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let key = json!({ "subject": "arabic", "context": "mastery" });
        let delete = json_request("DELETE", "/api/v1/insights/overrides", key.clone());
        let response = router
            .clone()
            .oneshot(delete)
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let again = json_request("DELETE", "/api/v1/insights/overrides", key);
        let response = router.oneshot(again).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let state = test_state(Vec::new());
        state
            .readiness
            .store(false, std::sync::atomic::Ordering::Release);
        let router = application_routes().layer(Extension(state));

        let request = Request::builder()
            .uri("/ready")
            .body(Body::empty())
            .expect("request");
        let response = router.oneshot(request).await.expect("router dispatch");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
