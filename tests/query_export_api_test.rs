mod common;

use axum::http::{Method, StatusCode};
use hospital_recruitment::services::export_service::COLUMNS;
use tokio_test::assert_ok;

#[tokio::test]
async fn score_sort_puts_unevaluated_applications_last() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let admin = ctx.principal("admin").await;
    let vacancy = ctx.vacancy(recruiter, 5).await;

    let a3 = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let a2 = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let a1 = ctx.submitted(ctx.principal("candidate").await, vacancy).await;

    assert_eq!(ctx.evaluate(recruiter, a1, 10).await, StatusCode::OK);
    assert_eq!(ctx.evaluate(admin, a1, 8).await, StatusCode::OK);
    assert_eq!(ctx.evaluate(recruiter, a2, 9).await, StatusCode::OK);

    let expected: Vec<String> = [a1, a2, a3].iter().map(|id| id.to_string()).collect();
    assert_eq!(ctx.list_ids(recruiter, "score_sort=high_to_low").await, expected);

    let low_first = ctx.list_ids(recruiter, "score_sort=low_to_high").await;
    assert_eq!(low_first.last(), Some(&a3.to_string()));
    assert_eq!(low_first.len(), 3);

    let (_, body) = ctx
        .json(Method::GET, "/applications/list?score_sort=high_to_low", recruiter, None)
        .await;
    assert_eq!(body["items"][0]["score"], "9.0");
    assert_eq!(body["items"][2]["score"], "N/A");

    let (status, body) = ctx
        .json(Method::GET, "/applications/list?score_sort=best", recruiter, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn favorites_are_private_to_each_recruiter() {
    let Some(ctx) = common::setup().await else { return };
    let r1 = ctx.principal("recruiter").await;
    let r2 = ctx.principal("recruiter").await;
    let vacancy = ctx.vacancy(r1, 5).await;

    let a1 = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let _a2 = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let a3 = ctx.submitted(ctx.principal("candidate").await, vacancy).await;

    for id in [a1, a3] {
        let (status, body) = ctx
            .json(Method::POST, &format!("/applications/toggle-favorite/{id}"), r1, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["is_favorite"], true);
    }

    let mut favorites = ctx.list_ids(r1, "favorites=true").await;
    favorites.sort();
    let mut expected = vec![a1.to_string(), a3.to_string()];
    expected.sort();
    assert_eq!(favorites, expected);
    assert!(ctx.list_ids(r2, "favorites=true").await.is_empty());

    let (status, _) = ctx
        .json(Method::GET, "/applications/list?favorites=yes", r1, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn toggling_twice_restores_the_original_state() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let vacancy = ctx.vacancy(recruiter, 1).await;
    let application = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let uri = format!("/applications/toggle-favorite/{application}");

    let (_, first) = ctx.json(Method::POST, &uri, recruiter, None).await;
    let (_, second) = ctx.json(Method::POST, &uri, recruiter, None).await;
    assert_eq!(first["is_favorite"], true);
    assert_eq!(second["is_favorite"], false);
    assert_eq!(second["message"], "Candidatura removida dos favoritos");

    let (status, state) = ctx.json(Method::GET, &uri, recruiter, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["is_favorite"], false);

    let rows: i64 = assert_ok!(
        sqlx::query_scalar("SELECT COUNT(*) FROM application_favorites WHERE application_id = $1")
            .bind(application)
            .fetch_one(&ctx.pool)
            .await
    );
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn export_matches_the_list_and_starts_with_a_bom() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let vacancy = ctx.vacancy(recruiter, 5).await;

    let approved = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let (status, _) = ctx.set_status(recruiter, approved, "approved").await;
    assert_eq!(status, StatusCode::OK);
    for _ in 0..11 {
        ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    }

    let (status, csv) = ctx
        .send(
            Method::GET,
            &format!("/applications/export?format=csv&vacancy={vacancy}"),
            Some(recruiter),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&csv[..3], &[0xEF, 0xBB, 0xBF]);

    let text = String::from_utf8(csv[3..].to_vec()).unwrap();
    let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines[0], COLUMNS.join(","));
    assert_eq!(lines.len(), 13);
    assert_eq!(lines.iter().filter(|l| l.contains(",Aprovado,")).count(), 1);

    // Same filter through the paginated list: 12 rows over two pages.
    let mut listed = ctx.list_ids(recruiter, &format!("vacancy={vacancy}&page=1")).await;
    listed.extend(ctx.list_ids(recruiter, &format!("vacancy={vacancy}&page=2")).await);
    assert_eq!(listed.len(), 12);
    assert_eq!(ctx.list_ids(recruiter, &format!("vacancy={vacancy}&page=99")).await.len(), 2);

    let (status, xlsx) = ctx
        .send(
            Method::GET,
            &format!("/applications/export?format=excel&vacancy={vacancy}"),
            Some(recruiter),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&xlsx[..2], b"PK");

    let candidate = ctx.principal("candidate").await;
    let (status, _) = ctx
        .send(Method::GET, "/applications/export", Some(candidate), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn status_counts_add_up_to_the_total() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let vacancy = ctx.vacancy(recruiter, 5).await;

    let a = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let b = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    ctx.set_status(recruiter, a, "under_review").await;
    ctx.set_status(recruiter, b, "rejected").await;

    let (status, body) = ctx
        .json(Method::GET, "/applications/stats", recruiter, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let counts = body["counts"].as_array().unwrap();
    assert_eq!(counts.len(), 6);
    let sum: i64 = counts.iter().map(|c| c["count"].as_i64().unwrap()).sum();
    assert_eq!(sum, body["total"].as_i64().unwrap());
    assert_eq!(sum, 3);

    let (_, list) = ctx
        .json(Method::GET, "/applications/list", recruiter, None)
        .await;
    assert_eq!(list["total"], body["total"]);
}

#[tokio::test]
async fn interview_candidates_exclude_closed_applications() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let vacancy = ctx.vacancy(recruiter, 5).await;

    let open = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let rejected = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    ctx.set_status(recruiter, rejected, "rejected").await;

    let (status, body) = ctx
        .json(Method::GET, "/applications/api/available-for-interview", recruiter, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common::ids(&body), vec![open.to_string()]);

    let candidate = ctx.principal("candidate").await;
    let (status, _) = ctx
        .json(Method::GET, "/applications/api/available-for-interview", candidate, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn search_and_date_filters_narrow_the_list() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let vacancy = ctx.vacancy(recruiter, 5).await;
    let candidate = ctx.principal("candidate").await;
    let application = ctx.submitted(candidate, vacancy).await;

    let by_email = ctx
        .list_ids(recruiter, &format!("search=candidate-{candidate}"))
        .await;
    assert_eq!(by_email, vec![application.to_string()]);
    assert!(ctx.list_ids(recruiter, "search=ninguem").await.is_empty());

    assert_eq!(ctx.list_ids(recruiter, "date=today").await.len(), 1);
    assert_eq!(ctx.list_ids(recruiter, "date=90").await.len(), 1);
    let (status, _) = ctx
        .json(Method::GET, "/applications/list?date=yesterday", recruiter, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
