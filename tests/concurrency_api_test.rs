mod common;

use axum::http::{Method, StatusCode};

#[tokio::test]
async fn simultaneous_final_approvals_fill_the_vacancy_once() {
    let Some(ctx) = common::setup().await else { return };
    let mut events = ctx.state.events.subscribe();
    let recruiter = ctx.principal("recruiter").await;
    let vacancy = ctx.vacancy(recruiter, 2).await;
    let first = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let second = ctx.submitted(ctx.principal("candidate").await, vacancy).await;

    let ((a, _), (b, _)) = tokio::join!(
        ctx.set_status(recruiter, first, "approved"),
        ctx.set_status(recruiter, second, "approved"),
    );
    assert_eq!(a, StatusCode::OK);
    assert_eq!(b, StatusCode::OK);
    assert_eq!(ctx.vacancy_status(vacancy).await, ("filled".to_string(), true));

    let mut fills = 0;
    while let Ok(event) = events.try_recv() {
        if event.name() == "vacancy_filled" && event.subject().1 == vacancy {
            fills += 1;
        }
    }
    assert_eq!(fills, 1);
}

#[tokio::test]
async fn simultaneous_submissions_create_one_application() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let candidate = ctx.principal("candidate").await;
    let vacancy = ctx.vacancy(recruiter, 1).await;

    let ((a, first), (b, second)) = tokio::join!(
        ctx.apply(candidate, vacancy),
        ctx.apply(candidate, vacancy),
    );
    let mut statuses = [a, b];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
    let rejected = if a == StatusCode::CONFLICT { first } else { second };
    assert_eq!(rejected["error"], "duplicate_application");

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications WHERE candidate_id = $1 AND vacancy_id = $2",
    )
    .bind(candidate)
    .bind(vacancy)
    .fetch_one(&ctx.pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn simultaneous_toggles_leave_a_consistent_favorite() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let vacancy = ctx.vacancy(recruiter, 1).await;
    let application = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let uri = format!("/applications/toggle-favorite/{application}");

    let ((a, first), (b, second), (c, third)) = tokio::join!(
        ctx.json(Method::POST, &uri, recruiter, None),
        ctx.json(Method::POST, &uri, recruiter, None),
        ctx.json(Method::POST, &uri, recruiter, None),
    );
    assert!([a, b, c].iter().all(|s| *s == StatusCode::OK));

    // Three serialized flips: two report "on", one reports "off", and it ends on.
    let on = [&first, &second, &third]
        .iter()
        .filter(|body| body["is_favorite"] == true)
        .count();
    assert_eq!(on, 2);

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM application_favorites WHERE application_id = $1 AND recruiter_id = $2",
    )
    .bind(application)
    .bind(recruiter)
    .fetch_one(&ctx.pool)
    .await
    .unwrap();
    assert_eq!(rows, 1);

    let (_, state) = ctx.json(Method::GET, &uri, recruiter, None).await;
    assert_eq!(state["is_favorite"], true);
}
