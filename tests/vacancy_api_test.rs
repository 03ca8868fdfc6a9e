mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn recruiter_creates_and_publishes_a_vacancy() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let candidate = ctx.principal("candidate").await;
    let hospital = ctx.hospital().await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/vacancies",
            recruiter,
            Some(json!({"title": "Técnico de Enfermagem", "hospital_id": hospital, "positions": 2})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "draft");
    assert_eq!(body["recruiter_id"], recruiter.to_string());
    let uri = format!("/vacancies/{}", body["id"].as_str().unwrap());

    // Drafts are not visible to candidates.
    let (status, _) = ctx.json(Method::GET, &uri, candidate, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .json(Method::PATCH, &uri, recruiter, Some(json!({"status": "open"})))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "open");

    let (status, _) = ctx.json(Method::GET, &uri, candidate, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .json(
            Method::POST,
            "/vacancies",
            candidate,
            Some(json!({"title": "Médico", "hospital_id": hospital})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reopening_with_enough_approvals_fills_immediately() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let vacancy = ctx.vacancy(recruiter, 2).await;
    let uri = format!("/vacancies/{vacancy}");

    let approved = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    let (status, _) = ctx.set_status(recruiter, approved, "approved").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.vacancy_status(vacancy).await, ("open".to_string(), false));

    let (status, _) = ctx
        .json(Method::PATCH, &uri, recruiter, Some(json!({"status": "closed"})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .json(
            Method::PATCH,
            &uri,
            recruiter,
            Some(json!({"status": "open", "positions": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "filled");
    assert!(body["filled_date"].is_string());
    assert_eq!(ctx.vacancy_status(vacancy).await, ("filled".to_string(), true));
}

#[tokio::test]
async fn filled_vacancies_reject_manual_edits() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let vacancy = ctx.vacancy(recruiter, 1).await;
    let uri = format!("/vacancies/{vacancy}");

    let application = ctx.submitted(ctx.principal("candidate").await, vacancy).await;
    ctx.set_status(recruiter, application, "approved").await;
    assert_eq!(ctx.vacancy_status(vacancy).await.0, "filled");

    for change in [json!({"status": "open"}), json!({"status": "closed"}), json!({"positions": 3})] {
        let (status, body) = ctx.json(Method::PATCH, &uri, recruiter, Some(change)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["error"], "validation");
    }
    assert_eq!(ctx.vacancy_status(vacancy).await.0, "filled");

    // Editing text on a filled vacancy is still allowed.
    let (status, body) = ctx
        .json(Method::PATCH, &uri, recruiter, Some(json!({"title": "Enfermeiro Chefe"})))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "filled");
}

#[tokio::test]
async fn only_the_owner_or_an_admin_edits_a_vacancy() {
    let Some(ctx) = common::setup().await else { return };
    let owner = ctx.principal("recruiter").await;
    let other = ctx.principal("recruiter").await;
    let admin = ctx.principal("admin").await;
    let vacancy = ctx.vacancy(owner, 1).await;
    let uri = format!("/vacancies/{vacancy}");

    // Open vacancies are visible to everyone, so a stranger is refused rather than not found.
    let (status, _) = ctx
        .json(Method::PATCH, &uri, other, Some(json!({"positions": 4})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .json(Method::PATCH, &uri, admin, Some(json!({"positions": 4})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["positions"], 4);

    let (status, body) = ctx
        .json(Method::PATCH, &uri, owner, Some(json!({"status": "filled"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn candidates_see_open_vacancies_and_the_ones_they_applied_to() {
    let Some(ctx) = common::setup().await else { return };
    let recruiter = ctx.principal("recruiter").await;
    let applicant = ctx.principal("candidate").await;
    let bystander = ctx.principal("candidate").await;
    let applied = ctx.vacancy(recruiter, 3).await;
    let never_applied = ctx.vacancy(recruiter, 3).await;
    ctx.submitted(applicant, applied).await;

    for vacancy in [applied, never_applied] {
        let (status, _) = ctx
            .json(
                Method::PATCH,
                &format!("/vacancies/{vacancy}"),
                recruiter,
                Some(json!({"status": "closed"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = ctx
        .json(Method::GET, &format!("/vacancies/{applied}"), applicant, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx
        .json(Method::GET, &format!("/vacancies/{applied}"), bystander, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = ctx
        .json(Method::GET, &format!("/vacancies/{never_applied}"), applicant, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .json(Method::GET, "/vacancies?status=closed", applicant, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = common::ids(&body["items"]);
    assert!(listed.contains(&applied.to_string()));
    assert!(!listed.contains(&never_applied.to_string()));
}

#[tokio::test]
async fn only_admins_change_roles_and_the_stored_role_wins() {
    let Some(ctx) = common::setup().await else { return };
    let admin = ctx.principal("admin").await;
    let recruiter = ctx.principal("recruiter").await;
    let target = ctx.principal("recruiter").await;
    let uri = format!("/admin/principals/{target}/role");

    let (status, body) = ctx
        .json(Method::PATCH, &uri, recruiter, Some(json!({"role": "admin"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");

    let (status, body) = ctx
        .json(Method::PATCH, &uri, admin, Some(json!({"role": "candidate"})))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["role"], "candidate");

    // The same token now acts as a candidate.
    let hospital = ctx.hospital().await;
    let (status, _) = ctx
        .json(
            Method::POST,
            "/vacancies",
            target,
            Some(json!({"title": "Fisioterapeuta", "hospital_id": hospital})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
