pub mod applications;
pub mod health;
pub mod hospitals;
pub mod identity;
pub mod resume;
pub mod vacancy;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::{middleware::auth::require_auth, AppState};

/// Every route except `/health` sits behind bearer authentication.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/applications/apply/:vacancy_id", post(applications::apply))
        .route("/applications/list", get(applications::list))
        .route(
            "/applications/detail/:id",
            get(applications::detail).post(applications::detail_action),
        )
        .route(
            "/applications/toggle-favorite/:id",
            get(applications::favorite_state).post(applications::toggle_favorite),
        )
        .route("/applications/export", get(applications::export))
        .route(
            "/applications/api/available-for-interview",
            get(applications::available_for_interview),
        )
        .route("/applications/stats", get(applications::stats))
        .route(
            "/applications/evaluations/:id",
            get(applications::list_evaluations).post(applications::upsert_evaluation),
        )
        .route("/applications/resume/:id", get(applications::download_resume))
        .route(
            "/vacancies",
            get(vacancy::list_vacancies).post(vacancy::create_vacancy),
        )
        .route(
            "/vacancies/:id",
            get(vacancy::get_vacancy).patch(vacancy::update_vacancy),
        )
        .route(
            "/hospitals",
            get(hospitals::list_hospitals).post(hospitals::create_hospital),
        )
        .route(
            "/hospitals/:id/departments",
            get(hospitals::list_departments).post(hospitals::create_department),
        )
        .route("/admin/principals", post(identity::create_principal))
        .route("/admin/principals/:id/role", patch(identity::change_role))
        .route(
            "/admin/audit/:entity_type/:entity_id",
            get(identity::audit_trail),
        )
        .route("/me", get(identity::me))
        .route(
            "/profile",
            get(identity::get_profile).put(identity::put_profile),
        )
        .route("/candidates/:id/profile", get(identity::candidate_profile))
        .route("/candidates/:id/resume", get(resume::candidate_resume))
        .route(
            "/resume",
            get(resume::get_own_resume).put(resume::put_resume),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
}
