pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    application_service::ApplicationService, audit_service::AuditService,
    evaluation_service::EvaluationService, event_bus::EventBus,
    favorite_service::FavoriteService, hospital_service::HospitalService,
    identity_service::IdentityService, query_service::QueryService,
    resume_service::ResumeService, storage_service::BlobStore, vacancy_service::VacancyService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub events: EventBus,
    pub jwt_secret: Arc<str>,
    pub identity_service: IdentityService,
    pub hospital_service: HospitalService,
    pub vacancy_service: VacancyService,
    pub application_service: ApplicationService,
    pub evaluation_service: EvaluationService,
    pub favorite_service: FavoriteService,
    pub query_service: QueryService,
    pub resume_service: ResumeService,
    pub audit_service: AuditService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        let events = EventBus::default();
        let storage = BlobStore::new(&config.uploads_dir);

        let identity_service = IdentityService::new(pool.clone());
        let hospital_service = HospitalService::new(pool.clone());
        let vacancy_service = VacancyService::new(pool.clone(), events.clone(), config.page_size);
        let application_service =
            ApplicationService::new(pool.clone(), events.clone(), storage);
        let evaluation_service = EvaluationService::new(pool.clone(), events.clone());
        let favorite_service = FavoriteService::new(pool.clone());
        let query_service =
            QueryService::new(pool.clone(), config.page_size, config.local_offset());
        let resume_service = ResumeService::new(pool.clone(), identity_service.clone());
        let audit_service = AuditService::new(pool.clone());

        Self {
            pool,
            events,
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            identity_service,
            hospital_service,
            vacancy_service,
            application_service,
            evaluation_service,
            favorite_service,
            query_service,
            resume_service,
            audit_service,
        }
    }

    /// Starts persisting every published event to the audit trail.
    pub fn spawn_audit_subscriber(&self) -> tokio::task::JoinHandle<()> {
        let receiver = self.events.subscribe();
        tokio::spawn(self.audit_service.clone().run(receiver))
    }
}
