pub mod application_service;
pub mod audit_service;
pub mod authorization;
pub mod evaluation_service;
pub mod event_bus;
pub mod export_service;
pub mod favorite_service;
pub mod hospital_service;
pub mod identity_service;
pub mod lifecycle_service;
pub mod query_service;
pub mod resume_service;
pub mod storage_service;
pub mod vacancy_service;
