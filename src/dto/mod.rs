pub mod application_dto;
pub mod hospital_dto;
pub mod identity_dto;
pub mod resume_dto;
pub mod vacancy_dto;
