use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Interview,
    Approved,
    Rejected,
    Withdrawn,
}

/// Who may perform a given status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAuthority {
    /// The recruiter owning the vacancy, or an admin.
    Staff,
    /// Only the candidate who submitted the application.
    Candidate,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Interview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    /// Statuses an application can still be scheduled for an interview from.
    pub const INTERVIEW_ELIGIBLE: [ApplicationStatus; 3] = [
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Interview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Localized label used in listings and exports.
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pendente",
            ApplicationStatus::UnderReview => "Em Análise",
            ApplicationStatus::Interview => "Entrevista",
            ApplicationStatus::Approved => "Aprovado",
            ApplicationStatus::Rejected => "Rejeitado",
            ApplicationStatus::Withdrawn => "Desistência",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// The transition table. `None` means the move is illegal for everyone.
    pub fn transition_authority(self, to: ApplicationStatus) -> Option<TransitionAuthority> {
        use ApplicationStatus::*;
        match (self, to) {
            (Pending, UnderReview | Interview | Approved | Rejected) => {
                Some(TransitionAuthority::Staff)
            }
            (UnderReview, Interview | Approved | Rejected) => Some(TransitionAuthority::Staff),
            (Interview, Approved | Rejected) => Some(TransitionAuthority::Staff),
            (Pending | UnderReview | Interview, Withdrawn) => Some(TransitionAuthority::Candidate),
            _ => None,
        }
    }

    pub fn can_transition(self, to: ApplicationStatus) -> bool {
        self.transition_authority(to).is_some()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("application status", s))
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub vacancy_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub resume_blob_ref: Option<String>,
    pub recruiter_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLength {
    LessThanSixMonths,
    SixMonthsToOneYear,
    OneToTwoYears,
    TwoToFiveYears,
    OverFiveYears,
}

impl ExperienceLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLength::LessThanSixMonths => "less_than_six_months",
            ExperienceLength::SixMonthsToOneYear => "six_months_to_one_year",
            ExperienceLength::OneToTwoYears => "one_to_two_years",
            ExperienceLength::TwoToFiveYears => "two_to_five_years",
            ExperienceLength::OverFiveYears => "over_five_years",
        }
    }
}

impl TryFrom<String> for ExperienceLength {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        use ExperienceLength::*;
        [
            LessThanSixMonths,
            SixMonthsToOneYear,
            OneToTwoYears,
            TwoToFiveYears,
            OverFiveYears,
        ]
        .into_iter()
        .find(|v| v.as_str() == value)
        .ok_or_else(|| UnknownVariant::new("experience length", value))
    }
}

/// The fixed questionnaire a candidate may attach to an application.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, FromRow)]
#[validate(schema(function = "validate_disclosures"))]
pub struct ComplementaryInfo {
    pub currently_employed_here: bool,
    #[validate(length(max = 255))]
    pub present_role: Option<String>,
    pub has_area_experience: bool,
    pub area_experience_description: Option<String>,
    #[validate(length(max = 255))]
    pub last_role: Option<String>,
    #[sqlx(try_from = "String")]
    pub experience_length: ExperienceLength,
    #[serde(default)]
    pub available_morning: bool,
    #[serde(default)]
    pub available_afternoon: bool,
    #[serde(default)]
    pub available_night: bool,
    #[serde(default)]
    pub available_business_hours: bool,
    #[serde(default)]
    pub available_day_shift: bool,
    #[serde(default)]
    pub available_night_shift: bool,
    pub immediate_start: bool,
    pub previously_worked_here: bool,
    #[validate(length(max = 255))]
    pub previous_area_role: Option<String>,
    pub previous_termination_date: Option<NaiveDate>,
    pub has_relatives_here: bool,
    #[validate(length(max = 20))]
    pub kinship_degree: Option<String>,
    #[validate(length(max = 255))]
    pub relative_name_and_sector: Option<String>,
    pub is_pcd: Option<bool>,
    #[validate(length(max = 20))]
    pub cid: Option<String>,
    pub needs_accommodations: Option<bool>,
    pub accommodations_description: Option<String>,
    #[validate(length(max = 20))]
    pub council_name: Option<String>,
    #[validate(length(max = 50))]
    pub council_registration_number: Option<String>,
    pub council_registration_valid_until: Option<NaiveDate>,
    pub truthfulness_declared: bool,
    pub notice_accepted: bool,
    pub data_use_authorized: bool,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}

fn validate_disclosures(info: &ComplementaryInfo) -> Result<(), ValidationError> {
    if !(info.truthfulness_declared && info.notice_accepted && info.data_use_authorized) {
        return Err(ValidationError::new("declarations_required"));
    }
    if info.has_relatives_here && is_blank(&info.kinship_degree) {
        return Err(ValidationError::new("kinship_degree_required"));
    }
    if info.needs_accommodations == Some(true) && is_blank(&info.accommodations_description) {
        return Err(ValidationError::new("accommodations_description_required"));
    }
    if !is_blank(&info.council_name) && is_blank(&info.council_registration_number) {
        return Err(ValidationError::new("council_registration_number_required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn staff_transitions_follow_the_table() {
        assert_eq!(Pending.transition_authority(UnderReview), Some(TransitionAuthority::Staff));
        assert_eq!(Pending.transition_authority(Approved), Some(TransitionAuthority::Staff));
        assert_eq!(UnderReview.transition_authority(Interview), Some(TransitionAuthority::Staff));
        assert_eq!(Interview.transition_authority(Rejected), Some(TransitionAuthority::Staff));
        assert_eq!(UnderReview.transition_authority(Pending), None);
        assert_eq!(Interview.transition_authority(UnderReview), None);
    }

    #[test]
    fn withdrawal_belongs_to_the_candidate() {
        for from in [Pending, UnderReview, Interview] {
            assert_eq!(
                from.transition_authority(Withdrawn),
                Some(TransitionAuthority::Candidate)
            );
        }
    }

    #[test]
    fn terminal_states_are_immutable() {
        for from in [Approved, Rejected, Withdrawn] {
            assert!(from.is_terminal());
            for to in ApplicationStatus::ALL {
                assert!(!from.can_transition(to), "{from} -> {to} must be illegal");
            }
        }
    }

    #[test]
    fn self_transitions_are_illegal() {
        for status in ApplicationStatus::ALL {
            assert!(!status.can_transition(status));
        }
    }

    #[test]
    fn labels_come_from_closed_mapping() {
        let labels: Vec<_> = ApplicationStatus::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            ["Pendente", "Em Análise", "Entrevista", "Aprovado", "Rejeitado", "Desistência"]
        );
    }

    #[test]
    fn status_parsing_rejects_unknown_values() {
        assert_eq!("under_review".parse::<ApplicationStatus>().unwrap(), UnderReview);
        assert!("submitted".parse::<ApplicationStatus>().is_err());
        assert!("interview_scheduled".parse::<ApplicationStatus>().is_err());
    }

    fn questionnaire() -> ComplementaryInfo {
        ComplementaryInfo {
            currently_employed_here: false,
            present_role: None,
            has_area_experience: true,
            area_experience_description: Some("UTI adulto".into()),
            last_role: Some("Técnico de enfermagem".into()),
            experience_length: ExperienceLength::TwoToFiveYears,
            available_morning: true,
            available_afternoon: false,
            available_night: false,
            available_business_hours: true,
            available_day_shift: false,
            available_night_shift: false,
            immediate_start: true,
            previously_worked_here: false,
            previous_area_role: None,
            previous_termination_date: None,
            has_relatives_here: false,
            kinship_degree: None,
            relative_name_and_sector: None,
            is_pcd: Some(false),
            cid: None,
            needs_accommodations: None,
            accommodations_description: None,
            council_name: Some("COREN".into()),
            council_registration_number: Some("123456".into()),
            council_registration_valid_until: None,
            truthfulness_declared: true,
            notice_accepted: true,
            data_use_authorized: true,
        }
    }

    #[test]
    fn questionnaire_requires_declarations() {
        assert!(questionnaire().validate().is_ok());
        let mut info = questionnaire();
        info.notice_accepted = false;
        assert!(info.validate().is_err());
    }

    #[test]
    fn kinship_disclosure_needs_degree() {
        let mut info = questionnaire();
        info.has_relatives_here = true;
        assert!(info.validate().is_err());
        info.kinship_degree = Some("irmao".into());
        assert!(info.validate().is_ok());
    }
}
