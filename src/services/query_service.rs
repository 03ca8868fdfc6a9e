//! Filtered, role-scoped reads over applications. The list, export, stats and
//! interview-candidate endpoints all build their SQL here so they agree on
//! which rows an actor sees and in what order.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::application_dto::ApplicationListQuery;
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::hospital::hospital_location;
use crate::models::principal::{join_name, Actor};
use crate::services::authorization::{ensure_staff, visible_set, AccessScope, VisibleSet};
use crate::utils::pagination::{like_pattern, parse_page, PageInfo};
use crate::utils::time::{days_after, days_before, local_midnight, local_today};
use crate::utils::validation::normalize_optional;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    Today,
    /// Created on or after the local date `n` days ago.
    SinceDaysAgo(u64),
}

impl DateWindow {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "today" => Ok(DateWindow::Today),
            "week" | "7" => Ok(DateWindow::SinceDaysAgo(7)),
            "month" | "30" => Ok(DateWindow::SinceDaysAgo(30)),
            "90" => Ok(DateWindow::SinceDaysAgo(90)),
            other => Err(Error::Validation(format!("unknown date filter: {other}"))),
        }
    }

    /// Half-open `[start, end)` interval in UTC, computed from the local calendar.
    pub fn bounds(self, today: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        match self {
            DateWindow::Today => (
                local_midnight(today, offset),
                Some(local_midnight(days_after(today, 1), offset)),
            ),
            DateWindow::SinceDaysAgo(days) => (local_midnight(days_before(today, days), offset), None),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSort {
    HighToLow,
    LowToHigh,
}

impl ScoreSort {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "high_to_low" => Ok(ScoreSort::HighToLow),
            "low_to_high" => Ok(ScoreSort::LowToHigh),
            other => Err(Error::Validation(format!("unknown score_sort: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub vacancy_id: Option<Uuid>,
    pub hospital_id: Option<Uuid>,
    pub date: Option<DateWindow>,
    pub search: Option<String>,
    pub favorites_only: bool,
    pub score_sort: Option<ScoreSort>,
    /// Restricts to a fixed status set; not reachable from the query string.
    pub status_in: Option<&'static [ApplicationStatus]>,
}

impl ApplicationFilter {
    /// Empty parameters are ignored; anything else must be well formed.
    pub fn parse(query: &ApplicationListQuery) -> Result<Self> {
        let status = non_empty(&query.status)
            .map(|s| s.parse::<ApplicationStatus>())
            .transpose()?;
        let vacancy_id = non_empty(&query.vacancy).map(|v| parse_uuid("vacancy", &v)).transpose()?;
        let hospital_id = non_empty(&query.hospital).map(|h| parse_uuid("hospital", &h)).transpose()?;
        let date = non_empty(&query.date).map(|d| DateWindow::parse(&d)).transpose()?;
        let favorites_only = match non_empty(&query.favorites).as_deref() {
            None => false,
            Some("true") => true,
            Some(other) => {
                return Err(Error::Validation(format!("favorites only accepts true, got {other}")))
            }
        };
        let score_sort = non_empty(&query.score_sort).map(|s| ScoreSort::parse(&s)).transpose()?;

        Ok(Self {
            status,
            vacancy_id,
            hospital_id,
            date,
            search: non_empty(&query.search),
            favorites_only,
            score_sort,
            status_in: None,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    normalize_optional(value.clone())
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid> {
    raw.parse::<Uuid>()
        .map_err(|_| Error::Validation(format!("{field} must be a valid id")))
}

/// One application joined with everything the listing and export need.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
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
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub cpf: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub vacancy_title: String,
    pub recruiter_id: Uuid,
    pub hospital_id: Uuid,
    pub hospital_name: String,
    pub hospital_city: String,
    pub hospital_state: String,
    pub evaluation_count: i64,
    pub avg_technical: Option<Decimal>,
    pub avg_experience: Option<Decimal>,
    pub avg_cultural_fit: Option<Decimal>,
    /// Mean of the three per-dimension means; `None` without evaluations.
    pub score_key: Option<Decimal>,
    pub is_favorite: bool,
}

impl ApplicationRow {
    pub fn candidate_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    pub fn hospital_location(&self) -> String {
        hospital_location(&self.hospital_city, &self.hospital_state)
    }

    pub fn scope(&self) -> AccessScope {
        AccessScope {
            candidate_id: self.candidate_id,
            recruiter_id: self.recruiter_id,
        }
    }

    pub fn into_application(self) -> Application {
        Application {
            id: self.id,
            candidate_id: self.candidate_id,
            vacancy_id: self.vacancy_id,
            status: self.status,
            cover_letter: self.cover_letter,
            resume_blob_ref: self.resume_blob_ref,
            recruiter_notes: self.recruiter_notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub struct ApplicationPage {
    pub items: Vec<ApplicationRow>,
    pub page: PageInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts([i64; 6]);

impl StatusCounts {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ApplicationStatus, i64)>) -> Self {
        let mut counts = [0; 6];
        for (status, count) in pairs {
            if let Some(slot) = ApplicationStatus::ALL.iter().position(|s| *s == status) {
                counts[slot] += count;
            }
        }
        Self(counts)
    }

    pub fn get(&self, status: ApplicationStatus) -> i64 {
        ApplicationStatus::ALL
            .iter()
            .position(|s| *s == status)
            .map_or(0, |slot| self.0[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = (ApplicationStatus, i64)> + '_ {
        ApplicationStatus::ALL.into_iter().zip(self.0.iter().copied())
    }

    pub fn total(&self) -> i64 {
        self.0.iter().sum()
    }
}

const ROW_SELECT: &str = r#"
    SELECT
        a.id, a.candidate_id, a.vacancy_id, a.status, a.cover_letter, a.resume_blob_ref,
        a.recruiter_notes, a.created_at, a.updated_at,
        p.first_name, p.last_name, p.email,
        cp.phone, cp.whatsapp, cp.cpf, cp.date_of_birth, cp.address, cp.city, cp.state, cp.postal_code,
        v.title AS vacancy_title, v.recruiter_id, v.hospital_id,
        h.name AS hospital_name, h.city AS hospital_city, h.state AS hospital_state,
        COALESCE(ev.evaluation_count, 0) AS evaluation_count,
        ev.avg_technical, ev.avg_experience, ev.avg_cultural_fit, ev.score_key,
        EXISTS (
            SELECT 1 FROM application_favorites f
            WHERE f.application_id = a.id AND f.recruiter_id = "#;

const ROW_FROM: &str = r#"
        ) AS is_favorite
    FROM applications a
    JOIN principals p ON p.id = a.candidate_id
    JOIN vacancies v ON v.id = a.vacancy_id
    JOIN hospitals h ON h.id = v.hospital_id
    LEFT JOIN candidate_profiles cp ON cp.principal_id = a.candidate_id
    LEFT JOIN (
        SELECT
            application_id,
            COUNT(*) AS evaluation_count,
            ROUND(AVG(technical_score), 10) AS avg_technical,
            ROUND(AVG(experience_score), 10) AS avg_experience,
            ROUND(AVG(cultural_fit_score), 10) AS avg_cultural_fit,
            ROUND((AVG(technical_score) + AVG(experience_score) + AVG(cultural_fit_score)) / 3, 10) AS score_key
        FROM application_evaluations
        GROUP BY application_id
    ) ev ON ev.application_id = a.id
"#;

const COUNT_FROM: &str = r#"
    FROM applications a
    JOIN principals p ON p.id = a.candidate_id
    JOIN vacancies v ON v.id = a.vacancy_id
    JOIN hospitals h ON h.id = v.hospital_id
"#;

#[derive(Clone)]
pub struct QueryService {
    pool: PgPool,
    page_size: i64,
    offset: FixedOffset,
}

impl QueryService {
    pub fn new(pool: PgPool, page_size: i64, offset: FixedOffset) -> Self {
        Self {
            pool,
            page_size: page_size.max(1),
            offset,
        }
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.offset
    }

    pub async fn list(
        &self,
        actor: &Actor,
        filter: &ApplicationFilter,
        page: Option<&str>,
    ) -> Result<ApplicationPage> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count.push(COUNT_FROM);
        self.push_where(&mut count, actor, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let page = PageInfo::clamp(parse_page(page), self.page_size, total);
        let mut rows = self.row_query(actor, filter);
        rows.push(" LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = rows
            .build_query_as::<ApplicationRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(ApplicationPage { items, page })
    }

    /// Every matching row in list order, without pagination.
    pub async fn fetch_all(&self, actor: &Actor, filter: &ApplicationFilter) -> Result<Vec<ApplicationRow>> {
        let mut rows = self.row_query(actor, filter);
        let items = rows
            .build_query_as::<ApplicationRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn status_counts(&self, actor: &Actor, filter: &ApplicationFilter) -> Result<StatusCounts> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT a.status, COUNT(*)");
        query.push(COUNT_FROM);
        self.push_where(&mut query, actor, filter);
        query.push(" GROUP BY a.status");
        let pairs: Vec<(String, i64)> = query.build_query_as().fetch_all(&self.pool).await?;

        let pairs = pairs
            .into_iter()
            .map(|(status, count)| Ok((ApplicationStatus::try_from(status)?, count)))
            .collect::<Result<Vec<_>>>()?;
        Ok(StatusCounts::from_pairs(pairs))
    }

    /// Applications that can still be scheduled for an interview.
    pub async fn available_for_interview(&self, actor: &Actor) -> Result<Vec<ApplicationRow>> {
        ensure_staff(actor)?;
        let eligible: &'static [ApplicationStatus] = &ApplicationStatus::INTERVIEW_ELIGIBLE;
        let filter = ApplicationFilter {
            status_in: Some(eligible),
            ..ApplicationFilter::default()
        };
        self.fetch_all(actor, &filter).await
    }

    fn row_query(&self, actor: &Actor, filter: &ApplicationFilter) -> QueryBuilder<'static, Postgres> {
        let mut query = QueryBuilder::<Postgres>::new(ROW_SELECT);
        query.push_bind(actor.id());
        query.push(ROW_FROM);
        self.push_where(&mut query, actor, filter);
        query.push(order_clause(filter.score_sort));
        query
    }

    fn push_where(&self, query: &mut QueryBuilder<'static, Postgres>, actor: &Actor, filter: &ApplicationFilter) {
        query.push(" WHERE TRUE");
        match visible_set(actor) {
            VisibleSet::All => {}
            VisibleSet::SubmittedBy(candidate_id) => {
                query.push(" AND a.candidate_id = ").push_bind(candidate_id);
            }
            VisibleSet::VacanciesOwnedBy(recruiter_id) => {
                query.push(" AND v.recruiter_id = ").push_bind(recruiter_id);
            }
        }

        if let Some(status) = filter.status {
            query.push(" AND a.status = ").push_bind(status.as_str());
        }
        if let Some(statuses) = filter.status_in {
            let names: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
            query.push(" AND a.status = ANY(").push_bind(names).push(")");
        }
        if let Some(vacancy_id) = filter.vacancy_id {
            query.push(" AND a.vacancy_id = ").push_bind(vacancy_id);
        }
        if let Some(hospital_id) = filter.hospital_id {
            query.push(" AND v.hospital_id = ").push_bind(hospital_id);
        }
        if let Some(window) = filter.date {
            let today = local_today(Utc::now(), self.offset);
            let (start, end) = window.bounds(today, self.offset);
            query.push(" AND a.created_at >= ").push_bind(start);
            if let Some(end) = end {
                query.push(" AND a.created_at < ").push_bind(end);
            }
        }
        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            query
                .push(" AND (p.first_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.last_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR v.title ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if filter.favorites_only {
            query
                .push(" AND EXISTS (SELECT 1 FROM application_favorites f WHERE f.application_id = a.id AND f.recruiter_id = ")
                .push_bind(actor.id())
                .push(")");
        }
    }
}

/// Applications without evaluations have no score and sort last either way.
pub fn order_clause(score_sort: Option<ScoreSort>) -> &'static str {
    match score_sort {
        None => " ORDER BY a.created_at DESC, a.id DESC",
        Some(ScoreSort::HighToLow) => {
            " ORDER BY ev.score_key DESC NULLS LAST, a.created_at DESC, a.id DESC"
        }
        Some(ScoreSort::LowToHigh) => {
            " ORDER BY ev.score_key ASC NULLS LAST, a.created_at DESC, a.id DESC"
        }
    }
}

/// Loads one application row regardless of scope; callers apply the policy.
pub async fn fetch_row(conn: &mut PgConnection, viewer_id: Uuid, id: Uuid) -> Result<ApplicationRow> {
    let mut query = QueryBuilder::<Postgres>::new(ROW_SELECT);
    query.push_bind(viewer_id);
    query.push(ROW_FROM);
    query.push(" WHERE a.id = ").push_bind(id);
    query
        .build_query_as::<ApplicationRow>()
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))
}
