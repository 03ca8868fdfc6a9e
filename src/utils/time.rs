use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn local_today(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// UTC instant at which `date` begins in the given local offset.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match offset.from_local_datetime(&midnight).single() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    }
}

pub fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

pub fn days_after(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// `DD/MM/YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `DD/MM/YYYY HH:MM` in local time.
pub fn format_local_datetime(dt: DateTime<Utc>, offset: FixedOffset) -> String {
    dt.with_timezone(&offset).format("%d/%m/%Y %H:%M").to_string()
}

/// `YYYYMMDD_HHMMSS` in local time, used in download file names.
pub fn file_stamp(dt: DateTime<Utc>, offset: FixedOffset) -> String {
    dt.with_timezone(&offset).format("%Y%m%d_%H%M%S").to_string()
}
