use chrono::{DateTime, FixedOffset, Utc};
use rust_xlsxwriter::*;

use crate::error::{Error, Result};
use crate::models::evaluation::{format_score, NOT_AVAILABLE};
use crate::services::query_service::ApplicationRow;
use crate::utils::time::{file_stamp, format_date, format_local_datetime};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const SHEET_NAME: &str = "Candidaturas";
const MAX_COLUMN_WIDTH: usize = 50;

pub const COLUMNS: [&str; 18] = [
    "Full Name",
    "Email",
    "Phone",
    "WhatsApp",
    "National ID (CPF)",
    "Date of Birth",
    "Address",
    "City",
    "State",
    "Postal Code",
    "Vacancy",
    "Hospital",
    "Hospital Location",
    "Status",
    "Score",
    "Application Date",
    "Cover Letter",
    "Recruiter Notes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    /// Absent means CSV.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None | Some("csv") => Ok(ExportFormat::Csv),
            Some("excel") | Some("xlsx") => Ok(ExportFormat::Excel),
            Some(other) => Err(Error::Validation(format!("unknown export format: {other}"))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub struct ExportService;

impl ExportService {
    pub fn render(
        format: ExportFormat,
        rows: &[ApplicationRow],
        offset: FixedOffset,
        now: DateTime<Utc>,
    ) -> Result<ExportFile> {
        let bytes = match format {
            ExportFormat::Csv => Self::to_csv(rows, offset)?,
            ExportFormat::Excel => Self::to_xlsx(rows, offset)?,
        };
        tracing::info!(rows = rows.len(), format = format.extension(), "applications exported");
        Ok(ExportFile {
            file_name: file_name(format, now, offset),
            content_type: format.content_type(),
            bytes,
        })
    }

    /// UTF-8 with BOM, comma separated, CRLF line endings.
    pub fn to_csv(rows: &[ApplicationRow], offset: FixedOffset) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(UTF8_BOM.to_vec());

        writer.write_record(COLUMNS)?;
        for row in rows {
            writer.write_record(export_record(row, offset))?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::Internal(format!("failed to flush csv export: {e}")))
    }

    pub fn to_xlsx(rows: &[ApplicationRow], offset: FixedOffset) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        let border_color = Color::RGB(0xE2E8F0);
        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x0F172A))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let cell_format = Format::new()
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.chars().count()).collect();
        for (col, name) in COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *name, &header_format)?;
        }

        for (idx, row) in rows.iter().enumerate() {
            let excel_row = idx as u32 + 1;
            for (col, value) in export_record(row, offset).iter().enumerate() {
                worksheet.write_string_with_format(excel_row, col as u16, value, &cell_format)?;
                widths[col] = widths[col].max(value.chars().count());
            }
        }

        for (col, width) in widths.into_iter().enumerate() {
            worksheet.set_column_width(col as u16, column_width(width) as f64)?;
        }
        worksheet.set_freeze_panes(1, 0)?;
        worksheet.autofilter(0, 0, rows.len() as u32, (COLUMNS.len() - 1) as u16)?;

        Ok(workbook.save_to_buffer()?)
    }
}

/// `candidaturas_YYYYMMDD_HHMMSS.{csv|xlsx}`, stamped in display time.
pub fn file_name(format: ExportFormat, now: DateTime<Utc>, offset: FixedOffset) -> String {
    format!("candidaturas_{}.{}", file_stamp(now, offset), format.extension())
}

fn column_width(content_chars: usize) -> usize {
    (content_chars + 2).min(MAX_COLUMN_WIDTH)
}

fn or_na(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// One export line in column order.
pub fn export_record(row: &ApplicationRow, offset: FixedOffset) -> [String; 18] {
    [
        or_na(Some(row.candidate_name().as_str())),
        or_na(Some(row.email.as_str())),
        or_na(row.phone.as_deref()),
        or_na(row.whatsapp.as_deref()),
        or_na(row.cpf.as_deref()),
        row.date_of_birth
            .map(format_date)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        or_na(row.address.as_deref()),
        or_na(row.city.as_deref()),
        or_na(row.state.as_deref()),
        or_na(row.postal_code.as_deref()),
        or_na(Some(row.vacancy_title.as_str())),
        or_na(Some(row.hospital_name.as_str())),
        or_na(Some(row.hospital_location().as_str())),
        row.status.label().to_string(),
        format_score(row.score_key),
        format_local_datetime(row.created_at, offset),
        or_na(row.cover_letter.as_deref()),
        or_na(row.recruiter_notes.as_deref()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationStatus;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn sao_paulo() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn approved_row() -> ApplicationRow {
        ApplicationRow {
            id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            vacancy_id: Uuid::new_v4(),
            status: ApplicationStatus::Approved,
            cover_letter: Some("Tenho experiência, em UTI".into()),
            resume_blob_ref: None,
            recruiter_notes: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 10, 14, 5, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 3, 10, 14, 5, 0).unwrap(),
            first_name: "Maria".into(),
            last_name: "Silva".into(),
            email: "maria@example.com".into(),
            phone: Some("11 99999-0000".into()),
            whatsapp: None,
            cpf: Some("123.456.789-00".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 7, 4),
            address: None,
            city: Some("São Paulo".into()),
            state: Some("SP".into()),
            postal_code: None,
            vacancy_title: "Enfermeira UTI".into(),
            recruiter_id: Uuid::new_v4(),
            hospital_id: Uuid::new_v4(),
            hospital_name: "Hospital Central".into(),
            hospital_city: "Campinas".into(),
            hospital_state: "SP".into(),
            evaluation_count: 2,
            avg_technical: Some(Decimal::from(9)),
            avg_experience: Some(Decimal::from(9)),
            avg_cultural_fit: Some(Decimal::from(9)),
            score_key: Some(Decimal::from(9)),
            is_favorite: false,
        }
    }

    #[test]
    fn csv_starts_with_bom_and_fixed_header() {
        let bytes = ExportService::to_csv(&[approved_row()], sao_paulo()).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);

        let text = std::str::from_utf8(&bytes[3..]).unwrap();
        let mut lines = text.split("\r\n");
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        let data = lines.next().unwrap();
        assert!(data.contains(",Aprovado,"));
        assert!(data.contains("\"Tenho experiência, em UTI\""));
        assert!(text.ends_with("\r\n"));
    }

    #[test]
    fn record_formats_dates_scores_and_missing_values() {
        let record = export_record(&approved_row(), sao_paulo());
        assert_eq!(record[0], "Maria Silva");
        assert_eq!(record[3], "N/A");
        assert_eq!(record[5], "04/07/1990");
        assert_eq!(record[12], "Campinas, SP");
        assert_eq!(record[13], "Aprovado");
        assert_eq!(record[14], "9.0");
        assert_eq!(record[15], "10/03/2025 11:05");
        assert_eq!(record[17], "N/A");
    }

    #[test]
    fn unevaluated_rows_score_not_available() {
        let mut row = approved_row();
        row.score_key = None;
        assert_eq!(export_record(&row, sao_paulo())[14], "N/A");
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = ExportService::to_xlsx(&[approved_row()], sao_paulo()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn format_parsing_and_file_names() {
        assert_eq!(ExportFormat::parse(None).unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse(Some("excel")).unwrap(), ExportFormat::Excel);
        assert!(ExportFormat::parse(Some("pdf")).is_err());

        let now = Utc.with_ymd_and_hms(2025, 3, 10, 14, 5, 9).unwrap();
        assert_eq!(
            file_name(ExportFormat::Excel, now, sao_paulo()),
            "candidaturas_20250310_110509.xlsx"
        );
    }

    #[test]
    fn column_widths_are_capped() {
        assert_eq!(column_width(5), 7);
        assert_eq!(column_width(200), 50);
    }
}
