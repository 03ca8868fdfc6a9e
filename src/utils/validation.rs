use validator::ValidationError;

/// Rejects strings that are empty once trimmed.
pub fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Trims and turns empty strings into `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(not_blank("  ").is_err());
        assert!(not_blank("Enfermagem").is_ok());
    }

    #[test]
    fn optional_text_is_normalized() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(Some(" ok ".into())), Some("ok".into()));
        assert_eq!(normalize_optional(None), None);
    }
}
