//! Input validation for new and updated credentials.

use chrono::{DateTime, Datelike, Utc};
use forge_types::{CredentialDraft, CredentialMetadata, CredentialType, Visibility};

use crate::CodecError;

const MAX_RATING: f64 = 5.0;

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, CodecError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CodecError::Validation(format!("missing required field: {field}"))),
    }
}

/// Ratings are stored in tenths.
fn check_rating(rating: Option<f64>) -> Result<(), CodecError> {
    match rating {
        Some(r) if !r.is_finite() || !(0.0..=MAX_RATING).contains(&r) => Err(
            CodecError::Validation(format!("rating {r} is outside 0..={MAX_RATING}")),
        ),
        Some(r) if ((r * 10.0).round() - r * 10.0).abs() > 1e-6 => Err(CodecError::Validation(
            format!("rating {r} has more precision than tenths"),
        )),
        _ => Ok(()),
    }
}

fn check_timestamp(timestamp: DateTime<Utc>) -> Result<(), CodecError> {
    if (0..=9999).contains(&timestamp.year()) {
        Ok(())
    } else {
        Err(CodecError::Validation(format!(
            "timestamp year {} is outside 0000..=9999",
            timestamp.year()
        )))
    }
}

/// Turn loosely typed input into validated metadata.
///
/// `credential_type`, `name`, `description`, `issuer` and `timestamp` must be
/// present; `name` and `issuer` must also be non-blank. Visibility defaults to
/// public when absent but must be `public` or `private` when given.
pub fn validate_draft(draft: &CredentialDraft) -> Result<CredentialMetadata, CodecError> {
    let type_text = required(&draft.credential_type, "credential_type")?;
    let credential_type: CredentialType = type_text
        .parse()
        .map_err(|e| CodecError::Validation(format!("{e}")))?;

    let name = required(&draft.name, "name")?;
    let issuer = required(&draft.issuer, "issuer")?;
    let description = draft
        .description
        .as_deref()
        .ok_or_else(|| CodecError::Validation("missing required field: description".into()))?;

    let ts_text = required(&draft.timestamp, "timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(ts_text)
        .map_err(|e| CodecError::Validation(format!("invalid timestamp {ts_text:?}: {e}")))?
        .with_timezone(&Utc);

    let visibility = match draft.visibility.as_deref().map(str::trim) {
        None | Some("") => Visibility::default(),
        Some(v) => v
            .parse::<Visibility>()
            .map_err(|e| CodecError::Validation(format!("{e}")))?,
    };

    check_rating(draft.rating)?;

    let proof_hash = draft
        .proof_hash
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    Ok(CredentialMetadata {
        credential_type,
        name: name.to_string(),
        description: description.to_string(),
        issuer: issuer.to_string(),
        rating: draft.rating,
        timestamp,
        visibility,
        proof_hash,
    })
}

/// Check invariants of already-typed metadata before it is encoded.
pub fn validate_metadata(metadata: &CredentialMetadata) -> Result<(), CodecError> {
    if metadata.name.trim().is_empty() {
        return Err(CodecError::Validation("missing required field: name".into()));
    }
    if metadata.issuer.trim().is_empty() {
        return Err(CodecError::Validation("missing required field: issuer".into()));
    }
    check_timestamp(metadata.timestamp)?;
    check_rating(metadata.rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> CredentialDraft {
        CredentialDraft {
            credential_type: Some("skill".into()),
            name: Some("Rust".into()),
            description: Some("Systems programming".into()),
            issuer: Some("Mozilla".into()),
            rating: None,
            timestamp: Some("2024-05-01T09:30:00Z".into()),
            visibility: None,
            proof_hash: None,
        }
    }

    #[test]
    fn complete_draft_validates() {
        let meta = validate_draft(&draft()).unwrap();
        assert_eq!(meta.credential_type, CredentialType::Skill);
        assert_eq!(meta.visibility, Visibility::Public);
        assert_eq!(meta.timestamp.to_rfc3339(), "2024-05-01T09:30:00+00:00");
    }

    #[test]
    fn missing_name_is_rejected() {
        let mut d = draft();
        d.name = None;
        assert_eq!(
            validate_draft(&d).unwrap_err(),
            CodecError::Validation("missing required field: name".into())
        );
    }

    #[test]
    fn blank_issuer_is_rejected() {
        let mut d = draft();
        d.issuer = Some("   ".into());
        assert!(matches!(validate_draft(&d), Err(CodecError::Validation(_))));
    }

    #[test]
    fn empty_description_is_allowed_but_absent_is_not() {
        let mut d = draft();
        d.description = Some(String::new());
        assert!(validate_draft(&d).is_ok());
        d.description = None;
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut d = draft();
        d.credential_type = Some("badge".into());
        let err = validate_draft(&d).unwrap_err();
        assert!(err.to_string().contains("badge"));
    }

    #[test]
    fn bad_visibility_is_rejected() {
        let mut d = draft();
        d.visibility = Some("hidden".into());
        assert!(validate_draft(&d).is_err());
        d.visibility = Some("private".into());
        assert_eq!(validate_draft(&d).unwrap().visibility, Visibility::Private);
    }

    #[test]
    fn rating_bounds() {
        let mut d = draft();
        d.rating = Some(5.0);
        assert!(validate_draft(&d).is_ok());
        d.rating = Some(5.1);
        assert!(validate_draft(&d).is_err());
        d.rating = Some(-0.1);
        assert!(validate_draft(&d).is_err());
        d.rating = Some(f64::NAN);
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn rating_finer_than_tenths_is_rejected() {
        let mut d = draft();
        d.rating = Some(4.3);
        assert!(validate_draft(&d).is_ok());
        d.rating = Some(4.25);
        let err = validate_draft(&d).unwrap_err();
        assert!(err.to_string().contains("tenths"));
    }

    #[test]
    fn timestamp_beyond_four_digit_years_is_rejected() {
        let mut meta = validate_draft(&draft()).unwrap();
        meta.timestamp = chrono::TimeZone::with_ymd_and_hms(&Utc, 10_000, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(validate_metadata(&meta), Err(CodecError::Validation(_))));
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let mut d = draft();
        d.timestamp = Some("last tuesday".into());
        assert!(validate_draft(&d).is_err());
    }

    #[test]
    fn blank_proof_hash_is_dropped() {
        let mut d = draft();
        d.proof_hash = Some("  ".into());
        assert_eq!(validate_draft(&d).unwrap().proof_hash, None);
    }
}
