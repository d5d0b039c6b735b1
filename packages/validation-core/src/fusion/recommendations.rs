//! Deterministic flag-to-recommendation text. Fixed mapping, per the
//! "deterministic text... fixed mapping" rule in the fusion design.

pub fn derive_recommendations(flags: &[String]) -> Vec<String> {
    let mut recommendations = Vec::new();

    if flags.iter().any(|f| f.starts_with("MISSING_")) {
        recommendations.push("provide missing critical fields".to_string());
    }
    if flags.iter().any(|f| f == "LOW_CONFIDENCE_EMAIL" || f == "INVALID_EMAIL") {
        recommendations.push("verify email domain".to_string());
    }
    if flags.iter().any(|f| f == "LOW_CONFIDENCE_PRIMARY_PHONE" || f == "INVALID_PHONE") {
        recommendations.push("verify phone number".to_string());
    }
    if flags.iter().any(|f| f == "INVALID_IDENTIFIER") {
        recommendations.push("correct the national identifier and resubmit".to_string());
    }
    if flags.contains(&"SUSPENDED_LICENSE".to_string()) {
        recommendations.push("confirm license status with the issuing board before approving".to_string());
    }
    if flags.contains(&"REVOKED_LICENSE".to_string()) {
        recommendations.push("provider's license has been revoked; escalate for review".to_string());
    }
    if flags.contains(&"EXPIRED_LICENSE".to_string()) {
        recommendations.push("request updated license documentation".to_string());
    }
    if flags.iter().any(|f| f.starts_with("FAILED_")) {
        recommendations.push("retry validation once the affected source is reachable".to_string());
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_maps_to_fixed_text() {
        let flags = vec!["MISSING_IDENTIFIER".to_string()];
        let recs = derive_recommendations(&flags);
        assert_eq!(recs, vec!["provide missing critical fields".to_string()]);
    }

    #[test]
    fn no_flags_yields_no_recommendations() {
        assert!(derive_recommendations(&[]).is_empty());
    }
}
