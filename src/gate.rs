//! Round-trip checks that must pass before a trial's numbers are kept.

use crate::fixture::{first_difference, DesiredLrp};

/// Decoded single-record frame must be exactly `[template]`.
pub fn check_single(template: &DesiredLrp, decoded: &[DesiredLrp]) -> Result<(), String> {
    match decoded {
        [record] => check_record(template, record),
        _ => Err(format!("expected 1 record, decoded {}", decoded.len())),
    }
}

/// Decoded bulk frame must keep the collection length and start with the template.
pub fn check_bulk(
    template: &DesiredLrp,
    expected_len: usize,
    decoded: &[DesiredLrp],
) -> Result<(), String> {
    if decoded.len() != expected_len {
        return Err(format!(
            "expected {expected_len} records, decoded {}",
            decoded.len()
        ));
    }
    match decoded.first() {
        Some(first) => check_record(template, first).map_err(|e| format!("record 0: {e}")),
        None => Ok(()),
    }
}

fn check_record(template: &DesiredLrp, decoded: &DesiredLrp) -> Result<(), String> {
    if template == decoded {
        return Ok(());
    }
    let field = first_difference(template, decoded).unwrap_or_else(|| "<unknown>".to_string());
    Err(format!("field `{field}` differs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::build_template;

    #[test]
    fn test_single_accepts_exact_copy() {
        let t = build_template();
        assert!(check_single(&t, &[t.clone()]).is_ok());
    }

    #[test]
    fn test_single_rejects_wrong_count() {
        let t = build_template();
        assert!(check_single(&t, &[]).is_err());
        assert!(check_single(&t, &[t.clone(), t.clone()]).is_err());
    }

    #[test]
    fn test_single_names_differing_field() {
        let t = build_template();
        let mut altered = t.clone();
        altered.log_guid.push('x');

        let err = check_single(&t, &[altered]).unwrap_err();
        assert!(err.contains("log_guid"), "{err}");
    }

    #[test]
    fn test_bulk_checks_length_then_first_record() {
        let t = build_template();
        let bulk = vec![t.clone(); 4];
        assert!(check_bulk(&t, 4, &bulk).is_ok());

        let err = check_bulk(&t, 5, &bulk).unwrap_err();
        assert!(err.contains("expected 5 records"), "{err}");

        let mut altered = bulk.clone();
        altered[0].privileged = false;
        let err = check_bulk(&t, 4, &altered).unwrap_err();
        assert!(err.contains("record 0") && err.contains("privileged"), "{err}");
    }

    #[test]
    fn test_empty_bulk_is_consistent() {
        let t = build_template();
        assert!(check_bulk(&t, 0, &[]).is_ok());
    }
}
