use ens_core::errors::{ErrorInfo, NestError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("ndim", "3")
        .with_context("points", "2")
}

#[test]
fn degenerate_error_is_recoverable() {
    let err = NestError::Degenerate(sample_info("too-few-points", "need ndim + 1 points"));
    assert_eq!(err.info().code, "too-few-points");
    assert!(err.info().context.contains_key("ndim"));
    assert!(err.is_recoverable());
}

#[test]
fn stalled_error_is_fatal() {
    let err = NestError::SamplingStalled(
        sample_info("attempt-cap", "no better point found").with_hint("raise max_attempts"),
    );
    assert!(!err.is_recoverable());
    let rendered = err.to_string();
    assert!(rendered.starts_with("sampling stalled: no better point found (code: attempt-cap)"));
    assert!(rendered.contains("ndim=3"));
    assert!(rendered.ends_with("hint: raise max_attempts"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = NestError::InvalidShape(ErrorInfo::new("negative-determinant", "det < 0"));
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["family"], "InvalidShape");
    assert_eq!(json["detail"]["code"], "negative-determinant");
    let back: NestError = serde_json::from_value(json).unwrap();
    assert_eq!(back, err);
}
