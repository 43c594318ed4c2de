use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use super::iteration::CheckRecord;

/// Evaluate a named predicate. A panicking predicate becomes a failed check carrying
/// the panic message; it never unwinds into the VU.
pub(crate) fn evaluate<T: ?Sized>(
    value: &T,
    name: &str,
    predicate: impl FnOnce(&T) -> bool,
) -> CheckRecord {
    match catch_unwind(AssertUnwindSafe(|| predicate(value))) {
        Ok(passed) => CheckRecord {
            name: name.to_string(),
            passed,
            error: None,
        },
        Err(payload) => CheckRecord {
            name: name.to_string(),
            passed: false,
            error: Some(panic_message(payload.as_ref())),
        },
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_predicate_result() {
        let status = 200u16;
        let ok = evaluate(&status, "status is 200", |s| *s == 200);
        assert_eq!(
            ok,
            CheckRecord {
                name: "status is 200".to_string(),
                passed: true,
                error: None,
            }
        );

        let bad = evaluate(&status, "status is 404", |s| *s == 404);
        assert!(!bad.passed);
        assert_eq!(bad.error, None);
    }

    #[test]
    fn panicking_predicate_is_a_failed_check() {
        let body: &[u8] = b"";
        let rec = evaluate(body, "first byte is {", |b| b[0] == b'{');
        assert!(!rec.passed);
        assert!(
            rec.error
                .as_deref()
                .is_some_and(|e| e.contains("index out of bounds")),
            "unexpected error: {:?}",
            rec.error
        );
    }
}
