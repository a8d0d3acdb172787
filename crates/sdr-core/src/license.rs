//! Process-wide license gate. It must be passed once before any store hands
//! data to a transform engine.

use std::sync::OnceLock;

use tracing::info;

use crate::transform::TransformStatus;

static LICENSEE: OnceLock<Licensee> = OnceLock::new();

/// Company the process is licensed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Licensee {
    pub company: String,
}

/// Initialize the license. Idempotent: the first successful call wins and
/// later calls with non-blank values are no-ops.
pub fn init_license(company: &str, key: &str) -> Result<&'static Licensee, TransformStatus> {
    if company.trim().is_empty() || key.trim().is_empty() {
        return Err(TransformStatus::LicenseError);
    }

    let licensee = LICENSEE.get_or_init(|| {
        info!(company = company.trim(), "license initialized");
        Licensee {
            company: company.trim().to_string(),
        }
    });
    Ok(licensee)
}

pub fn licensee() -> Option<&'static Licensee> {
    LICENSEE.get()
}

pub fn is_initialized() -> bool {
    LICENSEE.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert_eq!(
            init_license("  ", "key").unwrap_err(),
            TransformStatus::LicenseError
        );
        assert_eq!(
            init_license("Acme", "").unwrap_err(),
            TransformStatus::LicenseError
        );
    }

    #[test]
    fn init_is_idempotent() {
        let first = init_license("Acme", "LICENSE-KEY").expect("first init");
        let second = init_license("Other", "LICENSE-KEY").expect("second init");
        assert_eq!(first, second);
        assert!(is_initialized());
        assert_eq!(licensee(), Some(first));
    }
}
