use std::fmt;

/// Non-success statuses an engine can report. Codes are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformStatus {
    InvalidPassword,
    InvalidInput,
    BufferTooSmall,
    AuthenticationFailed,
    StateError,
    LicenseError,
}

impl TransformStatus {
    pub const ALL: [TransformStatus; 6] = [
        TransformStatus::InvalidPassword,
        TransformStatus::InvalidInput,
        TransformStatus::BufferTooSmall,
        TransformStatus::AuthenticationFailed,
        TransformStatus::StateError,
        TransformStatus::LicenseError,
    ];

    pub fn code(self) -> u32 {
        match self {
            TransformStatus::InvalidPassword => 1,
            TransformStatus::InvalidInput => 2,
            TransformStatus::BufferTooSmall => 3,
            TransformStatus::AuthenticationFailed => 4,
            TransformStatus::StateError => 5,
            TransformStatus::LicenseError => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TransformStatus::InvalidPassword => "invalid_password",
            TransformStatus::InvalidInput => "invalid_input",
            TransformStatus::BufferTooSmall => "buffer_too_small",
            TransformStatus::AuthenticationFailed => "authentication_failed",
            TransformStatus::StateError => "state_error",
            TransformStatus::LicenseError => "license_error",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TransformStatus::InvalidPassword => {
                "password must be at least 8 bytes with no byte value repeated more than twice, or a GUID"
            }
            TransformStatus::InvalidInput => "input is truncated or malformed",
            TransformStatus::BufferTooSmall => "output buffer is smaller than the reported requirement",
            TransformStatus::AuthenticationFailed => {
                "ciphertext failed authentication (wrong password or tampered data)"
            }
            TransformStatus::StateError => "state block does not match the engine's layout",
            TransformStatus::LicenseError => "license has not been initialized or is invalid",
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }
}

impl fmt::Display for TransformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.description())
    }
}

impl std::error::Error for TransformStatus {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique_and_resolvable() {
        for status in TransformStatus::ALL {
            assert_eq!(TransformStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(TransformStatus::from_code(0), None);
    }

    #[test]
    fn display_includes_name_and_code() {
        let shown = TransformStatus::BufferTooSmall.to_string();
        assert!(shown.starts_with("buffer_too_small (3)"));
    }
}
