pub type AcwfResult<T> = Result<T, AcwfError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcwfErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl AcwfErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }
}

/// Error raised by every fallible analysis step.
///
/// The placeholder is a stable dotted code (`INPUT.SCRIPT_VERSION`,
/// `RUN.REFERENCE_DISAGREEMENT`, ...) that scripts can match on without
/// parsing the free-form message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} [{}] {}", .category.as_str(), .placeholder, .message)]
pub struct AcwfError {
    category: AcwfErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl AcwfError {
    pub fn new(
        category: AcwfErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(AcwfErrorCategory::InputValidationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(AcwfErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(AcwfErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(AcwfErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> AcwfErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::{AcwfError, AcwfErrorCategory};

    #[test]
    fn exit_codes_are_stable_per_category() {
        let cases = [
            (AcwfErrorCategory::InputValidationError, 2, "InputValidationError"),
            (AcwfErrorCategory::IoSystemError, 3, "IoSystemError"),
            (AcwfErrorCategory::ComputationError, 4, "ComputationError"),
            (AcwfErrorCategory::InternalError, 5, "InternalError"),
        ];

        for (category, exit_code, name) in cases {
            assert_eq!(category.exit_code(), exit_code);
            assert_eq!(category.as_str(), name);
        }
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = AcwfError::input_validation(
            "INPUT.SCRIPT_VERSION",
            "unsupported script_version '0.0.1'",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [INPUT.SCRIPT_VERSION] unsupported script_version '0.0.1'"
        );
        assert_eq!(error.fatal_exit_line(), "FATAL EXIT CODE: 2");
        assert_eq!(
            error.to_string(),
            "InputValidationError [INPUT.SCRIPT_VERSION] unsupported script_version '0.0.1'"
        );
    }

    #[test]
    fn every_category_is_reported_as_fatal() {
        let errors = [
            AcwfError::input_validation("INPUT.X", "bad input"),
            AcwfError::io_system("IO.X", "disk gone"),
            AcwfError::computation("RUN.X", "diverged"),
            AcwfError::internal("SYS.X", "table broken"),
        ];
        for error in errors {
            assert!(error.diagnostic_line().starts_with("ERROR: ["));
            assert_eq!(
                error.fatal_exit_line(),
                format!("FATAL EXIT CODE: {}", error.category().exit_code())
            );
        }
    }
}
