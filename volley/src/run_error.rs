use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::RuntimeError(e) => e,
        }
    }
}

impl From<volley_core::Error> for RunError {
    fn from(err: volley_core::Error) -> Self {
        match err {
            volley_core::Error::Config(_) => Self::InvalidInput(err.into()),
            volley_core::Error::Engine(_) => Self::RuntimeError(err.into()),
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.anyhow())
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volley_core::{ConfigError, EngineFault};

    #[test]
    fn core_errors_are_classified() {
        let e = RunError::from(volley_core::Error::from(ConfigError::InvalidVus));
        assert_eq!(e.exit_code(), ExitCode::InvalidInput);
        assert!(e.to_string().contains("`vus` must be a positive integer"));

        let e = RunError::from(volley_core::Error::from(EngineFault::VuTask {
            vu_id: 3,
            reason: "cancelled".to_string(),
        }));
        assert_eq!(e.exit_code(), ExitCode::RuntimeError);
    }
}
