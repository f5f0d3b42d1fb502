use thiserror::Error;

/// Error type for dive planning and gas-text parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("gas {gas} is not available on any cylinder")]
    GasNotAvailable { gas: String },

    #[error("too many gas mixes")]
    TooManyGasMixes,

    #[error("invalid gas '{input}': {message}")]
    InvalidGas { input: String, message: String },

    #[error("invalid pO2 '{input}': {message}")]
    InvalidPo2 { input: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_error_display() {
        let err = PlanError::GasNotAvailable {
            gas: "EAN50".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "gas EAN50 is not available on any cylinder"
        );

        let err = PlanError::TooManyGasMixes;
        assert_eq!(err.to_string(), "too many gas mixes");

        let err = PlanError::InvalidGas {
            input: "21/80".to_string(),
            message: "fractions exceed 1000 permille".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid gas '21/80': fractions exceed 1000 permille"
        );
    }
}
