use serde::{Deserialize, Serialize};
use time::Date;

/// Which rules are active and at what severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Every check; checks flagged `escalate_in_strict` become errors.
    Strict,
    #[default]
    Normal,
    /// Required-ness of steps not yet reached is suppressed.
    Lenient,
}

impl std::str::FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "normal" => Ok(ValidationMode::Normal),
            "lenient" | "partial" => Ok(ValidationMode::Lenient),
            other => Err(format!(
                "unknown validation mode '{}' (expected strict, normal or lenient)",
                other
            )),
        }
    }
}

/// Inputs to a validation run besides the record itself.
///
/// `today` is supplied by the caller so that a run is a pure function of
/// its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    pub mode: ValidationMode,
    pub today: Date,
    /// Furthest wizard step the user has reached (1-based). Only
    /// consulted in lenient mode.
    pub reached_step: u32,
}

impl ValidationContext {
    pub fn new(today: Date) -> Self {
        ValidationContext {
            mode: ValidationMode::Normal,
            today,
            reached_step: u32::MAX,
        }
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn reached(mut self, step: u32) -> Self {
        self.reached_step = step;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_partial_as_lenient() {
        assert_eq!("partial".parse::<ValidationMode>(), Ok(ValidationMode::Lenient));
        assert_eq!("strict".parse::<ValidationMode>(), Ok(ValidationMode::Strict));
        assert!("loose".parse::<ValidationMode>().is_err());
    }
}
