use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Built-in tuning profile. `Accuracy` casts the widest nets; `Speed`
/// tightens every window and threshold for large statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Speed,
    Accuracy,
}

impl Mode {
    pub fn config(self) -> MatchConfig {
        match self {
            Self::Accuracy => MatchConfig {
                amount_tolerance_cents: 5,
                amount_tolerance_loose_cents: 150,
                date_window_strict: 3,
                date_window_loose: 10,
                date_window_reference: 45,
                fuzzy_text_threshold: 0.60,
                max_combination_depth: 4,
            },
            Self::Speed => MatchConfig {
                amount_tolerance_cents: 5,
                amount_tolerance_loose_cents: 150,
                date_window_strict: 1,
                date_window_loose: 3,
                date_window_reference: 10,
                fuzzy_text_threshold: 0.85,
                max_combination_depth: 2,
            },
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Speed => write!(f, "speed"),
            Self::Accuracy => write!(f, "accuracy"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tuning options
// ---------------------------------------------------------------------------

/// Cascade tuning. Amounts are integer cents, windows are whole days.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Amount tolerance for every pass except the loose-amount pass.
    pub amount_tolerance_cents: i64,
    /// Amount tolerance for the loose-amount, strong-text pass.
    pub amount_tolerance_loose_cents: i64,
    /// Date window for the strict-window and combination passes.
    pub date_window_strict: i64,
    /// Date window for the fuzzy-date pass.
    pub date_window_loose: i64,
    /// Date window for the reference-id pass.
    pub date_window_reference: i64,
    /// Minimum raw text similarity accepted by the fuzzy-date pass.
    pub fuzzy_text_threshold: f64,
    /// Subset size bound for split/merge search. Zero disables the
    /// combination passes entirely.
    pub max_combination_depth: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Mode::Accuracy.config()
    }
}

impl MatchConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: MatchConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.amount_tolerance_cents < 0 || self.amount_tolerance_loose_cents < 0 {
            return Err(ReconError::ConfigValidation(
                "amount tolerances must be non-negative".into(),
            ));
        }
        if self.amount_tolerance_loose_cents < self.amount_tolerance_cents {
            return Err(ReconError::ConfigValidation(format!(
                "loose amount tolerance ({}) must be at least the strict tolerance ({})",
                self.amount_tolerance_loose_cents, self.amount_tolerance_cents
            )));
        }
        if self.date_window_strict < 0
            || self.date_window_loose < 0
            || self.date_window_reference < 0
        {
            return Err(ReconError::ConfigValidation(
                "date windows must be non-negative".into(),
            ));
        }
        if self.date_window_loose < self.date_window_strict {
            return Err(ReconError::ConfigValidation(format!(
                "loose date window ({}) must be at least the strict window ({})",
                self.date_window_loose, self.date_window_strict
            )));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_text_threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "fuzzy text threshold must be in [0, 1], got {}",
                self.fuzzy_text_threshold
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_differ_where_expected() {
        let accuracy = Mode::Accuracy.config();
        let speed = Mode::Speed.config();
        assert_eq!(accuracy.amount_tolerance_cents, speed.amount_tolerance_cents);
        assert_eq!(
            accuracy.amount_tolerance_loose_cents,
            speed.amount_tolerance_loose_cents
        );
        assert!(speed.date_window_strict < accuracy.date_window_strict);
        assert!(speed.date_window_loose < accuracy.date_window_loose);
        assert!(speed.date_window_reference < accuracy.date_window_reference);
        assert!(speed.fuzzy_text_threshold > accuracy.fuzzy_text_threshold);
        assert!(speed.max_combination_depth < accuracy.max_combination_depth);
    }

    #[test]
    fn from_toml_partial_override() {
        let config = MatchConfig::from_toml(
            "date_window_strict = 2\nfuzzy_text_threshold = 0.7\n",
        )
        .unwrap();
        assert_eq!(config.date_window_strict, 2);
        assert_eq!(config.fuzzy_text_threshold, 0.7);
        // Untouched fields fall back to the accuracy profile.
        assert_eq!(config.date_window_reference, 45);
        assert_eq!(config.max_combination_depth, 4);
    }

    #[test]
    fn validate_rejects_inverted_tolerances() {
        let toml = "amount_tolerance_cents = 200\namount_tolerance_loose_cents = 100\n";
        assert!(matches!(
            MatchConfig::from_toml(toml),
            Err(ReconError::ConfigValidation(_))
        ));
    }

    #[test]
    fn validate_rejects_threshold_out_of_range() {
        let toml = "fuzzy_text_threshold = 1.5\n";
        assert!(matches!(
            MatchConfig::from_toml(toml),
            Err(ReconError::ConfigValidation(_))
        ));
    }

    #[test]
    fn validate_rejects_inverted_windows() {
        let toml = "date_window_strict = 5\ndate_window_loose = 2\n";
        assert!(matches!(
            MatchConfig::from_toml(toml),
            Err(ReconError::ConfigValidation(_))
        ));
    }
}
