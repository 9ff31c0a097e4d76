//! Record configuration and validation.
//!
//! [`RecordConfig`] is the builder input for
//! [`RecordImpl::with_config`](crate::RecordImpl::with_config).
//! [`validate()`](RecordConfig::validate) checks structural invariants
//! before a record is constructed.

use condor_core::ConfigError;
use condor_proxy::MaterializePolicy;

/// Behaviour switches for one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordConfig {
    /// How concurrent first accesses to an empty provider slot are
    /// resolved. Default: [`MaterializePolicy::Exclusive`].
    pub materialize: MaterializePolicy,
    /// Treat invalid tokens (uninitialized, or minted for another
    /// transition) as fatal programming errors and panic. When `false`
    /// they surface as an `InvalidToken` failure on the returned handle.
    /// Default: on in debug builds, off in release builds.
    pub strict_tokens: bool,
    /// Serve an unlabeled request `(T, "")` from the only provider of `T`
    /// when no unlabeled provider exists. Default: `false`.
    pub default_label_fallback: bool,
    /// Upper bound on distinct transitions minting tokens against the
    /// record. Default: 16. Minimum: 1.
    pub max_transitions: usize,
}

impl RecordConfig {
    /// Default transition limit.
    pub const DEFAULT_MAX_TRANSITIONS: usize = 16;

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_transitions == 0 {
            return Err(ConfigError::ZeroTransitions);
        }
        Ok(())
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            materialize: MaterializePolicy::default(),
            strict_tokens: cfg!(debug_assertions),
            default_label_fallback: false,
            max_transitions: Self::DEFAULT_MAX_TRANSITIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RecordConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.materialize, MaterializePolicy::Exclusive);
        assert_eq!(config.strict_tokens, cfg!(debug_assertions));
        assert!(!config.default_label_fallback);
        assert_eq!(config.max_transitions, RecordConfig::DEFAULT_MAX_TRANSITIONS);
    }

    #[test]
    fn zero_transitions_rejected() {
        let config = RecordConfig {
            max_transitions: 0,
            ..RecordConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTransitions));
    }
}
