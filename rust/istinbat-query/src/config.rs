use serde::{Deserialize, Serialize};

/// Default bound on the number of nested goals a proof may have open
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Knobs that govern how queries are resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Queries abort with [`QueryError::DepthExceeded`](crate::QueryError::DepthExceeded)
    /// once a goal this deep is reached
    pub max_depth: usize,
    /// Treat calls to predicates that were never asserted as errors instead
    /// of failing them under the closed-world assumption
    pub strict: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }
}

impl ResolverConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_their_defaults() {
        let config: ResolverConfig = serde_json::from_str(r#"{ "strict": true }"#).unwrap();
        assert_eq!(config, ResolverConfig::default().with_strict(true));
    }
}
