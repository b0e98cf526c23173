use alloc::string::String;
use alloc::vec::Vec;

use dec_reflect::walker::Limits;
use serde::{Deserialize, Serialize};

/// Runtime settings of an [`Engine`](crate::Engine).
///
/// Every field has a default, so a partial document deserializes:
///
/// ```
/// # use dec_defs::EngineConfig;
/// let config: EngineConfig = serde_json::from_str(r#"{ "pretty": false }"#).unwrap();
/// assert!(!config.pretty);
/// assert_eq!(config.depth_limit, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Namespace prefixes tried, in order, when resolving short type names.
    pub namespace_prefixes: Vec<String>,
    /// Depth below a reference record at which shared objects become
    /// references of their own.
    pub depth_limit: usize,
    /// Write recursion depth after which shared objects are deferred.
    pub max_recursion_depth: usize,
    /// Indents written documents.
    pub pretty: bool,
    /// Panics on the first reported error, after logging it.
    pub strict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            namespace_prefixes: Vec::new(),
            depth_limit: limits.depth_limit,
            max_recursion_depth: limits.max_recursion_depth,
            pretty: true,
            strict: true,
        }
    }
}

impl EngineConfig {
    /// A configuration which only logs errors.
    #[inline]
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    #[inline]
    pub fn limits(&self) -> Limits {
        Limits {
            depth_limit: self.depth_limit,
            max_recursion_depth: self.max_recursion_depth,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;

    use super::EngineConfig;

    #[test]
    fn config_round_trips_through_json() {
        let config = EngineConfig {
            namespace_prefixes: vec![String::from("game.items")],
            depth_limit: 4,
            ..EngineConfig::lenient()
        };
        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains(r#""strict":false"#), "{text}");
        let back: EngineConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.limits().depth_limit, 4);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_recursion_depth, 100);
        assert!(config.strict && config.pretty);
    }
}
