//! Runtime configuration.

/// Name of the root class every runtime starts with.
pub const ROOT_CLASS_NAME: &str = "Object";

/// Prefix prepended to an original class name to name its override subclass.
///
/// `Shape` gets `Eigen_Shape`. The name only has to be deterministic and
/// unlikely to collide with host classes; identity is tracked by class id.
pub const DEFAULT_SUBCLASS_PREFIX: &str = "Eigen_";

/// Default maximum depth of a class below the root.
///
/// Bounds the ancestor walk every dispatch and original-implementation lookup
/// performs. A synthesized subclass counts as one extra level.
pub const MAX_INHERITANCE_DEPTH: usize = 1000;

/// Configuration for a [`Runtime`](crate::Runtime).
///
/// Missing fields take their defaults when deserialized, so a host can load
/// a partial configuration:
///
/// ```
/// use eigenclass::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json(r#"{"subclass_prefix": "Patched_"}"#).unwrap();
/// assert_eq!(config.subclass_prefix, "Patched_");
/// assert_eq!(config.max_synthesized_subclasses, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Prefix used to derive override subclass names.
    pub subclass_prefix: String,
    /// Maximum class depth below the root, `None` for unlimited.
    pub max_inheritance_depth: Option<usize>,
    /// Maximum number of override subclasses the registry may create.
    ///
    /// Override subclasses are never freed, so this bounds the registry's
    /// growth for hosts that bind objects of many distinct classes.
    pub max_synthesized_subclasses: Option<usize>,
}

impl RuntimeConfig {
    /// Creates the default configuration: `Eigen_` prefix, depth limited to
    /// [`MAX_INHERITANCE_DEPTH`], unlimited override subclasses.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subclass_prefix: DEFAULT_SUBCLASS_PREFIX.to_owned(),
            max_inheritance_depth: Some(MAX_INHERITANCE_DEPTH),
            max_synthesized_subclasses: None,
        }
    }

    #[must_use]
    pub fn with_subclass_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subclass_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_max_inheritance_depth(mut self, depth: Option<usize>) -> Self {
        self.max_inheritance_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_synthesized_subclasses(mut self, limit: Option<usize>) -> Self {
        self.max_synthesized_subclasses = limit;
        self
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Name of the override subclass for a class called `original`.
    #[must_use]
    pub fn subclass_name(&self, original: &str) -> String {
        format!("{}{original}", self.subclass_prefix)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(RuntimeConfig::from_json("{}").unwrap(), RuntimeConfig::new());
    }

    #[test]
    fn builder_overrides_fields() {
        let config = RuntimeConfig::new()
            .with_subclass_prefix("X_")
            .with_max_inheritance_depth(None)
            .with_max_synthesized_subclasses(Some(4));
        assert_eq!(
            config,
            RuntimeConfig {
                subclass_prefix: "X_".to_owned(),
                max_inheritance_depth: None,
                max_synthesized_subclasses: Some(4),
            }
        );
        assert_eq!(config.subclass_name("Shape"), "X_Shape");
    }

    #[test]
    fn unknown_json_types_are_rejected() {
        assert!(RuntimeConfig::from_json(r#"{"max_inheritance_depth": "deep"}"#).is_err());
    }
}
