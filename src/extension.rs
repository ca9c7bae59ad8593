//! Helper methods injected into a formula only when compilation used them.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Extension {
    /// `environment(actions)`: persists explicit environment edits into the keg
    Environment,
}

/// Extensions referenced while compiling one package
pub type Extensions = BTreeSet<Extension>;

const ENVIRONMENT: &[&str] = &[
    "def environment(actions)",
    "  # Setup environment variable modifications that will be used later by",
    "  # platform-brew's env and vinstall commands.",
    "  act_hash = {\"actions\" => actions}",
    "  (prefix / \"platform_environment.json\").write act_hash.to_json",
    "end",
];

impl Extension {
    /// Modules the snippet needs at top level
    pub fn requires(self) -> &'static [&'static str] {
        match self {
            Self::Environment => &["json"],
        }
    }

    /// Snippet lines, relative to the class body indent
    pub fn snippet(self) -> &'static [&'static str] {
        match self {
            Self::Environment => ENVIRONMENT,
        }
    }
}

/// Distinct modules required by a set of extensions, in a stable order.
pub fn required_modules(extensions: &Extensions) -> BTreeSet<&'static str> {
    extensions
        .iter()
        .flat_map(|ext| ext.requires().iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_snippet_is_balanced() {
        let snippet = Extension::Environment.snippet();
        assert!(snippet[0].starts_with("def environment"));
        assert_eq!(*snippet.last().unwrap(), "end");
    }

    #[test]
    fn test_required_modules() {
        let mut extensions = Extensions::new();
        assert!(required_modules(&extensions).is_empty());
        extensions.insert(Extension::Environment);
        extensions.insert(Extension::Environment);
        assert_eq!(required_modules(&extensions).into_iter().collect::<Vec<_>>(), vec!["json"]);
    }
}
