//! Runtime settings: which tool shed the descriptors came from and where the
//! Homebrew installation (and therefore the tap) lives.

use crate::tap::Tap;
use anyhow::Result;
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_GIT_USER: &str = "jmchilton";

/// Known package indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ToolShed {
    #[default]
    Toolshed,
    Testtoolshed,
}

impl ToolShed {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Toolshed => "toolshed",
            Self::Testtoolshed => "testtoolshed",
        }
    }

    pub fn url(self) -> &'static str {
        match self {
            Self::Toolshed => "https://toolshed.g2.bx.psu.edu",
            Self::Testtoolshed => "https://testtoolshed.g2.bx.psu.edu",
        }
    }

    /// Tap recipes from this shed are published to by default: `<git_user>/<shed>`
    pub fn default_tap(self, git_user: &str) -> Result<Tap> {
        Tap::parse(&format!("{}/{}", git_user, self.as_str()))
    }
}

/// Homebrew root: explicit flag, then `HOMEBREW_PREFIX`, then the platform default.
pub fn resolve_brew_root(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(root) = explicit {
        return root;
    }

    if let Ok(prefix) = std::env::var("HOMEBREW_PREFIX")
        && !prefix.is_empty()
    {
        return PathBuf::from(prefix);
    }

    platform_brew_root()
}

fn platform_brew_root() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/usr/local")
    }
    #[cfg(not(target_os = "macos"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".linuxbrew")
    }
}
