//! Homebrew tap that generated recipes are published into

use crate::recipe::Recipe;
use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A `user/name` tap. Recipes reference each other through it in `depends_on`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tap {
    user: String,
    name: String,
}

impl Tap {
    /// Parse `"user/repo"` (or `"user/homebrew-repo"`).
    pub fn parse(tap: &str) -> Result<Self> {
        let parts: Vec<&str> = tap.split('/').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(anyhow!(
                "Invalid tap name format. Expected 'user/repo', got '{}'",
                tap
            ));
        }

        let name = parts[1].strip_prefix("homebrew-").unwrap_or(parts[1]);
        if name.is_empty() {
            return Err(anyhow!("Tap '{}' has an empty repository name", tap));
        }

        Ok(Self {
            user: parts[0].to_string(),
            name: name.to_string(),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Git repository backing the tap
    pub fn repository_name(&self) -> String {
        format!("homebrew-{}", self.name)
    }

    /// Where Homebrew keeps this tap under `brew_root`
    pub fn directory(&self, brew_root: &Path) -> PathBuf {
        brew_root
            .join("Library/Taps")
            .join(&self.user)
            .join(self.repository_name())
    }
}

impl fmt::Display for Tap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.name)
    }
}

/// Write recipes into `dir`, creating it if needed. Returns the written paths.
pub fn write_recipes(dir: &Path, recipes: &[Recipe]) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let mut written = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let path = dir.join(&recipe.file_name);
        fs::write(&path, &recipe.contents)
            .with_context(|| format!("Failed to write recipe: {}", path.display()))?;
        written.push(path);
    }

    Ok(written)
}
