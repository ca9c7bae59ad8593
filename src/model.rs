//! Input model: packages, their per-platform action sets, and the actions themselves.
//!
//! The model is produced by the descriptor parser (outside this crate) and arrives
//! here as JSON. It is read-only for the whole compile.
//!
//! # Example input
//!
//! ```json
//! {
//!   "name": "samtools",
//!   "version": "0.1.19",
//!   "repository": {"index_url": "https://toolshed.g2.bx.psu.edu", "owner": "devteam", "name": "package_samtools"},
//!   "action_sets": [
//!     {"actions": [
//!       {"type": "download_by_url", "url": "http://example.org/samtools-0.1.19.tar.gz"},
//!       {"type": "make_install"}
//!     ]}
//!   ]
//! }
//! ```

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A source of packages in the package index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Filled in from the selected tool shed when left empty.
    #[serde(default)]
    pub index_url: String,
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(index_url: &str, owner: &str, name: &str) -> Self {
        Self {
            index_url: index_url.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    /// Base name of recipes generated from this repository.
    ///
    /// Used both for the repository's own recipe files and for `depends_on`
    /// references from other recipes, so it must be stable.
    pub fn recipe_base_name(&self) -> String {
        format!("{}_{}", self.owner, self.name)
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Where the repository can be browsed in the index
    pub fn provenance_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.index_url.trim_end_matches('/'),
            self.owner,
            self.name
        )
    }
}

/// Reference to a package declared as a dependency
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageRef {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub readme: Option<String>,
    /// Set when the owning repository declares more than one package.
    #[serde(default)]
    pub shared_repository: bool,
    #[serde(default)]
    pub sub_dependencies: Vec<PackageRef>,
    pub action_sets: Vec<ActionSet>,
    pub repository: Repository,
}

impl Package {
    /// Name of the recipe, before class-name camel casing.
    pub fn recipe_name(&self) -> String {
        let base = self.repository.recipe_base_name();
        let raw = if self.shared_repository {
            format!("{}_{}", base, self.name)
        } else {
            base
        };
        sanitize_recipe_name(&raw)
    }
}

/// Collapse runs of `_` and map anything a file name or class can't carry to `_`.
fn sanitize_recipe_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && name.ends_with('_') {
            continue;
        }
        name.push(c);
    }
    name.trim_matches('_').to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Os {
    Linux,
    Darwin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "i386")]
    I386,
}

/// Actions scoped to an optional OS/architecture condition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionSet {
    #[serde(default)]
    pub os: Option<Os>,
    #[serde(default)]
    pub architecture: Option<Architecture>,
    #[serde(default, deserialize_with = "deserialize_actions")]
    pub actions: Vec<Action>,
    /// Dependencies declared only for this variant.
    #[serde(default)]
    pub packages: Vec<PackageRef>,
}

impl ActionSet {
    pub fn new(os: Option<Os>, architecture: Option<Architecture>, actions: Vec<Action>) -> Self {
        Self {
            os,
            architecture,
            actions,
            packages: Vec::new(),
        }
    }

    /// True for the fallback variant that applies when no condition matched.
    pub fn is_unconditioned(&self) -> bool {
        self.os.is_none() && self.architecture.is_none()
    }

    pub fn downloads(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(|a| a.is_download())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChmodEntry {
    pub mode: String,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Mutation {
    #[serde(rename = "set_to", alias = "set")]
    Set,
    #[serde(rename = "prepend_to", alias = "prepend")]
    Prepend,
    #[serde(rename = "append_to", alias = "append")]
    Append,
}

impl Mutation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Prepend => "prepend",
            Self::Append => "append",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvironmentEdit {
    pub action: Mutation,
    pub name: String,
    pub raw_value: String,
}

impl EnvironmentEdit {
    pub fn new(action: Mutation, name: &str, raw_value: &str) -> Self {
        Self {
            action,
            name: name.to_string(),
            raw_value: raw_value.to_string(),
        }
    }
}

fn default_extract() -> bool {
    true
}

/// One declarative install step.
///
/// Kinds outside the known vocabulary deserialize to [`Action::Unrecognized`] so the
/// dispatcher can annotate them instead of rejecting the whole descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    ShellCommand {
        command: String,
    },
    MoveFile {
        source: String,
        destination: String,
    },
    MoveDirectoryFiles {
        source_directory: String,
        destination_directory: String,
    },
    SetEnvironment {
        variables: Vec<EnvironmentEdit>,
    },
    Chmod {
        mods: Vec<ChmodEntry>,
    },
    DownloadByUrl {
        url: String,
    },
    DownloadFile {
        url: String,
        #[serde(default = "default_extract")]
        extract: bool,
    },
    MakeInstall,
    ChangeDirectory {
        directory: String,
    },
    MakeDirectory {
        directory: String,
    },
    SetupPerlEnvironment,
    SetupRubyEnvironment,
    SetupPythonEnvironment,
    SetupREnvironment,
    SetupVirtualenv,
    SetEnvironmentForInstall,
    #[serde(skip_deserializing)]
    Unrecognized {
        kind: String,
    },
}

/// Known action kinds, used as dispatch keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    ShellCommand,
    MoveFile,
    MoveDirectoryFiles,
    SetEnvironment,
    Chmod,
    DownloadByUrl,
    DownloadFile,
    MakeInstall,
    ChangeDirectory,
    MakeDirectory,
    SetupPerlEnvironment,
    SetupRubyEnvironment,
    SetupPythonEnvironment,
    SetupREnvironment,
    SetupVirtualenv,
    SetEnvironmentForInstall,
}

impl ActionKind {
    pub const ALL: [ActionKind; 16] = [
        Self::ShellCommand,
        Self::MoveFile,
        Self::MoveDirectoryFiles,
        Self::SetEnvironment,
        Self::Chmod,
        Self::DownloadByUrl,
        Self::DownloadFile,
        Self::MakeInstall,
        Self::ChangeDirectory,
        Self::MakeDirectory,
        Self::SetupPerlEnvironment,
        Self::SetupRubyEnvironment,
        Self::SetupPythonEnvironment,
        Self::SetupREnvironment,
        Self::SetupVirtualenv,
        Self::SetEnvironmentForInstall,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::ShellCommand => "shell_command",
            Self::MoveFile => "move_file",
            Self::MoveDirectoryFiles => "move_directory_files",
            Self::SetEnvironment => "set_environment",
            Self::Chmod => "chmod",
            Self::DownloadByUrl => "download_by_url",
            Self::DownloadFile => "download_file",
            Self::MakeInstall => "make_install",
            Self::ChangeDirectory => "change_directory",
            Self::MakeDirectory => "make_directory",
            Self::SetupPerlEnvironment => "setup_perl_environment",
            Self::SetupRubyEnvironment => "setup_ruby_environment",
            Self::SetupPythonEnvironment => "setup_python_environment",
            Self::SetupREnvironment => "setup_r_environment",
            Self::SetupVirtualenv => "setup_virtualenv",
            Self::SetEnvironmentForInstall => "set_environment_for_install",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Action {
    /// Dispatch key, or `None` for kinds outside the vocabulary.
    pub fn kind(&self) -> Option<ActionKind> {
        let kind = match self {
            Self::ShellCommand { .. } => ActionKind::ShellCommand,
            Self::MoveFile { .. } => ActionKind::MoveFile,
            Self::MoveDirectoryFiles { .. } => ActionKind::MoveDirectoryFiles,
            Self::SetEnvironment { .. } => ActionKind::SetEnvironment,
            Self::Chmod { .. } => ActionKind::Chmod,
            Self::DownloadByUrl { .. } => ActionKind::DownloadByUrl,
            Self::DownloadFile { .. } => ActionKind::DownloadFile,
            Self::MakeInstall => ActionKind::MakeInstall,
            Self::ChangeDirectory { .. } => ActionKind::ChangeDirectory,
            Self::MakeDirectory { .. } => ActionKind::MakeDirectory,
            Self::SetupPerlEnvironment => ActionKind::SetupPerlEnvironment,
            Self::SetupRubyEnvironment => ActionKind::SetupRubyEnvironment,
            Self::SetupPythonEnvironment => ActionKind::SetupPythonEnvironment,
            Self::SetupREnvironment => ActionKind::SetupREnvironment,
            Self::SetupVirtualenv => ActionKind::SetupVirtualenv,
            Self::SetEnvironmentForInstall => ActionKind::SetEnvironmentForInstall,
            Self::Unrecognized { .. } => return None,
        };
        Some(kind)
    }

    /// The descriptor tag of this action, including unrecognized ones.
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Unrecognized { kind } => kind,
            other => other.kind().map(ActionKind::tag).unwrap_or_default(),
        }
    }

    pub fn is_download(&self) -> bool {
        matches!(self, Self::DownloadByUrl { .. } | Self::DownloadFile { .. })
    }

    /// URL of a download action
    pub fn download_url(&self) -> Option<&str> {
        match self {
            Self::DownloadByUrl { url } | Self::DownloadFile { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Whether the downloaded archive gets unpacked. Only `download_file` can opt out.
    pub fn extracts(&self) -> bool {
        !matches!(self, Self::DownloadFile { extract: false, .. })
    }

    /// Structural equality over the fields this kind carries.
    pub fn same_as(&self, other: &Action) -> bool {
        self == other
    }
}

/// Deserialize an action list, routing unknown `type` tags to [`Action::Unrecognized`].
fn deserialize_actions<'de, D>(deserializer: D) -> std::result::Result<Vec<Action>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|value| {
            let tag = value
                .get("type")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| de::Error::missing_field("type"))?;
            if ActionKind::from_tag(tag).is_none() {
                return Ok(Action::Unrecognized {
                    kind: tag.to_string(),
                });
            }
            Action::deserialize(value).map_err(de::Error::custom)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> Repository {
        Repository::new("https://toolshed.g2.bx.psu.edu/", "devteam", "package_samtools_0_1_19")
    }

    #[test]
    fn test_recipe_base_name() {
        assert_eq!(repo().recipe_base_name(), "devteam_package_samtools_0_1_19");
        let odd = Repository::new("https://x", "Iuc-Team", "package.r");
        assert_eq!(odd.recipe_base_name(), "iuc_team_package_r");
    }

    #[test]
    fn test_provenance_url_trims_slash() {
        assert_eq!(
            repo().provenance_url(),
            "https://toolshed.g2.bx.psu.edu/devteam/package_samtools_0_1_19"
        );
    }

    #[test]
    fn test_recipe_name_suffix_for_shared_repository() {
        let mut package = Package {
            name: "numpy".to_string(),
            version: "1.7.1".to_string(),
            readme: None,
            shared_repository: false,
            sub_dependencies: vec![],
            action_sets: vec![],
            repository: Repository::new("https://x", "iuc", "package__python"),
        };
        assert_eq!(package.recipe_name(), "iuc_package_python");

        package.shared_repository = true;
        assert_eq!(package.recipe_name(), "iuc_package_python_numpy");
    }

    #[test]
    fn test_deserialize_action_set() {
        let json = r#"{
            "os": "linux",
            "architecture": "x86_64",
            "actions": [
                {"type": "download_file", "url": "http://a/b.jar", "extract": false},
                {"type": "chmod", "mods": [{"mode": "755", "target": "$INSTALL_DIR/b"}]},
                {"type": "set_environment", "variables": [
                    {"action": "prepend_to", "name": "PATH", "raw_value": "$INSTALL_DIR/bin"}
                ]},
                {"type": "make_install"},
                {"type": "custom_step", "whatever": 1}
            ]
        }"#;
        let set: ActionSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.os, Some(Os::Linux));
        assert_eq!(set.architecture, Some(Architecture::X86_64));
        assert_eq!(set.actions.len(), 5);
        assert!(!set.actions[0].extracts());
        assert_eq!(set.actions[3], Action::MakeInstall);
        assert_eq!(
            set.actions[4],
            Action::Unrecognized {
                kind: "custom_step".to_string()
            }
        );
        assert_eq!(set.actions[4].kind_name(), "custom_step");
    }

    #[test]
    fn test_known_kind_with_bad_fields_is_an_error() {
        let json = r#"{"actions": [{"type": "move_file", "source": "a"}]}"#;
        assert!(serde_json::from_str::<ActionSet>(json).is_err());
    }

    #[test]
    fn test_action_kind_tags_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ActionKind::from_tag("custom_step"), None);
    }

    #[test]
    fn test_same_as_compares_fields() {
        let a = Action::DownloadByUrl {
            url: "http://a".to_string(),
        };
        let b = Action::DownloadByUrl {
            url: "http://b".to_string(),
        };
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
        assert!(a.is_download() && b.is_download());
        assert!(a.extracts());
    }
}
