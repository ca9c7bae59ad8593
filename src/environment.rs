//! Environment variable edits: which ones Homebrew already covers, and how the
//! rest are recorded.
//!
//! Homebrew links a keg's `bin` onto `PATH` itself, so prepending the package's own
//! `bin` directory is *implicit* and only leaves a comment behind. Every other edit
//! is *explicit* and is handed to the formula's `environment` helper, which writes
//! them to `platform_environment.json` in the keg.
//!
//! A package runs in one of two modes (see [`EnvironmentMode`]):
//! - **Direct**: each `set_environment` action calls `environment([...])` inline.
//! - **Accumulate**: when any action set carries more than one explicit edit, a
//!   list is declared at the top of `install`, every action appends to it, and
//!   `environment(...)` runs once after all branches.

use crate::builder::Statement;
use crate::model::{Action, EnvironmentEdit, Package};
use crate::placeholders::{KEG_ROOT_VAR, Substitutions, resolve_placeholders, single_quoted};

/// Name of the list used in accumulate mode
pub const ACCUMULATOR: &str = "environment_actions";

/// Left in place of an edit Homebrew performs on its own
pub const IMPLICIT_COMMENT: &str =
    "# Tool Shed set environment variable that is picked implicitly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentMode {
    Direct,
    Accumulate,
}

/// An edit with its placeholders resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEdit<'a> {
    pub edit: &'a EnvironmentEdit,
    pub resolved_value: String,
    implicit: bool,
}

impl<'a> ResolvedEdit<'a> {
    pub fn new(edit: &'a EnvironmentEdit, subs: &Substitutions) -> Self {
        let resolved_value = resolve_placeholders(&edit.raw_value, subs);
        let bin_dir = format!("{}/bin", subs.install_dir);
        let implicit = edit.name == "PATH"
            && edit.action == crate::model::Mutation::Prepend
            && resolved_value.trim_end_matches('/') == bin_dir;
        Self {
            edit,
            resolved_value,
            implicit,
        }
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit
    }

    pub fn is_explicit(&self) -> bool {
        !self.implicit
    }

    /// Ruby hash literal read back by the environment activation tool.
    pub fn to_ruby_hash(&self, subs: &Substitutions) -> String {
        let value = self.resolved_value.replace(&subs.install_dir, KEG_ROOT_VAR);
        format!(
            "{{'action'=> '{}', 'variable'=> '{}', 'value'=> '{}'}}",
            self.edit.action.as_str(),
            single_quoted(&self.edit.name),
            single_quoted(&value)
        )
    }
}

/// Explicit edits carried by a `set_environment` action; empty for any other kind.
pub fn explicit_edits<'a>(action: &'a Action, subs: &Substitutions) -> Vec<ResolvedEdit<'a>> {
    match action {
        Action::SetEnvironment { variables } => variables
            .iter()
            .map(|edit| ResolvedEdit::new(edit, subs))
            .filter(ResolvedEdit::is_explicit)
            .collect(),
        _ => Vec::new(),
    }
}

/// Accumulate when any single action set carries more than one explicit edit.
pub fn mode_for(package: &Package, subs: &Substitutions) -> EnvironmentMode {
    let accumulate = package.action_sets.iter().any(|set| {
        let count: usize = set
            .actions
            .iter()
            .map(|action| explicit_edits(action, subs).len())
            .sum();
        count > 1
    });
    if accumulate {
        EnvironmentMode::Accumulate
    } else {
        EnvironmentMode::Direct
    }
}

/// Statements for one `set_environment` action.
///
/// The boolean reports whether the `environment` helper is now referenced.
pub fn emit_edits(
    variables: &[EnvironmentEdit],
    mode: EnvironmentMode,
    subs: &Substitutions,
) -> (Vec<Statement>, bool) {
    let mut statements = Vec::new();
    let mut hashes = Vec::new();

    for edit in variables {
        let resolved = ResolvedEdit::new(edit, subs);
        if resolved.is_implicit() {
            statements.push(Statement::line(IMPLICIT_COMMENT));
        } else {
            hashes.push(resolved.to_ruby_hash(subs));
        }
    }

    if hashes.is_empty() {
        return (statements, false);
    }

    let list = format!("[{}]", hashes.join(","));
    let line = match mode {
        EnvironmentMode::Accumulate => format!("{} += {}", ACCUMULATOR, list),
        EnvironmentMode::Direct => format!("environment({})", list),
    };
    statements.push(Statement::line(line));
    (statements, true)
}
