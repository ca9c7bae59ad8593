//! Maps each action kind to the statements that implement it in a formula.
//!
//! Handlers are plain functions looked up by [`ActionKind`]. Anything without a
//! registered handler, including kinds the descriptor parser didn't recognize,
//! goes to [`unhandled_action`], which leaves a visible `opoo` warning in the
//! formula rather than failing the compile.

use crate::builder::Statement;
use crate::download;
use crate::environment::{self, EnvironmentMode};
use crate::extension::{Extension, Extensions};
use crate::model::{Action, ActionKind};
use crate::placeholders::{Substitutions, named_install_root, resolve_placeholders, shell_string};
use std::collections::HashMap;
use tracing::warn;

/// Per-package state a handler may read
#[derive(Debug, Clone)]
pub struct HandlerContext<'a> {
    pub subs: &'a Substitutions,
    pub env_mode: EnvironmentMode,
}

/// Statements for one action plus any extensions they reference.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HandlerOutput {
    pub statements: Vec<Statement>,
    pub extensions: Extensions,
}

impl HandlerOutput {
    fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statements: lines.into_iter().map(Statement::line).collect(),
            extensions: Extensions::new(),
        }
    }

    fn statements(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            extensions: Extensions::new(),
        }
    }
}

pub type Handler = fn(&HandlerContext<'_>, &Action) -> HandlerOutput;

pub struct Dispatcher {
    handlers: HashMap<ActionKind, Handler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Dispatcher with every built-in handler registered.
    ///
    /// The `setup_*` kinds have no handler and fall through to the warning.
    pub fn new() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(ActionKind::ShellCommand, handle_shell_command);
        dispatcher.register(ActionKind::MoveFile, handle_move_file);
        dispatcher.register(ActionKind::MoveDirectoryFiles, handle_move_directory_files);
        dispatcher.register(ActionKind::SetEnvironment, handle_set_environment);
        dispatcher.register(ActionKind::Chmod, handle_chmod);
        dispatcher.register(ActionKind::DownloadByUrl, handle_download);
        dispatcher.register(ActionKind::DownloadFile, handle_download);
        dispatcher.register(ActionKind::MakeInstall, handle_make_install);
        dispatcher.register(ActionKind::ChangeDirectory, handle_change_directory);
        dispatcher.register(ActionKind::MakeDirectory, handle_make_directory);
        dispatcher.register(
            ActionKind::SetEnvironmentForInstall,
            handle_set_environment_for_install,
        );
        dispatcher
    }

    /// Dispatcher that routes everything to the default handler
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: ActionKind, handler: Handler) {
        self.handlers.insert(kind, handler);
    }

    pub fn dispatch(&self, ctx: &HandlerContext<'_>, action: &Action) -> HandlerOutput {
        match action.kind().and_then(|kind| self.handlers.get(&kind)) {
            Some(handler) => handler(ctx, action),
            None => unhandled_action(action),
        }
    }
}

/// Default handler: a warning in the generated formula, never an error.
pub fn unhandled_action(action: &Action) -> HandlerOutput {
    let kind = action.kind_name();
    warn!("Unhandled tool shed action {} encountered", kind);
    HandlerOutput::lines([format!(
        "opoo \"Unhandled tool shed action {} encountered.\"",
        kind.replace('"', "\\\"")
    )])
}

fn handle_shell_command(ctx: &HandlerContext<'_>, action: &Action) -> HandlerOutput {
    let Action::ShellCommand { command } = action else {
        return unhandled_action(action);
    };
    let command = command.trim();

    if command.contains('\n') {
        let resolved = resolve_placeholders(command, ctx.subs);
        let body = resolved
            .split('\n')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Statement::line)
            .collect();
        return HandlerOutput::statements(vec![Statement::Block {
            header: "system <<-EOF".to_string(),
            body,
            footer: "EOF".to_string(),
        }]);
    }

    HandlerOutput::lines([format!("system {}", shell_string(command, ctx.subs, true))])
}

fn handle_move_file(ctx: &HandlerContext<'_>, action: &Action) -> HandlerOutput {
    let Action::MoveFile {
        source,
        destination,
    } = action
    else {
        return unhandled_action(action);
    };
    let source = shell_string(source, ctx.subs, true);

    if let Some(root) = named_install_root(destination, ctx.subs) {
        return HandlerOutput::lines([format!("{}.install {}", root, source)]);
    }

    let destination = shell_string(destination, ctx.subs, true);
    HandlerOutput::lines([
        format!("system \"mkdir\", \"-p\", {}", destination),
        format!("mv {}, {}", source, destination),
    ])
}

fn handle_move_directory_files(ctx: &HandlerContext<'_>, action: &Action) -> HandlerOutput {
    let Action::MoveDirectoryFiles {
        source_directory,
        destination_directory,
    } = action
    else {
        return unhandled_action(action);
    };
    let contents = format!(
        "Dir[\"{}/*\"]",
        shell_string(source_directory, ctx.subs, false).trim_end_matches('/')
    );

    if let Some(root) = named_install_root(destination_directory, ctx.subs) {
        return HandlerOutput::lines([format!("{}.install {}", root, contents)]);
    }

    let destination = shell_string(destination_directory, ctx.subs, true);
    HandlerOutput::lines([
        format!("system \"mkdir\", \"-p\", {}", destination),
        format!("mv {}, {}", contents, destination),
    ])
}

fn handle_set_environment(ctx: &HandlerContext<'_>, action: &Action) -> HandlerOutput {
    let Action::SetEnvironment { variables } = action else {
        return unhandled_action(action);
    };
    let (statements, uses_helper) = environment::emit_edits(variables, ctx.env_mode, ctx.subs);
    let mut output = HandlerOutput::statements(statements);
    if uses_helper {
        output.extensions.insert(Extension::Environment);
    }
    output
}

fn handle_chmod(ctx: &HandlerContext<'_>, action: &Action) -> HandlerOutput {
    let Action::Chmod { mods } = action else {
        return unhandled_action(action);
    };
    HandlerOutput::lines(mods.iter().map(|entry| {
        format!(
            "system \"chmod\", {}, {}",
            shell_string(&entry.mode, ctx.subs, true),
            shell_string(&entry.target, ctx.subs, true)
        )
    }))
}

/// Downloads reaching `install` are secondary resources; the primary one was
/// already declared at class level and is skipped before dispatch.
fn handle_download(_ctx: &HandlerContext<'_>, action: &Action) -> HandlerOutput {
    HandlerOutput::statements(download::stage_resource(action))
}

fn handle_make_install(_ctx: &HandlerContext<'_>, _action: &Action) -> HandlerOutput {
    HandlerOutput::lines(["system \"make install\""])
}

fn handle_change_directory(ctx: &HandlerContext<'_>, action: &Action) -> HandlerOutput {
    let Action::ChangeDirectory { directory } = action else {
        return unhandled_action(action);
    };
    HandlerOutput::lines([format!("cd {}", shell_string(directory, ctx.subs, true))])
}

fn handle_make_directory(ctx: &HandlerContext<'_>, action: &Action) -> HandlerOutput {
    let Action::MakeDirectory { directory } = action else {
        return unhandled_action(action);
    };
    HandlerOutput::lines([format!(
        "system \"mkdir\", \"-p\", {}",
        shell_string(directory, ctx.subs, true)
    )])
}

fn handle_set_environment_for_install(_ctx: &HandlerContext<'_>, _action: &Action) -> HandlerOutput {
    HandlerOutput::lines([
        "# Skipping set_environment_for_install command, handled by platform brew.",
    ])
}
