//! Turns a package's per-platform action sets into one nested program.
//!
//! With a single action set its statements are used as-is. When every action set
//! performs the same steps and only the downloaded artifacts differ, the sets are
//! collapsed onto the first one. Otherwise an `if` / `elsif` / `else` chain is
//! built from the OS and architecture conditions, with the unconditioned set (if
//! any) as the trailing `else`.

use crate::builder::{Arm, Statement};
use crate::error::StructureError;
use crate::model::{ActionSet, Architecture, Os};

/// Build option that lets an operator skip architecture-specific branches.
pub const ARCHITECTURE_OPTION: &str = "option \"without-architecture\", \"Build without allowing architecture information (to force source install when binaries are available).\"";

const ARCHITECTURE_GUARD: &str = "!build.without?(\"architecture\")";

fn os_predicate(os: Os) -> &'static str {
    match os {
        Os::Linux => "OS.linux?",
        Os::Darwin => "OS.mac?",
    }
}

fn architecture_predicate(arch: Architecture) -> &'static str {
    match arch {
        Architecture::X86_64 => "Hardware.is_64_bit?",
        Architecture::I386 => "Hardware.is_32_bit?",
    }
}

/// Ruby condition selecting `set`, or `None` for the unconditioned fallback.
pub fn predicate(set: &ActionSet) -> Option<String> {
    let mut conds = Vec::new();
    if let Some(os) = set.os {
        conds.push(os_predicate(os));
    }
    if let Some(arch) = set.architecture {
        conds.push(architecture_predicate(arch));
    }
    if conds.is_empty() {
        return None;
    }
    if is_guarded(set) {
        conds.push(ARCHITECTURE_GUARD);
    }
    Some(conds.join(" and "))
}

/// Branches naming both an OS and an architecture honour `--without-architecture`.
pub fn is_guarded(set: &ActionSet) -> bool {
    set.os.is_some() && set.architecture.is_some()
}

/// A validated view over a package's action sets.
#[derive(Debug, Clone, Copy)]
pub struct ConditionalTree<'a> {
    sets: &'a [ActionSet],
}

impl<'a> ConditionalTree<'a> {
    /// Fails unless at most one action set is unconditioned and it comes last.
    pub fn new(sets: &'a [ActionSet]) -> Result<Self, StructureError> {
        if sets.len() > 1 {
            let fallbacks: Vec<usize> = sets
                .iter()
                .enumerate()
                .filter(|(_, set)| set.is_unconditioned())
                .map(|(i, _)| i)
                .collect();
            if fallbacks.len() > 1 {
                return Err(StructureError::DuplicateFallback {
                    count: fallbacks.len(),
                });
            }
            if let Some(&index) = fallbacks.first()
                && index != sets.len() - 1
            {
                return Err(StructureError::FallbackNotLast {
                    index,
                    total: sets.len(),
                });
            }
        }
        Ok(Self { sets })
    }

    pub fn sets(&self) -> &'a [ActionSet] {
        self.sets
    }

    /// True when the sets run the same steps and differ at most in what they download.
    ///
    /// Any two download actions count as equal here, whatever their kind or URL.
    pub fn differs_only_by_download(&self) -> bool {
        let Some((first, rest)) = self.sets.split_first() else {
            return true;
        };
        rest.iter().all(|set| {
            set.actions.len() == first.actions.len()
                && set
                    .actions
                    .iter()
                    .zip(&first.actions)
                    .all(|(a, b)| (a.is_download() && b.is_download()) || a.same_as(b))
        })
    }

    /// Whether [`map_collapsible`](Self::map_collapsible) emits a single body.
    pub fn collapses(&self) -> bool {
        self.sets.len() <= 1 || self.differs_only_by_download()
    }

    /// Statements for every set, wrapped in a conditional chain when there are several.
    pub fn map<F>(&self, f: F) -> Vec<Statement>
    where
        F: FnMut(&ActionSet) -> Vec<Statement>,
    {
        self.emit(false, f)
    }

    /// Like [`map`](Self::map), but uses only the first set when the tree collapses.
    pub fn map_collapsible<F>(&self, f: F) -> Vec<Statement>
    where
        F: FnMut(&ActionSet) -> Vec<Statement>,
    {
        self.emit(true, f)
    }

    /// True when a chain emitted with `collapse` would test `--without-architecture`.
    pub fn uses_architecture_option(&self, collapse: bool) -> bool {
        let chained = self.sets.len() > 1 && !(collapse && self.collapses());
        chained && self.sets.iter().any(is_guarded)
    }

    fn emit<F>(&self, collapse: bool, mut f: F) -> Vec<Statement>
    where
        F: FnMut(&ActionSet) -> Vec<Statement>,
    {
        match self.sets {
            [] => f(&ActionSet::default()),
            [only] => f(only),
            [first, ..] if collapse && self.differs_only_by_download() => f(first),
            sets => {
                let arms = sets
                    .iter()
                    .enumerate()
                    .map(|(i, set)| {
                        let header = match predicate(set) {
                            None => "else".to_string(),
                            Some(cond) if i == 0 => format!("if {}", cond),
                            Some(cond) => format!("elsif {}", cond),
                        };
                        Arm {
                            header,
                            body: f(set),
                        }
                    })
                    .collect();
                vec![Statement::Branches(arms)]
            }
        }
    }
}
