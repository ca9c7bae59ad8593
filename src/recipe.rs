//! Assembles a complete Homebrew formula for one package.
//!
//! The layout is fixed: requires, class header with provenance and readme,
//! the optional `without-architecture` option, download declarations,
//! `depends_on` lines, the `install` method, and finally any helper methods
//! the install body referenced.
//!
//! # Examples
//!
//! ```no_run
//! use shed2tap::{Package, RecipeCompiler, Tap};
//!
//! fn main() -> anyhow::Result<()> {
//!     let json = std::fs::read_to_string("samtools.json")?;
//!     let package: Package = serde_json::from_str(&json)?;
//!     let compiler = RecipeCompiler::new(Tap::parse("jmchilton/toolshed")?);
//!
//!     let recipe = compiler.compile(&package)?;
//!     println!("{}:\n{}", recipe.file_name, recipe.contents);
//!     Ok(())
//! }
//! ```

use crate::builder::{CodeBuilder, Statement};
use crate::conditional::{ARCHITECTURE_OPTION, ConditionalTree};
use crate::dispatch::{Dispatcher, HandlerContext};
use crate::download::{self, Checksums};
use crate::environment::{self, ACCUMULATOR, EnvironmentMode};
use crate::error::Result;
use crate::extension::{Extension, Extensions, required_modules};
use crate::model::{ActionSet, Package, PackageRef};
use crate::placeholders::Substitutions;
use crate::tap::Tap;
use serde::Serialize;
use tracing::debug;

/// A generated formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub file_name: String,
    pub contents: String,
}

pub struct RecipeCompiler {
    tap: Tap,
    checksums: Checksums,
    subs: Substitutions,
    dispatcher: Dispatcher,
}

impl RecipeCompiler {
    pub fn new(tap: Tap) -> Self {
        Self {
            tap,
            checksums: Checksums::new(),
            subs: Substitutions::default(),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Checksums resolved ahead of time, keyed by download URL.
    pub fn with_checksums(mut self, checksums: Checksums) -> Self {
        self.checksums = checksums;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn tap(&self) -> &Tap {
        &self.tap
    }

    /// Compile one package into a formula.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError`](crate::error::StructureError) when the
    /// unconditioned action set is not last or appears twice. Unknown action
    /// kinds are not errors; they become `opoo` warnings in the output.
    pub fn compile(&self, package: &Package) -> Result<Recipe> {
        let name = package.recipe_name();
        debug!(
            "Compiling {} ({} action set(s)) as {}",
            package.name,
            package.action_sets.len(),
            name
        );

        let tree = ConditionalTree::new(&package.action_sets)?;
        let env_mode = environment::mode_for(package, &self.subs);
        let ctx = HandlerContext {
            subs: &self.subs,
            env_mode,
        };

        let mut extensions = Extensions::new();
        let downloads =
            tree.map_collapsible(|set| download::download_block(set, &self.checksums));
        let install = tree.map_collapsible(|set| self.install_actions(&ctx, set, &mut extensions));
        if env_mode == EnvironmentMode::Accumulate {
            extensions.insert(Extension::Environment);
        }

        let mut depends: Vec<Statement> = package
            .sub_dependencies
            .iter()
            .map(|dep| self.depends_on(dep))
            .collect();
        let per_set_depends = package.action_sets.iter().any(|set| !set.packages.is_empty());
        if per_set_depends {
            depends.extend(tree.map(|set| set.packages.iter().map(|dep| self.depends_on(dep)).collect()));
        }

        let architecture_option = tree.uses_architecture_option(true)
            || (per_set_depends && tree.uses_architecture_option(false));

        let mut builder = CodeBuilder::new();
        builder.require("formula")?;
        for module in required_modules(&extensions) {
            builder.require(module)?;
        }
        builder.emit("");
        builder.open_block(&format!("class {} < Formula", class_name(&name)));
        builder.emit(&version_line(&package.version));
        builder.emit(&format!(
            "# Recipe auto-generate from repository {}",
            package.repository.provenance_url()
        ));
        if let Some(readme) = package.readme.as_deref().filter(|r| !r.trim().is_empty()) {
            builder.emit("# Tool Shed Readme:");
            for line in readme.lines() {
                builder.emit(format!("#    {}", line).trim_end());
            }
        }
        builder.emit("");

        if architecture_option {
            builder.emit(ARCHITECTURE_OPTION);
            builder.emit("");
        }

        builder.write_all(&downloads)?;
        builder.emit("");

        if !depends.is_empty() {
            builder.write_all(&depends)?;
            builder.emit("");
        }

        builder.open_block("def install");
        if env_mode == EnvironmentMode::Accumulate {
            builder.emit(&format!("{} = []", ACCUMULATOR));
        }
        builder.write_all(&install)?;
        if env_mode == EnvironmentMode::Accumulate {
            builder.emit(&format!("environment({})", ACCUMULATOR));
        }
        builder.close_block("end")?;

        for extension in &extensions {
            builder.emit("");
            for line in extension.snippet() {
                builder.emit(line);
            }
        }
        builder.close_block("end")?;

        Ok(Recipe {
            file_name: format!("{}.rb", name),
            contents: builder.serialize()?,
        })
    }

    /// Install statements for one action set. The set's first download is the
    /// formula's primary source and is already declared, so it is skipped.
    fn install_actions(
        &self,
        ctx: &HandlerContext<'_>,
        set: &ActionSet,
        extensions: &mut Extensions,
    ) -> Vec<Statement> {
        let primary = set.actions.iter().position(|a| a.is_download());
        let mut statements = Vec::new();
        for (i, action) in set.actions.iter().enumerate() {
            if Some(i) == primary {
                continue;
            }
            let output = self.dispatcher.dispatch(ctx, action);
            extensions.extend(output.extensions);
            statements.extend(output.statements);
        }
        statements
    }

    fn depends_on(&self, dep: &PackageRef) -> Statement {
        Statement::line(format!(
            "depends_on \"{}/{}\"",
            self.tap,
            dep.repository.recipe_base_name()
        ))
    }
}

/// Compile with default checksums and handlers.
pub fn compile(package: &Package, tap: &Tap) -> Result<Recipe> {
    RecipeCompiler::new(tap.clone()).compile(package)
}

fn version_line(version: &str) -> String {
    let version = if version.trim().is_empty() {
        "1.0"
    } else {
        version.trim()
    };
    format!("version \"{}\"", version.replace('"', "\\\""))
}

/// `devteam_package_samtools` → `DevteamPackageSamtools`
pub fn class_name(recipe_name: &str) -> String {
    let camel: String = recipe_name
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();

    // Ruby constants must start with a letter
    if camel.starts_with(|c: char| c.is_ascii_alphabetic()) {
        camel
    } else {
        format!("Recipe{}", camel)
    }
}
