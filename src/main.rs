mod colors;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde::Deserialize;
use shed2tap::config::{self, DEFAULT_GIT_USER, ToolShed};
use shed2tap::download::Checksums;
use shed2tap::{Package, Recipe, RecipeCompiler, Tap, tap};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "shed2tap")]
#[command(author, version, about = "Compile Tool Shed dependency descriptors into Homebrew formulae", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile package descriptors into Homebrew recipes
    Compile {
        /// JSON files, each holding one package or an array of packages
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Tool shed the descriptors come from
        #[arg(long, value_enum, default_value_t = ToolShed::Toolshed)]
        tool_shed: ToolShed,

        /// GitHub user owning the target tap
        #[arg(long, default_value = DEFAULT_GIT_USER)]
        git_user: String,

        /// Target tap (user/repo); defaults to <git-user>/<tool-shed>
        #[arg(long)]
        tap: Option<String>,

        /// Homebrew installation root (defaults to $HOMEBREW_PREFIX)
        #[arg(long)]
        brew_directory: Option<PathBuf>,

        /// Write recipes here instead of the tap directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON map of download URL to checksum, e.g. {"http://...": {"sha256": "..."}}
        #[arg(long)]
        checksums: Option<PathBuf>,

        /// Print recipes instead of writing them
        #[arg(long)]
        stdout: bool,
    },

    /// Compile descriptors and report problems without writing anything
    Check {
        /// JSON files, each holding one package or an array of packages
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PackageInput {
    One(Box<Package>),
    Many(Vec<Package>),
}

fn load_packages(inputs: &[PathBuf], tool_shed: ToolShed) -> Result<Vec<Package>> {
    let mut packages = Vec::new();
    for path in inputs {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let input: PackageInput = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse package descriptor {}", path.display()))?;
        match input {
            PackageInput::One(package) => packages.push(*package),
            PackageInput::Many(many) => packages.extend(many),
        }
    }

    for package in &mut packages {
        fill_index_url(package, tool_shed);
    }
    Ok(packages)
}

fn fill_index_url(package: &mut Package, tool_shed: ToolShed) {
    let repos = std::iter::once(&mut package.repository)
        .chain(package.sub_dependencies.iter_mut().map(|d| &mut d.repository))
        .chain(
            package
                .action_sets
                .iter_mut()
                .flat_map(|s| s.packages.iter_mut().map(|d| &mut d.repository)),
        );
    for repo in repos {
        if repo.index_url.is_empty() {
            repo.index_url = tool_shed.url().to_string();
        }
    }
}

fn load_checksums(path: Option<&Path>) -> Result<Checksums> {
    let Some(path) = path else {
        return Ok(Checksums::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid checksum file {}", path.display()))
}

/// Compile every package in parallel, reporting and skipping failures.
fn compile_all(compiler: &RecipeCompiler, packages: &[Package]) -> (Vec<Recipe>, usize) {
    let results: Vec<_> = packages
        .par_iter()
        .map(|package| (package, compiler.compile(package)))
        .collect();

    let mut recipes = Vec::new();
    let mut failures = 0;
    for (package, result) in results {
        match result {
            Ok(recipe) => recipes.push(recipe),
            Err(e) => {
                failures += 1;
                tracing::error!("Failed to convert package {}: {}", package.name, e);
                eprintln!(
                    "  {} Failed to convert package {}: {}",
                    "✗".red(),
                    package.name.bold(),
                    e
                );
            }
        }
    }
    (recipes, failures)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    colors::init_colors();

    let failures = match cli.command {
        Commands::Compile {
            inputs,
            tool_shed,
            git_user,
            tap,
            brew_directory,
            output,
            checksums,
            stdout,
        } => {
            let tap = match tap {
                Some(name) => Tap::parse(&name)?,
                None => tool_shed.default_tap(&git_user)?,
            };
            let packages = load_packages(&inputs, tool_shed)?;
            let compiler = RecipeCompiler::new(tap.clone())
                .with_checksums(load_checksums(checksums.as_deref())?);
            let (recipes, failures) = compile_all(&compiler, &packages);

            if stdout {
                for recipe in &recipes {
                    println!("# {}", recipe.file_name);
                    print!("{}", recipe.contents);
                }
            } else {
                let dir = output.unwrap_or_else(|| {
                    tap.directory(&config::resolve_brew_root(brew_directory))
                });
                let written = tap::write_recipes(&dir, &recipes)?;
                for path in &written {
                    println!("  {} {}", "✓".green(), path.display());
                }
                println!(
                    "Wrote {} recipe(s) for {} to {}",
                    written.len().to_string().bold(),
                    tap.to_string().cyan(),
                    dir.display()
                );
            }
            failures
        }
        Commands::Check { inputs } => {
            let packages = load_packages(&inputs, ToolShed::default())?;
            let tap = ToolShed::default().default_tap(DEFAULT_GIT_USER)?;
            let (recipes, failures) = compile_all(&RecipeCompiler::new(tap), &packages);
            for recipe in &recipes {
                let warnings = recipe.contents.matches("opoo ").count();
                if warnings > 0 {
                    println!(
                        "  {} {} ({} unhandled action(s))",
                        "⚠".yellow(),
                        recipe.file_name.bold(),
                        warnings
                    );
                } else {
                    println!("  {} {}", "✓".green(), recipe.file_name.bold());
                }
            }
            failures
        }
    };

    if failures > 0 {
        anyhow::bail!("{} package(s) failed to compile", failures);
    }
    Ok(())
}
