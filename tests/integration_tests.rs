// Integration tests: JSON descriptors in, recipe files on disk out.

use anyhow::Result;
use shed2tap::download::Checksums;
use shed2tap::{Package, RecipeCompiler, Tap, tap};
use std::fs;
use tempfile::TempDir;

const SAMTOOLS: &str = r#"{
    "name": "samtools",
    "version": "0.1.19",
    "readme": "Compiles samtools.",
    "repository": {
        "index_url": "https://toolshed.g2.bx.psu.edu",
        "owner": "devteam",
        "name": "package_samtools_0_1_19"
    },
    "sub_dependencies": [
        {
            "name": "ncurses",
            "version": "5.9",
            "repository": {"index_url": "https://toolshed.g2.bx.psu.edu", "owner": "iuc", "name": "package_ncurses_5_9"}
        }
    ],
    "action_sets": [
        {
            "os": "linux",
            "architecture": "x86_64",
            "actions": [
                {"type": "download_by_url", "url": "http://example.org/samtools-linux64.tar.bz2"},
                {"type": "move_directory_files", "source_directory": ".", "destination_directory": "$INSTALL_DIR/bin"},
                {"type": "set_environment", "variables": [
                    {"action": "prepend_to", "name": "PATH", "raw_value": "$INSTALL_DIR/bin"}
                ]}
            ]
        },
        {
            "actions": [
                {"type": "download_by_url", "url": "http://example.org/samtools-0.1.19.tar.bz2"},
                {"type": "shell_command", "command": "make"},
                {"type": "chmod", "mods": [{"mode": "755", "target": "$INSTALL_DIR/bin/samtools"}]},
                {"type": "move_file", "source": "samtools", "destination": "$INSTALL_DIR/bin"},
                {"type": "set_environment", "variables": [
                    {"action": "prepend_to", "name": "PATH", "raw_value": "$INSTALL_DIR/bin"}
                ]}
            ]
        }
    ]
}"#;

fn compiler() -> Result<RecipeCompiler> {
    Ok(RecipeCompiler::new(Tap::parse("jmchilton/toolshed")?))
}

#[test]
fn test_descriptor_to_tap_directory() -> Result<()> {
    let package: Package = serde_json::from_str(SAMTOOLS)?;
    let recipe = compiler()?.compile(&package)?;

    let brew_root = TempDir::new()?;
    let tap = Tap::parse("jmchilton/homebrew-toolshed")?;
    let dir = tap.directory(brew_root.path());
    let written = tap::write_recipes(&dir, std::slice::from_ref(&recipe))?;

    assert_eq!(written.len(), 1);
    assert_eq!(
        written[0],
        brew_root
            .path()
            .join("Library/Taps/jmchilton/homebrew-toolshed/devteam_package_samtools_0_1_19.rb")
    );

    let on_disk = fs::read_to_string(&written[0])?;
    assert_eq!(on_disk, recipe.contents);
    assert!(on_disk.starts_with("require 'formula'\n"));
    assert!(on_disk.contains("class DevteamPackageSamtools0119 < Formula"));
    assert!(on_disk.contains("depends_on \"jmchilton/toolshed/iuc_package_ncurses_5_9\""));
    assert!(on_disk.contains("#    Compiles samtools."));
    Ok(())
}

#[test]
fn test_descriptor_branches_and_relocation() -> Result<()> {
    let package: Package = serde_json::from_str(SAMTOOLS)?;
    let contents = compiler()?.compile(&package)?.contents;

    assert!(contents.contains("option \"without-architecture\""));
    assert!(contents.contains("url \"http://example.org/samtools-linux64.tar.bz2\""));
    assert!(contents.contains("url \"http://example.org/samtools-0.1.19.tar.bz2\""));

    // Moves into the install root go through Homebrew's install helpers
    assert!(contents.contains("bin.install"));
    assert!(contents.contains("system \"make\""));
    assert!(contents.contains("system \"chmod\", \"755\""));

    // PATH prepends onto bin/ are implicit in Homebrew
    assert_eq!(
        contents
            .matches("# Tool Shed set environment variable that is picked implicitly.")
            .count(),
        2
    );
    assert!(!contents.contains("def environment"));
    assert!(!contents.contains("require 'json'"));
    Ok(())
}

#[test]
fn test_unknown_and_setup_actions_become_warnings() -> Result<()> {
    let json = r#"{
        "name": "weird",
        "version": "2.0",
        "repository": {"owner": "someone", "name": "package_weird"},
        "action_sets": [
            {"actions": [
                {"type": "custom_step", "anything": [1, 2, 3]},
                {"type": "setup_perl_environment"},
                {"type": "make_install"}
            ]}
        ]
    }"#;
    let package: Package = serde_json::from_str(json)?;
    let contents = compiler()?.compile(&package)?.contents;

    assert!(contents.contains("opoo \"Unhandled tool shed action custom_step encountered.\""));
    assert!(
        contents.contains("opoo \"Unhandled tool shed action setup_perl_environment encountered.\"")
    );
    // Later actions still compile
    assert!(contents.contains("system \"make install\""));
    Ok(())
}

#[test]
fn test_batch_with_checksums() -> Result<()> {
    let checksums: Checksums = serde_json::from_str(
        r#"{"http://example.org/samtools-linux64.tar.bz2": {"sha256": "abc123"}}"#,
    )?;
    let packages: Vec<Package> = serde_json::from_str(&format!("[{}]", SAMTOOLS))?;
    let compiler = compiler()?.with_checksums(checksums);

    let recipes = packages
        .iter()
        .map(|p| compiler.compile(p))
        .collect::<shed2tap::Result<Vec<_>>>()?;

    let out = TempDir::new()?;
    let nested = out.path().join("recipes");
    let written = tap::write_recipes(&nested, &recipes)?;
    assert!(nested.is_dir());

    let contents = fs::read_to_string(&written[0])?;
    assert!(contents.contains("sha256 \"abc123\""));
    // The source tarball has no checksum entry
    assert!(contents.contains("sha256 \"\""));
    Ok(())
}

#[test]
fn test_malformed_known_action_rejects_descriptor() {
    let json = r#"{
        "name": "bad",
        "repository": {"owner": "o", "name": "n"},
        "action_sets": [{"actions": [{"type": "shell_command"}]}]
    }"#;
    assert!(serde_json::from_str::<Package>(json).is_err());
}
