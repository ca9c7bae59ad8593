//! Download declarations: the formula's primary `url`, named secondary resources,
//! and staging of secondary resources inside `install`.
//!
//! Homebrew requires every formula to declare at least one download, while a
//! descriptor may have none. In that case a well-known placeholder archive stands in.

use crate::builder::Statement;
use crate::model::{Action, ActionSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Stand-in download for action sets that never fetch anything
pub const PLACEHOLDER_URL: &str = "http://ftpmirror.gnu.org/hello/hello-2.9.tar.gz";
const PLACEHOLDER_SHA1: &str = "cb0470b0e8f4f7768338f5c5cfe1688c90fbbc74";

const PLACEHOLDER_COMMENT: &str = "# Each homebrew formula must have at least one download, tool shed doesn't require this so hacking in hello source download.";
const UNRESOLVED_COMMENT: &str = "# Checksum not resolved for this download.";
const RELOCATE_COMMENT: &str = "# Tool Shed would download inside build directory instead of its own - so move download.";

/// Checksum of a download artifact, as resolved by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checksum {
    Sha1(String),
    Sha256(String),
}

impl Checksum {
    fn to_line(&self) -> String {
        match self {
            Self::Sha1(hex) => format!("sha1 \"{}\"", hex),
            Self::Sha256(hex) => format!("sha256 \"{}\"", hex),
        }
    }
}

/// Checksums by download URL
pub type Checksums = BTreeMap<String, Checksum>;

/// Resource name for a download: the URL's file name minus `.tar.gz` / `.zip`.
///
/// Two downloads with the same file name get the same resource name.
pub fn resource_name(url: &str) -> String {
    let file_name = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .unwrap_or_default()
            .to_string(),
        Err(_) => {
            let path = url.split(['?', '#']).next().unwrap_or_default();
            path.trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        }
    };

    file_name
        .strip_suffix(".tar.gz")
        .or_else(|| file_name.strip_suffix(".zip"))
        .unwrap_or(&file_name)
        .to_string()
}

fn quote_url(url: &str) -> String {
    format!("\"{}\"", url.replace('"', "\\\""))
}

/// `url` and checksum lines for one download, or the placeholder when `None`.
fn single_download(action: Option<&Action>, checksums: &Checksums) -> Vec<Statement> {
    let Some(url) = action.and_then(Action::download_url) else {
        return vec![
            Statement::line(PLACEHOLDER_COMMENT),
            Statement::line(format!("url {}", quote_url(PLACEHOLDER_URL))),
            Statement::line(Checksum::Sha1(PLACEHOLDER_SHA1.to_string()).to_line()),
        ];
    };

    let mut url_line = format!("url {}", quote_url(url));
    if action.is_some_and(|a| !a.extracts()) {
        url_line.push_str(", :using => :nounzip");
    }

    let mut statements = vec![Statement::line(url_line)];
    match checksums.get(url) {
        Some(checksum) => statements.push(Statement::line(checksum.to_line())),
        None => {
            debug!("No checksum resolved for {}", url);
            statements.push(Statement::line(UNRESOLVED_COMMENT));
            statements.push(Statement::line("sha256 \"\""));
        }
    }
    statements
}

/// Download declarations for one action set.
///
/// The first download becomes the formula's primary source, later ones become
/// `resource` blocks named after their file.
pub fn download_block(set: &ActionSet, checksums: &Checksums) -> Vec<Statement> {
    let mut downloads = set.downloads();
    let Some(primary) = downloads.next() else {
        return single_download(None, checksums);
    };

    let mut statements = single_download(Some(primary), checksums);
    for action in downloads {
        let url = action.download_url().unwrap_or_default();
        statements.push(Statement::block(
            format!("resource '{}' do", resource_name(url)),
            single_download(Some(action), checksums),
        ));
    }
    statements
}

/// Stage a secondary resource into the build directory from inside `install`.
pub fn stage_resource(action: &Action) -> Vec<Statement> {
    let url = action.download_url().unwrap_or_default();
    let install = if action.extracts() {
        "buildpath.install Dir[\"../*\"]"
    } else {
        "buildpath.install Dir[\"*\"]"
    };
    vec![Statement::block(
        format!("resource('{}').stage do", resource_name(url)),
        vec![Statement::line(RELOCATE_COMMENT), Statement::line(install)],
    )]
}
