//! Descriptor placeholder substitution and Ruby string quoting.
//!
//! Descriptors refer to the install location and the host word size through
//! `$NAME` / `${NAME}` placeholders. All rewriting goes through
//! [`resolve_placeholders`] with an explicit [`Substitutions`] table.

/// Ruby expression for the keg's install prefix inside a formula
pub const PREFIX_EXPR: &str = "#{prefix}";

/// Shell-visible name of the install root once the keg is poured
pub const KEG_ROOT_VAR: &str = "$KEG_ROOT";

/// The enumerated placeholder table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitutions {
    /// Replacement for `INSTALL_DIR` and `system_install`
    pub install_dir: String,
    /// Replacement for `__is64bit__`
    pub is_64_bit: String,
}

impl Default for Substitutions {
    fn default() -> Self {
        Self {
            install_dir: PREFIX_EXPR.to_string(),
            is_64_bit: "#{Hardware.is_64_bit?}".to_string(),
        }
    }
}

impl Substitutions {
    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "INSTALL_DIR" | "system_install" => Some(&self.install_dir),
            "__is64bit__" => Some(&self.is_64_bit),
            _ => None,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Replace known placeholders; unknown ones are left exactly as written.
///
/// `$$` collapses to a single `$`.
pub fn resolve_placeholders(text: &str, subs: &Substitutions) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        if let Some(braced) = after.strip_prefix('{')
            && let Some(end) = braced.find('}')
        {
            let name = &braced[..end];
            let valid = name.starts_with(is_ident_start) && name.chars().all(is_ident_char);
            match subs.lookup(name) {
                Some(value) if valid => out.push_str(value),
                _ => out.push_str(&rest[pos..pos + 2 + end + 1]),
            }
            rest = &braced[end + 1..];
            continue;
        }

        if after.starts_with(is_ident_start) {
            let len = after
                .find(|c: char| !is_ident_char(c))
                .unwrap_or(after.len());
            let name = &after[..len];
            match subs.lookup(name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[len..];
            continue;
        }

        out.push('$');
        rest = after;
    }

    out.push_str(rest);
    out
}

/// Resolve placeholders and escape for a Ruby double-quoted string.
pub fn shell_string(text: &str, subs: &Substitutions, quoted: bool) -> String {
    let escaped = resolve_placeholders(text, subs).replace('"', "\\\"");
    if quoted {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}

/// Escape for a Ruby single-quoted string
pub fn single_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Formula accessor for a well-known install root, if `path` resolves to one.
pub fn named_install_root(path: &str, subs: &Substitutions) -> Option<&'static str> {
    let resolved = shell_string(path, subs, false);
    let resolved = resolved.trim_end_matches('/');
    if resolved == subs.install_dir {
        Some("prefix")
    } else if resolved == format!("{}/bin", subs.install_dir) {
        Some("bin")
    } else {
        None
    }
}
