//! Loading definitions from `Defs` documents and writing them back.
//!
//! ```xml
//! <Defs>
//!   <Base defName="Template" abstract="true"><v>1</v></Base>
//!   <Thing defName="Lamp" parent="Template"><w>2</w></Thing>
//! </Defs>
//! ```
//!
//! Loading is split in two passes. The first one runs as each document is
//! added: every node is recorded as a declaration, keyed by hierarchy root
//! and name. [`DefParser::finish`] then creates every non-abstract
//! definition and registers it, empty, so that any definition may refer to
//! any other one by name. The second pass fills the content in: a
//! definition is read once per node of its parent chain, root first, each
//! node overriding what the previous ones set.
//!
//! Documents belong to modules, `core` unless added through
//! [`DefParser::module`]. A definition declared in several modules is read
//! from each of its nodes, in module order.

// -----------------------------------------------------------------------------
// Modules

mod composer;
mod inheritance;
mod parser;

// -----------------------------------------------------------------------------
// Exports

pub use composer::compose_defs;
pub use parser::{DefModule, DefParser};

// -----------------------------------------------------------------------------
// Constants

/// Root tag of definition documents.
pub const DEFS_TAG: &str = "Defs";

/// Module of documents added straight to a [`DefParser`].
pub const CORE_MODULE: &str = "core";

/// Attributes of a definition node which belong to the loader.
pub const DEF_ATTRS: [&str; 3] = ["defName", "abstract", "parent"];

// -----------------------------------------------------------------------------
// Names

/// Checks a definition name: a letter, then letters, digits or `_`.
///
/// The error is a hint for the most common mistakes.
///
/// # Examples
///
/// ```
/// use dec_defs::validate_name;
///
/// assert!(validate_name("IronSword_2").is_ok());
/// assert!(validate_name("Iron Sword").unwrap_err().contains("spaces"));
/// assert!(validate_name("2ndSword").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(char::is_alphabetic)
        && chars.all(|c| c.is_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else if name.is_empty() {
        Err("names cannot be empty")
    } else if name.contains(' ') {
        Err("consider removing spaces")
    } else if name.contains('"') || name.contains('\'') {
        Err("consider removing quotes")
    } else {
        Err("names start with a letter, followed by letters, digits or `_`")
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::validate_name;

    #[test]
    fn name_hints() {
        assert!(validate_name("Épée").is_ok());
        assert!(validate_name("_hidden").is_err());
        assert_eq!(validate_name(""), Err("names cannot be empty"));
        assert_eq!(validate_name("\"Sword\""), Err("consider removing quotes"));
        assert_eq!(validate_name("a-b").map_err(|e| e.contains("letters")), Err(true));
    }
}
