//! Shell variables and the line preprocessor.
//!
//! `$NAME` and `${NAME}` are replaced with bound values before a line is
//! dispatched. References to unbound names are left as typed.

use std::borrow::Cow;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Variable bound to the current node on every navigation.
pub const NODE_VAR: &str = "NODE";

static VAR_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .unwrap_or_else(|_| unreachable!())
});

/// Bound variables.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    bindings: BTreeMap<String, String>,
}

impl Variables {
    /// Create an empty set of bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.bindings.insert(name.to_string(), value.into());
    }

    /// Remove a binding.
    pub fn unset(&mut self, name: &str) -> Option<String> {
        self.bindings.remove(name)
    }

    /// Current value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    /// Substitute bound references in `line`.
    #[must_use]
    pub fn expand<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if !line.contains('$') {
            return Cow::Borrowed(line);
        }
        VAR_REF.replace_all(line, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            match self.bindings.get(name) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn vars() -> Variables {
        let mut vars = Variables::new();
        vars.set(NODE_VAR, "42@afaf");
        vars.set("who", "world");
        vars
    }

    #[test_case("echo $who", "echo world" ; "plain reference")]
    #[test_case("echo ${who}!", "echo world!" ; "braced reference")]
    #[test_case("change-node $NODE", "change-node 42@afaf" ; "node variable")]
    #[test_case("echo $nobody", "echo $nobody" ; "unbound left alone")]
    #[test_case("echo $who$who", "echo worldworld" ; "adjacent references")]
    #[test_case("echo 5$", "echo 5$" ; "trailing dollar")]
    fn expands(input: &str, expected: &str) {
        assert_eq!(vars().expand(input), expected);
    }

    #[test]
    fn unset_removes_binding() {
        let mut vars = vars();
        assert_eq!(vars.unset(NODE_VAR).as_deref(), Some("42@afaf"));
        assert_eq!(vars.expand("x $NODE"), "x $NODE");
        assert!(vars.get(NODE_VAR).is_none());
    }

    #[test]
    fn rebinding_replaces_value() {
        let mut vars = vars();
        vars.set(NODE_VAR, "123@bfbf");
        assert_eq!(vars.expand("change-node $NODE"), "change-node 123@bfbf");
    }

    #[test]
    fn lines_without_references_are_borrowed() {
        assert!(matches!(vars().expand("list-nodes"), Cow::Borrowed(_)));
    }
}
