//! Permission representation and evaluation.

use std::collections::HashSet;
use std::fmt;

/// Wire spelling of the allow-everything permission.
pub const WILDCARD: &str = "*:*:*";

/// A single granted permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Permission {
    /// `*:*:*`: unconditional access.
    Wildcard,
    /// `module:resource:action`, kept verbatim.
    Named(String),
}

impl Permission {
    /// Parse one raw entry. Surrounding whitespace is dropped; blank entries
    /// yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            WILDCARD => Some(Permission::Wildcard),
            named => Some(Permission::Named(named.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Permission::Wildcard => WILDCARD,
            Permission::Named(name) => name,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluated authorization context for one request. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    subject: String,
    allow_all: bool,
    named: HashSet<String>,
}

impl PermissionSet {
    /// Trim, drop blanks, dedupe; any wildcard entry sets allow-all.
    pub fn build<I, S>(subject: impl Into<String>, raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self {
            subject: subject.into(),
            ..Default::default()
        };
        for permission in raw.into_iter().filter_map(|p| Permission::parse(p.as_ref())) {
            match permission {
                Permission::Wildcard => set.allow_all = true,
                Permission::Named(name) => {
                    set.named.insert(name);
                }
            }
        }
        set
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn allows_all(&self) -> bool {
        self.allow_all
    }

    /// Always true once allow-all is set.
    pub fn has(&self, permission: &str) -> bool {
        self.allow_all || self.named.contains(permission.trim())
    }

    /// Number of distinct named entries (the wildcard is not counted).
    pub fn len(&self) -> usize {
        self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.allow_all && self.named.is_empty()
    }

    /// Granted permissions, wildcard first, named entries sorted.
    pub fn permissions(&self) -> Vec<Permission> {
        let mut named: Vec<_> = self.named.iter().cloned().collect();
        named.sort();
        self.allow_all
            .then_some(Permission::Wildcard)
            .into_iter()
            .chain(named.into_iter().map(Permission::Named))
            .collect()
    }
}

/// Does `set` satisfy any one of `required`?
///
/// - no requirement declared: pass
/// - no set attached to the request: deny
/// - allow-all: pass
/// - otherwise: pass iff at least one required entry is held verbatim
pub fn check(set: Option<&PermissionSet>, required: &[&str]) -> bool {
    if required.is_empty() {
        return true;
    }
    let Some(set) = set else {
        return false;
    };
    set.allows_all() || required.iter().any(|r| set.has(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_normalizes_entries() {
        let set = PermissionSet::build(
            "7",
            ["  system:user:list ", "", "   ", "system:user:list", "system:role:edit"],
        );
        assert_eq!(set.subject(), "7");
        assert_eq!(set.len(), 2);
        assert!(set.has("system:user:list"));
        assert!(set.has("system:role:edit"));
        assert!(!set.allows_all());
    }

    #[test]
    fn test_wildcard_allows_everything() {
        let set = PermissionSet::build("1", [" *:*:* "]);
        assert!(set.allows_all());
        assert!(set.has("anything:at:all"));
        assert!(check(Some(&set), &["system:user:delete"]));
        assert!(check(Some(&set), &["x", "y"]));
        assert_eq!(set.permissions(), vec![Permission::Wildcard]);
    }

    #[test]
    fn test_empty_requirement_always_passes() {
        let set = PermissionSet::build("7", Vec::<String>::new());
        assert!(check(Some(&set), &[]));
        assert!(check(None, &[]));
    }

    #[test]
    fn test_missing_set_denies() {
        assert!(!check(None, &["system:user:list"]));
    }

    #[test]
    fn test_any_of_required() {
        let set = PermissionSet::build("7", ["system:user:list"]);
        assert!(check(Some(&set), &["system:user:edit", "system:user:list"]));
        assert!(!check(Some(&set), &["system:user:edit", "system:user:delete"]));
    }

    #[test]
    fn test_match_is_verbatim() {
        let set = PermissionSet::build("7", ["system:user:list"]);
        assert!(!set.has("system:user:*"));
        assert!(!set.has("SYSTEM:USER:LIST"));
        assert!(!set.has("system:user"));
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!(Permission::parse("*:*:*"), Some(Permission::Wildcard));
        assert_eq!(
            Permission::parse(" a:b:c "),
            Some(Permission::Named("a:b:c".into()))
        );
        assert_eq!(Permission::parse("  "), None);
        assert_eq!(Permission::Wildcard.to_string(), "*:*:*");
    }

    #[test]
    fn test_permissions_listing_is_sorted() {
        let set = PermissionSet::build("7", ["b:b:b", "a:a:a", "*:*:*"]);
        let listed: Vec<_> = set.permissions().iter().map(|p| p.to_string()).collect();
        assert_eq!(listed, vec!["*:*:*", "a:a:a", "b:b:b"]);
    }
}
