//! Route tables
//!
//! A route table is an ordered list of request-dispatch entries. Contributor
//! tables are merged into the host table with the anchor-preserving list
//! merge, so entries the host already lists keep their position.

use integrator_merge::merge_list;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One request-dispatch entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteEntry {
    /// URL pattern (e.g. "^blog/")
    pub pattern: String,

    /// Handler the pattern dispatches to (e.g. "blog.urls")
    pub view: String,

    /// Optional reverse-lookup name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Contributing application; None for host entries.
    ///
    /// Part of equality: identical entries from different applications are
    /// distinct and never anchor each other.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
}

impl RouteEntry {
    pub fn new(pattern: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            view: view.into(),
            name: None,
            app: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn from_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.pattern, self.view)?;
        if let Some(name) = &self.name {
            write!(f, " [{}]", name)?;
        }
        Ok(())
    }
}

/// Ordered route table
pub type RouteTable = Vec<RouteEntry>;

/// Merge `source` routes into `host`, returning how many were inserted
pub fn append_routes(source: &[RouteEntry], host: &mut RouteTable) -> usize {
    merge_list(source, host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_routes_keeps_host_order() {
        let admin = RouteEntry::new("^admin/", "admin.site.urls");
        let blog = RouteEntry::new("^blog/", "blog.urls").named("blog");
        let mut host = vec![admin.clone()];

        let inserted = append_routes(&[blog.clone()], &mut host);

        assert_eq!(inserted, 1);
        assert_eq!(host, vec![admin, blog]);
    }

    #[test]
    fn test_shared_entry_is_anchor() {
        let admin = RouteEntry::new("^admin/", "admin.site.urls");
        let api = RouteEntry::new("^api/", "api.urls");
        let shop = RouteEntry::new("^shop/", "shop.urls");
        let mut host = vec![admin.clone(), shop.clone()];

        append_routes(&[api.clone(), shop.clone()], &mut host);

        assert_eq!(host, vec![admin, api, shop]);
    }

    #[test]
    fn test_same_route_from_two_apps_is_kept_twice() {
        let mut host = RouteTable::new();
        let from_a = RouteEntry::new("^api/", "api.urls").from_app("a");
        let from_b = RouteEntry::new("^api/", "api.urls").from_app("b");

        append_routes(&[from_a.clone()], &mut host);
        let inserted = append_routes(&[from_b.clone()], &mut host);

        assert_eq!(inserted, 1);
        assert_eq!(host, vec![from_a, from_b]);
    }

    #[test]
    fn test_display() {
        let entry = RouteEntry::new("^blog/", "blog.urls").named("blog");
        assert_eq!(entry.to_string(), "^blog/ -> blog.urls [blog]");
    }
}
