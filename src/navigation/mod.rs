use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::authz::Role;

/// One sidebar entry. Zero or one of `required_role` / `required_any_role`
/// is meaningfully checked: when both are set, `required_role` alone decides
/// (pinned by test below).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationItem {
    pub href: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_any_role: Option<HashSet<Role>>,
}

impl NavigationItem {
    pub fn open(href: &str, label: &str, icon: &str) -> Self {
        Self {
            href: href.to_string(),
            label: label.to_string(),
            icon: Some(icon.to_string()),
            required_role: None,
            required_any_role: None,
        }
    }

    pub fn for_role(href: &str, label: &str, icon: &str, role: Role) -> Self {
        Self {
            required_role: Some(role),
            ..Self::open(href, label, icon)
        }
    }

    pub fn for_any_role<const N: usize>(href: &str, label: &str, icon: &str, roles: [Role; N]) -> Self {
        Self {
            required_any_role: Some(roles.into_iter().collect()),
            ..Self::open(href, label, icon)
        }
    }

    /// Visibility predicate for a caller role.
    pub fn visible_to(&self, role: Role) -> bool {
        if let Some(required) = self.required_role {
            return required == role;
        }
        if let Some(any) = &self.required_any_role {
            return any.contains(&role);
        }
        true
    }
}

/// A titled, ordered group of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationSection {
    pub title: String,
    pub items: Vec<NavigationItem>,
}

/// The declarative sidebar menu, in on-screen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationTree {
    pub sections: Vec<NavigationSection>,
}

impl NavigationTree {
    /// The dashboard sidebar. Built once at startup and shared read-only.
    pub fn default_layout() -> Self {
        use Role::*;

        Self {
            sections: vec![
                NavigationSection {
                    title: "Overview".to_string(),
                    items: vec![
                        NavigationItem::open("/dashboard", "Dashboard", "home"),
                        NavigationItem::open("/organizations", "Organizations", "building"),
                    ],
                },
                NavigationSection {
                    title: "Catalog".to_string(),
                    items: vec![
                        NavigationItem::for_any_role(
                            "/products",
                            "Products",
                            "package",
                            [Owner, Member],
                        ),
                        NavigationItem::for_any_role(
                            "/categories",
                            "Categories",
                            "tags",
                            [Owner, Member],
                        ),
                        NavigationItem::for_any_role("/combos", "Combos", "layers", [Owner, Member]),
                        NavigationItem::for_any_role(
                            "/inventory",
                            "Inventory",
                            "boxes",
                            [Owner, Member],
                        ),
                    ],
                },
                NavigationSection {
                    title: "Organization".to_string(),
                    items: vec![
                        NavigationItem::for_role("/settings", "Settings", "settings", Owner),
                        NavigationItem::for_role("/members", "Members", "users", Owner),
                    ],
                },
                NavigationSection {
                    title: "Platform".to_string(),
                    items: vec![
                        NavigationItem::for_any_role(
                            "/admin/organizations",
                            "All organizations",
                            "globe",
                            [Dev, Admin],
                        ),
                        NavigationItem::for_role("/admin/impersonate", "Impersonate", "user-cog", Dev),
                        NavigationItem::for_role("/admin/audit", "Audit log", "scroll", Dev),
                    ],
                },
            ],
        }
    }
}

/// Produce the tree a caller with `role` actually sees: items failing their
/// visibility predicate are dropped, then sections left empty are dropped.
/// Ordering of the survivors is preserved - it is the on-screen menu order.
pub fn filter_navigation_by_role(tree: &NavigationTree, role: Role) -> NavigationTree {
    let sections = tree
        .sections
        .iter()
        .filter_map(|section| {
            let items: Vec<NavigationItem> = section
                .items
                .iter()
                .filter(|item| item.visible_to(role))
                .cloned()
                .collect();

            if items.is_empty() {
                None
            } else {
                Some(NavigationSection {
                    title: section.title.clone(),
                    items,
                })
            }
        })
        .collect();

    NavigationTree { sections }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Role::*;

    fn sample_tree() -> NavigationTree {
        NavigationTree {
            sections: vec![
                NavigationSection {
                    title: "General".to_string(),
                    items: vec![
                        NavigationItem::open("/home", "Home", "home"),
                        NavigationItem::for_role("/settings", "Settings", "settings", Owner),
                    ],
                },
                NavigationSection {
                    title: "Admin".to_string(),
                    items: vec![NavigationItem::for_role("/admin", "Admin", "shield", Admin)],
                },
                NavigationSection {
                    title: "Staff".to_string(),
                    items: vec![NavigationItem::for_any_role(
                        "/work",
                        "Work",
                        "wrench",
                        [Owner, Member],
                    )],
                },
            ],
        }
    }

    #[test]
    fn unrestricted_items_are_visible_to_everyone() {
        for role in [Dev, Admin, User, Owner, Member] {
            let filtered = filter_navigation_by_role(&sample_tree(), role);
            assert!(filtered.sections[0]
                .items
                .iter()
                .any(|item| item.href == "/home"));
        }
    }

    #[test]
    fn every_surviving_item_satisfies_its_own_predicate() {
        for role in [Dev, Admin, User, Owner, Member] {
            let filtered = filter_navigation_by_role(&sample_tree(), role);
            for section in &filtered.sections {
                for item in &section.items {
                    assert!(item.visible_to(role), "{} leaked to {:?}", item.href, role);
                }
            }
        }
    }

    #[test]
    fn no_section_survives_empty() {
        for role in [Dev, Admin, User, Owner, Member] {
            let filtered = filter_navigation_by_role(&sample_tree(), role);
            assert!(filtered.sections.iter().all(|s| !s.items.is_empty()));
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        for role in [Dev, Admin, User, Owner, Member] {
            let once = filter_navigation_by_role(&sample_tree(), role);
            let twice = filter_navigation_by_role(&once, role);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn restricted_item_retained_for_matching_role_dropped_otherwise() {
        // role=Admin: the Admin section's only item survives
        let filtered = filter_navigation_by_role(&sample_tree(), Admin);
        assert!(filtered
            .sections
            .iter()
            .any(|s| s.title == "Admin" && s.items.len() == 1));

        // role=User: the item is dropped, and with it the whole section
        let filtered = filter_navigation_by_role(&sample_tree(), User);
        assert!(!filtered.sections.iter().any(|s| s.title == "Admin"));
        assert!(!filtered.sections.iter().any(|s| s.title == "Staff"));
    }

    #[test]
    fn any_role_sets_admit_each_listed_role() {
        for role in [Owner, Member] {
            let filtered = filter_navigation_by_role(&sample_tree(), role);
            assert!(filtered
                .sections
                .iter()
                .any(|s| s.items.iter().any(|i| i.href == "/work")));
        }
        let filtered = filter_navigation_by_role(&sample_tree(), User);
        assert!(!filtered
            .sections
            .iter()
            .any(|s| s.items.iter().any(|i| i.href == "/work")));
    }

    #[test]
    fn single_role_takes_precedence_over_any_role() {
        // Both fields set: only required_role decides, the set is ignored.
        let item = NavigationItem {
            required_role: Some(Owner),
            required_any_role: Some([Member].into_iter().collect()),
            ..NavigationItem::open("/both", "Both", "question")
        };
        assert!(item.visible_to(Owner));
        assert!(!item.visible_to(Member));
    }

    #[test]
    fn empty_tree_filters_to_empty_tree() {
        let filtered = filter_navigation_by_role(&NavigationTree::default(), Owner);
        assert!(filtered.sections.is_empty());
    }

    #[test]
    fn ordering_is_preserved() {
        let filtered = filter_navigation_by_role(&sample_tree(), Owner);
        let titles: Vec<&str> = filtered.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["General", "Staff"]);
        let hrefs: Vec<&str> = filtered.sections[0]
            .items
            .iter()
            .map(|i| i.href.as_str())
            .collect();
        assert_eq!(hrefs, vec!["/home", "/settings"]);
    }

    #[test]
    fn default_layout_shapes_by_role() {
        let tree = NavigationTree::default_layout();

        // Owners see settings and members but no platform tools
        let owner = filter_navigation_by_role(&tree, Owner);
        assert!(owner.sections.iter().any(|s| s.title == "Organization"));
        assert!(!owner.sections.iter().any(|s| s.title == "Platform"));

        // Members get the catalog but not organization settings
        let member = filter_navigation_by_role(&tree, Member);
        assert!(member.sections.iter().any(|s| s.title == "Catalog"));
        assert!(!member.sections.iter().any(|s| s.title == "Organization"));

        // Devs see all platform tooling
        let dev = filter_navigation_by_role(&tree, Dev);
        let platform = dev
            .sections
            .iter()
            .find(|s| s.title == "Platform")
            .expect("platform section");
        assert_eq!(platform.items.len(), 3);
    }
}
