use backoffice_api::authz::Role;
use backoffice_api::navigation::{
    filter_navigation_by_role, NavigationItem, NavigationSection, NavigationTree,
};

const ALL_ROLES: [Role; 5] = [Role::Dev, Role::Admin, Role::User, Role::Owner, Role::Member];

fn mixed_tree() -> NavigationTree {
    NavigationTree {
        sections: vec![
            NavigationSection {
                title: "Main".to_string(),
                items: vec![
                    NavigationItem::open("/dashboard", "Dashboard", "home"),
                    NavigationItem::for_role("/billing", "Billing", "credit-card", Role::Owner),
                    NavigationItem::for_any_role("/reports", "Reports", "chart", [Role::Owner, Role::Admin]),
                ],
            },
            NavigationSection {
                title: "Owner only".to_string(),
                items: vec![NavigationItem::for_role("/danger", "Danger zone", "alert", Role::Owner)],
            },
        ],
    }
}

#[test]
fn filtered_items_always_satisfy_their_own_predicate() {
    for tree in [mixed_tree(), NavigationTree::default_layout()] {
        for role in ALL_ROLES {
            let filtered = filter_navigation_by_role(&tree, role);
            for section in &filtered.sections {
                for item in &section.items {
                    assert!(
                        item.visible_to(role),
                        "{} should not be visible to {:?}",
                        item.href,
                        role
                    );
                }
            }
        }
    }
}

#[test]
fn filtered_trees_never_contain_empty_sections() {
    for tree in [mixed_tree(), NavigationTree::default_layout()] {
        for role in ALL_ROLES {
            let filtered = filter_navigation_by_role(&tree, role);
            assert!(filtered.sections.iter().all(|s| !s.items.is_empty()));
        }
    }
}

#[test]
fn filtering_twice_equals_filtering_once() {
    for tree in [mixed_tree(), NavigationTree::default_layout()] {
        for role in ALL_ROLES {
            let once = filter_navigation_by_role(&tree, role);
            let twice = filter_navigation_by_role(&once, role);
            assert_eq!(once, twice);
        }
    }
}

#[test]
fn non_matching_roles_never_see_a_restricted_item() {
    let tree = mixed_tree();
    for role in ALL_ROLES {
        let filtered = filter_navigation_by_role(&tree, role);
        let sees_billing = filtered
            .sections
            .iter()
            .any(|s| s.items.iter().any(|i| i.href == "/billing"));
        assert_eq!(sees_billing, role == Role::Owner);
    }
}

#[test]
fn dropping_a_sections_last_item_drops_the_section() {
    let tree = mixed_tree();

    // Owner keeps the single-item section
    let owner = filter_navigation_by_role(&tree, Role::Owner);
    assert!(owner.sections.iter().any(|s| s.title == "Owner only"));

    // Everyone else loses the item and therefore the section
    let member = filter_navigation_by_role(&tree, Role::Member);
    assert!(!member.sections.iter().any(|s| s.title == "Owner only"));
}

#[test]
fn an_empty_tree_is_a_valid_input() {
    let filtered = filter_navigation_by_role(&NavigationTree::default(), Role::Dev);
    assert!(filtered.sections.is_empty());
}

#[test]
fn on_screen_order_is_preserved() {
    let owner = filter_navigation_by_role(&mixed_tree(), Role::Owner);
    let hrefs: Vec<&str> = owner.sections[0]
        .items
        .iter()
        .map(|i| i.href.as_str())
        .collect();
    assert_eq!(hrefs, vec!["/dashboard", "/billing", "/reports"]);
}
