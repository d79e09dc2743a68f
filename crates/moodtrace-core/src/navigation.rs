//! Navigation trees and the role-scoped navigation filter.
//!
//! Two static trees exist, one per audience. Hrefs are templates that
//! carry the `:spaceSlug` placeholder; the filter substitutes the
//! viewer's space slug and removes the links the viewer may not see.

use serde::{Deserialize, Serialize};

use crate::access::has_access;
use crate::models::membership::MembershipRole;
use crate::models::space::substitute_slug;

/// A link in a static navigation tree.
#[derive(Debug, Clone, Copy)]
pub struct NavigationLinkDef {
    /// Href template containing `:spaceSlug`.
    pub href: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
    /// All-of role requirement. `None` means visible to everyone.
    pub roles: Option<&'static [MembershipRole]>,
}

/// A titled, ordered group of links in a static navigation tree.
#[derive(Debug, Clone, Copy)]
pub struct NavigationGroupDef {
    pub title: &'static str,
    pub default_open_start_path: Option<&'static str>,
    pub links: &'static [NavigationLinkDef],
}

/// A link ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationLink {
    pub href: String,
    pub label: String,
    pub icon: String,
}

/// A group ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationGroup {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_open_start_path: Option<String>,
    pub links: Vec<NavigationLink>,
}

const OWNER: &[MembershipRole] = &[MembershipRole::Owner];
const ADMIN: &[MembershipRole] = &[MembershipRole::Admin];

const fn link(href: &'static str, icon: &'static str, label: &'static str) -> NavigationLinkDef {
    NavigationLinkDef {
        href,
        icon,
        label,
        roles: None,
    }
}

const fn guarded(
    href: &'static str,
    icon: &'static str,
    label: &'static str,
    roles: &'static [MembershipRole],
) -> NavigationLinkDef {
    NavigationLinkDef {
        href,
        icon,
        label,
        roles: Some(roles),
    }
}

/// Navigation shown to the space owner.
pub static PATIENT_NAVIGATION: &[NavigationGroupDef] = &[
    NavigationGroupDef {
        title: "Suivi",
        default_open_start_path: Some("/app/:spaceSlug"),
        links: &[
            link("/app/:spaceSlug", "layout-dashboard", "Tableau de bord"),
            link("/app/:spaceSlug/mood", "smile", "Humeur"),
            link("/app/:spaceSlug/sleep", "moon", "Sommeil"),
            link("/app/:spaceSlug/medications", "pill", "Médicaments"),
            link("/app/:spaceSlug/journal", "notebook-pen", "Journal"),
            link("/app/:spaceSlug/correlations", "chart-line", "Corrélations"),
        ],
    },
    NavigationGroupDef {
        title: "Paramètres",
        default_open_start_path: Some("/app/:spaceSlug/settings"),
        links: &[
            link("/app/:spaceSlug/settings/profile", "user", "Mon profil"),
            guarded("/app/:spaceSlug/settings", "settings", "Espace", ADMIN),
            guarded(
                "/app/:spaceSlug/settings/caregivers",
                "users",
                "Aidants",
                ADMIN,
            ),
            guarded(
                "/app/:spaceSlug/settings/billing",
                "credit-card",
                "Abonnement",
                ADMIN,
            ),
            guarded(
                "/app/:spaceSlug/settings/danger",
                "triangle-alert",
                "Zone danger",
                OWNER,
            ),
        ],
    },
];

/// Navigation shown to caregivers of a space.
pub static CAREGIVER_NAVIGATION: &[NavigationGroupDef] = &[
    NavigationGroupDef {
        title: "Patient",
        default_open_start_path: Some("/app/:spaceSlug"),
        links: &[
            link("/app/:spaceSlug", "layout-dashboard", "Tableau de bord"),
            link("/app/:spaceSlug/mood", "smile", "Humeur"),
            link("/app/:spaceSlug/sleep", "moon", "Sommeil"),
            link("/app/:spaceSlug/medications", "pill", "Médicaments"),
            link("/app/:spaceSlug/notes", "message-square", "Notes d'aidant"),
        ],
    },
    NavigationGroupDef {
        title: "Paramètres",
        default_open_start_path: Some("/app/:spaceSlug/settings"),
        links: &[
            link("/app/:spaceSlug/settings/profile", "user", "Mon profil"),
            guarded(
                "/app/:spaceSlug/settings/caregivers",
                "users",
                "Aidants",
                ADMIN,
            ),
        ],
    },
];

/// Static tree for an audience.
pub fn base_navigation(is_patient: bool) -> &'static [NavigationGroupDef] {
    if is_patient {
        PATIENT_NAVIGATION
    } else {
        CAREGIVER_NAVIGATION
    }
}

/// Build the navigation a viewer sees in a space.
///
/// Links the viewer may not access are removed, every `:spaceSlug`
/// placeholder is replaced by `space_slug`, and groups left without
/// links are dropped. Group and link order are preserved.
pub fn filter_navigation(
    space_slug: &str,
    viewer_roles: Option<&[MembershipRole]>,
    is_patient: bool,
) -> Vec<NavigationGroup> {
    filter_groups(base_navigation(is_patient), space_slug, viewer_roles)
}

/// Same as [`filter_navigation`] over an explicit tree.
pub fn filter_groups(
    groups: &[NavigationGroupDef],
    space_slug: &str,
    viewer_roles: Option<&[MembershipRole]>,
) -> Vec<NavigationGroup> {
    groups
        .iter()
        .filter_map(|group| {
            let links: Vec<NavigationLink> = group
                .links
                .iter()
                .filter(|l| has_access(viewer_roles, l.roles))
                .map(|l| NavigationLink {
                    href: substitute_slug(l.href, space_slug),
                    label: l.label.to_string(),
                    icon: l.icon.to_string(),
                })
                .collect();

            if links.is_empty() {
                return None;
            }

            Some(NavigationGroup {
                title: group.title.to_string(),
                default_open_start_path: group
                    .default_open_start_path
                    .map(|p| substitute_slug(p, space_slug)),
                links,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::space::SPACE_SLUG_PLACEHOLDER;
    use MembershipRole::{Admin, Member, Owner};

    fn group<'a>(groups: &'a [NavigationGroup], title: &str) -> Option<&'a NavigationGroup> {
        groups.iter().find(|g| g.title == title)
    }

    fn labels(group: &NavigationGroup) -> Vec<&str> {
        group.links.iter().map(|l| l.label.as_str()).collect()
    }

    #[test]
    fn every_href_uses_the_slug() {
        for roles in [None, Some(&[Owner][..]), Some(&[Admin][..])] {
            for is_patient in [true, false] {
                for g in filter_navigation("marie-d", roles, is_patient) {
                    let start = g.default_open_start_path.as_deref().unwrap_or("marie-d");
                    assert!(!start.contains(SPACE_SLUG_PLACEHOLDER));
                    assert!(start.contains("marie-d"));
                    for l in &g.links {
                        assert!(!l.href.contains(SPACE_SLUG_PLACEHOLDER), "{}", l.href);
                        assert!(l.href.contains("marie-d"), "{}", l.href);
                    }
                }
            }
        }
    }

    #[test]
    fn owner_sees_the_whole_patient_tree() {
        let nav = filter_navigation("s", Some(&[Owner]), true);
        assert_eq!(group(&nav, "Suivi").unwrap().links.len(), 6);
        assert_eq!(group(&nav, "Paramètres").unwrap().links.len(), 5);
    }

    #[test]
    fn admin_does_not_see_danger_zone() {
        let nav = filter_navigation("s", Some(&[Admin]), true);
        let settings = labels(group(&nav, "Paramètres").unwrap());
        assert_eq!(settings, vec!["Mon profil", "Espace", "Aidants", "Abonnement"]);
        assert!(!settings.contains(&"Zone danger"));
        assert_eq!(group(&nav, "Suivi").unwrap().links.len(), 6);
    }

    #[test]
    fn member_sees_only_profile_in_settings() {
        let nav = filter_navigation("s", Some(&[Member]), true);
        let settings = group(&nav, "Paramètres").unwrap();
        assert_eq!(labels(settings), vec!["Mon profil"]);
    }

    #[test]
    fn absent_roles_keep_only_unconstrained_links() {
        let nav = filter_navigation("s", None, true);
        let settings = group(&nav, "Paramètres").unwrap();
        assert_eq!(labels(settings), vec!["Mon profil"]);
        assert_eq!(group(&nav, "Suivi").unwrap().links.len(), 6);
    }

    #[test]
    fn caregiver_tree_is_selected_for_non_patients() {
        let nav = filter_navigation("s", Some(&[Admin]), false);
        assert_eq!(nav[0].title, "Patient");
        assert!(labels(&nav[0]).contains(&"Notes d'aidant"));
        assert_eq!(labels(&nav[1]), vec!["Mon profil", "Aidants"]);
    }

    #[test]
    fn default_open_start_path_is_substituted() {
        let nav = filter_navigation("paul", Some(&[Owner]), true);
        assert_eq!(
            nav[1].default_open_start_path.as_deref(),
            Some("/app/paul/settings")
        );
    }

    #[test]
    fn empty_groups_are_dropped() {
        static TREE: &[NavigationGroupDef] = &[
            NavigationGroupDef {
                title: "Admin only",
                default_open_start_path: None,
                links: &[NavigationLinkDef {
                    href: "/app/:spaceSlug/admin",
                    icon: "shield",
                    label: "Admin",
                    roles: Some(&[MembershipRole::Admin]),
                }],
            },
            NavigationGroupDef {
                title: "Open",
                default_open_start_path: None,
                links: &[NavigationLinkDef {
                    href: "/app/:spaceSlug",
                    icon: "home",
                    label: "Home",
                    roles: None,
                }],
            },
        ];

        let nav = filter_groups(TREE, "s", Some(&[Member]));
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].title, "Open");
        assert_eq!(nav[0].default_open_start_path, None);
    }

    #[test]
    fn filtering_is_idempotent() {
        let first = filter_navigation("s", Some(&[Admin]), true);
        let second = filter_navigation("s", Some(&[Admin]), true);
        assert_eq!(first, second);
        assert_eq!(PATIENT_NAVIGATION[0].links[0].href, "/app/:spaceSlug");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let nav = filter_navigation("s", None, true);
        let json = serde_json::to_value(&nav[0]).unwrap();
        assert_eq!(json["defaultOpenStartPath"], "/app/s");
        assert_eq!(json["links"][0]["href"], "/app/s");
    }
}
