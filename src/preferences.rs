use crate::catalog::{Catalog, RouteQuery};
use compact_str::CompactString;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Per-id "notify me" flags for every line, station and feeder route, plus
/// the line whose station list is expanded.
pub struct PreferenceStore {
    catalog: Arc<Catalog>,
    // Id -> notifications enabled. Holds exactly the catalog's ids.
    flags: DashMap<CompactString, bool>,
    expanded_line: RwLock<Option<CompactString>>,
}

/// Serializable copy of the store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceSnapshot {
    pub flags: BTreeMap<CompactString, bool>,
    pub expanded_line: Option<CompactString>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StationEntry {
    pub id: CompactString,
    pub name: CompactString,
    pub enabled: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct LineEntry {
    pub id: CompactString,
    pub name: CompactString,
    pub color: CompactString,
    pub enabled: bool,
    pub expanded: bool,
    pub stations: Vec<StationEntry>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RouteEntry {
    pub id: CompactString,
    pub name: CompactString,
    pub enabled: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePage {
    pub page: usize,
    pub page_count: usize,
    pub routes: Vec<RouteEntry>,
}

impl PreferenceStore {
    /// Every known id starts enabled.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let flags = DashMap::new();
        for id in catalog.known_ids() {
            flags.insert(id.clone(), true);
        }
        Self {
            catalog,
            flags,
            expanded_line: RwLock::new(None),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn get(&self, id: &str) -> Option<bool> {
        self.flags.get(id).map(|r| *r.value())
    }

    /// Flips the flag for `id` and returns the new value. Unknown ids are
    /// ignored.
    pub fn toggle(&self, id: &str) -> Option<bool> {
        match self.flags.get_mut(id) {
            Some(mut flag) => {
                *flag = !*flag;
                debug!(id, enabled = *flag, "Preference toggled");
                Some(*flag)
            }
            None => {
                debug!(id, "Ignoring toggle for unknown id");
                None
            }
        }
    }

    pub fn snapshot(&self) -> BTreeMap<CompactString, bool> {
        self.flags
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect()
    }

    pub fn expanded_line(&self) -> Option<CompactString> {
        match self.expanded_line.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Expands `line_id`, or collapses it if it is already expanded.
    /// Unknown lines leave the selection unchanged.
    pub fn set_line_selection(&self, line_id: &str) -> Option<CompactString> {
        let mut expanded = match self.expanded_line.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !self.catalog.has_line(line_id) {
            return expanded.clone();
        }
        if expanded.as_deref() == Some(line_id) {
            *expanded = None;
        } else {
            *expanded = Some(CompactString::from(line_id));
        }
        expanded.clone()
    }

    pub fn lines(&self) -> Vec<LineEntry> {
        let expanded = self.expanded_line();
        self.catalog
            .lines
            .iter()
            .map(|line| LineEntry {
                id: line.id.clone(),
                name: line.name.clone(),
                color: line.color.clone(),
                enabled: self.get(&line.id).unwrap_or(true),
                expanded: expanded.as_ref() == Some(&line.id),
                stations: line
                    .stations
                    .iter()
                    .map(|s| StationEntry {
                        id: s.id.clone(),
                        name: s.name.clone(),
                        enabled: self.get(&s.id).unwrap_or(true),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Displayed feeder routes with their flags. Reads only.
    pub fn route_page(&self, query: &RouteQuery) -> RoutePage {
        let routes = self
            .catalog
            .filter_routes(query)
            .into_iter()
            .map(|r| RouteEntry {
                id: r.id.clone(),
                name: r.name.clone(),
                enabled: self.get(&r.id).unwrap_or(true),
            })
            .collect();
        RoutePage {
            page: query.page,
            page_count: self.catalog.route_page_count(),
            routes,
        }
    }

    pub fn export(&self) -> PreferenceSnapshot {
        PreferenceSnapshot {
            flags: self.snapshot(),
            expanded_line: self.expanded_line(),
        }
    }

    /// Applies a saved snapshot. Ids the catalog does not know are skipped.
    /// Returns how many flags were applied.
    pub fn restore(&self, saved: PreferenceSnapshot) -> usize {
        let mut applied = 0;
        for (id, enabled) in saved.flags {
            if let Some(mut flag) = self.flags.get_mut(&id) {
                *flag = enabled;
                applied += 1;
            }
        }

        let mut expanded = match self.expanded_line.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *expanded = saved
            .expanded_line
            .filter(|line| self.catalog.has_line(line));
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PreferenceStore {
        PreferenceStore::new(Arc::new(Catalog::medellin()))
    }

    #[test]
    fn test_every_known_id_defaults_to_enabled() {
        let store = store();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), store.catalog().known_ids().count());
        assert!(snapshot.values().all(|enabled| *enabled));
        assert_eq!(store.get("Metro A"), Some(true));
        assert_eq!(store.get("PBE"), Some(true));
        assert_eq!(store.get("C23"), Some(true));
    }

    #[test]
    fn test_toggle_only_touches_one_entry() {
        let store = store();
        let before = store.snapshot();

        assert_eq!(store.toggle("Metro B"), Some(false));
        let after = store.snapshot();
        for (id, enabled) in &after {
            if id.as_str() == "Metro B" {
                assert!(!enabled);
            } else {
                assert_eq!(before.get(id), Some(enabled), "{} changed", id);
            }
        }

        // Line flags do not cascade to stations
        assert_eq!(store.get("CIS_B"), Some(true));

        assert_eq!(store.toggle("Metro B"), Some(true));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_unknown_toggle_is_noop() {
        let store = store();
        let before = store.snapshot();
        assert_eq!(store.toggle("Metro Z"), None);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_line_selection_toggles_on_same_id() {
        let store = store();
        assert_eq!(store.expanded_line(), None);

        assert_eq!(store.set_line_selection("Metro A").as_deref(), Some("Metro A"));
        assert_eq!(store.set_line_selection("Tranvía").as_deref(), Some("Tranvía"));
        assert_eq!(store.set_line_selection("Tranvía"), None);

        store.set_line_selection("Metro B");
        assert_eq!(store.set_line_selection("nope").as_deref(), Some("Metro B"));

        let lines = store.lines();
        assert_eq!(lines.iter().filter(|l| l.expanded).count(), 1);
    }

    #[test]
    fn test_selection_does_not_touch_flags() {
        let store = store();
        let before = store.snapshot();
        store.set_line_selection("Metro A");
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_route_filter_leaves_flags_alone() {
        let store = store();
        store.toggle("250");
        let before = store.snapshot();

        let page = store.route_page(&RouteQuery {
            search: "BELÉN".to_string(),
            page: 1,
        });
        assert_eq!(page.routes.len(), 1);
        assert_eq!(page.routes[0].id.as_str(), "250");
        assert!(!page.routes[0].enabled);
        assert_eq!(page.page_count, 1);

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_restore_skips_unknown_ids() {
        let store = store();
        let mut saved = PreferenceSnapshot::default();
        saved.flags.insert("Metro A".into(), false);
        saved.flags.insert("Retired Line".into(), false);
        saved.expanded_line = Some("Retired Line".into());

        assert_eq!(store.restore(saved), 1);
        assert_eq!(store.get("Metro A"), Some(false));
        assert_eq!(store.get("Retired Line"), None);
        assert_eq!(store.expanded_line(), None);
    }

    #[test]
    fn test_export_then_restore_into_fresh_store() {
        let store = store();
        store.toggle("SAN_T");
        store.set_line_selection("Tranvía");

        let fresh = self::store();
        fresh.restore(store.export());
        assert_eq!(fresh.export(), store.export());
    }
}
