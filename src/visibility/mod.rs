//! Which optional columns are currently shown.
//!
//! One [`VisibilityStore`] exists per session. The table, the column panel and
//! the exporter all hold clones of the same handle and read it synchronously,
//! so none of them can observe a different answer for the same column.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, trace};

use crate::catalog::{self, ColumnKey};
use crate::preferences::{self, PreferenceChannel, PreferenceError};

pub type VisibilityState = BTreeMap<ColumnKey, bool>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Set(ColumnKey, bool),
    SetAll,
    ClearAll,
}

/// Pure transition: the entries a toggle assigns, in canonical order.
///
/// Every targeted entry is returned, changed or not, so applying the result to
/// a presentation surface is idempotent.
pub fn transition(state: &VisibilityState, toggle: Toggle) -> Vec<(ColumnKey, bool)> {
    match toggle {
        Toggle::Set(key, visible) => {
            debug_assert!(state.contains_key(&key), "column '{key}' is not toggleable");
            if state.contains_key(&key) {
                vec![(key, visible)]
            } else {
                Vec::new()
            }
        }
        Toggle::SetAll => state.keys().map(|k| (*k, true)).collect(),
        Toggle::ClearAll => state.keys().map(|k| (*k, false)).collect(),
    }
}

#[derive(Clone, Debug)]
pub struct VisibilityStore {
    inner: Rc<RefCell<VisibilityState>>,
}

impl VisibilityStore {
    /// Seed every optional column from `defaults`, then turn on each column
    /// whose persisted preference is truthy. Preferences never hide a column.
    pub fn initialize<I>(defaults: I, persisted: &HashMap<String, String>) -> Self
    where
        I: IntoIterator<Item = (ColumnKey, bool)>,
    {
        let mut state: VisibilityState = defaults
            .into_iter()
            .inspect(|(key, _)| debug_assert!(key.is_optional(), "core column '{key}' seeded"))
            .collect();

        for (raw_key, value) in persisted {
            let key = match raw_key.parse::<ColumnKey>() {
                Ok(key) => key,
                Err(_) => {
                    trace!(key = %raw_key, "ignoring unrelated preference");
                    continue;
                }
            };
            if let Some(entry) = state.get_mut(&key) {
                if preferences::is_truthy(value) {
                    *entry = true;
                }
            }
        }

        debug!(
            visible = state.values().filter(|v| **v).count(),
            total = state.len(),
            "column visibility initialized"
        );
        Self {
            inner: Rc::new(RefCell::new(state)),
        }
    }

    /// Catalog defaults plus persisted overrides.
    pub fn from_catalog(persisted: &HashMap<String, String>) -> Self {
        Self::initialize(catalog::default_visibility(), persisted)
    }

    /// Visibility of an optional column.
    pub fn get(&self, key: ColumnKey) -> bool {
        let state = self.inner.borrow();
        match state.get(&key) {
            Some(visible) => *visible,
            None => {
                debug_assert!(false, "column '{key}' has no visibility entry");
                true
            }
        }
    }

    /// Core columns are always visible; optional ones ask the store.
    pub fn is_visible(&self, key: ColumnKey) -> bool {
        !key.is_optional() || self.get(key)
    }

    pub fn set(&self, key: ColumnKey, visible: bool) {
        self.apply(Toggle::Set(key, visible));
    }

    pub fn set_all(&self, visible: bool) {
        self.apply(if visible {
            Toggle::SetAll
        } else {
            Toggle::ClearAll
        });
    }

    pub fn clear_all(&self) {
        self.apply(Toggle::ClearAll);
    }

    /// Apply a toggle in place and return the assigned entries.
    pub fn apply(&self, toggle: Toggle) -> Vec<(ColumnKey, bool)> {
        let changes = transition(&self.inner.borrow(), toggle);
        let mut state = self.inner.borrow_mut();
        for (key, visible) in &changes {
            state.insert(*key, *visible);
        }
        trace!(?toggle, entries = changes.len(), "visibility updated");
        changes
    }

    pub fn snapshot(&self) -> VisibilityState {
        self.inner.borrow().clone()
    }

    /// Core columns plus visible optional columns, in canonical order.
    pub fn visible_columns(&self) -> Vec<ColumnKey> {
        ColumnKey::ALL
            .into_iter()
            .filter(|k| self.is_visible(*k))
            .collect()
    }
}

/// Something that shows or hides columns, such as an assembled table.
pub trait ColumnSurface {
    fn show_column(&mut self, key: ColumnKey, visible: bool);
}

/// Stand-in surface for toggles made before anything is rendered.
#[derive(Clone, Copy, Debug, Default)]
pub struct Detached;

impl ColumnSurface for Detached {
    fn show_column(&mut self, _key: ColumnKey, _visible: bool) {}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PanelEntry {
    pub key: ColumnKey,
    pub label: &'static str,
    pub checked: bool,
}

/// The column configuration control: one checkbox per optional column plus
/// "set all" and "clear all".
///
/// Each action updates the store, projects the result onto the surface, and
/// writes the preference channel, in that order.
pub struct ColumnPanel<P: PreferenceChannel> {
    store: VisibilityStore,
    preferences: P,
}

impl<P: PreferenceChannel> ColumnPanel<P> {
    pub fn new(store: VisibilityStore, preferences: P) -> Self {
        Self { store, preferences }
    }

    pub fn store(&self) -> &VisibilityStore {
        &self.store
    }

    pub fn preferences(&self) -> &P {
        &self.preferences
    }

    pub fn entries(&self) -> Vec<PanelEntry> {
        catalog::optional_columns()
            .map(|key| PanelEntry {
                key,
                label: key.label(),
                checked: self.store.get(key),
            })
            .collect()
    }

    pub fn toggle(
        &mut self,
        key: ColumnKey,
        visible: bool,
        surface: &mut dyn ColumnSurface,
    ) -> Result<(), PreferenceError> {
        self.dispatch(Toggle::Set(key, visible), surface)
    }

    pub fn set_all(&mut self, surface: &mut dyn ColumnSurface) -> Result<(), PreferenceError> {
        self.dispatch(Toggle::SetAll, surface)
    }

    pub fn clear_all(&mut self, surface: &mut dyn ColumnSurface) -> Result<(), PreferenceError> {
        self.dispatch(Toggle::ClearAll, surface)
    }

    pub fn apply(
        &mut self,
        toggle: Toggle,
        surface: &mut dyn ColumnSurface,
    ) -> Result<(), PreferenceError> {
        self.dispatch(toggle, surface)
    }

    fn dispatch(
        &mut self,
        toggle: Toggle,
        surface: &mut dyn ColumnSurface,
    ) -> Result<(), PreferenceError> {
        let changes = self.store.apply(toggle);
        for (key, visible) in &changes {
            surface.show_column(*key, *visible);
        }
        self.preferences.store_many(&changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryPreferences;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(ColumnKey, bool)>,
    }

    impl ColumnSurface for Recorder {
        fn show_column(&mut self, key: ColumnKey, visible: bool) {
            self.calls.push((key, visible));
        }
    }

    fn empty() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn store_keys_are_exactly_the_optional_columns() {
        let store = VisibilityStore::from_catalog(&empty());
        let keys: Vec<ColumnKey> = store.snapshot().into_keys().collect();
        let optional: Vec<ColumnKey> = catalog::optional_columns().collect();
        assert_eq!(keys, optional);
    }

    #[test]
    fn persisted_truthy_values_only_increase_visibility() {
        let persisted = HashMap::from([
            ("lot_number".to_string(), "true".to_string()),
            ("host".to_string(), "false".to_string()),
            ("CookieConsent".to_string(), "true".to_string()),
        ]);
        let defaults = vec![(ColumnKey::LotNumber, false), (ColumnKey::Host, true)];
        let store = VisibilityStore::initialize(defaults, &persisted);
        assert!(store.get(ColumnKey::LotNumber));
        assert!(store.get(ColumnKey::Host));
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn toggling_is_reversible() {
        let store = VisibilityStore::from_catalog(&empty());
        for key in catalog::optional_columns() {
            let before = store.get(key);
            store.set(key, true);
            assert!(store.get(key));
            store.set(key, false);
            assert!(!store.get(key));
            assert_eq!(store.get(key), before);
        }
    }

    #[test]
    fn clones_share_state() {
        let store = VisibilityStore::from_catalog(&empty());
        let reader = store.clone();
        store.set(ColumnKey::Rrid, true);
        assert!(reader.get(ColumnKey::Rrid));
        store.clear_all();
        assert!(!reader.get(ColumnKey::Rrid));
    }

    #[test]
    fn core_columns_are_always_visible() {
        let store = VisibilityStore::from_catalog(&empty());
        store.clear_all();
        let visible = store.visible_columns();
        assert_eq!(visible, catalog::core_columns().collect::<Vec<_>>());
        store.set_all(true);
        assert_eq!(store.visible_columns(), ColumnKey::ALL.to_vec());
    }

    #[test]
    fn transition_is_pure() {
        let state = VisibilityStore::from_catalog(&empty()).snapshot();
        let before = state.clone();
        let changes = transition(&state, Toggle::SetAll);
        assert_eq!(state, before);
        assert_eq!(changes.len(), 22);
        assert!(changes.iter().all(|(_, v)| *v));
    }

    #[test]
    fn panel_updates_store_then_surface_then_preferences() {
        let store = VisibilityStore::from_catalog(&empty());
        let mut panel = ColumnPanel::new(store.clone(), MemoryPreferences::new());
        let mut surface = Recorder::default();

        panel.toggle(ColumnKey::Isotype, true, &mut surface).unwrap();
        assert!(store.get(ColumnKey::Isotype));
        assert_eq!(surface.calls, vec![(ColumnKey::Isotype, true)]);
        assert_eq!(panel.preferences().get(ColumnKey::Isotype), Some("true"));

        panel.clear_all(&mut surface).unwrap();
        assert_eq!(surface.calls.len(), 1 + 22);
        assert!(panel.entries().iter().all(|e| !e.checked));
        assert_eq!(panel.preferences().get(ColumnKey::Host), Some("false"));
    }

    #[test]
    fn panel_lists_optional_columns_with_labels() {
        let panel = ColumnPanel::new(VisibilityStore::from_catalog(&empty()), MemoryPreferences::new());
        let entries = panel.entries();
        assert_eq!(entries.len(), 22);
        assert_eq!(entries[0].key, ColumnKey::CloneId);
        assert_eq!(entries[0].label, "Clone ID");
    }
}
