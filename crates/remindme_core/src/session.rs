//! Explicit list-view session state.
//!
//! # Responsibility
//! - Hold selection, theme and search state passed into UI calls instead of
//!   living in ambient globals.
//! - Apply list-view rules: selection gestures, reload on activation, bulk
//!   delete of the selection.
//!
//! # Invariants
//! - `selected_ids` has no duplicates and keeps selection order.
//! - Selection mode is active iff at least one id is selected.

use crate::clock::Clock;
use crate::model::reminder::{Reminder, ReminderId};
use crate::notify::scheduler::NotificationBackend;
use crate::repo::reminder_repo::ReminderStore;
use crate::service::reminder_service::{CoordinatorResult, ReminderCoordinator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// What a tap on a list row should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressAction {
    /// Navigate to the editor for this reminder.
    Open(ReminderId),
    /// Selection changed; stay on the list.
    SelectionChanged,
}

/// State of the reminder list view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiSession {
    selection_mode: bool,
    selected_ids: Vec<ReminderId>,
    pub theme: Theme,
    search_visible: bool,
    query: String,
}

impl UiSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection_mode(&self) -> bool {
        self.selection_mode
    }

    pub fn selected_ids(&self) -> &[ReminderId] {
        &self.selected_ids
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_ids.iter().any(|selected| selected == id)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn search_visible(&self) -> bool {
        self.search_visible
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Shows or hides the search field; hiding clears the query.
    pub fn toggle_search(&mut self) {
        if self.search_visible {
            self.query.clear();
        }
        self.search_visible = !self.search_visible;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Enters selection mode with exactly `id` selected.
    pub fn long_press(&mut self, id: &str) {
        self.selection_mode = true;
        self.selected_ids = vec![id.to_string()];
    }

    /// Toggles `id` in selection mode, otherwise opens it.
    pub fn press(&mut self, id: &str) -> PressAction {
        if !self.selection_mode {
            return PressAction::Open(id.to_string());
        }

        if self.is_selected(id) {
            self.selected_ids.retain(|selected| selected != id);
            if self.selected_ids.is_empty() {
                self.exit_selection_mode();
            }
        } else {
            self.selected_ids.push(id.to_string());
        }
        PressAction::SelectionChanged
    }

    /// Whether every visible row is selected (checked select-all box).
    pub fn all_selected(&self, visible_ids: &[ReminderId]) -> bool {
        !visible_ids.is_empty() && visible_ids.iter().all(|id| self.is_selected(id))
    }

    /// Selects every visible row, or clears the selection when all of them
    /// already are. Clearing ends selection mode; outside selection mode this
    /// does nothing.
    pub fn toggle_select_all(&mut self, visible_ids: &[ReminderId]) {
        if !self.selection_mode {
            return;
        }
        if self.all_selected(visible_ids) {
            self.exit_selection_mode();
            return;
        }

        self.selected_ids.clear();
        for id in visible_ids {
            if !self.is_selected(id) {
                self.selected_ids.push(id.clone());
            }
        }
        if self.selected_ids.is_empty() {
            self.exit_selection_mode();
        }
    }

    pub fn exit_selection_mode(&mut self) {
        self.selection_mode = false;
        self.selected_ids.clear();
    }

    /// Reloads the list from the store when the view becomes active.
    ///
    /// Previously held snapshots are never reused; selection mode ends.
    pub fn activate_list_view<S, B, C>(
        &mut self,
        coordinator: &ReminderCoordinator<S, B, C>,
    ) -> Vec<Reminder>
    where
        S: ReminderStore,
        B: NotificationBackend,
        C: Clock,
    {
        self.exit_selection_mode();
        coordinator.list_visible(&self.query)
    }

    /// Deletes every selected reminder and leaves selection mode.
    ///
    /// Selection is kept when the store write fails so the user can retry.
    pub fn delete_selected<S, B, C>(
        &mut self,
        coordinator: &ReminderCoordinator<S, B, C>,
    ) -> CoordinatorResult<usize>
    where
        S: ReminderStore,
        B: NotificationBackend,
        C: Clock,
    {
        let removed = coordinator.delete_many(&self.selected_ids)?;
        self.exit_selection_mode();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::{PressAction, Theme, UiSession};

    fn visible(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn select_all_selects_every_row_then_clears() {
        let rows = visible(&["a", "b", "c"]);
        let mut session = UiSession::new();
        session.long_press("b");
        assert!(!session.all_selected(&rows));

        session.toggle_select_all(&rows);
        assert_eq!(session.selected_ids(), rows.as_slice());
        assert!(session.all_selected(&rows));

        session.toggle_select_all(&rows);
        assert!(session.selected_ids().is_empty());
        assert!(!session.selection_mode());
    }

    #[test]
    fn select_all_is_ignored_outside_selection_mode() {
        let mut session = UiSession::new();
        session.toggle_select_all(&visible(&["a"]));
        assert!(!session.selection_mode());
        assert!(session.selected_ids().is_empty());
    }

    #[test]
    fn press_outside_selection_mode_opens_editor() {
        let mut session = UiSession::new();
        assert_eq!(session.press("a"), PressAction::Open("a".to_string()));
        assert!(!session.selection_mode());
    }

    #[test]
    fn deselecting_last_id_leaves_selection_mode() {
        let mut session = UiSession::new();
        session.long_press("a");
        assert_eq!(session.press("b"), PressAction::SelectionChanged);
        assert_eq!(session.selected_ids(), ["a".to_string(), "b".to_string()]);

        session.press("a");
        session.press("b");
        assert!(!session.selection_mode());
        assert!(session.selected_ids().is_empty());
    }

    #[test]
    fn hiding_search_clears_query() {
        let mut session = UiSession::new();
        session.toggle_search();
        session.set_query("gym");
        session.toggle_search();
        assert!(!session.search_visible());
        assert_eq!(session.query(), "");
    }

    #[test]
    fn theme_defaults_to_dark_and_toggles() {
        let mut session = UiSession::new();
        assert_eq!(session.theme, Theme::Dark);
        assert_eq!(session.toggle_theme(), Theme::Light);
    }
}
