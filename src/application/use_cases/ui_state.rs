use std::sync::Mutex;

/// Transient view flags. Session-scoped only, nothing here is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiState {
    pub sidebar_open: bool,
    pub page_loading: bool,
}

pub struct UiStateService {
    state: Mutex<UiState>,
}

impl UiStateService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(UiState::default()),
        }
    }

    pub fn snapshot(&self) -> UiState {
        *self.state.lock().unwrap()
    }

    pub fn set_sidebar_open(&self, open: bool) {
        self.state.lock().unwrap().sidebar_open = open;
    }

    /// Flips the sidebar flag and returns the new value.
    pub fn toggle_sidebar(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.sidebar_open = !state.sidebar_open;
        state.sidebar_open
    }

    pub fn set_page_loading(&self, loading: bool) {
        self.state.lock().unwrap().page_loading = loading;
    }
}

impl Default for UiStateService {
    fn default() -> Self {
        Self::new()
    }
}
