//! Context-menu state scoped to one list
//!
//! Each list owns its own `MenuState`; at most one menu is open per list and
//! any interaction outside the menu closes it.

/// Which row's menu is open, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState<K> {
    open: Option<K>,
}

impl<K> Default for MenuState<K> {
    fn default() -> Self {
        Self { open: None }
    }
}

impl<K: PartialEq + Clone> MenuState<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the menu for `key`, or close it if it is already open
    pub fn toggle(&mut self, key: &K) {
        if self.is_open(key) {
            self.open = None;
        } else {
            self.open = Some(key.clone());
        }
    }

    pub fn is_open(&self, key: &K) -> bool {
        self.open.as_ref() == Some(key)
    }

    pub fn open_key(&self) -> Option<&K> {
        self.open.as_ref()
    }

    /// Click or key press anywhere outside the open menu
    pub fn close(&mut self) {
        self.open = None;
    }
}
