//! Shared access token cell

use std::cell::RefCell;
use std::rc::Rc;

/// Current access token, written by the session boundary and read by the
/// row store and realtime transport on every request.
#[derive(Debug, Clone, Default)]
pub struct TokenSlot(Rc<RefCell<Option<String>>>);

impl TokenSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.0.borrow().clone()
    }

    pub fn set(&self, token: Option<String>) {
        *self.0.borrow_mut() = token;
    }
}
