//! Scoped subscription handle

use std::fmt;

/// An open subscription. Released exactly once: explicitly through
/// [`Subscription::unsubscribe`] or implicitly on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self { release: Some(Box::new(release)) }
    }

    /// Subscription that owns `guard` until release, then hands it to
    /// `release`. Transport callbacks stay registered exactly as long as the
    /// handle is active.
    pub fn holding<G: 'static>(guard: G, release: impl FnOnce(G) + 'static) -> Self {
        Self::new(move || release(guard))
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Tracked {
        name: &'static str,
        dropped: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.dropped.borrow_mut().push(self.name);
        }
    }

    struct Callbacks {
        _onopen: Tracked,
        _onmessage: Tracked,
        heartbeat: Tracked,
    }

    fn open(dropped: &Rc<RefCell<Vec<&'static str>>>, log: Rc<RefCell<Vec<&'static str>>>) -> Subscription {
        let tracked = |name| Tracked { name, dropped: dropped.clone() };
        let callbacks = Callbacks {
            _onopen: tracked("onopen"),
            _onmessage: tracked("onmessage"),
            heartbeat: tracked("heartbeat"),
        };
        Subscription::holding(callbacks, move |callbacks| {
            log.borrow_mut().push("released");
            drop(callbacks.heartbeat);
        })
    }

    #[test]
    fn test_release_runs_once_on_drop() {
        let released = Rc::new(Cell::new(0));
        {
            let released = released.clone();
            let _sub = Subscription::new(move || released.set(released.get() + 1));
        }
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_explicit_unsubscribe_does_not_double_release() {
        let released = Rc::new(Cell::new(0));
        let sub = {
            let released = released.clone();
            Subscription::new(move || released.set(released.get() + 1))
        };
        assert!(sub.is_active());
        sub.unsubscribe();
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn test_held_callbacks_live_until_release() {
        let dropped = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::new(RefCell::new(Vec::new()));
        let sub = open(&dropped, log.clone());

        assert!(dropped.borrow().is_empty(), "dropped while active: {:?}", dropped.borrow());
        assert!(log.borrow().is_empty());

        sub.unsubscribe();
        assert_eq!(*log.borrow(), vec!["released"]);
        let mut gone = dropped.borrow().clone();
        gone.sort_unstable();
        assert_eq!(gone, vec!["heartbeat", "onmessage", "onopen"]);
    }

    #[test]
    fn test_held_callbacks_released_on_drop() {
        let dropped = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::new(RefCell::new(Vec::new()));
        drop(open(&dropped, log.clone()));
        assert_eq!(*log.borrow(), vec!["released"]);
        assert_eq!(dropped.borrow().len(), 3);
    }
}
