//! One-shot "layout completed" listeners.
//!
//! A listener is registered for a single element and runs at most once:
//! firing removes it before it is invoked, and it can be cancelled any
//! time before that.

use crate::tree::ElementId;

/// Handle for cancelling a pending listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback run with the shared loop data and the measured height
pub type LayoutCallback<'l, D, R = ()> = Box<dyn FnOnce(&mut D, f32) -> R + 'l>;

struct Listener<'l, D, R> {
    id: ListenerId,
    element: ElementId,
    callback: LayoutCallback<'l, D, R>,
}

pub struct LayoutListeners<'l, D, R = ()> {
    next_id: u64,
    pending: Vec<Listener<'l, D, R>>,
}

impl<'l, D, R> LayoutListeners<'l, D, R> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Run `callback` the next time `element` completes layout.
    pub fn once<F>(&mut self, element: ElementId, callback: F) -> ListenerId
    where
        F: FnOnce(&mut D, f32) -> R + 'l,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Listener {
            id,
            element,
            callback: Box::new(callback),
        });
        id
    }

    /// Drop a pending listener. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: ListenerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|l| l.id != id);
        self.pending.len() != before
    }

    /// Remove and return every listener waiting on `element`, in registration order.
    pub fn take(&mut self, element: ElementId) -> Vec<LayoutCallback<'l, D, R>> {
        let (fired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|l| l.element == element);
        self.pending = kept;
        fired.into_iter().map(|l| l.callback).collect()
    }

    pub fn is_subscribed(&self, element: ElementId) -> bool {
        self.pending.iter().any(|l| l.element == element)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<D, R> Default for LayoutListeners<'_, D, R> {
    fn default() -> Self {
        Self::new()
    }
}
