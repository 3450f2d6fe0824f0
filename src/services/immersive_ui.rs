//! Immersive reading UI state.
//!
//! A small state machine over [`UiState`]: chrome visible or hidden, at most
//! one overlay panel, plus the library/reader view and the loading and
//! error flags. [`transition`] is pure; [`UiStore`] owns the current state
//! and notifies subscribers after every change.
//!
//! Gestures only act on the reader view. The library scrolls like any
//! other list.

use tracing::{debug, warn};

use crate::types::gesture::Gesture;
use crate::types::ui::{UiEvent, UiState, View};

/// Next state for `event`. Returns a copy of `state` when nothing applies.
pub fn transition(state: &UiState, event: &UiEvent) -> UiState {
    let mut next = state.clone();

    match event {
        UiEvent::Gesture(gesture) => {
            if next.view != View::Reader {
                return next;
            }
            match gesture {
                Gesture::Tap => {
                    // A tap over an open panel belongs to the panel.
                    if !next.panel_open() {
                        next.chrome_hidden = !next.chrome_hidden;
                    }
                }
                Gesture::SwipeUp => {
                    next.panel = None;
                    next.chrome_hidden = true;
                }
                Gesture::SwipeDown => {
                    if next.panel_open() {
                        next.panel = None;
                    } else {
                        next.chrome_hidden = false;
                    }
                }
                Gesture::SwipeLeft | Gesture::SwipeRight => {}
            }
        }
        UiEvent::OpenPanel(panel) => {
            next.chrome_hidden = false;
            next.panel = Some(*panel);
        }
        UiEvent::ClosePanel => {
            next.panel = None;
        }
        UiEvent::OpenArticle(id) => {
            next.view = View::Reader;
            next.current_article_id = Some(id.clone());
            next.chrome_hidden = false;
            next.panel = None;
            next.error = None;
        }
        UiEvent::ShowLibrary => {
            next.view = View::Library;
            next.current_article_id = None;
            next.chrome_hidden = false;
            next.panel = None;
        }
        UiEvent::LoadingStarted => {
            next.loading = true;
            next.error = None;
        }
        UiEvent::LoadingFinished => {
            next.loading = false;
        }
        UiEvent::Failed(message) => {
            next.loading = false;
            next.error = Some(message.clone());
        }
        UiEvent::DismissError => {
            next.error = None;
        }
    }

    debug_assert!(
        !(next.chrome_hidden && next.panel_open()),
        "panel open with hidden chrome"
    );
    next
}

pub type SubscriptionId = u64;

type Observer = Box<dyn FnMut(&UiState)>;

/// Owner of the current [`UiState`].
#[derive(Default)]
pub struct UiStore {
    state: UiState,
    observers: Vec<(SubscriptionId, Observer)>,
    next_id: SubscriptionId,
}

impl std::fmt::Debug for UiStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiStore")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl UiStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Applies `event`. Observers run only when the state actually changed;
    /// the return value says whether it did.
    pub fn dispatch(&mut self, event: UiEvent) -> bool {
        let next = transition(&self.state, &event);
        if next == self.state {
            return false;
        }

        if let UiEvent::Failed(message) = &event {
            warn!(message = %message, "ui error shown");
        }
        debug!(?event, chrome_hidden = next.chrome_hidden, panel = ?next.panel, "ui state changed");

        self.state = next;
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.state);
        }
        true
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&UiState) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Returns `false` for unknown IDs.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}
