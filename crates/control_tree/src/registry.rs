use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use shared::{
    domain::{Category, ControlId},
    error::{BuildError, UpdateError},
    protocol::{ControlSnapshot, ServerEvent},
};
use tokio::sync::broadcast;
use tracing::debug;

use crate::control::{Control, NewControl};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Default)]
pub(crate) struct RegistryState {
    pub(crate) controls: HashMap<ControlId, Control>,
    roots: Vec<ControlId>,
    dirty: Vec<ControlId>,
    next_order: u64,
}

impl RegistryState {
    pub(crate) fn mark_dirty(&mut self, id: ControlId) {
        if !self.dirty.contains(&id) {
            self.dirty.push(id);
        }
    }

    fn renders(&self, control: &Control) -> bool {
        let display = control.category() == Category::Display;
        control.visible()
            && self.ancestors(control.id()).all(|ancestor| {
                ancestor.visible() && (!display || ancestor.visibility_state().unwrap_or(true))
            })
    }

    fn ancestors(&self, id: ControlId) -> Ancestors<'_> {
        Ancestors {
            state: self,
            next: self.controls.get(&id).and_then(Control::parent),
        }
    }
}

struct Ancestors<'a> {
    state: &'a RegistryState,
    next: Option<ControlId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Control;

    fn next(&mut self) -> Option<Self::Item> {
        let control = self.state.controls.get(&self.next?)?;
        self.next = control.parent();
        Some(control)
    }
}

/// Shared owner of every control, keyed by id.
///
/// Cloning is cheap and every clone sees the same controls. Each public method
/// takes the lock once, so a single call is atomic with respect to concurrent
/// update deliveries.
#[derive(Clone)]
pub struct Registry {
    state: Arc<RwLock<RegistryState>>,
    events: broadcast::Sender<ServerEvent>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(RegistryState::default())),
            events,
        }
    }

    /// Outbound stream of created/updated/removed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, event: ServerEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    pub fn register(&self, new: NewControl) -> Result<ControlId, BuildError> {
        let mut state = self.write();

        if let Some(parent_id) = new.parent {
            let parent = state
                .controls
                .get(&parent_id)
                .ok_or(BuildError::ParentMissing(parent_id))?;
            if !parent.is_container() {
                return Err(BuildError::NotAContainer {
                    id: parent_id,
                    kind: parent.kind(),
                });
            }
        }

        let id = ControlId::new_v4();
        let order = state.next_order;
        state.next_order += 1;

        let control = Control::from_new(id, order, new);
        let parent = control.parent();
        let snapshot = control.snapshot();
        state.controls.insert(id, control);

        match parent {
            Some(parent_id) => {
                if let Some(container) = state
                    .controls
                    .get_mut(&parent_id)
                    .and_then(|p| p.container.as_mut())
                {
                    container.children.push(id);
                }
            }
            None => state.roots.push(id),
        }

        debug!(%id, kind = %snapshot.kind, label = %snapshot.label, "control registered");
        self.publish(ServerEvent::ControlCreated { control: snapshot });
        Ok(id)
    }

    pub fn resolve(&self, id: ControlId) -> Result<Control, UpdateError> {
        self.read()
            .controls
            .get(&id)
            .cloned()
            .ok_or(UpdateError::NotFound(id))
    }

    pub fn contains(&self, id: ControlId) -> bool {
        self.read().controls.contains_key(&id)
    }

    pub fn snapshot(&self, id: ControlId) -> Result<ControlSnapshot, UpdateError> {
        self.read()
            .controls
            .get(&id)
            .map(Control::snapshot)
            .ok_or(UpdateError::NotFound(id))
    }

    /// Detaches `id` and its whole subtree. Removing an unknown id is a no-op.
    ///
    /// Returns the ids that were actually removed, parent first.
    pub fn remove(&self, id: ControlId) -> Vec<ControlId> {
        let mut state = self.write();
        let Some(parent) = state.controls.get(&id).map(Control::parent) else {
            return Vec::new();
        };

        let mut parent_snapshot = None;
        match parent {
            Some(parent_id) => {
                if let Some(parent) = state.controls.get_mut(&parent_id) {
                    if let Some(container) = parent.container.as_mut() {
                        container.children.retain(|child| *child != id);
                    }
                    parent.touch();
                    parent_snapshot = Some(parent.snapshot());
                    state.mark_dirty(parent_id);
                }
            }
            None => state.roots.retain(|root| *root != id),
        }

        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(control) = state.controls.remove(&next) {
                pending.extend(control.children().iter().rev().copied());
                removed.push(next);
            }
        }
        state.dirty.retain(|dirty| !removed.contains(dirty));
        drop(state);

        for removed_id in &removed {
            self.publish(ServerEvent::ControlRemoved { id: *removed_id });
        }
        if let Some(control) = parent_snapshot {
            self.publish(ServerEvent::ControlUpdated { control });
        }
        debug!(%id, count = removed.len(), "control subtree removed");
        removed
    }

    pub fn roots(&self) -> Vec<ControlId> {
        self.read().roots.clone()
    }

    pub fn children(&self, id: ControlId) -> Result<Vec<ControlId>, UpdateError> {
        self.read()
            .controls
            .get(&id)
            .map(|control| control.children().to_vec())
            .ok_or(UpdateError::NotFound(id))
    }

    pub fn is_descendant(&self, ancestor: ControlId, id: ControlId) -> bool {
        self.read()
            .ancestors(id)
            .any(|control| control.id() == ancestor)
    }

    /// Depth-first snapshot of every control, siblings in insertion order.
    pub fn tree(&self) -> Vec<ControlSnapshot> {
        let state = self.read();
        let mut out = Vec::with_capacity(state.controls.len());
        let mut pending: Vec<ControlId> = state.roots.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            if let Some(control) = state.controls.get(&id) {
                pending.extend(control.children().iter().rev().copied());
                out.push(control.snapshot());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.read().controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().controls.is_empty()
    }

    /// Drains the ids changed since the last call, in first-change order.
    pub fn take_dirty(&self) -> Vec<ControlId> {
        std::mem::take(&mut self.write().dirty)
    }

    /// Whether the control renders. Hidden ancestors hide it without touching
    /// its own flag. A closed eye on an ancestor folder tree hides display
    /// controls only; inputs stay on screen, dimmed and locked.
    pub fn effective_visibility(&self, id: ControlId) -> Result<bool, UpdateError> {
        let state = self.read();
        let control = state.controls.get(&id).ok_or(UpdateError::NotFound(id))?;
        Ok(state.renders(control))
    }

    /// Whether the control accepts interaction: it renders, neither it nor any
    /// ancestor container is disabled, and no ancestor folder tree has its
    /// eye closed.
    pub fn effective_interactivity(&self, id: ControlId) -> Result<bool, UpdateError> {
        let state = self.read();
        let control = state.controls.get(&id).ok_or(UpdateError::NotFound(id))?;
        let enabled = state.renders(control)
            && !control.disabled().unwrap_or(false)
            && state.ancestors(id).all(|ancestor| {
                !ancestor.disabled().unwrap_or(false)
                    && ancestor.visibility_state().unwrap_or(true)
            });
        Ok(enabled)
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
