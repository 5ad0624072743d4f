use shared::domain::ControlId;

/// Stack of open containers for one builder session.
///
/// New controls attach to the top of the stack; an empty stack means the root.
#[derive(Debug, Default, Clone)]
pub struct ScopeStack {
    frames: Vec<ControlId>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, container: ControlId) {
        self.frames.push(container);
    }

    /// Pops the innermost container. No-op at the root.
    pub fn exit(&mut self) -> Option<ControlId> {
        self.frames.pop()
    }

    /// Pops `container` and everything opened after it. No-op if it is not open.
    pub fn unwind_to(&mut self, container: ControlId) {
        if let Some(pos) = self.frames.iter().rposition(|frame| *frame == container) {
            self.frames.truncate(pos);
        }
    }

    pub fn current(&self) -> Option<ControlId> {
        self.frames.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
