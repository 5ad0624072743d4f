use std::ops::{Deref, DerefMut};

use shared::{
    domain::{ControlId, ControlKind, ControlProps},
    error::BuildError,
};
use tracing::{trace, warn};

use crate::{control::NewControl, registry::Registry, scope::ScopeStack};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlHandle {
    id: ControlId,
    kind: ControlKind,
}

impl ControlHandle {
    pub fn id(&self) -> ControlId {
        self.id
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }
}

/// Handle to a Folder or FolderTree. Only these can be entered as a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    id: ControlId,
    kind: ControlKind,
}

impl ContainerHandle {
    pub fn id(&self) -> ControlId {
        self.id
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }
}

impl From<ContainerHandle> for ControlHandle {
    fn from(value: ContainerHandle) -> Self {
        Self {
            id: value.id,
            kind: value.kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlOptions {
    pub visible: bool,
    pub disabled: bool,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            visible: true,
            disabled: false,
        }
    }
}

impl ControlOptions {
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderTreeOptions {
    pub label: String,
    pub expand_by_default: bool,
    pub visible: bool,
    pub visibility_state: bool,
}

impl FolderTreeOptions {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            expand_by_default: true,
            visible: true,
            visibility_state: true,
        }
    }

    pub fn expand_by_default(mut self, expand: bool) -> Self {
        self.expand_by_default = expand;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn visibility_state(mut self, state: bool) -> Self {
        self.visibility_state = state;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SliderRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }
}

/// One builder session: a registry handle plus its own scope stack.
///
/// Sessions sharing a registry never share a stack.
pub struct GuiBuilder {
    registry: Registry,
    scope: ScopeStack,
}

impl GuiBuilder {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            scope: ScopeStack::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn current_container(&self) -> Option<ControlId> {
        self.scope.current()
    }

    pub fn depth(&self) -> usize {
        self.scope.depth()
    }

    /// Makes `container` current until the returned guard drops.
    pub fn enter(&mut self, container: &ContainerHandle) -> ScopeGuard<'_> {
        self.scope.enter(container.id);
        trace!(container = %container.id, depth = self.scope.depth(), "entered container scope");
        ScopeGuard {
            builder: self,
            container: container.id,
        }
    }

    pub fn within<R>(
        &mut self,
        container: &ContainerHandle,
        build: impl FnOnce(&mut GuiBuilder) -> R,
    ) -> R {
        let mut scope = self.enter(container);
        build(&mut *scope)
    }

    /// Handle for an existing container, e.g. to add more children later.
    pub fn reopen(&self, id: ControlId) -> Result<ContainerHandle, BuildError> {
        let control = self
            .registry
            .resolve(id)
            .map_err(|_| BuildError::ParentMissing(id))?;
        if !control.is_container() {
            return Err(BuildError::NotAContainer {
                id,
                kind: control.kind(),
            });
        }
        Ok(ContainerHandle {
            id,
            kind: control.kind(),
        })
    }

    fn add(&mut self, new: NewControl) -> Result<ControlHandle, BuildError> {
        let kind = new.props.kind();
        let id = self.registry.register(new.under(self.scope.current()))?;
        Ok(ControlHandle { id, kind })
    }

    fn add_input(
        &mut self,
        label: impl Into<String>,
        props: ControlProps,
        options: ControlOptions,
    ) -> Result<ControlHandle, BuildError> {
        let mut new = NewControl::new(label, props);
        new.visible = options.visible;
        new.disabled = options.disabled;
        self.add(new)
    }

    pub fn add_folder_tree(
        &mut self,
        options: FolderTreeOptions,
    ) -> Result<ContainerHandle, BuildError> {
        let mut new = NewControl::new(
            options.label,
            ControlProps::FolderTree {
                expand_by_default: options.expand_by_default,
            },
        );
        new.visible = options.visible;
        new.visibility_state = options.visibility_state;
        let handle = self.add(new)?;
        Ok(ContainerHandle {
            id: handle.id,
            kind: handle.kind,
        })
    }

    pub fn add_folder(
        &mut self,
        label: impl Into<String>,
        expand_by_default: bool,
    ) -> Result<ContainerHandle, BuildError> {
        let handle = self.add(NewControl::new(
            label,
            ControlProps::Folder { expand_by_default },
        ))?;
        Ok(ContainerHandle {
            id: handle.id,
            kind: handle.kind,
        })
    }

    pub fn add_button(
        &mut self,
        label: impl Into<String>,
        options: ControlOptions,
    ) -> Result<ControlHandle, BuildError> {
        self.add_input(label, ControlProps::Button, options)
    }

    pub fn add_slider(
        &mut self,
        label: impl Into<String>,
        range: SliderRange,
        initial_value: f64,
        options: ControlOptions,
    ) -> Result<ControlHandle, BuildError> {
        let label = label.into();
        let SliderRange { min, max, step } = range;
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(invalid(&label, "slider bounds must be finite"));
        }
        if min > max {
            return Err(invalid(&label, format!("min {min} exceeds max {max}")));
        }
        if step <= 0.0 {
            return Err(invalid(&label, "step must be positive"));
        }
        let value = initial_value.clamp(min, max);
        self.add_input(
            label,
            ControlProps::Slider {
                min,
                max,
                step,
                value,
            },
            options,
        )
    }

    pub fn add_checkbox(
        &mut self,
        label: impl Into<String>,
        initial_value: bool,
        options: ControlOptions,
    ) -> Result<ControlHandle, BuildError> {
        self.add_input(
            label,
            ControlProps::Checkbox {
                value: initial_value,
            },
            options,
        )
    }

    pub fn add_text(
        &mut self,
        label: impl Into<String>,
        initial_value: impl Into<String>,
        options: ControlOptions,
    ) -> Result<ControlHandle, BuildError> {
        self.add_input(
            label,
            ControlProps::Text {
                value: initial_value.into(),
            },
            options,
        )
    }

    pub fn add_rgb(
        &mut self,
        label: impl Into<String>,
        initial_value: [u8; 3],
        options: ControlOptions,
    ) -> Result<ControlHandle, BuildError> {
        self.add_input(
            label,
            ControlProps::Rgb {
                value: initial_value,
            },
            options,
        )
    }

    pub fn add_number(
        &mut self,
        label: impl Into<String>,
        initial_value: f64,
        options: ControlOptions,
    ) -> Result<ControlHandle, BuildError> {
        let label = label.into();
        if !initial_value.is_finite() {
            return Err(invalid(&label, "number must be finite"));
        }
        self.add_input(
            label,
            ControlProps::Number {
                value: initial_value,
            },
            options,
        )
    }

    pub fn add_vector3(
        &mut self,
        label: impl Into<String>,
        initial_value: [f64; 3],
        options: ControlOptions,
    ) -> Result<ControlHandle, BuildError> {
        self.add_input(
            label,
            ControlProps::Vector3 {
                value: initial_value,
            },
            options,
        )
    }

    pub fn add_markdown(&mut self, content: impl Into<String>) -> Result<ControlHandle, BuildError> {
        let content = content.into();
        let label = content.lines().next().unwrap_or_default().to_string();
        self.add(NewControl::new(label, ControlProps::Markdown { content }))
    }

    pub fn add_progress_bar(
        &mut self,
        label: impl Into<String>,
        value: f64,
    ) -> Result<ControlHandle, BuildError> {
        let label = label.into();
        if !value.is_finite() {
            return Err(invalid(&label, "progress must be finite"));
        }
        self.add(NewControl::new(
            label,
            ControlProps::ProgressBar {
                value: value.clamp(0.0, 100.0),
            },
        ))
    }
}

fn invalid(label: &str, reason: impl Into<String>) -> BuildError {
    BuildError::InvalidOptions {
        label: label.to_string(),
        reason: reason.into(),
    }
}

/// Open container scope. Dropping it, on any exit path, restores the previous one.
pub struct ScopeGuard<'a> {
    builder: &'a mut GuiBuilder,
    container: ControlId,
}

impl ScopeGuard<'_> {
    pub fn container(&self) -> ControlId {
        self.container
    }
}

impl Deref for ScopeGuard<'_> {
    type Target = GuiBuilder;

    fn deref(&self) -> &Self::Target {
        self.builder
    }
}

impl DerefMut for ScopeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.builder
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        let popped = self.builder.scope.exit();
        if popped != Some(self.container) {
            // An inner guard was leaked; drop its frames along with ours.
            warn!(container = %self.container, ?popped, "scope stack out of balance");
            self.builder.scope.unwind_to(self.container);
        }
        trace!(container = %self.container, "left container scope");
    }
}

#[cfg(test)]
#[path = "tests/builder_tests.rs"]
mod tests;
