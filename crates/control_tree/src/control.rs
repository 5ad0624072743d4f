use chrono::{DateTime, Utc};
use shared::{
    domain::{Attribute, Category, ControlId, ControlKind, ControlProps},
    error::UpdateError,
    protocol::ControlSnapshot,
};

/// Everything needed to register a control. The registry assigns id and order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewControl {
    pub label: String,
    pub props: ControlProps,
    pub parent: Option<ControlId>,
    pub visible: bool,
    pub disabled: bool,
    pub visibility_state: bool,
}

impl NewControl {
    pub fn new(label: impl Into<String>, props: ControlProps) -> Self {
        Self {
            label: label.into(),
            props,
            parent: None,
            visible: true,
            disabled: false,
            visibility_state: true,
        }
    }

    pub fn under(mut self, parent: Option<ControlId>) -> Self {
        self.parent = parent;
        self
    }
}

/// Child list and container-only flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub(crate) children: Vec<ControlId>,
    pub(crate) expanded: Option<bool>,
    pub(crate) visibility_state: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub(crate) id: ControlId,
    pub(crate) label: String,
    pub(crate) props: ControlProps,
    pub(crate) parent: Option<ControlId>,
    pub(crate) order: u64,
    pub(crate) visible: bool,
    // None for display controls: the slot does not exist.
    pub(crate) disabled: Option<bool>,
    pub(crate) container: Option<Container>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Control {
    pub(crate) fn from_new(id: ControlId, order: u64, new: NewControl) -> Self {
        let kind = new.props.kind();
        let disabled = (kind.category() == Category::Input).then_some(new.disabled);
        let container = match &new.props {
            ControlProps::FolderTree { expand_by_default } => Some(Container {
                children: Vec::new(),
                expanded: Some(*expand_by_default),
                visibility_state: Some(new.visibility_state),
            }),
            ControlProps::Folder { .. } => Some(Container {
                children: Vec::new(),
                expanded: None,
                visibility_state: None,
            }),
            _ => None,
        };

        Self {
            id,
            label: new.label,
            props: new.props,
            parent: new.parent,
            order,
            visible: new.visible,
            disabled,
            container,
            updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> ControlId {
        self.id
    }

    pub fn kind(&self) -> ControlKind {
        self.props.kind()
    }

    pub fn category(&self) -> Category {
        self.kind().category()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn props(&self) -> &ControlProps {
        &self.props
    }

    pub fn parent(&self) -> Option<ControlId> {
        self.parent
    }

    pub fn order(&self) -> u64 {
        self.order
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn disabled(&self) -> Option<bool> {
        self.disabled
    }

    pub fn expanded(&self) -> Option<bool> {
        self.container.as_ref().and_then(|c| c.expanded)
    }

    pub fn visibility_state(&self) -> Option<bool> {
        self.container.as_ref().and_then(|c| c.visibility_state)
    }

    pub fn is_container(&self) -> bool {
        self.container.is_some()
    }

    pub fn children(&self) -> &[ControlId] {
        self.container
            .as_ref()
            .map(|c| c.children.as_slice())
            .unwrap_or_default()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn get(&self, attribute: Attribute) -> Option<bool> {
        match attribute {
            Attribute::Visible => Some(self.visible),
            Attribute::Disabled => self.disabled,
            Attribute::Expanded => self.expanded(),
            Attribute::VisibilityState => self.visibility_state(),
        }
    }

    /// Writes one attribute. Returns whether the stored value changed.
    pub(crate) fn set(&mut self, attribute: Attribute, value: bool) -> Result<bool, UpdateError> {
        let kind = self.kind();
        let target_id = self.id;
        let slot = if kind.accepts(attribute) {
            match attribute {
                Attribute::Visible => Some(&mut self.visible),
                Attribute::Disabled => self.disabled.as_mut(),
                Attribute::Expanded => self.container.as_mut().and_then(|c| c.expanded.as_mut()),
                Attribute::VisibilityState => self
                    .container
                    .as_mut()
                    .and_then(|c| c.visibility_state.as_mut()),
            }
        } else {
            None
        };

        let Some(slot) = slot else {
            return Err(UpdateError::UnsupportedAttribute {
                target_id,
                kind,
                attribute: attribute.as_str().to_string(),
            });
        };

        let changed = *slot != value;
        *slot = value;
        Ok(changed)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        ControlSnapshot {
            id: self.id,
            kind: self.kind(),
            category: self.category(),
            label: self.label.clone(),
            parent: self.parent,
            order: self.order,
            visible: self.visible,
            disabled: self.disabled,
            expanded: self.expanded(),
            visibility_state: self.visibility_state(),
            children: self.children().to_vec(),
            props: self.props.clone(),
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
#[path = "tests/control_tests.rs"]
mod tests;
