use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ClientId);

/// Stable identifier of a control. Opaque: carries no ordering information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(pub Uuid);

impl ControlId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ControlId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Read-only controls. Synchronize `visible` only.
    Display,
    /// Interactive controls and containers. Synchronize `visible` and `disabled`.
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Button,
    Slider,
    Checkbox,
    Text,
    Rgb,
    Number,
    Vector3,
    Markdown,
    ProgressBar,
    Folder,
    FolderTree,
}

impl ControlKind {
    pub fn category(self) -> Category {
        match self {
            Self::Markdown | Self::ProgressBar => Category::Display,
            Self::Button
            | Self::Slider
            | Self::Checkbox
            | Self::Text
            | Self::Rgb
            | Self::Number
            | Self::Vector3
            | Self::Folder
            | Self::FolderTree => Category::Input,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, Self::Folder | Self::FolderTree)
    }

    /// Fixed attribute table: which synchronized attributes a kind carries.
    pub fn accepts(self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::Visible => true,
            Attribute::Disabled => self.category() == Category::Input,
            Attribute::Expanded | Attribute::VisibilityState => self == Self::FolderTree,
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Button => "button",
            Self::Slider => "slider",
            Self::Checkbox => "checkbox",
            Self::Text => "text",
            Self::Rgb => "rgb",
            Self::Number => "number",
            Self::Vector3 => "vector3",
            Self::Markdown => "markdown",
            Self::ProgressBar => "progress_bar",
            Self::Folder => "folder",
            Self::FolderTree => "folder_tree",
        };
        f.write_str(name)
    }
}

/// Attributes a remote actor may synchronize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Visible,
    Disabled,
    Expanded,
    VisibilityState,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::Visible,
        Attribute::Disabled,
        Attribute::Expanded,
        Attribute::VisibilityState,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Disabled => "disabled",
            Self::Expanded => "expanded",
            Self::VisibilityState => "visibility_state",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.as_str() == key)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Widget payload. The variant fixes the control's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlProps {
    Button,
    Slider {
        min: f64,
        max: f64,
        step: f64,
        value: f64,
    },
    Checkbox {
        value: bool,
    },
    Text {
        value: String,
    },
    Rgb {
        value: [u8; 3],
    },
    Number {
        value: f64,
    },
    Vector3 {
        value: [f64; 3],
    },
    Markdown {
        content: String,
    },
    ProgressBar {
        value: f64,
    },
    Folder {
        expand_by_default: bool,
    },
    FolderTree {
        expand_by_default: bool,
    },
}

impl ControlProps {
    pub fn kind(&self) -> ControlKind {
        match self {
            Self::Button => ControlKind::Button,
            Self::Slider { .. } => ControlKind::Slider,
            Self::Checkbox { .. } => ControlKind::Checkbox,
            Self::Text { .. } => ControlKind::Text,
            Self::Rgb { .. } => ControlKind::Rgb,
            Self::Number { .. } => ControlKind::Number,
            Self::Vector3 { .. } => ControlKind::Vector3,
            Self::Markdown { .. } => ControlKind::Markdown,
            Self::ProgressBar { .. } => ControlKind::ProgressBar,
            Self::Folder { .. } => ControlKind::Folder,
            Self::FolderTree { .. } => ControlKind::FolderTree,
        }
    }
}
