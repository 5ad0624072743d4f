//! Control tree core: a registry of GUI controls, per-session scoped
//! construction, and the update protocol remote clients use to toggle
//! `visible`/`disabled` and friends.

mod builder;
mod control;
pub mod layouts;
mod registry;
mod scope;
mod update;

pub use builder::{
    ContainerHandle, ControlHandle, ControlOptions, FolderTreeOptions, GuiBuilder, ScopeGuard,
    SliderRange,
};
pub use control::{Container, Control, NewControl};
pub use registry::{Registry, DEFAULT_EVENT_CAPACITY};
pub use scope::ScopeStack;
pub use update::{decode_client_message, handle_update, rejection_event, UpdateReport};
