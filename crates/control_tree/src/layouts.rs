//! Ready-made control trees used by the server at startup and by the CLI.

use std::{fmt, str::FromStr};

use shared::error::BuildError;
use thiserror::Error;

use crate::builder::{ControlOptions, FolderTreeOptions, GuiBuilder, SliderRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Three levels of folder trees plus a regular folder.
    FolderTree,
    /// One folder tree holding one control of each input kind and a display control.
    EyeButton,
    /// A folder tree nested in a folder tree holding a single button.
    Nested,
    Empty,
}

#[derive(Debug, Error)]
#[error("unknown layout `{0}` (expected one of: folder_tree, eye_button, nested, empty)")]
pub struct UnknownLayout(pub String);

impl Layout {
    pub const ALL: [Layout; 4] = [
        Layout::FolderTree,
        Layout::EyeButton,
        Layout::Nested,
        Layout::Empty,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::FolderTree => "folder_tree",
            Self::EyeButton => "eye_button",
            Self::Nested => "nested",
            Self::Empty => "empty",
        }
    }

    pub fn build(self, gui: &mut GuiBuilder) -> Result<(), BuildError> {
        match self {
            Self::FolderTree => folder_tree(gui),
            Self::EyeButton => eye_button(gui),
            Self::Nested => nested(gui),
            Self::Empty => Ok(()),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layout {
    type Err = UnknownLayout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|layout| layout.name() == wanted)
            .ok_or_else(|| UnknownLayout(s.to_string()))
    }
}

fn folder_tree(gui: &mut GuiBuilder) -> Result<(), BuildError> {
    let defaults = ControlOptions::default();
    let main = gui.add_folder_tree(FolderTreeOptions::new("Main Folder Tree"))?;
    let mut main = gui.enter(&main);
    main.add_button("Button 1", defaults)?;
    main.add_slider("Slider 1", SliderRange::new(0.0, 100.0, 1.0), 50.0, defaults)?;

    let nested =
        main.add_folder_tree(FolderTreeOptions::new("Nested Folder Tree").expand_by_default(false))?;
    {
        let mut nested = main.enter(&nested);
        nested.add_button("Nested Button", defaults)?;
        nested.add_checkbox("Nested Checkbox", true, defaults)?;

        let deep = nested.add_folder_tree(FolderTreeOptions::new("Deep Nested Folder"))?;
        let mut deep = nested.enter(&deep);
        deep.add_rgb("Color", [255, 0, 0], defaults)?;
        deep.add_number("Number", 42.0, defaults)?;
    }

    let regular = main.add_folder("Regular Folder", true)?;
    let mut regular = main.enter(&regular);
    regular.add_text("Text Input", "Hello", defaults)?;
    regular.add_vector3("Vector", [1.0, 0.0, 0.0], defaults)?;
    Ok(())
}

fn eye_button(gui: &mut GuiBuilder) -> Result<(), BuildError> {
    let defaults = ControlOptions::default();
    let tree = gui.add_folder_tree(FolderTreeOptions::new("Test FolderTree"))?;
    gui.within(&tree, |gui| -> Result<(), BuildError> {
        gui.add_button("Test Button 1", defaults)?;
        gui.add_button("Test Button 2", ControlOptions::disabled())?;
        gui.add_slider("Test Slider", SliderRange::new(0.0, 100.0, 1.0), 50.0, defaults)?;
        gui.add_text("Text Input", "Hello", defaults)?;
        gui.add_checkbox("Checkbox", true, defaults)?;
        gui.add_markdown("Toggle the eye to hide everything in this tree.")?;
        gui.add_progress_bar("Progress", 25.0)?;
        Ok(())
    })
}

fn nested(gui: &mut GuiBuilder) -> Result<(), BuildError> {
    let outer = gui.add_folder_tree(FolderTreeOptions::new("Test FolderTree"))?;
    gui.within(&outer, |gui| -> Result<(), BuildError> {
        let inner = gui.add_folder_tree(FolderTreeOptions::new("Subfolder 1"))?;
        gui.within(&inner, |gui| gui.add_button("Test Button", ControlOptions::default()))?;
        Ok(())
    })
}
