use std::panic::{self, AssertUnwindSafe};

use super::*;

fn builder() -> GuiBuilder {
    GuiBuilder::new(Registry::new())
}

#[test]
fn controls_attach_to_current_container_and_scope_restores() {
    let mut gui = builder();
    let tree = gui
        .add_folder_tree(FolderTreeOptions::new("Main Tree"))
        .expect("tree");

    let button = {
        let mut scope = gui.enter(&tree);
        scope.add_button("Test Button", ControlOptions::default()).expect("button")
    };
    let outside = gui.add_button("Outside", ControlOptions::default()).expect("outside");

    let registry = gui.registry();
    assert_eq!(registry.resolve(button.id()).expect("button").parent(), Some(tree.id()));
    assert_eq!(registry.resolve(outside.id()).expect("outside").parent(), None);
    assert_eq!(gui.depth(), 0);
}

#[test]
fn nested_scopes_make_every_child_a_descendant_of_the_outer_container() {
    let mut gui = builder();
    let outer = gui
        .add_folder_tree(FolderTreeOptions::new("Outer Tree"))
        .expect("outer");

    let (outer_button, inner, inner_button, after_inner) = gui.within(&outer, |gui| {
        let outer_button = gui.add_button("Outer Button", ControlOptions::default())?;
        let inner = gui.add_folder_tree(FolderTreeOptions::new("Inner Tree"))?;
        let inner_button = gui.within(&inner, |gui| {
            assert_eq!(gui.current_container(), Some(inner.id()));
            gui.add_button("Inner Button", ControlOptions::default())
        })?;
        let after_inner = gui.add_checkbox("After", true, ControlOptions::default())?;
        Ok::<_, BuildError>((outer_button, inner, inner_button, after_inner))
    })
    .expect("build");

    let registry = gui.registry();
    for id in [outer_button.id(), inner.id(), inner_button.id(), after_inner.id()] {
        assert!(registry.is_descendant(outer.id(), id));
    }
    assert!(registry.is_descendant(inner.id(), inner_button.id()));
    assert!(!registry.is_descendant(inner.id(), after_inner.id()));
    assert_eq!(registry.resolve(after_inner.id()).expect("after").parent(), Some(outer.id()));
}

#[test]
fn scope_is_released_on_early_return() {
    fn build(gui: &mut GuiBuilder, tree: &ContainerHandle) -> Result<(), BuildError> {
        let mut scope = gui.enter(tree);
        scope.add_slider("bad", SliderRange::new(10.0, 0.0, 1.0), 5.0, ControlOptions::default())?;
        Ok(())
    }

    let mut gui = builder();
    let tree = gui.add_folder("Regular Folder", true).expect("folder");
    let err = build(&mut gui, &tree).expect_err("slider range is inverted");
    assert!(matches!(err, BuildError::InvalidOptions { .. }));
    assert_eq!(gui.depth(), 0);
}

#[test]
fn scope_is_released_when_construction_panics() {
    let mut gui = builder();
    let tree = gui
        .add_folder_tree(FolderTreeOptions::new("tree"))
        .expect("tree");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _scope = gui.enter(&tree);
        panic!("builder failed mid-construction");
    }));
    assert!(result.is_err());
    assert_eq!(gui.depth(), 0);
    assert_eq!(gui.current_container(), None);
}

#[test]
fn leaked_inner_guard_is_unwound_by_the_outer_one() {
    let mut gui = builder();
    let outer = gui
        .add_folder_tree(FolderTreeOptions::new("outer"))
        .expect("outer");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut scope = gui.enter(&outer);
        let inner = scope
            .add_folder_tree(FolderTreeOptions::new("inner"))
            .expect("inner");
        std::mem::forget(scope.enter(&inner));
        assert_eq!(scope.depth(), 2);
        drop(scope);
    }));
    assert!(result.is_ok());
    assert_eq!(gui.depth(), 0);
    assert_eq!(gui.current_container(), None);
}

#[test]
fn sessions_sharing_a_registry_have_independent_stacks() {
    let registry = Registry::new();
    let mut first = GuiBuilder::new(registry.clone());
    let mut second = GuiBuilder::new(registry.clone());
    let tree = first
        .add_folder_tree(FolderTreeOptions::new("shared"))
        .expect("tree");

    let _scope = first.enter(&tree);
    let loose = second
        .add_button("loose", ControlOptions::default())
        .expect("button");
    assert_eq!(registry.resolve(loose.id()).expect("loose").parent(), None);
}

#[test]
fn initial_disabled_only_lands_on_input_controls() {
    let mut gui = builder();
    let button = gui.add_button("Test Button 2", ControlOptions::disabled()).expect("button");
    let notes = gui.add_markdown("**hello**\nworld").expect("markdown");

    let registry = gui.registry();
    assert_eq!(registry.resolve(button.id()).expect("button").disabled(), Some(true));
    let notes = registry.resolve(notes.id()).expect("markdown");
    assert_eq!(notes.disabled(), None);
    assert_eq!(notes.label(), "**hello**");
}

#[test]
fn slider_value_is_clamped_into_range() {
    let mut gui = builder();
    let slider = gui
        .add_slider("s", SliderRange::new(0.0, 10.0, 1.0), 42.0, ControlOptions::default())
        .expect("slider");
    let control = gui.registry().resolve(slider.id()).expect("slider");
    assert_eq!(
        control.props(),
        &ControlProps::Slider {
            min: 0.0,
            max: 10.0,
            step: 1.0,
            value: 10.0
        }
    );
}

#[test]
fn reopen_returns_handle_for_containers_only() {
    let mut gui = builder();
    let folder = gui.add_folder("folder", false).expect("folder");
    let button = gui.add_button("b", ControlOptions::default()).expect("button");

    assert_eq!(gui.reopen(folder.id()).expect("reopen"), folder);
    assert!(matches!(
        gui.reopen(button.id()),
        Err(BuildError::NotAContainer { .. })
    ));

    gui.registry().remove(folder.id());
    assert_eq!(
        gui.within(&folder, |gui| gui.add_button("late", ControlOptions::default())),
        Err(BuildError::ParentMissing(folder.id()))
    );
}
