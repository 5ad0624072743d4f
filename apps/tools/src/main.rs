use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use control_tree::{handle_update, layouts::Layout, GuiBuilder, Registry};
use shared::{
    domain::{Category, ClientId, ControlKind},
    protocol::{ControlSnapshot, UpdateMessage, UpdateSet},
};
use tracing::{info, warn};

const CLIENT: ClientId = ClientId(0);

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "warn")]
    log_filter: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in layouts.
    Layouts,
    /// Build a layout and print its controls as JSON, depth first.
    Dump {
        #[arg(long, default_value = "folder_tree")]
        layout: Layout,
        #[arg(long)]
        pretty: bool,
    },
    /// Click every eye button in a layout and fail on any rejected update.
    EyeCheck {
        #[arg(long, default_value = "eye_button")]
        layout: Layout,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter.as_str())
        .init();

    match cli.command {
        Command::Layouts => {
            for layout in Layout::ALL {
                println!("{layout}");
            }
        }
        Command::Dump { layout, pretty } => {
            let controls = build(layout)?.tree();
            let json = if pretty {
                serde_json::to_string_pretty(&controls)?
            } else {
                serde_json::to_string(&controls)?
            };
            println!("{json}");
        }
        Command::EyeCheck { layout } => {
            let lines = eye_check(layout)?;
            for line in &lines {
                println!("{line}");
            }
            println!("{} controls ok in {layout}", lines.len());
        }
    }

    Ok(())
}

fn build(layout: Layout) -> Result<Registry> {
    let registry = Registry::new();
    layout
        .build(&mut GuiBuilder::new(registry.clone()))
        .with_context(|| format!("failed to build layout {layout}"))?;
    Ok(registry)
}

fn send(registry: &Registry, control: &ControlSnapshot, updates: UpdateSet) -> Result<()> {
    let report = handle_update(registry, CLIENT, &UpdateMessage::new(control.id, updates))
        .with_context(|| format!("{} `{}`", control.kind, control.label))?;
    if let Some(err) = report.rejected.first() {
        warn!(id = %control.id, error = %err, "eye toggle rejected");
        bail!("{} `{}` rejected an eye toggle: {err}", control.kind, control.label);
    }
    Ok(())
}

/// Replays what a rendering client's eye button sends: inputs flip
/// `disabled`, display controls flip `visible`. Each toggle is undone right
/// after, so every control must end in its initial state.
fn eye_check(layout: Layout) -> Result<Vec<String>> {
    let registry = build(layout)?;
    let mut lines = Vec::new();

    for control in registry.tree() {
        send(&registry, &control, UpdateSet::new().with("visible", !control.visible))?;
        send(&registry, &control, UpdateSet::new().with("visible", control.visible))?;

        let toggle = match control.category {
            Category::Input => ("disabled", control.disabled.unwrap_or(false)),
            Category::Display => ("visible", control.visible),
        };
        send(&registry, &control, UpdateSet::new().with(toggle.0, !toggle.1))?;
        send(&registry, &control, UpdateSet::new().with(toggle.0, toggle.1))?;

        if control.kind == ControlKind::FolderTree {
            send(&registry, &control, UpdateSet::new().with("visibility_state", false))?;
            for child in &control.children {
                let child = registry.snapshot(*child)?;
                if registry.effective_interactivity(child.id)? {
                    bail!("`{}` still accepts input with its tree's eye closed", child.label);
                }
                if child.category == Category::Display && registry.effective_visibility(child.id)? {
                    bail!("`{}` still renders with its tree's eye closed", child.label);
                }
            }
            let restored = control.visibility_state.unwrap_or(true);
            send(&registry, &control, UpdateSet::new().with("visibility_state", restored))?;
        }

        let after = registry.snapshot(control.id)?;
        if after.visible != control.visible || after.disabled != control.disabled {
            bail!("`{}` did not return to its initial state", control.label);
        }
        let category = match control.category {
            Category::Display => "display",
            Category::Input => "input",
        };
        lines.push(format!(
            "{:<12} {category:<8} {}",
            control.kind.to_string(),
            control.label
        ));
    }

    info!(%layout, count = lines.len(), "eye check passed");
    Ok(lines)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
