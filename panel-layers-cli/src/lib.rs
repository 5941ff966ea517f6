use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{CommandFactory, Parser};
use panel_layers::{
    ColorStyle, EditorSession, Geometry, HexColor, LayerId, LayerKind, LayerSpec, LayerStack,
    PanelImage, PanelMetadata, PanelProject,
};

use crate::cli::{Cli, Commands};

mod cli;

pub fn run() -> anyhow::Result<()> {
    // parse command
    let args = Cli::parse();

    match args.command {
        Some(Commands::New {
            image,
            output,
            title,
            manga_title,
            character,
            style,
            seed,
        }) => {
            let style = style
                .map(|id| {
                    ColorStyle::from_id(&id).ok_or_else(|| anyhow::anyhow!("Unknown style {id}"))
                })
                .transpose()?
                .unwrap_or_default();
            let metadata = PanelMetadata {
                title,
                manga_title,
                character_name: character,
                style,
                ..Default::default()
            };
            new_project(&image, &output, metadata, seed)?;
        }
        Some(Commands::Info { project }) => info(&project)?,
        Some(Commands::ExportLayers { project }) => {
            let project = PanelProject::open(&project)?;
            println!("{}", serde_json::to_string_pretty(&project.stack)?);
        }
        Some(Commands::Add {
            project,
            kind,
            name,
            x,
            y,
            width,
            height,
            color,
            opacity,
        }) => {
            let geometry = Geometry::new(x, y, width, height);
            let mut spec = LayerSpec::new(kind.parse::<LayerKind>()?, geometry);
            if let Some(name) = name {
                spec = spec.with_name(name);
            }
            if let Some(color) = color {
                spec = spec.with_color(color.parse::<HexColor>()?);
            }
            if let Some(opacity) = opacity {
                spec = spec.with_opacity(opacity);
            }
            let mut id = None;
            edit(&project, |session| {
                id = Some(session.add_layer(spec));
                true
            })?;
            if let Some(id) = id {
                println!("{id}");
            }
        }
        Some(Commands::Remove { project, id }) => {
            edit(&project, |session| session.remove_layer(&LayerId::new(id)))?;
        }
        Some(Commands::Move {
            project,
            id,
            direction,
        }) => {
            edit(&project, |session| {
                session.apply(panel_layers::Edit::Reorder {
                    id: LayerId::new(id),
                    direction: direction.into(),
                })
            })?;
        }
        Some(Commands::Show { project, id }) => {
            edit(&project, |session| {
                session.apply(panel_layers::Edit::SetVisibility {
                    id: LayerId::new(id),
                    visible: true,
                })
            })?;
        }
        Some(Commands::Hide { project, id }) => {
            edit(&project, |session| {
                session.apply(panel_layers::Edit::SetVisibility {
                    id: LayerId::new(id),
                    visible: false,
                })
            })?;
        }
        Some(Commands::Opacity { project, id, value }) => {
            edit(&project, |session| {
                let id = LayerId::new(id);
                session.list().set_opacity(&id, value);
                session.history().can_undo()
            })?;
        }
        Some(Commands::Rename { project, id, name }) => {
            edit(&project, |session| {
                let id = LayerId::new(id);
                session.list().rename(&id, name);
                session.history().can_undo()
            })?;
        }
        Some(Commands::Geometry {
            project,
            id,
            x,
            y,
            width,
            height,
        }) => {
            edit(&project, |session| {
                session.apply(panel_layers::Edit::SetGeometry {
                    id: LayerId::new(id),
                    geometry: Geometry::new(x, y, width, height),
                })
            })?;
        }
        None => {
            Cli::command().print_long_help()?;
        }
    }

    Ok(())
}

fn new_project(
    image: &Path,
    output: &Path,
    metadata: PanelMetadata,
    seed: bool,
) -> anyhow::Result<()> {
    let original = PanelImage::open(image)?;
    log::info!(
        "Creating project from {} ({}x{})",
        image.to_string_lossy(),
        original.width,
        original.height
    );
    let stack = if seed {
        LayerStack::seeded(&metadata.palette)
    } else {
        LayerStack::new()
    };
    let project = PanelProject {
        metadata,
        stack,
        original: Some(original),
        colorized: None,
    };
    project.save(output)?;
    println!("Created {}", output.to_string_lossy());
    Ok(())
}

fn info(path: &Path) -> anyhow::Result<()> {
    let project = PanelProject::open(path)?;
    let metadata = &project.metadata;
    println!("Title: {}", metadata.title);
    println!("Manga: {}", metadata.manga_title);
    println!("Character: {}", metadata.character_name);
    println!("Style: {}", metadata.style.display_name());
    if let Some(original) = &project.original {
        println!("Panel: {}x{}", original.width, original.height);
    }
    println!("Layers ({}):", project.stack.len());
    for (i, layer) in project.stack.iter().enumerate() {
        let g = layer.geometry;
        println!(
            "  {i}. {} [{}] {:?} {}x{} at ({}, {}) opacity {}%{}{}",
            layer.name,
            layer.id,
            layer.kind,
            g.width,
            g.height,
            g.x,
            g.y,
            (layer.opacity * 100.0).round(),
            layer.color.as_ref().map(|c| format!(" color {c}")).unwrap_or_default(),
            if layer.visible { "" } else { " (hidden)" },
        );
    }
    Ok(())
}

/// Loads the project, runs `f` against an editor session and writes the
/// project back if `f` reports a change.
fn edit(path: &Path, f: impl FnOnce(&mut EditorSession) -> bool) -> anyhow::Result<()> {
    let mut project = PanelProject::open(path)?;
    let mut session = EditorSession::new(project.stack);
    if !f(&mut session) {
        log::info!("Nothing changed");
        return Ok(());
    }
    project.stack = session.into_stack();
    save_atomically(&project, path)
}

/// Writes `<path>.tmp` and renames it over `path`, so a failed save keeps
/// the old project.
fn save_atomically(project: &PanelProject, path: &Path) -> anyhow::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let saved = project
        .save(&tmp)
        .map_err(anyhow::Error::from)
        .and_then(|()| Ok(fs::rename(&tmp, path)?));
    if saved.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    saved
}
