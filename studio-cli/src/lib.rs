use std::{fmt::Write as _, sync::Arc};

use anyhow::{Context, bail};
use clap::Parser;
use panel_layers::{ColorStyle, Edit, LayerId, PanelImage, PanelMetadata, TransformDelta};
use rustyline::{DefaultEditor, error::ReadlineError};
use studio::{
    AppConfig, AuthSession, BaseView, FileStore, Gallery, GalleryQuery, KeyValueStore,
    MockColorizer, NoticeLevel, Notifier, PanelEditor, PanelStore, Preferences, SortOrder,
    StoredId,
};
use tokio::sync::broadcast;

use crate::cli::{Answer, Cli, Command, Line, ThemeToggle, words};

mod cli;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let args = Cli::parse();
    let storage_path = args.storage.unwrap_or(config.storage.path);
    let panel_dir = args.panels.unwrap_or(config.panels.dir);

    let style = args
        .style
        .map(|id| ColorStyle::from_id(&id).ok_or_else(|| anyhow::anyhow!("Unknown style {id}")))
        .transpose()?
        .unwrap_or_default();
    let metadata = PanelMetadata {
        character_name: args.character,
        manga_title: args.manga,
        style,
        ..Default::default()
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&storage_path)
            .with_context(|| format!("Failed to open storage {}", storage_path.display()))?,
    );
    let panels = PanelStore::open(&panel_dir)
        .with_context(|| format!("Failed to open panel dir {}", panel_dir.display()))?;
    let mut repl = Repl::new(
        store,
        panels,
        MockColorizer::new(config.mock.colorize_delay),
        config.mock.auth_delay,
        metadata,
    )?;

    let printer = tokio::spawn(print_notices(repl.notifier.subscribe()));
    if let Some(user) = repl.auth.current_user() {
        println!("Signed in as {}", user.username);
    }

    let mut rl = DefaultEditor::new()?;
    loop {
        let line = match rl.readline(">>> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let words = words(&line);
        if words.is_empty() {
            continue;
        }
        rl.add_history_entry(line.as_str())?;

        let command = match Line::try_parse_from(words) {
            Ok(line) => line.command,
            Err(err) => {
                err.print()?;
                continue;
            }
        };
        if matches!(command, Command::Quit) {
            break;
        }
        match repl.execute(command).await {
            Ok(output) if output.is_empty() => {}
            Ok(output) => println!("{output}"),
            Err(err) => eprintln!("Error: {err:#}"),
        }
    }

    printer.abort();
    Ok(())
}

async fn print_notices(mut rx: broadcast::Receiver<studio::Notice>) {
    loop {
        match rx.recv().await {
            Ok(notice) => match notice.level {
                NoticeLevel::Success => println!("[ok] {}", notice.message),
                NoticeLevel::Error => println!("[error] {}", notice.message),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Dropped {skipped} notices");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Everything one REPL session works on. Commands return the text to print.
struct Repl {
    auth: AuthSession<dyn KeyValueStore>,
    preferences: Preferences<dyn KeyValueStore>,
    gallery: Gallery,
    panels: PanelStore,
    colorizer: MockColorizer,
    notifier: Notifier,
    editor: PanelEditor,
    metadata: PanelMetadata,
}

impl Repl {
    fn new(
        store: Arc<dyn KeyValueStore>,
        panels: PanelStore,
        colorizer: MockColorizer,
        auth_delay: std::time::Duration,
        metadata: PanelMetadata,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthSession::restore(store.clone(), auth_delay)?,
            preferences: Preferences::load(store)?,
            gallery: Gallery::sample()?,
            panels,
            colorizer,
            notifier: Notifier::new(16),
            editor: PanelEditor::new(metadata.clone()),
            metadata,
        })
    }

    async fn execute(&mut self, command: Command) -> anyhow::Result<String> {
        let output = match command {
            Command::Login { email, password } => {
                let user = self.auth.login(&email, &password).await?;
                format!("Welcome back, {}!", user.username)
            }
            Command::Signup {
                email,
                password,
                username,
            } => {
                let user = self
                    .auth
                    .signup(&email, &password, username.as_deref())
                    .await?;
                format!("Welcome, {}!", user.username)
            }
            Command::Logout => {
                self.auth.logout()?;
                "Signed out".to_string()
            }
            Command::Whoami => match self.auth.current_user() {
                Some(user) => format!("{} <{}>", user.username, user.email),
                None => "Not signed in".to_string(),
            },
            Command::Theme { toggle } => {
                let theme = match toggle {
                    None => self.preferences.theme(),
                    Some(ThemeToggle::Dark) => self.preferences.toggle_dark_mode()?,
                    Some(ThemeToggle::Contrast) => self.preferences.toggle_high_contrast()?,
                    Some(ThemeToggle::ColorBlind) => self.preferences.toggle_color_blind()?,
                };
                format!("Theme: {}", theme.theme_name())
            }
            Command::Fun => self.toggle_fun_mode()?,
            Command::Gallery {
                search,
                manga,
                recent,
            } => {
                let query = GalleryQuery {
                    search: (!search.is_empty()).then(|| search.join(" ")),
                    manga,
                    sort: if recent {
                        SortOrder::Recent
                    } else {
                        SortOrder::Popular
                    },
                };
                self.gallery(&query)
            }
            Command::New => {
                self.editor = PanelEditor::new(self.metadata.clone());
                "Started a new panel".to_string()
            }
            Command::Open { image } => {
                self.editor.upload_file(&image)?;
                format!("Uploaded {}, colorize it next", image.display())
            }
            Command::Load { id } => {
                let id = StoredId::parse(&id)?;
                let project = self.panels.load(&id)?;
                self.editor = PanelEditor::from_project(project, Some(id));
                format!("Opened {:?}\n{}", self.editor.metadata().title, self.layers())
            }
            Command::Reference { image } => {
                let reference = image.map(PanelImage::open).transpose()?;
                let output = match &reference {
                    Some(image) => format!("Reference set ({}x{})", image.width, image.height),
                    None => "Reference cleared".to_string(),
                };
                self.editor.set_reference(reference, &self.notifier);
                output
            }
            Command::Colorize => {
                // failures are reported as notices
                match self.editor.colorize(&self.colorizer, &self.notifier).await {
                    Ok(()) => self.layers(),
                    Err(_) => String::new(),
                }
            }
            Command::Authentic { answer } => {
                if !self
                    .editor
                    .answer_authenticity(answer == Answer::Yes, &self.notifier)
                {
                    bail!("Colorize the panel first");
                }
                String::new()
            }
            Command::View => {
                let view = self.editor.toggle_view();
                let name = match view {
                    BaseView::Colorized => "colorized",
                    BaseView::Original => "original",
                };
                match self.editor.base_image() {
                    Some(image) => format!("Showing {name} panel ({}x{})", image.width, image.height),
                    None => format!("Showing {name} panel (none yet)"),
                }
            }
            Command::Layers => self.layers(),
            Command::Export => serde_json::to_string_pretty(self.editor.session().stack())?,
            Command::Select { id } => {
                self.editor.session_mut().select(&LayerId::new(id));
                match self.editor.session().selected() {
                    Some(layer) => format!("Selected {}", layer.id),
                    None => "Nothing selected".to_string(),
                }
            }
            Command::Drag { dx, dy } => self.transform(TransformDelta::translate(dx, dy))?,
            Command::Scale { sx, sy } => self.transform(TransformDelta::scale(sx, sy))?,
            Command::Up { id } => {
                self.editor.session_mut().list().move_up(&LayerId::new(id));
                self.layers()
            }
            Command::Down { id } => {
                self.editor.session_mut().list().move_down(&LayerId::new(id));
                self.layers()
            }
            Command::Hide { id } => self.set_visibility(id, false),
            Command::Show { id } => self.set_visibility(id, true),
            Command::Delete { id } => {
                let session = self.editor.session_mut();
                match id {
                    Some(id) => {
                        session.list().delete(&LayerId::new(id));
                    }
                    None => {
                        if !session.delete_selected() {
                            bail!("Select a layer first");
                        }
                    }
                }
                self.layers()
            }
            Command::Opacity { id, value } => {
                self.editor
                    .session_mut()
                    .list()
                    .set_opacity(&LayerId::new(id), value);
                self.layers()
            }
            Command::Rename { id, name } => {
                self.editor
                    .session_mut()
                    .list()
                    .rename(&LayerId::new(id), name.join(" "));
                self.layers()
            }
            Command::Undo => {
                let session = self.editor.session_mut();
                let Some(description) = session.history().undo_description() else {
                    return Ok("Nothing to undo".to_string());
                };
                session.undo();
                format!("Undid: {description}")
            }
            Command::Redo => {
                let session = self.editor.session_mut();
                let Some(description) = session.history().redo_description() else {
                    return Ok("Nothing to redo".to_string());
                };
                session.redo();
                format!("Redid: {description}")
            }
            Command::History => {
                let edits: Vec<_> = self
                    .editor
                    .session()
                    .history()
                    .edits()
                    .map(Edit::description)
                    .collect();
                if edits.is_empty() {
                    "No edits yet".to_string()
                } else {
                    edits.join("\n")
                }
            }
            Command::Save => match self.editor.save(&self.panels, &self.notifier) {
                Ok(id) => format!("Saved as {id}"),
                Err(_) => String::new(),
            },
            Command::Panels => {
                let ids = self.panels.list()?;
                if ids.is_empty() {
                    "No saved panels".to_string()
                } else {
                    ids.iter().map(StoredId::to_string).collect::<Vec<_>>().join("\n")
                }
            }
            Command::Quit => String::new(),
        };
        Ok(output)
    }

    fn toggle_fun_mode(&mut self) -> anyhow::Result<String> {
        if !self.preferences.toggle_fun_mode()? {
            return Ok("Fun mode off".to_string());
        }
        let mut output = String::from("Fun mode on");
        if let Some(prank) = self.preferences.random_prank(&mut rand::thread_rng()) {
            write!(output, "\n{}: {}", prank.character, prank.message)?;
        }
        Ok(output)
    }

    fn gallery(&self, query: &GalleryQuery) -> String {
        let posts = self.gallery.filter(query);
        let Some(featured) = Gallery::featured(&posts, query.sort) else {
            return "No posts match".to_string();
        };
        let mut output = format!("Featured: {} by {}", featured.title, featured.username);
        for post in posts {
            let _ = write!(
                output,
                "\n  {:>3} likes  {} by {} ({}, {})",
                post.likes, post.title, post.username, post.manga_title, post.character
            );
        }
        output
    }

    fn transform(&mut self, delta: TransformDelta) -> anyhow::Result<String> {
        let session = self.editor.session_mut();
        if session.selected().is_none() {
            bail!("Select a layer first");
        }
        session.apply_transform(delta);
        Ok(self.layers())
    }

    fn set_visibility(&mut self, id: String, visible: bool) -> String {
        let id = LayerId::new(id);
        self.editor
            .session_mut()
            .apply(Edit::SetVisibility { id, visible });
        self.layers()
    }

    /// Bottom layer first.
    fn layers(&self) -> String {
        let session = self.editor.session();
        if session.stack().is_empty() {
            return "No layers".to_string();
        }
        let mut output = String::new();
        for (index, layer) in session.stack().iter().enumerate() {
            let marker = if session.selection().is_selected(&layer.id) {
                '*'
            } else {
                ' '
            };
            let eye = if layer.visible { "on " } else { "off" };
            let g = layer.geometry;
            let _ = writeln!(
                output,
                "{marker}{index} [{eye}] {} {:?} ({}) at {},{} size {}x{} opacity {}%{}",
                layer.id,
                layer.name,
                layer.kind.label(),
                g.x,
                g.y,
                g.width,
                g.height,
                (layer.opacity * 100.0).round(),
                layer
                    .color
                    .as_ref()
                    .map(|color| format!(" color {color}"))
                    .unwrap_or_default(),
            );
        }
        output.truncate(output.trim_end().len());
        output
    }
}
