use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(version, about = "Interactive panel studio")]
pub struct Cli {
    /// Key-value storage file (user, theme, settings)
    #[arg(long, env = "STUDIO_STORAGE_PATH")]
    pub storage: Option<PathBuf>,
    /// Directory for saved panels
    #[arg(long, env = "STUDIO_PANEL_DIR")]
    pub panels: Option<PathBuf>,
    #[arg(long, default_value = "")]
    pub character: String,
    #[arg(long, default_value = "")]
    pub manga: String,
    /// Style id, e.g. anime-style or cel-shading
    #[arg(long)]
    pub style: Option<String>,
}

/// One line typed at the prompt.
#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Login {
        email: String,
        password: String,
    },
    Signup {
        email: String,
        password: String,
        username: Option<String>,
    },
    Logout,
    Whoami,
    /// Show or toggle theme options
    Theme {
        #[arg(value_enum)]
        toggle: Option<ThemeToggle>,
    },
    /// Toggle fun mode
    Fun,
    /// Browse the community gallery
    Gallery {
        search: Vec<String>,
        #[arg(long)]
        manga: Option<String>,
        #[arg(long)]
        recent: bool,
    },
    /// Start over with an empty panel
    New,
    /// Upload a panel image
    Open {
        image: PathBuf,
    },
    /// Open a saved panel
    Load {
        id: String,
    },
    /// Set the reference panel used when colorizing, or clear it
    Reference {
        image: Option<PathBuf>,
    },
    Colorize,
    /// Tell us whether the last colorization got the character right
    Authentic {
        #[arg(value_enum)]
        answer: Answer,
    },
    /// Show the base image you are looking at
    View,
    Layers,
    /// Print the layer stack as JSON
    Export,
    /// Select a layer, or deselect it if it is already selected
    Select {
        id: String,
    },
    #[command(allow_negative_numbers = true)]
    Drag {
        dx: f64,
        dy: f64,
    },
    Scale {
        sx: f64,
        sy: f64,
    },
    Up {
        id: String,
    },
    Down {
        id: String,
    },
    Hide {
        id: String,
    },
    Show {
        id: String,
    },
    /// Delete a layer, the selected one by default
    Delete {
        id: Option<String>,
    },
    Opacity {
        id: String,
        value: f64,
    },
    Rename {
        id: String,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    Undo,
    Redo,
    /// List the edits that can be undone, oldest first
    History,
    Save,
    /// List saved panels
    Panels,
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ThemeToggle {
    Dark,
    Contrast,
    ColorBlind,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

/// Splits a line on whitespace, keeping double-quoted runs together.
pub fn words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;
    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    words.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn words_respect_quotes() {
        assert_eq!(
            words(r#"gallery --manga "Jujutsu Kaisen"  gojo"#),
            ["gallery", "--manga", "Jujutsu Kaisen", "gojo"]
        );
        assert_eq!(words(r#"rename hair-layer """#), ["rename", "hair-layer", ""]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn lines_parse_into_commands() {
        let line = Line::try_parse_from(words("drag -10 2.5")).unwrap();
        assert!(matches!(line.command, Command::Drag { dx, dy } if dx == -10.0 && dy == 2.5));

        let line = Line::try_parse_from(words("rename hair-layer Golden hair")).unwrap();
        assert!(matches!(line.command, Command::Rename { name, .. } if name.join(" ") == "Golden hair"));

        assert!(Line::try_parse_from(words("scale two 1")).is_err());

        let line = Line::try_parse_from(words("reference")).unwrap();
        assert!(matches!(line.command, Command::Reference { image: None }));

        let line = Line::try_parse_from(words("authentic no")).unwrap();
        assert!(matches!(line.command, Command::Authentic { answer: Answer::No }));
        assert!(Line::try_parse_from(words("authentic maybe")).is_err());
    }

    #[test]
    fn definitions_are_valid() {
        Cli::command().debug_assert();
        Line::command().debug_assert();
    }
}
