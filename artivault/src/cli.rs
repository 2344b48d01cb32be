use artivault_core::{
    color::Color,
    store::{CanvasID, FolderID},
    stroke::{InkKind, Point},
};
use clap::{Parser, Subcommand};

/// Command-line arguments for artivault.
#[derive(Debug, Clone, Parser)]
#[command(name = "artivault")]
#[command(about = "Keep sketches in folders and draw on them")]
#[command(version)]
pub struct Cli {
    /// Directory holding the catalog and drawings. Overrides the settings file.
    #[arg(long, env = "ARTIVAULT_DATA_DIR")]
    pub data_dir: Option<std::path::PathBuf>,

    /// Settings file to use instead of the one in the preferences directory.
    #[arg(long)]
    pub settings: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List folders.
    Folders,
    /// Create a folder.
    NewFolder { name: String },
    /// Delete a folder and every canvas in it.
    DeleteFolder { id: FolderID },
    /// List the canvases in a folder.
    Canvases { folder: FolderID },
    /// Create an empty canvas in a folder.
    NewCanvas { folder: FolderID, name: String },
    /// Delete a canvas.
    DeleteCanvas { id: CanvasID },
    /// Ink one stroke onto a canvas.
    Draw {
        canvas: CanvasID,
        /// Ink kind, e.g. pen, marker, fountain-pen.
        #[arg(long)]
        ink: Option<InkKind>,
        /// Color as #rgb, #rrggbb or #rrggbbaa.
        #[arg(long)]
        color: Option<Color>,
        /// Stroke width, in canvas points.
        #[arg(long)]
        width: Option<f32>,
        /// Points as x,y or x,y,pressure.
        #[arg(required = true, allow_hyphen_values = true, value_parser = parse_point)]
        points: Vec<Point>,
    },
    /// Show a canvas's details.
    Info { canvas: CanvasID },
    /// Handle an artivault:// URL or shortcut phrase.
    Launch { request: String },
}

/// `x,y` or `x,y,pressure`. Pressure defaults to 1.
fn parse_point(text: &str) -> Result<Point, String> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad coordinate in {text:?}: {e}"))?;
    let (x, y, pressure) = match values.as_slice() {
        [x, y] => (*x, *y, 1.0),
        [x, y, pressure] => (*x, *y, *pressure),
        _ => return Err(format!("expected x,y or x,y,pressure, got {text:?}")),
    };
    Point::new(x, y, pressure).map_err(|e| e.to_string())
}

#[cfg(test)]
mod test {
    use super::{parse_point, Cli, Command};
    use artivault_core::stroke::InkKind;
    use clap::{CommandFactory, Parser};

    #[test]
    fn definition() {
        Cli::command().debug_assert();
    }
    #[test]
    fn points() {
        assert_eq!(parse_point("1,2").unwrap().pressure(), 1.0);
        assert_eq!(parse_point(" -3.5, 4 ,0.25").unwrap().position(), [-3.5, 4.0]);
        assert!(parse_point("1").is_err());
        assert!(parse_point("1,2,3,4").is_err());
        assert!(parse_point("x,2").is_err());
        assert!(parse_point("inf,2").is_err());
    }
    #[test]
    fn draw_args() {
        let id = artivault_core::store::CanvasID::new().to_string();
        let cli = Cli::try_parse_from([
            "artivault",
            "--data-dir",
            "/tmp/av",
            "draw",
            &id,
            "--ink",
            "fountain-pen",
            "--color",
            "#ff0000",
            "0,0",
            "-1,5,0.5",
        ])
        .unwrap();
        let Command::Draw {
            ink, color, points, ..
        } = cli.command
        else {
            panic!("expected draw");
        };
        assert_eq!(ink, Some(InkKind::FountainPen));
        assert_eq!(color.unwrap().to_hex(), "#ff0000ff");
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].position(), [-1.0, 5.0]);

        assert!(Cli::try_parse_from(["artivault", "draw", &id]).is_err());
        assert!(Cli::try_parse_from(["artivault", "info", "not-an-id"]).is_err());
    }
}
