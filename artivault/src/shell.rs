//! Carries out one command-line request against the library.

use std::io::Write;

use anyhow::Context;
use artivault_core::{codec, launch, session::CloseError, Library, Session};

use crate::cli::Command;

pub fn run(library: &Library, command: Command, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Folders => {
            for folder in library.folders() {
                writeln!(
                    out,
                    "{}  {}  ({} canvases)",
                    folder.id,
                    folder.name,
                    folder.canvases.len()
                )?;
            }
        }
        Command::NewFolder { name } => {
            let folder = library.create_folder(&name)?;
            writeln!(out, "{}", folder.id)?;
        }
        Command::DeleteFolder { id } => {
            library.delete_folder(id)?;
            writeln!(out, "deleted folder {id}")?;
        }
        Command::Canvases { folder } => {
            let folder = library
                .store()
                .folder(folder)
                .with_context(|| format!("no folder {folder}"))?;
            for canvas in &folder.canvases {
                writeln!(
                    out,
                    "{}  {}  modified {}",
                    canvas.id,
                    canvas.name,
                    canvas.modified.format("%Y-%m-%d %H:%M")
                )?;
            }
        }
        Command::NewCanvas { folder, name } => {
            let canvas = library.create_canvas(folder, &name)?;
            writeln!(out, "{}", canvas.id)?;
        }
        Command::DeleteCanvas { id } => {
            library.delete_canvas(id)?;
            writeln!(out, "deleted canvas {id}")?;
        }
        Command::Draw {
            canvas,
            ink,
            color,
            width,
            points,
        } => {
            let mut session = library.open_canvas(canvas)?;
            if let Some(ink) = ink {
                session.set_ink(ink);
            }
            if let Some(color) = color {
                session.set_color(color);
            }
            if let Some(width) = width {
                session.set_width(width)?;
            }
            let count = points.len();
            session.draw(points)?;
            let strokes = session.combined().len();
            close(library, session)?;
            writeln!(out, "drew {count} points, canvas now has {strokes} strokes")?;
        }
        Command::Info { canvas } => {
            let (folder, meta) = library
                .store()
                .canvas(canvas)
                .with_context(|| format!("no canvas {canvas}"))?;
            writeln!(out, "name:     {}", meta.name)?;
            writeln!(out, "folder:   {folder}")?;
            writeln!(out, "created:  {}", meta.created.to_rfc3339())?;
            writeln!(out, "modified: {}", meta.modified.to_rfc3339())?;
            match library.store().load_drawing(canvas)? {
                None => writeln!(out, "drawing:  empty")?,
                Some(bytes) => {
                    let size = human_bytes::human_bytes(bytes.len() as f64);
                    match codec::decode(&bytes) {
                        Ok(drawing) => writeln!(
                            out,
                            "drawing:  {} strokes, {} points ({size})",
                            drawing.len(),
                            drawing.point_count()
                        )?,
                        Err(e) => writeln!(out, "drawing:  unreadable, {e} ({size})")?,
                    }
                }
            }
        }
        Command::Launch { request } => {
            let action = launch::parse(&request)?;
            let session = library.launch(action)?;
            let id = session.canvas();
            let name = library
                .store()
                .canvas(id)
                .map(|(_, canvas)| canvas.name)
                .unwrap_or_default();
            close(library, session)?;
            writeln!(out, "opened {name} ({id})")?;
        }
    }
    Ok(())
}

/// Close a session, giving a failed save one more go before reporting it.
fn close(library: &Library, session: Session) -> anyhow::Result<()> {
    let Err(CloseError { error, pending }) = session.close() else {
        return Ok(());
    };
    match pending {
        Some(pending) => library
            .retry_save(&pending)
            .with_context(|| format!("drawing not saved ({error})")),
        None => Err(anyhow::anyhow!(error).context("drawing not saved")),
    }
}
