use anyhow::{anyhow, Context, Result};
use freehand::draw::messages::{ExportOutcome, InputEvent};
use freehand::draw::save::{ensure_output_folder, write_png, PngExporter};
use freehand::draw::{settings_store, DrawEngine, Size};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct Script {
    viewport: Size,
    events: Vec<InputEvent>,
}

fn main() -> Result<()> {
    let mut args = std::env::args_os().skip(1);
    let script_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: freehand <script.json> [output.png]"))?;
    let output = args.next().map(PathBuf::from);

    let settings = settings_store::load()?;
    freehand::logging::init(settings.debug_logging, None);

    let script = load_script(&script_path)?;
    let mut engine = DrawEngine::new(settings);
    engine
        .initialize(script.viewport)
        .context("initialize canvas from script viewport")?;

    let total = script.events.len();
    let mut rejected = 0usize;
    for (index, event) in script.events.into_iter().enumerate() {
        if let Err(err) = engine.handle(event) {
            rejected += 1;
            tracing::warn!(index, %err, "replay event rejected");
        }
    }
    tracing::info!(
        total,
        rejected,
        history_len = engine.history_len(),
        "replay finished"
    );

    match output {
        Some(path) => {
            let image = engine.export_image()?;
            write_png(&path, &image)?;
            tracing::info!(path = %path.display(), "canvas written");
        }
        None => {
            let folder = ensure_output_folder(&engine.settings().export_subdir)?;
            match engine.export_to(&mut PngExporter::new(folder)) {
                ExportOutcome::Saved(path) => {
                    tracing::info!(path = %path.display(), "canvas written");
                }
                ExportOutcome::Failed(message) => return Err(anyhow!(message)),
            }
        }
    }
    Ok(())
}

fn load_script(path: &Path) -> Result<Script> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read replay script {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parse replay script {}", path.display()))
}
