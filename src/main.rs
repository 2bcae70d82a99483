//! Bézier-Ketten-Editor (Replay).
//!
//! Lädt Pfad-Features aus JSON, spielt eine Sequenz von Zeiger-Events ab und
//! schreibt die bearbeiteten Features wieder als JSON.
//!
//! Aufruf: `bezier-chain-editor <feature.json> <script.json> [out.json]`

use std::path::PathBuf;

use anyhow::{bail, Context};
use bezier_chain_editor::{
    Camera2D, EditSession, EditorOptions, MarkerOverlay, PathFeature, PointerEvent,
};
use glam::DVec2;
use serde::{Deserialize, Serialize};

fn main() -> anyhow::Result<()> {
    // Logger initialisieren
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!(
        "Bézier-Ketten-Editor v{} startet...",
        env!("CARGO_PKG_VERSION")
    );

    let args = ReplayArgs::from_env()?;
    ReplayRunner::run(&args)
}

/// Kommandozeilen-Argumente.
struct ReplayArgs {
    feature_path: PathBuf,
    script_path: PathBuf,
    output_path: Option<PathBuf>,
}

impl ReplayArgs {
    fn from_env() -> anyhow::Result<Self> {
        let mut args = std::env::args_os().skip(1);
        let (Some(feature_path), Some(script_path)) = (args.next(), args.next()) else {
            bail!("Aufruf: bezier-chain-editor <feature.json> <script.json> [out.json]");
        };
        Ok(Self {
            feature_path: feature_path.into(),
            script_path: script_path.into(),
            output_path: args.next().map(PathBuf::from),
        })
    }
}

/// Ein Feature oder eine Liste von Features; die Ausgabe behält die Form bei.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum FeatureInput {
    Many(Vec<PathFeature>),
    One(PathFeature),
}

/// Kamera-Einstellungen des Skripts (fehlende Werte aus den Optionen).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScriptCamera {
    position: Option<DVec2>,
    zoom: Option<f64>,
    viewport: Option<DVec2>,
}

/// Abzuspielendes Zeiger-Skript.
#[derive(Debug, Deserialize)]
struct ReplayScript {
    #[serde(default)]
    camera: ScriptCamera,
    events: Vec<PointerEvent>,
}

struct ReplayRunner;

impl ReplayRunner {
    fn run(args: &ReplayArgs) -> anyhow::Result<()> {
        // Optionen aus TOML laden (oder Standardwerte)
        let options = EditorOptions::load_from_file(&EditorOptions::config_path());

        let input: FeatureInput = read_json(&args.feature_path)?;
        let script: ReplayScript = read_json(&args.script_path)?;

        let camera = Self::build_camera(&script.camera, &options);
        let mut session = EditSession::new(camera, MarkerOverlay::new(), options);

        let single = matches!(input, FeatureInput::One(_));
        let features = match input {
            FeatureInput::One(feature) => vec![feature],
            FeatureInput::Many(features) => features,
        };
        for feature in features {
            let id = session.add_feature(feature)?;
            if let Some(chain) = session.chain(id) {
                log::info!(
                    "Kette {} geladen: {} Segment(e)",
                    id,
                    chain.segment_count()
                );
            }
        }

        Self::replay(&mut session, script.events);

        let mut features = session.into_features();
        let output = match (single, features.len()) {
            (true, 1) => FeatureInput::One(features.remove(0)),
            _ => FeatureInput::Many(features),
        };
        let json = serde_json::to_string_pretty(&output)
            .context("Fehler beim Serialisieren der Features")?;

        match &args.output_path {
            Some(path) => {
                std::fs::write(path, json)
                    .with_context(|| format!("Fehler beim Schreiben von {}", path.display()))?;
                log::info!("Features gespeichert nach: {}", path.display());
            }
            None => println!("{}", json),
        }
        Ok(())
    }

    fn build_camera(script: &ScriptCamera, options: &EditorOptions) -> Camera2D {
        let [width, height] = options.viewport_size_px;
        let mut camera = Camera2D::new(script.viewport.unwrap_or(DVec2::new(width, height)));
        if let Some(position) = script.position {
            camera.look_at(position);
        }
        if let Some(zoom) = script.zoom {
            camera.zoom_by(zoom);
        }
        camera
    }

    fn replay(session: &mut EditSession, events: Vec<PointerEvent>) {
        let total = events.len();
        for (i, event) in events.into_iter().enumerate() {
            let before = session.state();
            if let Err(e) = session.handle_event(event) {
                log::error!("Event {}/{} fehlgeschlagen: {:#}", i + 1, total, e);
                continue;
            }
            let after = session.state();
            if before != after {
                log::info!("Event {}/{}: {:?} -> {:?}", i + 1, total, before, after);
            }
        }
        log::info!("{} Event(s) abgespielt", total);
    }
}

fn read_json<T>(path: &std::path::Path) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Datei nicht lesbar: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Fehler beim Parsen von {}", path.display()))
}
