//! Vista CLI tools: session simulation, configuration.

#![forbid(unsafe_code)]

mod script;

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use vista_layers::{BootstrapStatus, LayerName, MediaSession, SceneGraph, SessionConfig};
use vista_xr::dummy::{DummyCompositor, DummySession, DummyVideo};
use vista_xr::{ControllerId, ReadyState, VideoSource, XrSession};

use crate::script::Script;

#[derive(Parser, Debug)]
#[command(name = "vista")]
#[command(about = "Vista media layer tools")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted media session against the in-process host
    Simulate {
        /// Session layout file (JSON); built-in layout when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frames to render; extended as needed to finish the script
        #[arg(short, long, default_value_t = 300)]
        frames: u64,

        /// Frame at which the first video can play through
        #[arg(long, default_value_t = 30)]
        ready_after: u64,

        /// Render loop rate
        #[arg(long, default_value_t = 60)]
        fps: u32,

        /// Length of every simulated video, in seconds
        #[arg(long, default_value_t = 30.0)]
        duration: f64,
    },

    /// Print or write the built-in session layout
    DefaultConfig {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    vista_common::init_tracing();

    let args = Args::parse();

    match args.command {
        Command::Simulate {
            config,
            frames,
            ready_after,
            fps,
            duration,
        } => {
            let config = match config {
                Some(path) => SessionConfig::load(&path)
                    .with_context(|| format!("failed to load session config {}", path.display()))?,
                None => SessionConfig::default(),
            };

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            rt.block_on(simulate(config, frames, ready_after, fps.max(1), duration))?;
        }
        Command::DefaultConfig { output } => {
            let config = SessionConfig::default();
            match output {
                Some(path) => {
                    vista_common::save_json(&path, &config)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&config)?),
            }
        }
        Command::Version => {
            println!("vista {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

async fn simulate(config: SessionConfig, frames: u64, ready_after: u64, fps: u32, duration: f64) -> Result<()> {
    let session = Rc::new(DummySession::new());
    let compositor = Rc::new(DummyCompositor::new());
    let videos: Vec<(LayerName, Rc<DummyVideo>)> = config
        .layers
        .iter()
        .map(|layer| (layer.name, Rc::new(DummyVideo::new(duration))))
        .collect();
    let layers = config
        .layers
        .iter()
        .cloned()
        .zip(videos.iter())
        .map(|(layer, (_, video))| (layer, Rc::clone(video) as Rc<dyn VideoSource>))
        .collect();

    let mut media = MediaSession::new(session.clone(), compositor, layers)?;
    let mut scene = SceneGraph::new();
    let mut script = Script::new();

    let dt = 1.0 / f64::from(fps);
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(dt));
    let mut frame = 0u64;
    let mut last_frame = frames;
    info!("simulating {} frames at {} fps", frames, fps);

    while frame < last_frame {
        ticker.tick().await;

        // Videos become ready one after another.
        for (index, (_, video)) in videos.iter().enumerate() {
            if frame == ready_after + 5 * index as u64 {
                video.set_ready_state(ReadyState::HaveEnoughData);
            }
            video.advance(dt);
        }

        for event in script.step(frame, &media, &mut scene) {
            media.dispatch(event, &mut scene);
        }

        match media.on_frame(&mut scene) {
            Ok(BootstrapStatus::Published(created)) => {
                for layer in &created {
                    info!("{} layer '{}' is {:?}", layer.kind, layer.name, layer.handle);
                }
                script.on_published(frame);
                last_frame = last_frame.max(frame + Script::length());
            }
            Ok(_) => {}
            Err(err) => error!("frame {}: {}", frame, err),
        }
        frame += 1;
    }

    println!("Rendered {} frames", frame);
    println!("Render state: {:?}", session.render_state_layers());
    for (name, video) in &videos {
        let state = media.state(ControllerId::RIGHT, *name);
        println!(
            "{:<9} t={:>6.2}s paused={:<5} toolbar={:?}",
            name.as_str(),
            video.current_time(),
            video.is_paused(),
            state
        );
    }

    media.end(&mut scene);
    Ok(())
}
