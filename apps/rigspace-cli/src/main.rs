use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use rigspace_common::Pose;
use rigspace_input::{GamepadSnapshot, InputEvent};
use rigspace_kernel::{FrameInput, FrameOutput, SceneConfig, Simulation};
use rigspace_physics::ChainConfig;
use rigspace_render::{DebugTextRenderer, RenderView, Renderer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rigspace-cli", about = "Headless driver for the rigspace simulation")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the effective scene config as YAML
    Config {
        /// Scene config file (YAML); defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run the scene with a scripted gamepad and held keys
    Simulate {
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Scene config file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Left stick held for the whole run, as `x,y`
        #[arg(long, value_parser = parse_pad, allow_hyphen_values = true)]
        left: Option<(f32, f32)>,
        /// Right stick held for the whole run, as `x,y`
        #[arg(long, value_parser = parse_pad, allow_hyphen_values = true)]
        right: Option<(f32, f32)>,
        /// Key codes held for the whole run (e.g. KeyW)
        #[arg(long = "key")]
        keys: Vec<String>,
        /// Enter XR presentation before the first frame
        #[arg(long)]
        presenting: bool,
        /// Read a real gamepad instead of the scripted sticks
        #[cfg(feature = "gilrs")]
        #[arg(long)]
        gilrs: bool,
        /// Print every Nth frame
        #[arg(long, default_value = "30")]
        every: u64,
        /// Emit one JSON object per printed frame
        #[arg(long)]
        json: bool,
    },
    /// Hang a rope from a pivot target and print its curve
    Rope {
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Rope segment count
        #[arg(short, long, default_value = "8")]
        segments: usize,
        /// Pivot target height above the rope frame
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        lift: f32,
        /// Let the rope fall freely
        #[arg(long)]
        free: bool,
        /// Curve samples per span in the printed polyline
        #[arg(long, default_value = "8")]
        per_span: usize,
    },
}

fn parse_pad(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("bad axis `{v}`: {e}"))
    };
    Ok((parse(x)?, parse(y)?))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn print_frame(out: &FrameOutput, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(out)?);
    } else {
        let view = RenderView::from_player(&out.player);
        print!("{}", DebugTextRenderer::new().render(out, &view));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("rigspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", rigspace_common::crate_info());
            println!("input: {}", rigspace_input::crate_info());
            println!("locomotion: {}", rigspace_locomotion::crate_info());
            println!("physics: {}", rigspace_physics::crate_info());
            println!("kernel: {}", rigspace_kernel::crate_info());
            println!("render: {}", rigspace_render::crate_info());
        }
        Commands::Config { config } => {
            let config = load_config(config.as_ref())?;
            print!("{}", config.to_yaml_string()?);
        }
        Commands::Simulate {
            frames,
            config,
            left,
            right,
            keys,
            presenting,
            #[cfg(feature = "gilrs")]
            gilrs,
            every,
            json,
        } => {
            let config = load_config(config.as_ref())?;
            let mut sim = Simulation::new(config)?;
            tracing::info!(frames, ?left, ?right, ?keys, "simulate");

            if presenting {
                sim.set_presenting(true);
            }
            for key in &keys {
                sim.key_down(key);
            }

            // A scripted pad at index 0 stands in for a connected gamepad.
            let (lx, ly) = left.unwrap_or((0.0, 0.0));
            let (rx, ry) = right.unwrap_or((0.0, 0.0));
            let scripted = vec![GamepadSnapshot::new(0, "scripted", vec![lx, ly, rx, ry])];
            sim.handle_input_event(&InputEvent::GamepadConnected {
                index: 0,
                id: "scripted".into(),
                axis_count: 4,
            });

            #[cfg(feature = "gilrs")]
            let mut backend = if gilrs {
                Some(rigspace_input::GilrsBackend::new()?)
            } else {
                None
            };

            let every = every.max(1);
            for _ in 0..frames {
                #[cfg(feature = "gilrs")]
                let out = match backend.as_mut() {
                    Some(backend) => {
                        for event in backend.pump() {
                            sim.handle_input_event(&event);
                        }
                        sim.step(FrameInput {
                            gamepads: &*backend,
                            ..FrameInput::default()
                        })
                    }
                    None => sim.step(FrameInput {
                        gamepads: &scripted,
                        ..FrameInput::default()
                    }),
                };
                #[cfg(not(feature = "gilrs"))]
                let out = sim.step(FrameInput {
                    gamepads: &scripted,
                    ..FrameInput::default()
                });

                if out.tick % every == 0 || out.tick == frames {
                    print_frame(&out, json)?;
                }
            }

            for event in sim.drain_events() {
                tracing::info!(?event, "event");
            }
            sim.shutdown();
        }
        Commands::Rope {
            frames,
            segments,
            lift,
            free,
            per_span,
        } => {
            let config = SceneConfig {
                rope: Some(ChainConfig {
                    segments,
                    ..SceneConfig::default().rope.unwrap_or_default()
                }),
                pivot_target: (!free).then(|| Pose::from_position(Vec3::Y * lift)),
                ball: None,
                ..SceneConfig::default()
            };
            let mut sim = Simulation::new(config)?;

            let mut last = None;
            for _ in 0..frames {
                last = Some(sim.step(FrameInput::default()));
            }
            let Some(out) = last else {
                println!("no frames run");
                return Ok(());
            };

            println!("Rope after {} frames ({} segments):", out.tick, out.rope_points.len());
            for (i, p) in out.rope_points.iter().enumerate() {
                println!("  [{i}] ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
            }
            let line = rigspace_render::rope_polyline(&out, per_span);
            println!("Curve: {} world points", line.len());
            if let (Some(first), Some(last)) = (line.first(), line.last()) {
                println!(
                    "  from ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
                    first.x, first.y, first.z, last.x, last.y, last.z
                );
            }
            if let Some(cmd) = out.pivot {
                println!("Pivot error: {:.4}", cmd.position_error.length());
            }
        }
    }

    Ok(())
}
