use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use skinview_common::{UniformLayout, skin_vertex_layout};
use skinview_pose::{AnimationController, Avatar, BoneId, ClipRegistry, PlayOptions, SkinVariant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skinview-cli", about = "Headless tools for the skin renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Classic,
    Slim,
}

impl From<Variant> for SkinVariant {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Classic => SkinVariant::Classic,
            Variant::Slim => SkinVariant::Slim,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// List registered animation clips
    Clips {
        /// Extra clips as a JSON array
        #[arg(short, long)]
        clips: Option<PathBuf>,
    },
    /// Print the rest pose of an avatar
    Pose {
        #[arg(long, value_enum, default_value = "classic")]
        variant: Variant,
        /// Dump all bone matrices as JSON instead of bone origins
        #[arg(long)]
        json: bool,
    },
    /// Simulate playback of a clip at a fixed time step
    Play {
        /// Clip name
        name: String,
        #[arg(short, long, default_value = "120")]
        frames: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        #[arg(long, default_value = "1.0")]
        speed: f32,
        #[arg(long, default_value = "1.0")]
        amplitude: f32,
        #[arg(long, value_enum, default_value = "classic")]
        variant: Variant,
        /// Extra clips as a JSON array
        #[arg(short, long)]
        clips: Option<PathBuf>,
    },
    /// Print the uniform block and vertex layouts shared by both backends
    Layout,
}

fn load_registry(clips: Option<&PathBuf>) -> anyhow::Result<ClipRegistry> {
    let mut registry = ClipRegistry::with_builtin_clips();
    if let Some(path) = clips {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let added = registry
            .load_json(&json)
            .with_context(|| format!("loading clips from {}", path.display()))?;
        tracing::info!(added, path = %path.display(), "loaded clips");
    }
    Ok(registry)
}

fn bone_origin(avatar: &Avatar, bone: BoneId) -> Vec3 {
    avatar.bone_matrix(bone).transform_point3(Vec3::ZERO)
}

/// `RUST_LOG` when it parses, otherwise `debug` or `info` from `--verbose`.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), cli.verbose))
        .init();

    match cli.command {
        Commands::Info => {
            println!("skinview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", skinview_common::crate_info());
            println!("pose: {}", skinview_pose::crate_info());
            println!("render: {}", skinview_render::crate_info());
            println!("render-gl: {}", skinview_render_gl::crate_info());
            println!("render-wgpu: {}", skinview_render_wgpu::crate_info());
        }
        Commands::Clips { clips } => {
            let registry = load_registry(clips.as_ref())?;
            for name in registry.names() {
                let Some(clip) = registry.get(name) else {
                    continue;
                };
                println!(
                    "{name}: {:.2}s, {} tracks{}",
                    clip.duration,
                    clip.tracks.len(),
                    if clip.looping { ", loop" } else { "" }
                );
            }
        }
        Commands::Pose { variant, json } => {
            let mut avatar = Avatar::new(variant.into());
            avatar.update_matrices();
            if json {
                let bones: serde_json::Map<String, serde_json::Value> = BoneId::ALL
                    .iter()
                    .map(|&bone| {
                        let cols = avatar.bone_matrix(bone).to_cols_array().to_vec();
                        (bone.name().to_string(), serde_json::json!(cols))
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&bones)?);
            } else {
                for bone in BoneId::ALL {
                    let origin = bone_origin(&avatar, bone);
                    println!(
                        "{:<10} ({:>6.2}, {:>6.2}, {:>6.2})",
                        bone.name(),
                        origin.x,
                        origin.y,
                        origin.z
                    );
                }
            }
        }
        Commands::Play {
            name,
            frames,
            dt,
            speed,
            amplitude,
            variant,
            clips,
        } => {
            let registry = load_registry(clips.as_ref())?;
            let mut avatar = Avatar::new(variant.into());
            let mut controller = AnimationController::new();
            let options = PlayOptions { speed, amplitude };
            if !controller.play(&registry, &name, options, &mut avatar) {
                anyhow::bail!("unknown clip {name:?}");
            }

            println!("Playing {name}: frames={frames}, dt={dt}, speed={speed}");
            let report_every = (frames / 8).max(1);
            let mut solves = 0;
            for frame in 1..=frames {
                controller.update(dt, &mut avatar);
                if avatar.update_matrices() {
                    solves += 1;
                }
                if frame % report_every == 0 || frame == frames {
                    let head = bone_origin(&avatar, BoneId::Head);
                    println!(
                        "frame {frame:>5}: t={:.3}s progress={:.2} head=({:.2}, {:.2}, {:.2})",
                        controller.elapsed(),
                        controller.progress(),
                        head.x,
                        head.y,
                        head.z
                    );
                }
                if controller.is_finished() {
                    println!("finished at frame {frame}");
                    break;
                }
            }
            println!("state={:?}, solves={solves}", controller.state());
        }
        Commands::Layout => {
            let uniforms = UniformLayout::skin();
            println!("uniform block: {} bytes", uniforms.size());
            for field in uniforms.fields() {
                println!("  {:<12} offset={:<4} {:?}", field.name, field.offset, field.kind);
            }
            let vertex = skin_vertex_layout();
            println!("vertex stride: {} bytes", vertex.stride);
            for attribute in &vertex.attributes {
                println!(
                    "  location={} offset={:<3} {:?}",
                    attribute.location, attribute.offset, attribute.format
                );
            }
        }
    }

    Ok(())
}
