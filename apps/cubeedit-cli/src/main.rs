use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use cubeedit_author::Tool;
use cubeedit_common::Colour;
use cubeedit_common::codec::{FACE_BACKGROUND, FACE_GROUND, MAX_GROUND_COORD, MAX_PICKABLE};
use cubeedit_input::{Buttons, PointerEvent, PointerKind};
use cubeedit_kernel::World;
use cubeedit_render::{DebugTextRenderer, InstanceSink, RaycastPicker, Renderer};
use cubeedit_session::{EditorSession, SessionConfig};
use glam::Vec2;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Drag moves are replayed in this many steps, one frame apart.
const DRAG_STEPS: u32 = 10;
const FRAME_MS: f64 = 16.0;
/// Momentum that has not settled after this many ticks is reported as an error.
const MAX_MOMENTUM_TICKS: u32 = 100_000;

#[derive(Parser)]
#[command(name = "cubeedit-cli", about = "Headless voxel editor tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML session config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Viewport width in pixels
    #[arg(long, default_value = "800")]
    width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value = "600")]
    height: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ButtonArg {
    Primary,
    Secondary,
}

impl ButtonArg {
    fn mask(self) -> Buttons {
        match self {
            ButtonArg::Primary => Buttons::PRIMARY,
            ButtonArg::Secondary => Buttons::SECONDARY,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and pick protocol constants
    Info,
    /// Print the seed world
    World {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Simulate a drag, then let momentum run out
    Orbit {
        #[arg(long, value_enum, default_value = "primary")]
        button: ButtonArg,
        /// Horizontal drag distance in pixels
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        dx: f32,
        /// Vertical drag distance in pixels
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        dy: f32,
        /// Hold still this long before releasing
        #[arg(long, default_value = "0")]
        pause_ms: f64,
    },
    /// Click a pixel of the default view and apply the tool
    Click {
        #[arg(long)]
        x: f32,
        #[arg(long)]
        y: f32,
        /// Use the delete tool
        #[arg(long)]
        delete: bool,
        /// Paint colour as #RRGGBB
        #[arg(long)]
        colour: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SessionConfig> {
    match path {
        Some(path) => {
            let config = SessionConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            tracing::info!(path = %path.display(), "config loaded");
            Ok(config)
        }
        None => Ok(SessionConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_ref())?;
    tracing::debug!(width = cli.width, height = cli.height, "viewport");

    match cli.command {
        Commands::Info => {
            println!("cubeedit-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("pick protocol: version 2");
            println!("  face ids: 1 front, 2 back, 3 top, 4 bottom, 5 right, 6 left");
            println!("  background byte: {FACE_BACKGROUND}");
            println!("  ground byte: {FACE_GROUND}");
            println!("  pickable cubes: {}", MAX_PICKABLE as u64 + 1);
            println!("  ground cells: |x|, |z| <= {MAX_GROUND_COORD}");
            println!("seed world: {} cubes", World::seeded().len());
        }
        Commands::World { json } => {
            let world = World::seeded();
            if json {
                println!("{}", serde_json::to_string_pretty(&world)?);
            } else {
                let session = EditorSession::with_world(world, &config, cli.width, cli.height);
                let mut renderer = DebugTextRenderer::new();
                renderer.upload_instances(&session.world().snapshot());
                print!("{}", renderer.render(&session.render_view()));
            }
        }
        Commands::Orbit {
            button,
            dx,
            dy,
            pause_ms,
        } => {
            let mut session = EditorSession::new(&config, cli.width, cli.height);
            let mut picker = RaycastPicker::new(config.ground_extent);
            session.sync(&mut picker);
            picker.render(&session.render_view());

            let start = Vec2::new(cli.width as f32 / 2.0, cli.height as f32 / 2.0);
            let step = Vec2::new(dx, dy) / DRAG_STEPS as f32;
            let mask = button.mask();
            let mut now = 0.0;

            session.handle_pointer(
                &PointerEvent::new(PointerKind::Down, start.x, start.y, mask, now),
                &mut picker,
            );
            let mut at = start;
            for _ in 0..DRAG_STEPS {
                now += FRAME_MS;
                at += step;
                session.handle_pointer(
                    &PointerEvent::new(PointerKind::Move, at.x, at.y, mask, now),
                    &mut picker,
                );
            }
            now += pause_ms.max(0.0);
            let outcomes = session.handle_pointer(
                &PointerEvent::new(PointerKind::Up, at.x, at.y, Buttons::NONE, now),
                &mut picker,
            );
            if !outcomes.is_empty() {
                println!("Drag too short, treated as a click: {outcomes:?}");
            }

            let released = session.camera().pose();
            let velocity = session.camera().velocity();
            let mut ticks = 0u32;
            while !session.camera().is_at_rest() {
                if ticks >= MAX_MOMENTUM_TICKS {
                    anyhow::bail!("camera still moving after {ticks} ticks");
                }
                ticks += session.tick(session.camera().config().sim_rate_ms);
            }
            tracing::debug!(ticks, "camera at rest");
            let pose = session.camera().pose();

            println!(
                "Released: rotation={:.3} pan={:.3} distance={:.3} ascension={:.3}",
                released.rotation, released.pan, released.distance, released.ascension
            );
            println!(
                "Velocity: rotation={:.3} pan={:.3} distance={:.4} ascension={:.4}",
                velocity.rotation, velocity.pan, velocity.distance, velocity.ascension
            );
            println!("Momentum ran {ticks} ticks");
            println!(
                "Rest: rotation={:.3} pan={:.3} distance={:.3} ascension={:.3}",
                pose.rotation, pose.pan, pose.distance, pose.ascension
            );
        }
        Commands::Click {
            x,
            y,
            delete,
            colour,
        } => {
            let mut session = EditorSession::new(&config, cli.width, cli.height);
            if let Some(text) = colour {
                Colour::parse_hex(&text).with_context(|| format!("bad --colour {text}"))?;
                session.controls_mut().set_swatch(0, text);
                session.controls_mut().select(Tool::Swatch(0));
            }
            if delete {
                session.controls_mut().select(Tool::Delete);
            }

            let mut picker = RaycastPicker::new(config.ground_extent);
            picker.render(&session.render_view());
            let outcome = session.click(Vec2::new(x, y), &mut picker);

            println!("Click ({x}, {y}): {outcome:?}");
            println!("Cubes: {}", session.world().len());
        }
    }

    Ok(())
}
