//! SpikeTouch Application
//!
//! Command-line entry point for the spiking haptic renderer.
//!
//! # Usage
//!
//! ```bash
//! # Headless press, drag and release session at 1 kHz
//! spiketouch simulate --material wood --speed 1500
//!
//! # Remote rendering server (UDP control on 0.0.0.0:5005)
//! spiketouch serve
//!
//! # Drive a server
//! spiketouch send --target 192.168.0.20:5005 change --hz 40 --ms 90
//! spiketouch send play --types ra --channel-id 1 --volume 0.8
//!
//! # Inspect or export configuration
//! spiketouch materials
//! spiketouch dump-config spiketouch.json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use spiketouch_core::audio::WaveformSynthesizer;
use spiketouch_native::bridge::{ControlClient, ControlServer, GrainKind, RemoteRenderer};
use spiketouch_native::{
    GrainCache, HapticConfig, HapticEngine, PointerTracker, RecordingPlayer, Scheduler, TracingPlayer,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// SpikeTouch haptic renderer
#[derive(Parser, Debug)]
#[command(name = "spiketouch")]
#[command(author, version, about = "Spiking-neuron haptic feedback renderer", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// JSON config file (built-in tuning if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scripted press, drag and release through the tick scheduler
    Simulate {
        /// Session length in milliseconds
        #[arg(short, long, default_value = "2000")]
        duration_ms: u64,

        /// Material to drag across (config default if omitted)
        #[arg(short, long)]
        material: Option<String>,

        /// Drag speed in px/s
        #[arg(short, long, default_value = "1200")]
        speed: f64,
    },

    /// Run the UDP control server until Ctrl-C
    Serve {
        /// Bind address (overrides the config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Send one control command
    Send {
        /// Server address
        #[arg(short, long, default_value = "127.0.0.1:5005")]
        target: String,

        #[command(subcommand)]
        action: SendAction,
    },

    /// List configured materials
    Materials,

    /// Write the effective config as JSON (stdout if no path)
    DumpConfig {
        /// Output file
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum SendAction {
    /// Play a pre-rendered grain
    Play {
        /// Grain: sa or ra
        #[arg(long, default_value = "ra")]
        types: String,

        /// Output channel
        #[arg(long, default_value = "1")]
        channel_id: i32,

        /// Volume (clamped to 0..1 by the player)
        #[arg(long, default_value = "1.0")]
        volume: f32,
    },

    /// Replace the RA grain
    Change {
        /// Frequency in Hz
        #[arg(long, default_value = "35")]
        hz: u32,

        /// Length in ms
        #[arg(long, default_value = "90")]
        ms: u32,

        /// Amplitude
        #[arg(long, default_value = "1.0")]
        amp: f32,

        /// Release in ms
        #[arg(long, default_value = "5")]
        fade_out_ms: u32,
    },

    /// Request a reset
    Reset,

    /// Send the legacy bare `reset` datagram
    LegacyReset,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("SpikeTouch v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate {
            duration_ms,
            material,
            speed,
        } => run_simulation(&config, duration_ms, material.as_deref(), speed),
        Commands::Serve { bind } => run_server(config, bind),
        Commands::Send { target, action } => send_command(&target, action),
        Commands::Materials => {
            list_materials(&config);
            Ok(())
        }
        Commands::DumpConfig { path } => dump_config(&config, path.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<HapticConfig> {
    match path {
        Some(path) => {
            let config = HapticConfig::from_json(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        }
        None => Ok(HapticConfig::default()),
    }
}

fn grain_cache(config: &HapticConfig) -> Arc<GrainCache> {
    let cache = Arc::new(GrainCache::new(WaveformSynthesizer::new(config.sound.sample_rate)));
    cache.prewarm(config.materials.values(), &config.sound);
    cache
}

/// Scripted session: idle, press, drag, hold still, release, idle
fn run_simulation(
    config: &HapticConfig,
    duration_ms: u64,
    material: Option<&str>,
    speed: f64,
) -> anyhow::Result<()> {
    if duration_ms < 100 {
        bail!("--duration-ms must be at least 100");
    }
    if !speed.is_finite() || speed < 0.0 {
        bail!("--speed must be a non-negative number");
    }

    let player = Arc::new(RecordingPlayer::new());
    let mut engine = HapticEngine::new(config, grain_cache(config), player.clone())?;
    if let Some(name) = material {
        engine.select_material(name)?;
    }
    info!(
        material = engine.material_name(),
        duration_ms,
        speed,
        "Starting simulation"
    );

    let (mut tracker, pointer) = PointerTracker::new(config.pointer);
    let handle = Scheduler::spawn(engine, pointer, config.scheduler)?;

    let start = Instant::now();
    let total = Duration::from_millis(duration_ms);
    let press_at = total / 10;
    let drag_until = total * 6 / 10;
    let release_at = total * 8 / 10;
    let step = Duration::from_millis(5);

    let (mut x, mut pressed) = (0.0, false);
    loop {
        let now = Instant::now();
        let elapsed = now - start;
        if elapsed >= total {
            break;
        }

        if !pressed && elapsed >= press_at && elapsed < release_at {
            tracker.press_at(x, 0.0, now);
            pressed = true;
        } else if pressed && elapsed >= release_at {
            tracker.release();
            pressed = false;
        } else if pressed && elapsed < drag_until {
            x += speed * step.as_secs_f64();
            tracker.move_to_at(x, 0.0, now);
        }
        tracker.check_stopped(now);

        thread::sleep(step);
    }

    let stats = handle.shutdown()?;
    let [pressure, motion, click] = stats.spikes;
    info!(
        ticks = stats.ticks,
        overruns = stats.overruns,
        pressure,
        motion,
        click,
        plays = player.len(),
        "Simulation finished"
    );
    if stats.overruns > stats.ticks / 10 {
        warn!("More than 10% of ticks overran; timing is unreliable on this host");
    }
    Ok(())
}

fn run_server(mut config: HapticConfig, bind: Option<String>) -> anyhow::Result<()> {
    use tokio::runtime::Runtime;

    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut renderer = RemoteRenderer::new(&config, grain_cache(&config), Arc::new(TracingPlayer))?;
        let server = ControlServer::bind(&config.server).await?;
        let stats = server
            .run(&mut renderer, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {e}");
                    std::future::pending::<()>().await;
                }
            })
            .await?;
        info!(
            dispatched = stats.dispatched,
            dropped = stats.dropped,
            resets = renderer.resets(),
            "Server stopped"
        );
        Ok::<(), anyhow::Error>(())
    })
}

fn send_command(target: &str, action: SendAction) -> anyhow::Result<()> {
    let client = ControlClient::new(target)?;
    let sent = match action {
        SendAction::Play {
            types,
            channel_id,
            volume,
        } => {
            let types = match types.to_lowercase().as_str() {
                "sa" => GrainKind::Sa,
                "ra" => GrainKind::Ra,
                other => bail!("unknown grain type '{other}', expected sa or ra"),
            };
            client.play(types, channel_id, volume)?
        }
        SendAction::Change {
            hz,
            ms,
            amp,
            fade_out_ms,
        } => client.change(hz, ms, amp, fade_out_ms)?,
        SendAction::Reset => client.reset()?,
        SendAction::LegacyReset => client.send_reset_legacy()?,
    };
    info!("Sent {sent} bytes to {}", client.target());
    Ok(())
}

fn list_materials(config: &HapticConfig) {
    println!("{:<10} {:<8} {:>6} {:>6}  parameter", "name", "family", "r", "f");
    for (name, material) in &config.materials {
        let marker = if *name == config.default_material { "*" } else { " " };
        let parameter = match (material.family().parameter_name(), material.shape.parameter()) {
            (Some(key), Some(value)) => format!("{key}={value}"),
            _ => "-".to_string(),
        };
        println!(
            "{marker}{:<9} {:<8} {:>6.2} {:>6.2}  {parameter}",
            name,
            material.family(),
            material.roughness,
            material.freq_scale,
        );
    }
}

fn dump_config(config: &HapticConfig, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            config.to_json(path)?;
            info!("Wrote config to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}
