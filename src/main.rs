use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use clicktrack::audio::device::AudioDeviceManager;
use clicktrack::{
    EngineConfig, Metronome, Preset, PresetStore, SilentMode, SoundId, Subdivision, TempoRamp,
};
use tracing_subscriber::EnvFilter;

fn main() -> clicktrack::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Devices => {
            list_devices();
            Ok(())
        }
        Commands::Sounds => {
            list_sounds();
            Ok(())
        }
        Commands::Presets { store, remove } => manage_presets(store, remove),
    }
}

fn init_tracing() {
    // Also bridges the library's `log` records
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

fn run(args: RunArgs) -> clicktrack::Result<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if args.device.is_some() {
        config.output_device = args.device.clone();
    }

    let store = preset_store(args.store.clone())?;
    let mut metronome = Metronome::new(config)?;

    if let Some(name) = &args.preset {
        let preset = store.get(name)?;
        metronome.apply_preset(&preset);
    }

    if let Some(bpm) = args.bpm {
        metronome.set_tempo(bpm);
    }
    if let Some(beats) = args.beats {
        metronome.set_time_signature(beats);
    }
    if let Some(id) = &args.subdivision {
        metronome.set_subdivision_id(id);
    }
    if let Some(id) = &args.sound {
        metronome.set_sound_type(id);
    }
    if let Some(volume) = args.volume {
        metronome.set_volume(volume);
    }
    if let Some(target) = args.ramp_to {
        metronome.set_tempo_ramp(Some(TempoRamp::new(target, args.ramp_step, args.ramp_every)));
    }
    if let Some((audible, silent)) = args.silent {
        metronome.set_silent_mode(SilentMode::new(audible, silent));
    }
    if let Some(bars) = args.count_in {
        metronome.set_count_in(bars);
    }

    let _printer = (!args.quiet).then(|| {
        metronome.on_beat(|event| {
            if !event.sounding && event.subdivision_index > 0 {
                return;
            }
            let marker = match (event.count_in, event.is_accent, event.muted) {
                (true, _, _) => "count-in",
                (_, true, false) => "ACCENT",
                (_, _, true) => "(muted)",
                _ => "",
            };
            println!(
                "bar {:>4} beat {:>2}.{} {:>6.1} BPM {}",
                event.bar + 1,
                event.beat_index + 1,
                event.subdivision_index + 1,
                event.tempo_bpm,
                marker
            );
        })
    });

    let snapshot = metronome.snapshot();
    metronome.start(snapshot.tempo)?;
    tracing::info!(
        bpm = snapshot.tempo,
        beats = snapshot.beats_per_bar,
        subdivision = %snapshot.subdivision,
        sound = %snapshot.sound,
        "metronome running"
    );

    match args.duration {
        Some(seconds) => std::thread::sleep(Duration::from_secs_f64(seconds.max(0.0).min(86_400.0))),
        None => {
            println!("Press Enter to stop");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
        }
    }

    metronome.stop();

    if let Some(name) = args.save_preset {
        let preset = Preset::from_snapshot(name, &metronome.snapshot());
        tracing::info!(name = %preset.name, path = %store.path().display(), "saving preset");
        store.add(preset)?;
    }

    Ok(())
}

fn list_devices() {
    let devices = AudioDeviceManager::new().list_output_devices();
    if devices.is_empty() {
        println!("No audio output device found");
    }
    for device in devices {
        let marker = if device.is_default { " (default)" } else { "" };
        println!("{}{}", device.name, marker);
    }
}

fn list_sounds() {
    println!("Sounds:");
    for sound in SoundId::ALL {
        let recipe = sound.recipe();
        println!(
            "  {:<10} {:>6.0} Hz {:?}, {:.0} ms",
            sound.id(),
            recipe.frequency,
            recipe.waveform,
            recipe.decay * 1000.0
        );
    }
    println!("Subdivisions:");
    for subdivision in Subdivision::ALL {
        let slots: String = subdivision
            .pattern()
            .slots()
            .iter()
            .map(|&on| if on { 'x' } else { '.' })
            .collect();
        println!("  {:<10} {}", subdivision.id(), slots);
    }
}

fn manage_presets(store: Option<PathBuf>, remove: Option<String>) -> clicktrack::Result<()> {
    let store = preset_store(store)?;

    if let Some(name) = remove {
        store.remove(&name)?;
        println!("Removed preset '{}'", name);
        return Ok(());
    }

    let presets = store.load()?;
    if presets.is_empty() {
        println!("No presets in {}", store.path().display());
    }
    for preset in presets {
        println!(
            "{:<20} {:>5.1} BPM, {} beats, {}, sound {}, count-in {}{}",
            preset.name,
            preset.bpm,
            preset.beats_per_bar,
            preset.subdivision,
            preset.sound.map(|s| s.id()).unwrap_or("-"),
            preset.count_in_measures,
            if preset.tempo_ramp.is_some_and(|r| r.enabled) { ", ramp" } else { "" }
        );
    }
    Ok(())
}

fn preset_store(path: Option<PathBuf>) -> clicktrack::Result<PresetStore> {
    Ok(match path {
        Some(path) => PresetStore::new(path),
        None => PresetStore::open_default()?,
    })
}

fn parse_silent(value: &str) -> Result<(u32, u32), String> {
    let (audible, silent) = value
        .split_once(':')
        .ok_or_else(|| "expected AUDIBLE:SILENT, e.g. 3:1".to_string())?;
    let audible = audible.trim().parse().map_err(|e| format!("audible bars: {}", e))?;
    let silent = silent.trim().parse().map_err(|e| format!("silent bars: {}", e))?;
    Ok((audible, silent))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Sample-accurate practice metronome", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the metronome until Enter is pressed (or for --duration seconds).
    Run(RunArgs),
    /// List audio output devices.
    Devices,
    /// List click sounds and subdivision patterns.
    Sounds,
    /// List saved presets, or remove one.
    Presets {
        /// Preset file (defaults to the user data directory).
        #[arg(long)]
        store: Option<PathBuf>,
        /// Name of a preset to delete.
        #[arg(long)]
        remove: Option<String>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Tempo in beats per minute (1-300).
    #[arg(short, long)]
    bpm: Option<f64>,
    /// Beats per bar (1-32).
    #[arg(long)]
    beats: Option<u32>,
    /// Subdivision id, see `clicktrack sounds`.
    #[arg(short, long)]
    subdivision: Option<String>,
    /// Click sound id, see `clicktrack sounds`.
    #[arg(long)]
    sound: Option<String>,
    /// Output volume (0-1).
    #[arg(short, long)]
    volume: Option<f32>,
    /// Ramp the tempo toward this BPM.
    #[arg(long)]
    ramp_to: Option<f64>,
    /// BPM change per ramp step.
    #[arg(long, default_value_t = 5.0)]
    ramp_step: f64,
    /// Bars between ramp steps.
    #[arg(long, default_value_t = 4)]
    ramp_every: u32,
    /// Silent practice as AUDIBLE:SILENT bars, e.g. 3:1.
    #[arg(long, value_parser = parse_silent)]
    silent: Option<(u32, u32)>,
    /// Bars of count-in before the pattern starts.
    #[arg(long)]
    count_in: Option<u32>,
    /// Stop after this many seconds instead of waiting for Enter.
    #[arg(short, long)]
    duration: Option<f64>,
    /// Output device name, see `clicktrack devices`.
    #[arg(long)]
    device: Option<String>,
    /// Engine config file (RON).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Load a saved preset before applying the other options.
    #[arg(short, long)]
    preset: Option<String>,
    /// Save the final settings as a preset under this name.
    #[arg(long)]
    save_preset: Option<String>,
    /// Preset file (defaults to the user data directory).
    #[arg(long)]
    store: Option<PathBuf>,
    /// Do not print beats.
    #[arg(short, long)]
    quiet: bool,
}
