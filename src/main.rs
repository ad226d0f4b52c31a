use clap::{Parser, Subcommand};
use mix_maven::app_core::AppCore;
use mix_maven::library::MixLibrary;
use mix_maven::player::AudioOutput;
use mix_maven::scheduler::CrossfadeScheduler;
use mix_maven::suggest::{Candidate, DEFAULT_LIMIT};
use mix_maven::track::MixTrack;
use mix_maven::transition;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mixmaven", about = "Harmonic Mix Engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show library status
    Status,
    /// Mix management
    Mix {
        #[command(subcommand)]
        action: MixCmd,
    },
    /// Score the transition between two tagged audio files
    Score {
        /// Outgoing track
        file_a: PathBuf,
        /// Incoming track
        file_b: PathBuf,
    },
    /// Show transitions and the flow score for a mix
    Flow {
        /// Mix name
        name: String,
    },
    /// Rank candidate files as the next track for a mix
    Suggest {
        /// Mix name
        mix: String,
        /// Candidate audio file path(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Maximum number of suggestions
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Play a mix with crossfaded transitions
    Play {
        /// Mix name (defaults to the active mix)
        mix: Option<String>,
        /// Track number to start from (1-based)
        #[arg(short, long)]
        track: Option<usize>,
        /// Playback volume 0.0-1.0
        #[arg(short, long)]
        volume: Option<f32>,
    },
}

#[derive(Subcommand)]
enum MixCmd {
    /// Create a new mix
    Create { name: String },
    /// List all mixes
    List,
    /// Show tracks in a mix
    Show { name: String },
    /// Set a mix as the active context
    Activate { name: String },
    /// Delete a mix
    Delete { name: String },
    /// Rename a mix
    Rename { name: String, new_name: String },
    /// Add tagged audio file(s) to a mix
    Add {
        /// Mix name
        mix: String,
        /// Audio file path(s) carrying TBPM and TKEY tags
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Remove track(s) from a mix by position (1-based)
    Remove {
        /// Mix name
        name: String,
        /// Track numbers to remove (1-based)
        #[arg(required = true)]
        tracks: Vec<usize>,
    },
    /// Move a track from one position to another (1-based)
    Move {
        /// Mix name
        name: String,
        /// Current position (1-based)
        from: usize,
        /// New position (1-based)
        to: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let state_path = MixLibrary::default_path();
    let mut core = AppCore::new(&state_path);

    match cli.command {
        Commands::Status => {
            let status = core.get_status();
            println!("Mixes: {}", status.mix_count);
            match (status.active_mix, status.active_flow_score) {
                (Some(name), Some(flow)) => {
                    println!("Active mix: {} (flow {:.1}/5.0)", name, flow)
                }
                _ => println!("Active mix: none"),
            }
        }

        Commands::Mix { action } => run_mix(&mut core, action)?,

        Commands::Score { file_a, file_b } => {
            let a = MixTrack::from_path(&file_a)?;
            let b = MixTrack::from_path(&file_b)?;
            let t = transition::score_transition(&a, &b);
            println!("{} — {}  →  {} — {}", a.artist, a.title, b.artist, b.title);
            println!("Score: {}/100 ({}, {})", t.score, t.label, t.color);
            println!("{}", t.details);
        }

        Commands::Flow { name } => {
            let tracks = core.get_mix_tracks(&name)?;
            let transitions = core.get_transitions(&name)?;
            for (i, track) in tracks.iter().enumerate() {
                println!(
                    "{:2}. {} — {} [{} | {:.0} BPM]",
                    i + 1,
                    track.artist,
                    track.title,
                    track.key,
                    track.bpm
                );
                if let Some(t) = transitions.get(i) {
                    println!("      ↓ {} ({}): {}", t.score, t.label, t.details);
                }
            }
            println!("Flow score: {:.1}/5.0", core.get_flow_score(&name)?);
        }

        Commands::Suggest { mix, files, limit } => {
            let mut candidates = Vec::new();
            for file in &files {
                match MixTrack::from_path(file) {
                    Ok(track) => candidates.push(Candidate::new(track)),
                    Err(e) => eprintln!("Skipping '{}': {}", file.display(), e),
                }
            }
            let ranked =
                core.get_suggestions(&mix, &candidates, limit.unwrap_or(DEFAULT_LIMIT))?;
            if ranked.is_empty() {
                println!("No suggestions available");
            }
            for s in ranked {
                println!(
                    "{:3}/100  {} — {} ({})",
                    s.compatibility, s.track.artist, s.track.title, s.details
                );
            }
        }

        Commands::Play { mix, track, volume } => {
            let mix_name = match mix {
                Some(name) => name,
                None => core
                    .get_status()
                    .active_mix
                    .ok_or_else(|| "No active mix".to_string())?,
            };
            play_mix(&core, &mix_name, track, volume)?;
        }
    }
    Ok(())
}

fn run_mix(core: &mut AppCore, action: MixCmd) -> Result<(), String> {
    match action {
        MixCmd::Create { name } => {
            core.create_mix(name.clone())?;
            println!("Created mix '{}'", name);
        }
        MixCmd::List => {
            let mixes = core.get_mixes();
            if mixes.is_empty() {
                println!("No mixes yet");
            }
            for m in mixes {
                println!(
                    "{} {} — {} track(s), flow {:.1}/5.0",
                    if m.is_active { "*" } else { " " },
                    m.name,
                    m.track_count,
                    m.flow_score
                );
            }
        }
        MixCmd::Show { name } => {
            for t in core.get_mix_tracks(&name)? {
                println!(
                    "{:2}. {} — {} [{} | {:.0} BPM | {}]{}",
                    t.index + 1,
                    t.artist,
                    t.title,
                    t.key,
                    t.bpm,
                    t.duration_display,
                    if t.has_preview { "" } else { " (no preview)" }
                );
            }
        }
        MixCmd::Activate { name } => {
            core.set_active_mix(&name)?;
            println!("Active mix: {}", name);
        }
        MixCmd::Delete { name } => {
            core.delete_mix(&name)?;
            println!("Deleted mix '{}'", name);
        }
        MixCmd::Rename { name, new_name } => {
            core.rename_mix(&name, new_name.clone())?;
            println!("Renamed '{}' to '{}'", name, new_name);
        }
        MixCmd::Add { mix, files } => {
            let mut added = 0;
            for file in &files {
                match core.add_track_from_path(&mix, &file.to_string_lossy()) {
                    Ok(_) => added += 1,
                    Err(e) => eprintln!("Failed to add '{}': {}", file.display(), e),
                }
            }
            println!(
                "Added {} track(s); flow {:.1}/5.0",
                added,
                core.get_flow_score(&mix)?
            );
        }
        MixCmd::Remove { name, tracks } => {
            let mut sorted = tracks;
            sorted.sort_unstable();
            sorted.dedup();
            for &num in sorted.iter().rev() {
                if num == 0 {
                    return Err("Track numbers are 1-based".to_string());
                }
                core.remove_track(&name, num - 1)?;
            }
            println!("Removed {} track(s)", sorted.len());
        }
        MixCmd::Move { name, from, to } => {
            if from == 0 || to == 0 {
                return Err("Track numbers are 1-based".to_string());
            }
            core.move_track(&name, from - 1, to - 1)?;
            println!("Moved track {} to position {}", from, to);
        }
    }
    Ok(())
}

/// Blocking playback loop: drives the scheduler at ~60 ticks per second
/// until the mix finishes. Tracks without previews are announced and
/// skipped, since a CLI has no idle "current track" screen to park on.
fn play_mix(
    core: &AppCore,
    mix_name: &str,
    start_track: Option<usize>,
    volume: Option<f32>,
) -> Result<(), String> {
    let mix = core
        .library
        .find_mix(mix_name)
        .ok_or_else(|| format!("Mix '{}' not found", mix_name))?;
    if mix.tracks.is_empty() {
        return Err(format!("Mix '{}' has no tracks", mix_name));
    }

    let start = match start_track {
        Some(0) => return Err("Track numbers are 1-based".to_string()),
        Some(n) if n > mix.tracks.len() => {
            return Err(format!(
                "Track {} out of range ({} tracks)",
                n,
                mix.tracks.len()
            ));
        }
        Some(n) => n - 1,
        None => 0,
    };

    let output = AudioOutput::new()?;
    let deck = output.create_deck()?;
    let mut scheduler = CrossfadeScheduler::new(deck, mix.tracks.clone());
    if let Some(v) = volume {
        scheduler.set_volume(v);
    }
    scheduler.load_and_play(start);

    let total = mix.tracks.len();
    let mut announced = usize::MAX;
    loop {
        scheduler.tick();
        let snap = scheduler.snapshot();

        if snap.current_index != announced {
            announced = snap.current_index;
            let t = &mix.tracks[announced];
            println!(
                "Now playing [{}/{}]: {} — {} [{} | {:.0} BPM]",
                announced + 1,
                total,
                t.artist,
                t.title,
                t.camelot,
                t.bpm
            );
            if !snap.has_preview || !snap.is_playing {
                println!("  No preview available — skipping");
                if announced + 1 < total {
                    scheduler.load_and_play(announced + 1);
                    continue;
                }
                break;
            }
        }

        if !snap.is_playing {
            break;
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    scheduler.stop();
    println!("Mix finished.");
    Ok(())
}
