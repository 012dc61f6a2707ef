use keyfall::{load_config, parse_script, read_file, resolve_chart, CliError, Replay};
use keyfall_engine::beat::DEFAULT_BPM;
use keyfall_engine::{BeatConfig, BeatsPerMeasure, ChartDocument, Metronome};
use std::env;
use std::process;
use std::time::Duration;

const USAGE: &str = "Usage: keyfall play <chart> <input-script> [--config <file>] [--tick <ms>]
       keyfall charts
       keyfall metronome [bpm] [beats-per-measure] [count]";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("{}", USAGE);
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "play" => play(&args[2..]),
        "charts" => list_charts(),
        "metronome" => metronome(&args[2..]),
        "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => {
            eprintln!("Unknown command '{}'", other);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn play(args: &[String]) -> Result<(), CliError> {
    let mut positional: Vec<&String> = Vec::new();
    let mut config_path: Option<&str> = None;
    let mut tick: Option<f64> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliError::Usage("--config needs a file".to_string()))?;
                config_path = Some(value.as_str());
            }
            "--tick" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliError::Usage("--tick needs a value".to_string()))?;
                let ms: f64 = value
                    .parse()
                    .map_err(|_| CliError::Usage(format!("'{}' is not a tick length", value)))?;
                tick = Some(ms);
            }
            _ => positional.push(arg),
        }
    }

    let [chart_arg, script_path] = positional.as_slice() else {
        return Err(CliError::Usage(format!(
            "play takes a chart and an input script\n{}",
            USAGE
        )));
    };

    let config = load_config(config_path)?;
    let (name, source) = resolve_chart(chart_arg)?;
    let events = parse_script(&read_file(script_path)?)?;

    let mut replay = Replay::new(config);
    if let Some(ms) = tick {
        replay = replay.with_tick(ms)?;
    }
    let outcome = replay.run(&name, &source, &events)?;

    eprintln!(
        "{}: score {}, accuracy {} ({} perfect, {} good, {} miss, max combo {})",
        outcome.title,
        outcome.result.display_score(),
        outcome.result.display_accuracy(),
        outcome.result.perfect,
        outcome.result.good,
        outcome.result.miss,
        outcome.result.max_combo
    );
    println!("{}", to_json(&outcome)?);
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn list_charts() -> Result<(), CliError> {
    for chart in keyfall_charts::get_all_charts() {
        let document = ChartDocument::parse(&chart.content)?;
        let metadata = &document.metadata;
        println!(
            "{:<16} {:<30} {:<12} {:>4} bpm  {} notes",
            chart.name,
            document.title_or(&chart.name),
            metadata.difficulty.as_deref().unwrap_or("-"),
            metadata.bpm.unwrap_or(DEFAULT_BPM),
            document.notes.len()
        );
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(
    args: &[String],
    index: usize,
    what: &str,
) -> Result<Option<T>, CliError> {
    match args.get(index) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| CliError::Usage(format!("'{}' is not a valid {}", value, what))),
        None => Ok(None),
    }
}

fn metronome(args: &[String]) -> Result<(), CliError> {
    let bpm: u16 = parse_arg(args, 0, "bpm")?.unwrap_or(DEFAULT_BPM);
    let beats: u8 = parse_arg(args, 1, "beats per measure")?.unwrap_or(4);
    let count: u64 = parse_arg(args, 2, "beat count")?.unwrap_or(8);

    let config = BeatConfig::new(bpm, BeatsPerMeasure::new(beats)?)?;
    let mut metronome = Metronome::new(config);
    metronome.start();

    // generous margin over the slowest supported interval
    let timeout = Duration::from_secs(3);
    for _ in 0..count {
        let Some(beat) = metronome.recv_timeout(timeout) else {
            break;
        };
        println!(
            "{:>4}  {}/{}  {:>9.1} ms{}",
            beat.sequence,
            beat.beat,
            beats,
            beat.target_ms,
            if beat.accent { "  *" } else { "" }
        );
    }

    metronome.stop();
    Ok(())
}
