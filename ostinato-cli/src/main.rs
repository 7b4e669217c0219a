//! ostinato-render: drive the arpeggiator offline and print every event.
//!
//! ```text
//! ostinato-render [--config PATH] [--blocks N] [--notes 60,64,67]
//!                 [--spice X] [--humanize X] [--verbose]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use ostinato_audio::ArpEngine;
use ostinato_core::{Config, EngineHandle};
use ostinato_types::{EngineEvent, GenerativeAmounts};

struct Args {
    config: Option<PathBuf>,
    blocks: usize,
    notes: Vec<u8>,
    spice: Option<f32>,
    humanize: Option<f32>,
    verbose: bool,
}

const USAGE: &str = "usage: ostinato-render [--config PATH] [--blocks N] [--notes 60,64,67] \
                     [--spice X] [--humanize X] [--verbose]";

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    // Events go to stdout, so logs stay on stderr
    if let Err(e) = TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("logger unavailable: {}", e);
    }

    log::info!("ostinato-render starting (log level: {:?})", log_level);
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args {
        config: None,
        blocks: 64,
        notes: vec![60, 64, 67],
        spice: None,
        humanize: None,
        verbose: false,
    };

    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verbose" | "-v" => args.verbose = true,
            "--config" => args.config = Some(PathBuf::from(value(&mut iter, arg)?)),
            "--blocks" => {
                let v = value(&mut iter, arg)?;
                args.blocks = v.parse().map_err(|_| format!("bad block count: {}", v))?;
            }
            "--notes" => args.notes = parse_notes(value(&mut iter, arg)?)?,
            "--spice" => args.spice = Some(parse_amount(value(&mut iter, arg)?)?),
            "--humanize" => args.humanize = Some(parse_amount(value(&mut iter, arg)?)?),
            "--help" | "-h" => return Err(USAGE.to_string()),
            other => return Err(format!("unknown argument: {}\n{}", other, USAGE)),
        }
    }
    Ok(args)
}

fn value<'a>(iter: &mut std::slice::Iter<'a, String>, flag: &str) -> Result<&'a str, String> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| format!("{} needs a value", flag))
}

fn parse_notes(list: &str) -> Result<Vec<u8>, String> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| match s.trim().parse::<u8>() {
            Ok(p) if p <= 127 => Ok(p),
            _ => Err(format!("bad MIDI note: {}", s)),
        })
        .collect()
}

fn parse_amount(s: &str) -> Result<f32, String> {
    match s.parse::<f32>() {
        Ok(v) if (0.0..=1.0).contains(&v) => Ok(v),
        _ => Err(format!("amount must be 0..1, got {}", s)),
    }
}

fn describe(block: usize, event: &EngineEvent) -> String {
    match event {
        EngineEvent::NoteOn(on) => format!(
            "{:>6} {:>5} on  {:>3} vel {:>3} gate {:>6}{}",
            block,
            on.sample_offset,
            on.pitch,
            on.velocity,
            on.gate_samples,
            if on.is_tie { " tie" } else { "" }
        ),
        EngineEvent::NoteOff(off) => {
            format!("{:>6} {:>5} off {:>3}", block, off.sample_offset, off.pitch)
        }
    }
}

fn banner(engine: &ArpEngine) -> String {
    let params = engine.params();
    format!(
        "# {} {} at {} bpm, {} octave(s)",
        params.note_order.name(),
        params.rate.name(),
        engine.bpm(),
        params.octave_range
    )
}

fn run(args: Args) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => Config::load_from(path).map_err(|e| format!("{}: {}", path.display(), e))?,
        None => Config::load(),
    };

    let (handle, mut runner) = EngineHandle::build(&config);
    let defaults = config.amounts();
    handle.set_amounts(GenerativeAmounts::new(
        args.spice.unwrap_or(defaults.spice),
        args.humanize.unwrap_or(defaults.humanize),
    ));
    for &pitch in &args.notes {
        handle.control().note_on(pitch, 100)?;
    }

    let block_size = runner.engine().max_block_size();
    log::debug!(target: "audio", "rendering {} blocks of {}", args.blocks, block_size);

    println!("{}", banner(runner.engine()));
    println!(" block offset event");
    for block in 0..args.blocks {
        for event in runner.process(block_size) {
            println!("{}", describe(block, event));
        }
    }

    let engine = runner.engine();
    log::info!(
        target: "audio",
        "{} steps evaluated, loop {}, {} samples rendered",
        engine.steps_evaluated(),
        engine.loop_count(),
        engine.position()
    );
    Ok(())
}

fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::from(2);
        }
    };
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ostinato-render: {}", e);
            ExitCode::FAILURE
        }
    }
}
