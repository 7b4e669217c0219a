use std::path::{Path, PathBuf};

use ostinato_audio::RngSeeds;
use ostinato_types::{ArpParams, ArpRate, EuclideanConfig, GenerativeAmounts, NoteOrder};
use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    euclidean: EuclideanSection,
    #[serde(default)]
    seeds: SeedsConfig,
    #[serde(default)]
    generative: GenerativeConfig,
}

#[derive(Deserialize, Default)]
struct EngineConfig {
    sample_rate: Option<f64>,
    max_block_size: Option<usize>,
    bpm: Option<f64>,
    rate: Option<String>,
    gate_percent: Option<f32>,
    note_order: Option<String>,
    octave_range: Option<u8>,
    accent_velocity: Option<u8>,
}

#[derive(Deserialize, Default)]
struct EuclideanSection {
    enabled: Option<bool>,
    hits: Option<u8>,
    steps: Option<u8>,
    rotation: Option<u8>,
}

#[derive(Deserialize, Default)]
struct SeedsConfig {
    dice: Option<u64>,
    humanize: Option<u64>,
    condition: Option<u64>,
    selector: Option<u64>,
}

#[derive(Deserialize, Default)]
struct GenerativeConfig {
    spice: Option<f32>,
    humanize: Option<f32>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Parse(e) => write!(f, "TOML error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    engine: EngineConfig,
    euclidean: EuclideanSection,
    seeds: SeedsConfig,
    generative: GenerativeConfig,
}

impl Config {
    /// Embedded defaults with the user's config file merged over them.
    /// Never fails: an unreadable or malformed user file is logged and skipped.
    pub fn load() -> Self {
        let mut base = embedded();

        if let Some(path) = user_config_path() {
            if path.exists() {
                match read_file(&path) {
                    Ok(user) => merge(&mut base, user),
                    Err(e) => {
                        log::warn!(target: "config", "ignoring config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Self::from_file(base)
    }

    /// The embedded defaults alone, ignoring any user file.
    pub fn defaults() -> Self {
        Self::from_file(embedded())
    }

    /// Embedded defaults with one specific file merged over them.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut base = embedded();
        merge(&mut base, read_file(path)?);
        Ok(Self::from_file(base))
    }

    fn from_file(file: ConfigFile) -> Self {
        Config {
            engine: file.engine,
            euclidean: file.euclidean,
            seeds: file.seeds,
            generative: file.generative,
        }
    }

    /// Sample rate in Hz (clamped to 8000..384000).
    pub fn sample_rate(&self) -> f64 {
        let sr = self.engine.sample_rate.unwrap_or(48_000.0);
        if sr.is_finite() {
            sr.clamp(8_000.0, 384_000.0)
        } else {
            48_000.0
        }
    }

    /// Largest block the host will ask for (clamped to 1..8192).
    pub fn max_block_size(&self) -> usize {
        self.engine.max_block_size.unwrap_or(512).clamp(1, 8192)
    }

    pub fn bpm(&self) -> f64 {
        let bpm = self.engine.bpm.unwrap_or(120.0);
        if bpm.is_finite() {
            bpm.clamp(20.0, 300.0)
        } else {
            120.0
        }
    }

    pub fn params(&self) -> ArpParams {
        let fallback = ArpParams::default();
        ArpParams {
            note_order: self
                .engine
                .note_order
                .as_deref()
                .and_then(parse_note_order)
                .unwrap_or(fallback.note_order),
            rate: self
                .engine
                .rate
                .as_deref()
                .and_then(parse_rate)
                .unwrap_or(fallback.rate),
            octave_range: self.engine.octave_range.unwrap_or(fallback.octave_range),
            gate_percent: self.engine.gate_percent.unwrap_or(fallback.gate_percent),
            accent_velocity: self.engine.accent_velocity.unwrap_or(fallback.accent_velocity),
        }
        .sanitized(&fallback)
    }

    pub fn euclidean(&self) -> EuclideanConfig {
        let fallback = EuclideanConfig::default();
        EuclideanConfig {
            enabled: self.euclidean.enabled.unwrap_or(fallback.enabled),
            hits: self.euclidean.hits.unwrap_or(fallback.hits),
            steps: self.euclidean.steps.unwrap_or(fallback.steps),
            rotation: self.euclidean.rotation.unwrap_or(fallback.rotation),
        }
        .clamped()
    }

    pub fn seeds(&self) -> RngSeeds {
        let fallback = RngSeeds::default();
        RngSeeds {
            dice: self.seeds.dice.unwrap_or(fallback.dice),
            humanize: self.seeds.humanize.unwrap_or(fallback.humanize),
            condition: self.seeds.condition.unwrap_or(fallback.condition),
            selector: self.seeds.selector.unwrap_or(fallback.selector),
        }
    }

    /// Starting spice/humanize amounts (clamped to 0..1).
    pub fn amounts(&self) -> GenerativeAmounts {
        GenerativeAmounts::new(
            self.generative.spice.unwrap_or(0.0),
            self.generative.humanize.unwrap_or(0.0),
        )
    }
}

fn embedded() -> ConfigFile {
    match toml::from_str(DEFAULT_CONFIG) {
        Ok(file) => file,
        Err(e) => {
            log::error!(target: "config", "embedded config.toml is invalid: {}", e);
            ConfigFile::default()
        }
    }
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ostinato").join("config.toml"))
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    merge_engine(&mut base.engine, user.engine);
    merge_euclidean(&mut base.euclidean, user.euclidean);
    merge_seeds(&mut base.seeds, user.seeds);
    merge_generative(&mut base.generative, user.generative);
}

fn merge_engine(base: &mut EngineConfig, user: EngineConfig) {
    if user.sample_rate.is_some() {
        base.sample_rate = user.sample_rate;
    }
    if user.max_block_size.is_some() {
        base.max_block_size = user.max_block_size;
    }
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.rate.is_some() {
        base.rate = user.rate;
    }
    if user.gate_percent.is_some() {
        base.gate_percent = user.gate_percent;
    }
    if user.note_order.is_some() {
        base.note_order = user.note_order;
    }
    if user.octave_range.is_some() {
        base.octave_range = user.octave_range;
    }
    if user.accent_velocity.is_some() {
        base.accent_velocity = user.accent_velocity;
    }
}

fn merge_euclidean(base: &mut EuclideanSection, user: EuclideanSection) {
    if user.enabled.is_some() {
        base.enabled = user.enabled;
    }
    if user.hits.is_some() {
        base.hits = user.hits;
    }
    if user.steps.is_some() {
        base.steps = user.steps;
    }
    if user.rotation.is_some() {
        base.rotation = user.rotation;
    }
}

fn merge_seeds(base: &mut SeedsConfig, user: SeedsConfig) {
    if user.dice.is_some() {
        base.dice = user.dice;
    }
    if user.humanize.is_some() {
        base.humanize = user.humanize;
    }
    if user.condition.is_some() {
        base.condition = user.condition;
    }
    if user.selector.is_some() {
        base.selector = user.selector;
    }
}

fn merge_generative(base: &mut GenerativeConfig, user: GenerativeConfig) {
    if user.spice.is_some() {
        base.spice = user.spice;
    }
    if user.humanize.is_some() {
        base.humanize = user.humanize;
    }
}

fn parse_rate(s: &str) -> Option<ArpRate> {
    match s {
        "1/4" | "quarter" => Some(ArpRate::Quarter),
        "1/8" | "eighth" => Some(ArpRate::Eighth),
        "1/16" | "sixteenth" => Some(ArpRate::Sixteenth),
        "1/32" | "thirty_second" => Some(ArpRate::ThirtySecond),
        _ => None,
    }
}

fn parse_note_order(s: &str) -> Option<NoteOrder> {
    match s.to_lowercase().as_str() {
        "up" => Some(NoteOrder::Up),
        "down" => Some(NoteOrder::Down),
        "up_down" | "updown" => Some(NoteOrder::UpDown),
        "down_up" | "downup" => Some(NoteOrder::DownUp),
        "as_played" | "played" => Some(NoteOrder::AsPlayed),
        "random" => Some(NoteOrder::Random),
        "walk" => Some(NoteOrder::Walk),
        "chord" => Some(NoteOrder::Chord),
        _ => None,
    }
}
