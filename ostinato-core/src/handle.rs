use std::io::{Read, Write};

use ostinato_audio::control::DEFAULT_CONTROL_CAPACITY;
use ostinato_audio::{control_pair, ArpEngine, ControlHandle, ControlReader};
use ostinato_types::{EngineEvent, GenerativeAmounts};

use crate::config::Config;
use crate::persist::{read_amounts, write_amounts, PersistError};

/// Main-thread side of a running engine.
pub struct EngineHandle {
    control: ControlHandle,
}

/// Audio-thread side: the engine plus the reader it polls each block.
pub struct EngineRunner {
    engine: ArpEngine,
    reader: ControlReader,
}

impl EngineHandle {
    /// Build an engine from `config`. The runner is meant to move to the audio thread.
    pub fn build(config: &Config) -> (EngineHandle, EngineRunner) {
        let mut engine = ArpEngine::new(config.seeds(), config.params());
        engine.prepare(config.sample_rate(), config.max_block_size());
        engine.set_tempo(config.bpm());
        engine.set_euclidean(config.euclidean());

        let (control, reader) = control_pair(DEFAULT_CONTROL_CAPACITY, config.bpm() as f32);
        let amounts = config.amounts();
        control.set_spice(amounts.spice);
        control.set_humanize(amounts.humanize);

        log::debug!(
            target: "audio",
            "engine built: {:?} at {} bpm, spice {:.2}, humanize {:.2}",
            engine.params().rate,
            engine.bpm(),
            amounts.spice,
            amounts.humanize
        );
        (EngineHandle { control }, EngineRunner { engine, reader })
    }

    pub fn control(&self) -> &ControlHandle {
        &self.control
    }

    pub fn amounts(&self) -> GenerativeAmounts {
        GenerativeAmounts {
            spice: self.control.spice(),
            humanize: self.control.humanize(),
        }
    }

    pub fn set_amounts(&self, amounts: GenerativeAmounts) {
        self.control.set_spice(amounts.spice);
        self.control.set_humanize(amounts.humanize);
    }

    /// Append the persisted amounts to a session stream.
    pub fn save_amounts<W: Write>(&self, out: &mut W) -> Result<(), PersistError> {
        write_amounts(out, &self.amounts())
    }

    /// Read the persisted amounts and apply them. On error nothing changes.
    pub fn load_amounts<R: Read>(&self, input: &mut R) -> Result<GenerativeAmounts, PersistError> {
        let amounts = read_amounts(input).map_err(|e| {
            log::warn!(target: "persist", "could not load generative amounts: {}", e);
            e
        })?;
        self.set_amounts(amounts);
        Ok(amounts)
    }
}

impl EngineRunner {
    /// One audio callback: pick up control changes, then render.
    pub fn process(&mut self, block_size: usize) -> &[EngineEvent] {
        self.engine.apply_controls(&self.reader);
        self.engine.process_block(block_size)
    }

    pub fn engine(&self) -> &ArpEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ArpEngine {
        &mut self.engine
    }
}
