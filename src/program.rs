use tracing::{debug, info};

use crate::config::{GenerateConfig, Selection};
use crate::thumb::{Instruction, RandASM, RandomSource, Registry};
use crate::{Error, Result};

/// Emits a stream of instructions from one registry and one randomizer. Entry selection draws
/// from the same randomizer as the entries themselves, so the seed alone fixes the output.
#[derive(Debug)]
pub struct ProgramGenerator<R> {
    registry: Registry<R>,
    rand: RandASM<R>,
    selection: Selection,
    next_index: usize,
}

impl<R: RandomSource> ProgramGenerator<R> {
    pub fn new(registry: Registry<R>, rand: RandASM<R>, selection: Selection) -> Self {
        debug!(encodings = registry.len(), ?selection, "starting generation session");
        Self { registry, rand, selection, next_index: 0 }
    }

    /// Registry narrowed to the configured mnemonics, encoding names and width
    pub fn from_config(config: &GenerateConfig, rand: RandASM<R>) -> Result<Self> {
        let registry = Registry::<R>::thumb();
        let names = config
            .encodings
            .iter()
            .map(|name| {
                registry
                    .find(name)
                    .map(|e| e.name())
                    .ok_or_else(|| Error::UnknownEncoding(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        let registry = registry.retain(|e| {
            (config.mnemonics.is_empty() || config.mnemonics.contains(&e.mnemonic()))
                && (names.is_empty() || names.contains(&e.name()))
                && (!config.wide_only || e.is_wide())
        })?;
        Ok(Self::new(registry, rand, config.selection))
    }

    pub fn registry(&self) -> &Registry<R> {
        &self.registry
    }

    fn select(&mut self) -> usize {
        match self.selection {
            Selection::Uniform => self.rand.below(self.registry.len() as u64) as usize,
            Selection::Sequential => {
                let index = self.next_index;
                self.next_index = (self.next_index + 1) % self.registry.len();
                index
            }
        }
    }

    pub fn next_instruction(&mut self) -> Instruction {
        let index = self.select();
        self.registry.generate(index, &mut self.rand)
    }

    pub fn generate(&mut self, count: usize) -> Vec<Instruction> {
        let program: Vec<_> = (0..count).map(|_| self.next_instruction()).collect();
        info!(count = program.len(), "generated program");
        program
    }
}

impl<R: RandomSource> Iterator for ProgramGenerator<R> {
    type Item = Instruction;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_instruction())
    }
}
