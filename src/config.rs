use std::str::FromStr;

use strum::{Display, EnumString};

use crate::thumb::Mnemonic;
use crate::{Error, Result};

/// How a program picks the next encoding to run
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Selection {
    /// Uniformly random entry, drawn from the session's randomizer
    #[default]
    Uniform,
    /// Every entry in registry order, wrapping around
    Sequential,
}

/// Options for one generation run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateConfig {
    /// Seed for the session's randomizer. A fresh one is drawn (and logged) when absent.
    pub seed: Option<u64>,
    /// Number of instructions to emit
    pub count: usize,
    pub selection: Selection,
    /// Restrict generation to these mnemonics. Empty means all.
    pub mnemonics: Vec<Mnemonic>,
    /// Restrict generation to these encoding forms, by registry name. Empty means all.
    pub encodings: Vec<String>,
    /// Only run 32-bit encodings
    pub wide_only: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            seed: None,
            count: 100,
            selection: Selection::Uniform,
            mnemonics: Vec::new(),
            encodings: Vec::new(),
            wide_only: false,
        }
    }
}

impl GenerateConfig {
    /// The configured seed, or a fresh random one
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

/// Parse a comma-separated mnemonic list such as `add,adc,asr`
pub fn parse_mnemonics(list: &str) -> Result<Vec<Mnemonic>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Mnemonic::from_str(s).map_err(|_| Error::UnknownMnemonic(s.to_string())))
        .collect()
}
