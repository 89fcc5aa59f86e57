use std::io::BufRead;

use tracing::{debug, warn};

use crate::thumb::Instruction;
use crate::{Error, Result};

/// Outcome of checking a corpus: how many lines were instructions and which of them failed
#[derive(Debug, Default)]
pub struct CorpusReport {
    pub checked: usize,
    pub failures: Vec<Error>,
}

impl CorpusReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse every non-blank line of `reader` as an instruction. Malformed lines are collected as
/// `Error::Corpus`; only read failures abort the check.
pub fn check_corpus<B: BufRead>(reader: B) -> Result<CorpusReport> {
    let mut report = CorpusReport::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        report.checked += 1;
        if let Err(e) = line.parse::<Instruction>() {
            let e = Error::Corpus { line: i + 1, source: Box::new(e) };
            warn!("{}", e);
            report.failures.push(e);
        }
    }
    debug!(checked = report.checked, failed = report.failures.len(), "checked corpus");
    Ok(report)
}
