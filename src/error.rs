use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),

    #[error("no register with index {0}")]
    InvalidRegister(u32),

    #[error("no encoding named `{0}`")]
    UnknownEncoding(String),

    #[error("selection matches no encodings")]
    EmptySelection,

    #[error("cannot parse `{input}`:\n{reason}")]
    Parse { input: String, reason: String },

    #[error("line {line}: {source}")]
    Corpus {
        line: usize,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}
