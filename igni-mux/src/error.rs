//! Muxer error vocabulary, modeled on `av1an_core::broker::EncoderCrash`.

use std::fmt;
use std::process::ExitStatus;

use thiserror::Error;

use crate::string_or_bytes::StringOrBytes;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to spawn encoder process: {0}")]
    Spawn(std::io::Error),

    #[error("frame has pix_fmt {found:?}, segment encoder expects {expected:?}")]
    WrongPixFmt {
        expected: igni_decode::PixFmt,
        found: igni_decode::PixFmt,
    },

    #[error("{0}")]
    Crash(EncoderCrash),
}

#[derive(Debug)]
pub struct EncoderCrash {
    pub exit_status: ExitStatus,
    pub stdout: StringOrBytes,
    pub stderr: StringOrBytes,
}

impl std::error::Error for EncoderCrash {}

impl fmt::Display for EncoderCrash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "encoder crashed: {}\nstdout:\n{:?}\nstderr:\n{:?}",
            self.exit_status, self.stdout, self.stderr
        )
    }
}
