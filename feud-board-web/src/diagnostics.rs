use log::Level;

use crate::render::RenderError;

/// A non-fatal event of the mirror.
#[derive(Debug, thiserror::Error)]
pub enum Diagnostic {
    #[error("socket connected")]
    Connected,
    #[error("socket disconnected")]
    Disconnected,
    #[error("render error in {renderer}: {error}")]
    RenderFailed { renderer: String, error: RenderError },
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(serde_json::Error),
    #[error("failed to fetch initial state: {0}")]
    FetchFailed(feud_board_api::Error),
    #[error("failed to open channel: {0}")]
    ChannelFailed(feud_board_api::Error),
}

impl Diagnostic {
    /// Returns the level used by [`LogDiagnostics`]. A failed initial fetch is only a debug
    /// message, it never interrupts the page.
    pub fn level(&self) -> Level {
        match self {
            Self::Connected | Self::Disconnected => Level::Info,
            Self::RenderFailed { .. } | Self::InvalidSnapshot(_) => Level::Error,
            Self::FetchFailed(_) => Level::Debug,
            Self::ChannelFailed(_) => Level::Warn,
        }
    }
}

/// A sink receiving every [`Diagnostic`] of a mirror.
pub trait Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Writes diagnostics to the [`log`] facade at [`Diagnostic::level`].
#[derive(Copy, Clone, Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::log!(diagnostic.level(), "{}", diagnostic);
    }
}

impl<F> Diagnostics for F
where
    F: FnMut(Diagnostic),
{
    #[inline]
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}
