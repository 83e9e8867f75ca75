use std::io;
use std::path::PathBuf;

use socle_container::ContainerError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Errors surfaced by the bootstrap sequence.
///
/// Everything propagates to the caller of the entry point; nothing is
/// retried. The two documented "absent is valid" cases - a missing settings
/// file and an unresolvable domain name - never reach this enum.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A candidate plugin entry could not be turned into a loadable archive.
    ///
    /// Aborts discovery entirely: a partial plugin set is worse than a clear
    /// startup failure.
    #[error("plugin archive '{path}' could not be resolved")]
    PluginLocation {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An archive declared aspects against a different runtime version.
    ///
    /// `found` is copied out of the archive's declaration; the error must
    /// not borrow from the mapping it rejects.
    #[error("archive '{path}' was built against runtime {found}, host runs {expected}")]
    IncompatibleArchive {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },

    /// An aspect's activation entry point failed. Remaining activations are
    /// abandoned; registrations already applied are not rolled back.
    #[error("system aspect #{index} failed while configuring the container")]
    AspectActivation {
        index: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No registered connection driver understands the endpoint.
    #[error("no connection driver accepts endpoint '{endpoint}'")]
    NoDriver { endpoint: String },

    /// The settings file exists but could not be read.
    #[error("settings file '{path}' could not be read")]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The settings file exists but is not a flat string map.
    #[error("settings file '{path}' is malformed")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
