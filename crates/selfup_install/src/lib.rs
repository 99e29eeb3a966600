//! Replaces an installed application with a staged copy and relaunches it.
//!
//! The update happens across three processes. The running application calls
//! [launcher::run_update], which starts the applier detached and lets the application
//! exit. The applier ([applier::run_applier]) swaps the staged files into place and
//! starts the new version.

pub mod applier;
pub mod consts;
pub mod invocation;
pub mod launcher;
pub mod profile;

use std::path::PathBuf;

pub use applier::{
    apply_update,
    run_applier,
};
pub use invocation::{
    LogForwarding,
    UpdatePaths,
};
pub use launcher::{
    launch,
    run_update,
};
pub use profile::{
    JvmProfile,
    LaunchProfile,
    NativeProfile,
    ProfileKind,
    ReplaceStrategy,
};
use selfup_os_shim::{
    Invocation,
    ProcessProvider,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to delete {}: {source}", path.display())]
    Delete { path: PathBuf, source: std::io::Error },
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to start {program}: {source}")]
    Spawn { program: String, source: std::io::Error },
    #[error("no runtime configured and `{0}` is not set")]
    MissingRuntime(&'static str),
}

/// Starts `invocation` detached through the [ProcessProvider]'s process shim.
fn spawn_detached(process: &impl ProcessProvider, invocation: &Invocation) -> Result<(), Error> {
    process
        .process()
        .spawn_detached(invocation)
        .map_err(|source| Error::Spawn {
            program: invocation.program().to_string_lossy().into_owned(),
            source,
        })
}
