use std::io;
use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use selfup_os_shim::{
    Context,
    EnvProvider,
    FsProvider,
    Invocation,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};

use crate::consts::{
    SWAP_NEW_SUFFIX,
    SWAP_OLD_SUFFIX,
};
use crate::invocation::{
    UpdatePaths,
    jvm_relaunch_invocation,
    native_relaunch_invocation,
};
use crate::profile::{
    LaunchProfile,
    ReplaceStrategy,
};
use crate::{
    Error,
    spawn_detached,
};

/// Entry point of the detached applier process.
///
/// Returns exit code `0` once the new version has been started and `1` if anything
/// failed along the way. Failures are logged, never retried and never rolled back.
pub fn run_applier(
    ctx: &Context,
    profile: &LaunchProfile,
    strategy: ReplaceStrategy,
    paths: &UpdatePaths,
) -> ExitCode {
    match apply_update(ctx, profile, strategy, paths) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err @ Error::Spawn { .. }) => {
            error!(%err, "Failed to restart the application after update.");
            ExitCode::from(1)
        },
        Err(err) => {
            error!(%err, "Updating the installation failed!");
            ExitCode::from(1)
        },
    }
}

/// Replaces `paths.installed` with the contents of `paths.staged` and starts the new
/// version, returning the invocation that was spawned.
///
/// Both directories are validated before anything is touched. The relaunch command is
/// resolved up front as well, so a missing runtime leaves the installation alone.
pub fn apply_update(
    ctx: &Context,
    profile: &LaunchProfile,
    strategy: ReplaceStrategy,
    paths: &UpdatePaths,
) -> Result<Invocation, Error> {
    info!("Running self updater.");
    debug!(profile = %profile.kind(), %strategy, "Applying update");

    check_directory(ctx, &paths.installed)?;
    check_directory(ctx, &paths.staged)?;

    let invocation = relaunch_invocation(ctx, profile, &paths.installed)?;

    match strategy {
        ReplaceStrategy::DeleteThenCopy => delete_then_copy(ctx, paths)?,
        ReplaceStrategy::StagedSwap => staged_swap(ctx, paths)?,
    }

    info!("Start new application: {invocation}");
    spawn_detached(ctx, &invocation)?;

    Ok(invocation)
}

fn relaunch_invocation(env: &impl EnvProvider, profile: &LaunchProfile, installed: &Path) -> Result<Invocation, Error> {
    Ok(match profile {
        LaunchProfile::Jvm(jvm) => jvm_relaunch_invocation(&jvm.java_executable(env)?, jvm, installed),
        LaunchProfile::Native(native) => native_relaunch_invocation(native, installed),
    })
}

/// Fails unless `path` exists and is a directory, following symlinks.
pub fn check_directory(fs: &impl FsProvider, path: &Path) -> Result<(), Error> {
    match fs.fs().metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(path.to_owned())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Error::NotFound(path.to_owned())),
        Err(err) => Err(err.into()),
    }
}

fn delete_then_copy(fs: &impl FsProvider, UpdatePaths { installed, staged }: &UpdatePaths) -> Result<(), Error> {
    let fs = fs.fs();

    info!("Delete installation directory: {}", installed.display());
    fs.remove_dir_all(installed).map_err(|source| Error::Delete {
        path: installed.clone(),
        source,
    })?;

    info!("Copy new files: {}", staged.display());
    let copied = fs.copy_dir_all(staged, installed).map_err(|source| Error::Copy {
        from: staged.clone(),
        to: installed.clone(),
        source,
    })?;
    debug!(copied, "Copied new files");

    Ok(())
}

/// Copies into a sibling of the installation, then swaps the two with renames.
fn staged_swap(fs: &impl FsProvider, UpdatePaths { installed, staged }: &UpdatePaths) -> Result<(), Error> {
    let fs = fs.fs();
    let new_dir = swap_sibling(installed, SWAP_NEW_SUFFIX)?;
    let old_dir = swap_sibling(installed, SWAP_OLD_SUFFIX)?;

    // Leftovers of an interrupted run.
    for leftover in [&new_dir, &old_dir] {
        if fs.exists(leftover) {
            debug!(?leftover, "Removing leftover swap directory");
            fs.remove_dir_all(leftover).map_err(|source| Error::Delete {
                path: leftover.clone(),
                source,
            })?;
        }
    }

    info!("Copy new files: {} -> {}", staged.display(), new_dir.display());
    if let Err(source) = fs.copy_dir_all(staged, &new_dir) {
        fs.remove_dir_all(&new_dir)
            .map_err(|err| warn!(?err, ?new_dir, "Unable to remove partial copy"))
            .ok();
        return Err(Error::Copy {
            from: staged.clone(),
            to: new_dir,
            source,
        });
    }

    info!("Swap {} into {}", new_dir.display(), installed.display());
    fs.rename(installed, &old_dir)?;
    if let Err(err) = fs.rename(&new_dir, installed) {
        fs.rename(&old_dir, installed)
            .map_err(|err| error!(?err, ?old_dir, "Unable to move the old installation back"))
            .ok();
        return Err(err.into());
    }

    fs.remove_dir_all(&old_dir)
        .map_err(|err| warn!(?err, ?old_dir, "Unable to remove the old installation"))
        .ok();

    Ok(())
}

/// `<parent>/.<name>.<suffix>` for the installation directory `installed`.
fn swap_sibling(installed: &Path, suffix: &str) -> Result<PathBuf, Error> {
    let Some(name) = installed.file_name() else {
        return Err(Error::NotADirectory(installed.to_owned()));
    };
    let mut sibling = std::ffi::OsString::from(".");
    sibling.push(name);
    sibling.push(".");
    sibling.push(suffix);
    Ok(installed.with_file_name(sibling))
}
