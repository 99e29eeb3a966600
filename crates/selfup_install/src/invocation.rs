//! Pure builders for the command lines `selfup` spawns.
//!
//! Nothing in here touches the filesystem or starts a process, so every platform's
//! quoting can be checked from any host.

use std::ffi::OsString;
use std::path::{
    Path,
    PathBuf,
};

use selfup_os_shim::{
    Invocation,
    Os,
};

use crate::consts::LIB_DIR;
use crate::profile::{
    JvmProfile,
    NativeProfile,
    ProfileKind,
};

/// The installed and staged directories handed from the launcher to the applier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePaths {
    /// Where the running application is installed.
    pub installed: PathBuf,
    /// Where the downloaded files of the new version are waiting.
    pub staged: PathBuf,
}

impl UpdatePaths {
    pub fn new(installed: impl Into<PathBuf>, staged: impl Into<PathBuf>) -> Self {
        Self {
            installed: installed.into(),
            staged: staged.into(),
        }
    }

    /// The `lib` directory of the staged tree.
    pub fn staged_lib(&self) -> PathBuf {
        self.staged.join(LIB_DIR)
    }
}

/// Logging options the launcher hands down to a native applier.
///
/// The applier runs detached with its standard streams closed, so without a log file
/// nothing it reports survives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogForwarding {
    /// File the applier appends its logs to.
    pub log_file: Option<PathBuf>,
    /// Number of `-v` flags passed on.
    pub verbose: u8,
}

/// Builds the classpath argument for the staged `lib` directory.
///
/// Windows gets a single wildcard entry which the JVM expands itself. Everywhere else
/// each entry is listed explicitly and joined with the platform separator, which means
/// an empty `lib_entries` yields an empty string.
pub fn classpath(os: Os, staged_lib: &Path, lib_entries: &[PathBuf]) -> OsString {
    if os.is_windows() {
        return staged_lib.join("*").into_os_string();
    }

    let mut classpath = OsString::new();
    for (i, entry) in lib_entries.iter().enumerate() {
        if i > 0 {
            classpath.push(os.path_list_separator());
        }
        classpath.push(entry);
    }
    classpath
}

/// `[java, "-cp", <classpath>, <entry point>, <installed>, <staged>]`
pub fn jvm_applier_invocation(
    os: Os,
    java: &Path,
    profile: &JvmProfile,
    paths: &UpdatePaths,
    lib_entries: &[PathBuf],
) -> Invocation {
    Invocation::new(java)
        .arg("-cp")
        .arg(classpath(os, &paths.staged_lib(), lib_entries))
        .arg(&profile.entry_point)
        .arg(&paths.installed)
        .arg(&paths.staged)
}

/// Runs the staged copy of the updater with the `apply` subcommand, passing the
/// launcher's logging options along as global flags.
pub fn native_applier_invocation(profile: &NativeProfile, paths: &UpdatePaths, logging: &LogForwarding) -> Invocation {
    let mut invocation = Invocation::new(profile.updater_in(&paths.staged));
    for _ in 0..logging.verbose {
        invocation = invocation.arg("-v");
    }
    if let Some(log_file) = &logging.log_file {
        invocation = invocation.arg("--log-file").arg(log_file);
    }

    invocation
        .arg("apply")
        .arg("--profile")
        .arg(ProfileKind::Native.to_string())
        .arg("--updater")
        .arg(&profile.updater)
        .arg("--application")
        .arg(&profile.application)
        .arg(&paths.installed)
        .arg(&paths.staged)
}

/// `[java, "-jar", <installed>/lib/<archive>]`
pub fn jvm_relaunch_invocation(java: &Path, profile: &JvmProfile, installed: &Path) -> Invocation {
    Invocation::new(java)
        .arg("-jar")
        .arg(installed.join(LIB_DIR).join(&profile.archive_name))
}

pub fn native_relaunch_invocation(profile: &NativeProfile, installed: &Path) -> Invocation {
    Invocation::new(profile.application_in(installed))
}
