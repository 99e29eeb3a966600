//! How the updater and the application are started.

use std::path::{
    Path,
    PathBuf,
};

use selfup_os_shim::EnvProvider;
use strum::{
    Display,
    EnumString,
};

use crate::Error;
use crate::consts::{
    DEFAULT_ARCHIVE_NAME,
    DEFAULT_ENTRY_POINT,
    DEFAULT_NATIVE_APPLICATION,
    DEFAULT_NATIVE_UPDATER,
    JAVA_HOME,
};

/// Which kind of [LaunchProfile] is in use, as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ProfileKind {
    Jvm,
    Native,
}

/// How the installed directory gets replaced by the staged one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ReplaceStrategy {
    /// Delete the installation, then copy the staged files in its place. The installation
    /// is absent between the two steps.
    #[default]
    DeleteThenCopy,
    /// Copy into a sibling directory first, then swap it in with renames.
    StagedSwap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JvmProfile {
    /// Installation directory of the runtime. Falls back to `JAVA_HOME` when unset.
    pub java_home: Option<PathBuf>,
    /// Fully qualified name of the class that applies the update.
    pub entry_point: String,
    /// File name of the application archive inside `lib`.
    pub archive_name: String,
}

impl Default for JvmProfile {
    fn default() -> Self {
        Self {
            java_home: None,
            entry_point: DEFAULT_ENTRY_POINT.to_owned(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_owned(),
        }
    }
}

impl JvmProfile {
    /// Resolves the `java` executable, preferring the configured home over `JAVA_HOME`.
    pub fn java_executable(&self, env: &impl EnvProvider) -> Result<PathBuf, Error> {
        let java_home = match &self.java_home {
            Some(java_home) => java_home.clone(),
            None => env
                .env()
                .get(JAVA_HOME)
                .ok()
                .filter(|home| !home.trim().is_empty())
                .map(PathBuf::from)
                .ok_or(Error::MissingRuntime(JAVA_HOME))?,
        };
        Ok(java_home.join("bin").join("java"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeProfile {
    /// The updater binary, relative to an installation root.
    pub updater: PathBuf,
    /// The application binary, relative to an installation root.
    pub application: PathBuf,
}

impl Default for NativeProfile {
    fn default() -> Self {
        Self {
            updater: PathBuf::from(DEFAULT_NATIVE_UPDATER),
            application: PathBuf::from(DEFAULT_NATIVE_APPLICATION),
        }
    }
}

impl NativeProfile {
    pub fn updater_in(&self, root: &Path) -> PathBuf {
        root.join(&self.updater)
    }

    pub fn application_in(&self, root: &Path) -> PathBuf {
        root.join(&self.application)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchProfile {
    Jvm(JvmProfile),
    Native(NativeProfile),
}

impl LaunchProfile {
    pub fn kind(&self) -> ProfileKind {
        match self {
            LaunchProfile::Jvm(_) => ProfileKind::Jvm,
            LaunchProfile::Native(_) => ProfileKind::Native,
        }
    }
}

impl Default for LaunchProfile {
    fn default() -> Self {
        LaunchProfile::Jvm(JvmProfile::default())
    }
}
