/// Name of the `selfup` binary
pub const UPDATER_BINARY_NAME: &str = "selfup";

/// Directory inside an installation that holds the application archives
pub const LIB_DIR: &str = "lib";

/// Entry point the JVM runs to apply an update
pub const DEFAULT_ENTRY_POINT: &str = "org.terasology.launcher.updater.SelfUpdater";

/// Application archive started once an update is applied
pub const DEFAULT_ARCHIVE_NAME: &str = "TerasologyLauncher.jar";

/// Location of the updater binary relative to an installation root
pub const DEFAULT_NATIVE_UPDATER: &str = "bin/selfup";

/// Location of the application binary relative to an installation root
pub const DEFAULT_NATIVE_APPLICATION: &str = "bin/app";

/// Variable read for the JVM installation directory when none is configured
pub const JAVA_HOME: &str = "JAVA_HOME";

/// Suffix of the sibling directory a staged swap copies into
pub const SWAP_NEW_SUFFIX: &str = "selfup-new";

/// Suffix of the sibling directory a staged swap moves the old installation to
pub const SWAP_OLD_SUFFIX: &str = "selfup-old";
