//! CLI functionality

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{
    ArgAction,
    Args,
    Parser,
    Subcommand,
};
use selfup_install::consts::{
    DEFAULT_ARCHIVE_NAME,
    DEFAULT_ENTRY_POINT,
    DEFAULT_NATIVE_APPLICATION,
    DEFAULT_NATIVE_UPDATER,
    UPDATER_BINARY_NAME,
};
use selfup_install::{
    JvmProfile,
    LaunchProfile,
    LogForwarding,
    NativeProfile,
    ProfileKind,
    ReplaceStrategy,
    UpdatePaths,
    run_applier,
    run_update,
};
use selfup_os_shim::Context;
use tracing::debug;

/// Applies a downloaded update to an installed application and relaunches it
#[derive(Debug, PartialEq, Parser)]
#[command(name = UPDATER_BINARY_NAME, version)]
pub struct Cli {
    #[command(subcommand)]
    pub subcommand: CliRootCommands,
    /// Increase logging verbosity
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Subcommand)]
pub enum CliRootCommands {
    /// Start the applier for a downloaded update, then exit
    Launch {
        #[command(flatten)]
        profile: ProfileArgs,
        #[command(flatten)]
        paths: PathArgs,
    },
    /// Replace the installation with the staged files and start the new version
    Apply {
        #[command(flatten)]
        profile: ProfileArgs,
        /// How the installation is replaced
        #[arg(long, default_value_t = ReplaceStrategy::DeleteThenCopy)]
        strategy: ReplaceStrategy,
        #[command(flatten)]
        paths: PathArgs,
    },
}

#[derive(Debug, PartialEq, Args)]
pub struct PathArgs {
    /// Directory the application is currently installed in
    pub installed: PathBuf,
    /// Directory holding the downloaded files of the new version
    pub staged: PathBuf,
}

impl From<PathArgs> for UpdatePaths {
    fn from(PathArgs { installed, staged }: PathArgs) -> Self {
        UpdatePaths::new(installed, staged)
    }
}

#[derive(Debug, PartialEq, Args)]
pub struct ProfileArgs {
    /// How the updater and the application are started
    #[arg(long, default_value_t = ProfileKind::Jvm)]
    pub profile: ProfileKind,
    /// Installation directory of the Java runtime, defaults to `JAVA_HOME`
    #[arg(long)]
    pub java_home: Option<PathBuf>,
    /// Class the Java runtime runs to apply the update
    #[arg(long, default_value = DEFAULT_ENTRY_POINT)]
    pub entry_point: String,
    /// Application archive inside the `lib` directory of the installation
    #[arg(long = "archive", default_value = DEFAULT_ARCHIVE_NAME)]
    pub archive_name: String,
    /// Updater binary, relative to the staged directory
    #[arg(long, default_value = DEFAULT_NATIVE_UPDATER)]
    pub updater: PathBuf,
    /// Application binary, relative to the installed directory
    #[arg(long, default_value = DEFAULT_NATIVE_APPLICATION)]
    pub application: PathBuf,
}

impl From<ProfileArgs> for LaunchProfile {
    fn from(args: ProfileArgs) -> Self {
        match args.profile {
            ProfileKind::Jvm => LaunchProfile::Jvm(JvmProfile {
                java_home: args.java_home,
                entry_point: args.entry_point,
                archive_name: args.archive_name,
            }),
            ProfileKind::Native => LaunchProfile::Native(NativeProfile {
                updater: args.updater,
                application: args.application,
            }),
        }
    }
}

impl Cli {
    /// The log level implied by `--verbose`, if any.
    pub fn log_level(&self) -> Option<String> {
        match self.verbose {
            0 => None,
            1 => Some("debug".to_owned()),
            _ => Some("trace".to_owned()),
        }
    }

    /// The logging options a detached applier started by `launch` should run with.
    pub fn log_forwarding(&self) -> LogForwarding {
        LogForwarding {
            log_file: self.log_file.clone(),
            verbose: self.verbose,
        }
    }

    pub fn execute(self) -> ExitCode {
        let ctx = Context::new();
        debug!(command = ?self.subcommand, "Executing command");

        let logging = self.log_forwarding();
        match self.subcommand {
            CliRootCommands::Launch { profile, paths } => run_update(&ctx, &profile.into(), &paths.into(), &logging),
            CliRootCommands::Apply {
                profile,
                strategy,
                paths,
            } => run_applier(&ctx, &profile.into(), strategy, &paths.into()),
        }
    }
}
