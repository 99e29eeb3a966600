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
    PlatformProvider,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};

use crate::invocation::{
    LogForwarding,
    UpdatePaths,
    jvm_applier_invocation,
    native_applier_invocation,
};
use crate::profile::LaunchProfile;
use crate::{
    Error,
    spawn_detached,
};

/// Starts the applier for an already downloaded update.
///
/// The caller is expected to exit with the returned code right away, which is always
/// success: a failure to start the applier is logged and otherwise ignored so that the
/// application still shuts down.
pub fn run_update(ctx: &Context, profile: &LaunchProfile, paths: &UpdatePaths, logging: &LogForwarding) -> ExitCode {
    if let Err(err) = launch(ctx, profile, paths, logging) {
        error!(%err, "Failed to run self update process!");
    }
    ExitCode::SUCCESS
}

/// Builds the applier invocation for `profile` and starts it detached.
pub fn launch(
    ctx: &Context,
    profile: &LaunchProfile,
    paths: &UpdatePaths,
    logging: &LogForwarding,
) -> Result<Invocation, Error> {
    let invocation = applier_invocation(ctx, profile, paths, logging)?;

    info!("Running self update with: {invocation}");
    info!("Current installation path: {}", paths.installed.display());
    info!("New files temporarily located in: {}", paths.staged.display());

    spawn_detached(ctx, &invocation)?;
    Ok(invocation)
}

/// Resolves the runtime and the classpath for `profile` and builds the applier invocation.
///
/// Only a native applier understands the forwarded logging options; a JVM applier
/// configures its own logging.
pub fn applier_invocation<C>(
    ctx: &C,
    profile: &LaunchProfile,
    paths: &UpdatePaths,
    logging: &LogForwarding,
) -> Result<Invocation, Error>
where
    C: EnvProvider + FsProvider + PlatformProvider,
{
    debug!(profile = %profile.kind(), ?logging, "Building applier invocation");
    match profile {
        LaunchProfile::Jvm(jvm) => {
            let java = jvm.java_executable(ctx)?;
            let os = ctx.platform().os();
            let lib_entries = if os.is_windows() {
                Vec::new()
            } else {
                lib_entries(ctx, &paths.staged_lib())
            };
            Ok(jvm_applier_invocation(os, &java, jvm, paths, &lib_entries))
        },
        LaunchProfile::Native(native) => Ok(native_applier_invocation(native, paths, logging)),
    }
}

fn lib_entries(fs: &impl FsProvider, staged_lib: &Path) -> Vec<PathBuf> {
    match fs.fs().read_dir_sorted(staged_lib) {
        Ok(entries) => {
            if entries.is_empty() {
                warn!(?staged_lib, "Staged lib directory is empty, the classpath will be empty");
            }
            entries
        },
        Err(err) => {
            warn!(?staged_lib, %err, "Unable to list the staged lib directory, the classpath will be empty");
            Vec::new()
        },
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::sync::Arc;

    use selfup_os_shim::{
        Os,
        Process,
    };

    use super::*;
    use crate::consts::JAVA_HOME;
    use crate::profile::{
        JvmProfile,
        NativeProfile,
    };

    fn ctx(os: Os) -> Arc<Context> {
        Context::builder()
            .with_chroot()
            .unwrap()
            .with_os(os)
            .with_env_var(JAVA_HOME, "/jdk")
            .build_fake()
    }

    fn paths() -> UpdatePaths {
        UpdatePaths::new("/opt/app", "/tmp/new")
    }

    fn assert_success(code: ExitCode) {
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::SUCCESS));
    }

    fn classpath_of(invocation: &Invocation) -> &OsString {
        &invocation.args()[1]
    }

    #[test]
    fn test_launch_spawns_the_applier() {
        tracing_subscriber::fmt::try_init().ok();

        let ctx = ctx(Os::Linux);
        ctx.fs().write("/tmp/new/lib/b.jar", "b").unwrap();
        ctx.fs().write("/tmp/new/lib/a.jar", "a").unwrap();
        ctx.fs().write("/tmp/new/lib/c.jar", "c").unwrap();

        let invocation = launch(&ctx, &LaunchProfile::default(), &paths(), &LogForwarding::default()).unwrap();

        assert_eq!(ctx.process().spawned(), vec![invocation.clone()]);
        assert_eq!(invocation.program(), Path::new("/jdk").join("bin").join("java").as_os_str());
        assert_eq!(invocation.args()[0], "-cp");
        let classpath = classpath_of(&invocation).to_string_lossy().into_owned();
        assert_eq!(classpath.split(':').count(), 3);
        assert!(classpath.find("a.jar") < classpath.find("b.jar"));
        assert_eq!(invocation.args()[2], crate::consts::DEFAULT_ENTRY_POINT);
        assert_eq!(invocation.args()[3].as_os_str(), paths().installed.as_os_str());
        assert_eq!(invocation.args()[4].as_os_str(), paths().staged.as_os_str());
    }

    #[test]
    fn test_windows_launch_does_not_need_the_lib_directory() {
        let ctx = ctx(Os::Windows);
        let invocation = launch(&ctx, &LaunchProfile::default(), &paths(), &LogForwarding::default()).unwrap();
        assert_eq!(
            classpath_of(&invocation),
            &paths().staged_lib().join("*").into_os_string()
        );
    }

    #[test]
    fn test_missing_lib_directory_gives_an_empty_classpath() {
        let ctx = ctx(Os::Mac);
        let invocation = launch(&ctx, &LaunchProfile::default(), &paths(), &LogForwarding::default()).unwrap();
        assert!(classpath_of(&invocation).is_empty());
    }

    #[test]
    fn test_native_launch() {
        let ctx = ctx(Os::Linux);
        let profile = LaunchProfile::Native(NativeProfile::default());
        let invocation = launch(&ctx, &profile, &paths(), &LogForwarding::default()).unwrap();
        assert_eq!(invocation.program(), Path::new("/tmp/new").join("bin/selfup").as_os_str());
        assert_eq!(invocation.args()[0], "apply");
    }

    #[test]
    fn test_native_launch_forwards_logging() {
        let ctx = ctx(Os::Linux);
        let logging = LogForwarding {
            log_file: Some(PathBuf::from("/var/log/selfup.log")),
            verbose: 1,
        };

        assert_success(run_update(
            &ctx,
            &LaunchProfile::Native(NativeProfile::default()),
            &paths(),
            &logging,
        ));

        let spawned = ctx.process().spawned();
        assert_eq!(spawned.len(), 1);
        let args = spawned[0].args();
        assert_eq!(args[0], "-v");
        assert_eq!(args[1], "--log-file");
        assert_eq!(args[2].as_os_str(), Path::new("/var/log/selfup.log").as_os_str());
        assert_eq!(args[3], "apply");
    }

    #[test]
    fn test_jvm_launch_ignores_forwarded_logging() {
        let ctx = ctx(Os::Windows);
        let logging = LogForwarding {
            log_file: Some(PathBuf::from("/var/log/selfup.log")),
            verbose: 2,
        };
        let invocation = launch(&ctx, &LaunchProfile::default(), &paths(), &logging).unwrap();
        assert_eq!(invocation.args()[0], "-cp");
        assert_eq!(invocation.args().len(), 5);
    }

    #[test]
    fn test_spawn_failure_is_logged_not_propagated() {
        let ctx = Context::builder()
            .with_chroot()
            .unwrap()
            .with_process(Process::new_failing())
            .build_fake();
        let profile = LaunchProfile::Jvm(JvmProfile {
            java_home: Some("/jdk".into()),
            ..Default::default()
        });

        assert!(matches!(launch(&ctx, &profile, &paths(), &LogForwarding::default()), Err(Error::Spawn { .. })));
        // Logged, not propagated.
        assert_success(run_update(&ctx, &profile, &paths(), &LogForwarding::default()));
    }

    #[test]
    fn test_missing_runtime_is_not_spawned() {
        let ctx = Context::builder().with_chroot().unwrap().build_fake();
        assert!(matches!(
            launch(&ctx, &LaunchProfile::default(), &paths(), &LogForwarding::default()),
            Err(Error::MissingRuntime(JAVA_HOME))
        ));
        assert_success(run_update(&ctx, &LaunchProfile::default(), &paths(), &LogForwarding::default()));
        assert!(ctx.process().spawned().is_empty());
    }
}
