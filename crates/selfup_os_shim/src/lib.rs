mod env;
mod fs;
mod platform;
mod process;
mod providers;

use std::sync::Arc;

pub use env::Env;
pub use fs::Fs;
pub use platform::{
    Os,
    Platform,
};
pub use process::{
    Invocation,
    Process,
};
pub use providers::{
    ContextProvider,
    EnvProvider,
    FsProvider,
    PlatformProvider,
    ProcessProvider,
};

pub trait Shim {
    /// Returns whether or not the shim is a real implementation.
    fn is_real(&self) -> bool;
}

/// Struct that contains the interface to every system related IO operation.
///
/// Every operation that accesses the file system, environment, or spawns a process
/// should be done through a [Context] as this enables testing otherwise untestable
/// code paths in unit tests.
#[derive(Debug, Clone, Default)]
pub struct Context {
    fs: Fs,
    env: Env,
    platform: Platform,
    process: Process,
}

impl Context {
    /// Returns a new [Context] with real implementations of each OS shim.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn fs(&self) -> &Fs {
        &self.fs
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn process(&self) -> &Process {
        &self.process
    }
}

#[derive(Default, Debug)]
pub struct ContextBuilder {
    fs: Option<Fs>,
    env: Option<Env>,
    platform: Option<Platform>,
    process: Option<Process>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an immutable [Context] using real implementations for each field by default.
    pub fn build(self) -> Arc<Context> {
        Arc::new(Context {
            fs: self.fs.unwrap_or_default(),
            env: self.env.unwrap_or_default(),
            platform: self.platform.unwrap_or_default(),
            process: self.process.unwrap_or_default(),
        })
    }

    /// Builds an immutable [Context] using fake implementations for each field by default.
    ///
    /// The filesystem stays real unless one was provided, since there is no in-memory [Fs].
    pub fn build_fake(self) -> Arc<Context> {
        Arc::new(Context {
            fs: self.fs.unwrap_or_default(),
            env: self.env.unwrap_or_else(Env::new_fake),
            platform: self.platform.unwrap_or_else(|| Platform::new_fake(Os::Linux)),
            process: self.process.unwrap_or_else(Process::new_fake),
        })
    }

    pub fn with_env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_fs(mut self, fs: Fs) -> Self {
        self.fs = Some(fs);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.process = Some(process);
        self
    }

    /// Replaces the [Fs] with a chroot rooted in a new temporary directory.
    pub fn with_chroot(mut self) -> Result<Self, std::io::Error> {
        self.fs = Some(Fs::new_chroot()?);
        Ok(self)
    }

    pub fn with_env_var(mut self, key: &str, value: &str) -> Self {
        self.env = match self.env {
            Some(env) if !env.is_real() => {
                env.set_fake_var(key, value);
                Some(env)
            },
            _ => Some(Env::from_slice(&[(key, value)])),
        };
        self
    }

    pub fn with_os(mut self, os: Os) -> Self {
        self.platform = Some(Platform::new_fake(os));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_builder_returns_real_impls_by_default() {
        let ctx = ContextBuilder::new().build();
        assert!(ctx.fs().is_real());
        assert!(ctx.env().is_real());
        assert!(ctx.platform().is_real());
        assert!(ctx.process().is_real());
    }

    #[test]
    fn context_builder_build_fake() {
        let ctx = Context::builder()
            .with_chroot()
            .unwrap()
            .with_os(Os::Windows)
            .with_env_var("JAVA_HOME", "/opt/jdk")
            .build_fake();
        assert!(ctx.fs().is_chroot());
        assert!(!ctx.process().is_real());
        assert_eq!(ctx.platform().os(), Os::Windows);
        assert_eq!(ctx.env().get("JAVA_HOME").unwrap(), "/opt/jdk");
    }
}
