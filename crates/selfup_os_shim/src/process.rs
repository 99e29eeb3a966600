use std::ffi::{
    OsStr,
    OsString,
};
use std::fmt;
use std::io;
use std::process::{
    Command,
    Stdio,
};
use std::sync::{
    Arc,
    Mutex,
};

use crate::Shim;

/// An executable followed by its arguments, ready to be handed to [Process::spawn_detached].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// The program followed by every argument.
    pub fn to_vec(&self) -> Vec<OsString> {
        std::iter::once(self.program.clone()).chain(self.args.iter().cloned()).collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self.to_vec().iter().map(|part| part.to_string_lossy().into_owned()).collect();
        write!(f, "{parts:?}")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Process(inner::Inner);

mod inner {
    use super::*;

    #[derive(Debug, Clone, Default)]
    pub(super) enum Inner {
        #[default]
        Real,
        Fake(Arc<Mutex<Fake>>),
    }

    #[derive(Debug, Default)]
    pub(super) struct Fake {
        pub spawned: Vec<Invocation>,
        pub fail_spawns: bool,
    }
}

impl Process {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fake [Process] that records every invocation instead of starting it.
    pub fn new_fake() -> Self {
        Self(inner::Inner::Fake(Arc::default()))
    }

    /// Returns a fake [Process] whose spawns all fail with [io::ErrorKind::NotFound].
    pub fn new_failing() -> Self {
        Self(inner::Inner::Fake(Arc::new(Mutex::new(inner::Fake {
            spawned: Vec::new(),
            fail_spawns: true,
        }))))
    }

    /// Starts `invocation` as an independent process and returns without waiting for it.
    ///
    /// On unix the child is moved into its own process group, on Windows it is created
    /// without a console. Standard streams are not inherited in either case.
    pub fn spawn_detached(&self, invocation: &Invocation) -> io::Result<()> {
        use inner::Inner;
        match &self.0 {
            Inner::Real => {
                let mut command = Command::new(invocation.program());
                command
                    .args(invocation.args())
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());

                cfg_if::cfg_if! {
                    if #[cfg(unix)] {
                        use std::os::unix::process::CommandExt;
                        command.process_group(0);
                    } else if #[cfg(windows)] {
                        use std::os::windows::process::CommandExt;
                        const DETACHED_PROCESS: u32 = 0x0000_0008;
                        command.creation_flags(DETACHED_PROCESS);
                    }
                }

                command.spawn().map(drop)
            },
            Inner::Fake(fake) => {
                let mut fake = fake.lock().map_err(|_poisoned| io::Error::other("poisoned lock"))?;
                if fake.fail_spawns {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("{:?} not found", invocation.program()),
                    ));
                }
                fake.spawned.push(invocation.clone());
                Ok(())
            },
        }
    }

    /// Invocations recorded by a fake [Process]. Always empty for the real implementation.
    pub fn spawned(&self) -> Vec<Invocation> {
        match &self.0 {
            inner::Inner::Real => Vec::new(),
            inner::Inner::Fake(fake) => fake.lock().map(|fake| fake.spawned.clone()).unwrap_or_default(),
        }
    }
}

impl Shim for Process {
    fn is_real(&self) -> bool {
        matches!(self.0, inner::Inner::Real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation() {
        let invocation = Invocation::new("/usr/bin/java").arg("-jar").arg("/opt/app/lib/app.jar");
        assert_eq!(invocation.program(), "/usr/bin/java");
        assert_eq!(invocation.args(), &[OsString::from("-jar"), OsString::from("/opt/app/lib/app.jar")]);
        assert_eq!(invocation.to_vec().len(), 3);
        assert_eq!(
            invocation.to_string(),
            r#"["/usr/bin/java", "-jar", "/opt/app/lib/app.jar"]"#
        );
    }

    #[test]
    fn test_fake_records_spawns() {
        let process = Process::new_fake();
        assert!(!process.is_real());

        let invocation = Invocation::new("app");
        process.spawn_detached(&invocation).unwrap();
        assert_eq!(process.spawned(), vec![invocation]);
    }

    #[test]
    fn test_failing_spawns() {
        let process = Process::new_failing();
        let err = process.spawn_detached(&Invocation::new("app")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(process.spawned().is_empty());
    }

    #[test]
    fn test_real_spawn_of_missing_program_fails() {
        let process = Process::new();
        assert!(process.is_real());
        let invocation = Invocation::new("/this/program/does/not/exist");
        assert!(process.spawn_detached(&invocation).is_err());
    }
}
