use std::sync::Arc;

use crate::{
    Context,
    Env,
    Fs,
    Platform,
    Process,
};

pub trait ContextProvider {
    fn context(&self) -> &Context;
}

macro_rules! impl_context_provider {
    ($a:ty) => {
        impl ContextProvider for $a {
            fn context(&self) -> &Context {
                self
            }
        }
    };
}

impl_context_provider!(Arc<Context>);
impl_context_provider!(&Arc<Context>);
impl_context_provider!(Context);
impl_context_provider!(&Context);

pub trait EnvProvider {
    fn env(&self) -> &Env;
}

impl<T> EnvProvider for T
where
    T: ContextProvider,
{
    fn env(&self) -> &Env {
        self.context().env()
    }
}

pub trait FsProvider {
    fn fs(&self) -> &Fs;
}

impl<T> FsProvider for T
where
    T: ContextProvider,
{
    fn fs(&self) -> &Fs {
        self.context().fs()
    }
}

pub trait PlatformProvider {
    fn platform(&self) -> &Platform;
}

impl<T> PlatformProvider for T
where
    T: ContextProvider,
{
    fn platform(&self) -> &Platform {
        self.context().platform()
    }
}

pub trait ProcessProvider {
    fn process(&self) -> &Process;
}

impl<T> ProcessProvider for T
where
    T: ContextProvider,
{
    fn process(&self) -> &Process {
        self.context().process()
    }
}
