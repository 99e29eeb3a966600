use std::collections::HashMap;
use std::env::{
    self,
    VarError,
};
use std::sync::{
    Arc,
    Mutex,
};

use crate::Shim;

#[derive(Debug, Clone, Default)]
pub struct Env(inner::Inner);

mod inner {
    use std::collections::HashMap;
    use std::sync::{
        Arc,
        Mutex,
    };

    #[derive(Debug, Clone, Default)]
    pub(super) enum Inner {
        #[default]
        Real,
        Fake(Arc<Mutex<Fake>>),
    }

    #[derive(Debug, Clone, Default)]
    pub(super) struct Fake {
        pub vars: HashMap<String, String>,
    }
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_fake() -> Self {
        Self(inner::Inner::Fake(Arc::new(Mutex::new(inner::Fake::default()))))
    }

    /// Create a fake process environment from a slice of tuples.
    pub fn from_slice(vars: &[(&str, &str)]) -> Self {
        use inner::Inner;
        let map: HashMap<_, _> = vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        Self(Inner::Fake(Arc::new(Mutex::new(inner::Fake { vars: map }))))
    }

    pub fn get<K: AsRef<str>>(&self, key: K) -> Result<String, VarError> {
        use inner::Inner;
        match &self.0 {
            Inner::Real => env::var(key.as_ref()),
            Inner::Fake(fake) => fake
                .lock()
                .map_err(|_poisoned| VarError::NotPresent)?
                .vars
                .get(key.as_ref())
                .cloned()
                .ok_or(VarError::NotPresent),
        }
    }

    /// Sets a variable in a fake environment. Does nothing for the real environment.
    pub fn set_fake_var(&self, key: &str, value: &str) {
        if let inner::Inner::Fake(fake) = &self.0 {
            if let Ok(mut fake) = fake.lock() {
                fake.vars.insert(key.to_owned(), value.to_owned());
            }
        }
    }
}

impl Shim for Env {
    fn is_real(&self) -> bool {
        matches!(self.0, inner::Inner::Real)
    }
}
