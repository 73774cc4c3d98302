//! Scoped process environment updates for integration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Restores the touched variables when dropped.
///
/// Guards serialize on one process-wide lock, so tests mutating the
/// environment never interleave.
pub struct EnvVarGuard {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Sets or removes each variable; `None` removes it.
    #[must_use]
    pub fn apply(changes: &[(&str, Option<&str>)]) -> Self {
        let lock = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = changes
            .iter()
            .map(|(key, value)| {
                let prior = env::var_os(key);
                unsafe {
                    // SAFETY: ENV_MUTEX serializes environment mutation in tests.
                    match value {
                        Some(new_value) => env::set_var(key, new_value),
                        None => env::remove_var(key),
                    }
                }
                (OsString::from(key), prior)
            })
            .collect();

        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            unsafe {
                // SAFETY: the guard still holds ENV_MUTEX.
                match value {
                    Some(prior) => env::set_var(&key, &prior),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}
