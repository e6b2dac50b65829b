// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Process-wide library configuration
//!
//! Holds the policies chosen at `initialize` time: logging verbosity,
//! whether a panic clears the on-disk index and is reported as a
//! recoverable error, and whether malformed UTF-8 from a host is accepted
//! leniently. The index path is recorded when a context opens it so the
//! panic hook knows what to clear.

use lazy_static::lazy_static;
use log::debug;
use std::fs;
use std::panic;
use std::path::Path;
use std::sync::RwLock;

lazy_static! {
    pub static ref CONFIG: RwLock<Config> = RwLock::new(Config::default());
}

/// Process-wide policy flags and state
pub struct Config {
    /// Accept invalid UTF-8 from the host by replacing bad sequences
    pub utf8_lenient: bool,
    /// Clear the index directory on panic and treat panics as recoverable
    pub clear_on_panic: bool,
    /// Path of the most recently opened index, cleared by the panic hook
    pub index_path: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            utf8_lenient: false,
            clear_on_panic: false,
            index_path: String::new(),
        }
    }
}

impl Config {
    pub fn update_utf8_lenient(&mut self, utf8_lenient: bool) {
        self.utf8_lenient = utf8_lenient;
    }

    pub fn update_clear_on_panic(&mut self, clear_on_panic: bool) {
        self.clear_on_panic = clear_on_panic;
    }

    pub fn update_index_path(&mut self, index_path: String) {
        self.index_path = index_path;
    }
}

/// One-time process-wide initialization.
///
/// Sets the default log filter, the panic policy, and the UTF-8 policy.
/// Safe to call more than once; later calls only update the policy flags.
pub fn initialize(log_level: &str, clear_on_panic: bool, utf8_lenient: bool) {
    if clear_on_panic {
        let old_hook = panic::take_hook();
        install_clearing_hook(old_hook);
    }

    match CONFIG.write() {
        Ok(mut config) => {
            config.update_utf8_lenient(utf8_lenient);
            config.update_clear_on_panic(clear_on_panic);
        }
        Err(e) => {
            debug!("Failed to update config: {}", e);
        }
    }

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .try_init();
}

/// Whether panics should be reported as recoverable errors
pub fn recover_on_panic() -> bool {
    CONFIG.read().map(|c| c.clear_on_panic).unwrap_or(false)
}

/// Whether host strings are converted leniently
pub fn utf8_lenient() -> bool {
    CONFIG.read().map(|c| c.utf8_lenient).unwrap_or(false)
}

fn install_clearing_hook(old_hook: Box<dyn Fn(&panic::PanicHookInfo) + Sync + Send>) {
    panic::set_hook(Box::new(move |panic_info| {
        match CONFIG.read() {
            Ok(config) => {
                let index_path = config.index_path.as_str();
                if index_path.is_empty() {
                    debug!("index path is empty, nothing to clear");
                } else {
                    let _ = fs::remove_dir_all(Path::new(index_path));
                }
            }
            Err(e) => {
                debug!("Panic hook could not read config: {}", e);
            }
        }
        old_hook(panic_info)
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_initialize_sets_flags() {
        initialize("debug", false, true);
        assert!(utf8_lenient());
        assert!(!recover_on_panic());

        initialize("debug", false, false);
        assert!(!utf8_lenient());
    }

    #[test]
    #[serial]
    fn test_index_path_update() {
        {
            let mut config = CONFIG.write().unwrap();
            config.update_index_path("/tmp/textlite-test".to_string());
        }
        let config = CONFIG.read().unwrap();
        assert_eq!(config.index_path, "/tmp/textlite-test");
    }
}
