//! Process-wide GPU environment for downstream training frameworks.
//!
//! The variables are read by CUDA and TensorFlow when they start, so they must
//! be set once at startup, before any heavy computation. Nothing in this crate
//! depends on them.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// GPU-related environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEnv {
    /// `CUDA_VISIBLE_DEVICES`: comma-separated device ids.
    pub visible_devices: String,

    /// `CUDA_DEVICE_ORDER`: device enumeration order.
    pub device_order: String,

    /// `TF_CPP_MIN_LOG_LEVEL`: TensorFlow native log verbosity.
    pub min_log_level: String,

    /// `TF_XLA_FLAGS`, left untouched when `None`.
    pub xla_flags: Option<String>,
}

impl Default for DeviceEnv {
    fn default() -> Self {
        Self {
            visible_devices: "0".to_string(),
            device_order: "PCI_BUS_ID".to_string(),
            min_log_level: "1".to_string(),
            xla_flags: Some("--tf_xla_enable_xla_devices".to_string()),
        }
    }
}

impl DeviceEnv {
    /// Default environment exposing only `devices`.
    #[must_use]
    pub fn with_visible_devices<S: Into<String>>(devices: S) -> Self {
        Self {
            visible_devices: devices.into(),
            ..Self::default()
        }
    }

    /// Variable name and value pairs, in the order they are applied.
    #[must_use]
    pub fn vars(&self) -> Vec<(&'static str, &str)> {
        let mut vars = vec![
            ("TF_CPP_MIN_LOG_LEVEL", self.min_log_level.as_str()),
            ("CUDA_DEVICE_ORDER", self.device_order.as_str()),
            ("CUDA_VISIBLE_DEVICES", self.visible_devices.as_str()),
        ];
        if let Some(flags) = &self.xla_flags {
            vars.push(("TF_XLA_FLAGS", flags.as_str()));
        }
        vars
    }
}

/// Apply `device_env` to the process environment.
///
/// Only the first call in a process has an effect; it returns `true`. Later
/// calls return `false` and leave the environment as it is.
pub fn init(device_env: &DeviceEnv) -> bool {
    apply_once(&INIT, device_env, |key, value| env::set_var(key, value))
}

fn apply_once<F>(once: &Once, device_env: &DeviceEnv, mut set_var: F) -> bool
where
    F: FnMut(&str, &str),
{
    let mut applied = false;
    once.call_once(|| {
        for (key, value) in device_env.vars() {
            tracing::debug!("Setting {key}={value}");
            set_var(key, value);
        }
        applied = true;
    });
    applied
}
