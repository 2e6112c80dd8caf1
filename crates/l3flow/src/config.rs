//! Profile selection and CLI flag overrides on top of `l3flow_config`.

use l3flow_config::{Config, Profile, config_path, load_config};
use l3flow_core::{ControllerConfig, ReactiveConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything a command needs to talk to the controller.
#[derive(Debug)]
pub struct Resolved {
    pub controller: ControllerConfig,
    pub reactive: ReactiveConfig,
}

/// `--profile`, then `default_profile`, then `"default"`.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Load the config file and build controller and loop settings.
///
/// Without a matching profile, `--controller` alone is enough as long as
/// no profile was asked for by name.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config(global.config.as_deref())?;
    let name = active_profile_name(global, &cfg);

    let mut profile = if global.profile.is_some() {
        cfg.profile(&name)?.clone()
    } else if let Some(profile) = cfg.profiles.get(&name) {
        profile.clone()
    } else if global.controller.is_some() {
        Profile::default()
    } else {
        let path = global.config.clone().unwrap_or_else(config_path);
        return Err(CliError::NoConfig {
            path: path.display().to_string(),
        });
    };

    apply_overrides(&mut profile, global);
    tracing::debug!(profile = %name, controller = %profile.controller, "resolved profile");

    let controller = l3flow_config::profile_to_controller_config(&profile, &name, &cfg.defaults)?;
    let reactive = l3flow_config::reactive_config(&profile.reactive)?;
    Ok(Resolved {
        controller,
        reactive,
    })
}

fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref url) = global.controller {
        profile.controller.clone_from(url);
    }
    if let Some(ref user) = global.username {
        profile.username = Some(user.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}
