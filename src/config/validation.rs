use super::{ConfigError, SynthConfig};

fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_nan() || value <= 0.0 {
        return Err(ConfigError::Invalid(format!(
            "{field} must be positive, got {value}"
        )));
    }
    Ok(())
}

pub(super) fn validate(config: &SynthConfig) -> Result<(), ConfigError> {
    if config.output.path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("output.path must not be empty".to_string()));
    }

    positive("voice.rate", config.voice.rate)?;
    positive("voice.duration_mean_rate", config.voice.duration_mean_rate)?;

    match (&config.voice.duration_tree, &config.voice.duration_table) {
        (Some(_), None) => {
            return Err(ConfigError::Invalid(
                "voice.duration_table is required with voice.duration_tree".to_string(),
            ));
        }
        (None, Some(_)) => {
            return Err(ConfigError::Invalid(
                "voice.duration_tree is required with voice.duration_table".to_string(),
            ));
        }
        _ => {}
    }

    let volume = config.voice.volume;
    if !(0.0..=1.0).contains(&volume) {
        return Err(ConfigError::Invalid(format!(
            "voice.volume must be within [0.0, 1.0], got {volume}"
        )));
    }

    if config.playback.queue_capacity == 0 {
        return Err(ConfigError::Invalid(
            "playback.queue_capacity must be greater than zero".to_string(),
        ));
    }

    Ok(())
}
