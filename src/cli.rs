use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

const SUPPORTED_FLAGS: &str =
    "--width, --height, --vsync, --antialias, --model, --environment, --rgb-shift, --orbit, --config";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliOverrides {
    config: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    vsync: Option<bool>,
    antialias: Option<bool>,
    model: Option<PathBuf>,
    environment: Option<PathBuf>,
    rgb_shift: Option<f32>,
    orbit: Option<bool>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // program name
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "width" => {
                    overrides.width =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid width '{value}'"))?);
                }
                "height" => {
                    overrides.height =
                        Some(value.parse::<u32>().with_context(|| format!("Invalid height '{value}'"))?);
                }
                "vsync" => overrides.vsync = Some(parse_bool_flag("vsync", &value)?),
                "antialias" => overrides.antialias = Some(parse_bool_flag("antialias", &value)?),
                "orbit" => overrides.orbit = Some(parse_bool_flag("orbit", &value)?),
                "model" => overrides.model = Some(PathBuf::from(value)),
                "environment" => overrides.environment = Some(PathBuf::from(value)),
                "config" => overrides.config = Some(PathBuf::from(value)),
                "rgb-shift" => {
                    let amount = value
                        .parse::<f32>()
                        .with_context(|| format!("Invalid rgb-shift amount '{value}'"))?;
                    if !amount.is_finite() || amount < 0.0 {
                        bail!("rgb-shift amount must be a finite, non-negative number (got {value})");
                    }
                    overrides.rgb_shift = Some(amount);
                }
                _ => bail!("Unknown flag '{flag}'. Supported flags: {SUPPORTED_FLAGS}."),
            }
        }
        Ok(overrides)
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides {
            config_path: self.config,
            width: self.width,
            height: self.height,
            vsync: self.vsync,
            antialias: self.antialias,
            model: self.model,
            environment: self.environment,
            rgb_shift_amount: self.rgb_shift,
            orbit_controls: self.orbit,
        }
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_window_and_asset_flags() {
        let args = [
            "app",
            "--width",
            "1600",
            "--height",
            "900",
            "--vsync",
            "off",
            "--model",
            "models/helmet.gltf",
            "--orbit",
            "on",
        ];
        let overrides = CliOverrides::parse(args).expect("parse overrides").into_config_overrides();
        assert_eq!(overrides.width, Some(1600));
        assert_eq!(overrides.height, Some(900));
        assert_eq!(overrides.vsync, Some(false));
        assert_eq!(overrides.model, Some(PathBuf::from("models/helmet.gltf")));
        assert_eq!(overrides.orbit_controls, Some(true));
        assert!(overrides.environment.is_none());
    }

    #[test]
    fn antialias_flag_turns_msaa_off() {
        let overrides =
            CliOverrides::parse(["app", "--antialias", "off"]).expect("parse overrides").into_config_overrides();
        assert_eq!(overrides.antialias, Some(false));
        let err = CliOverrides::parse(["app", "--antialias", "sometimes"]).unwrap_err();
        assert!(err.to_string().contains("antialias"));
    }

    #[test]
    fn latest_flag_wins() {
        let args = ["app", "--rgb-shift", "0.01", "--rgb-shift", "0.002"];
        let overrides = CliOverrides::parse(args).expect("parse overrides");
        assert_eq!(overrides.rgb_shift, Some(0.002));
    }

    #[test]
    fn negative_shift_is_rejected() {
        let err = CliOverrides::parse(["app", "--rgb-shift", "-1"]).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn missing_value_errors() {
        let err = CliOverrides::parse(["app", "--width"]).unwrap_err();
        assert!(err.to_string().contains("Expected a value"), "error should mention missing value");
    }

    #[test]
    fn rejects_unknown_flags() {
        let err = CliOverrides::parse(["app", "--foo", "bar"]).unwrap_err();
        assert!(err.to_string().contains("Unknown flag"), "unknown flags should error");
    }
}
