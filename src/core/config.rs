use anyhow::{anyhow, Result};
use strum::{Display, EnumString};

/// Whether a numeric fact's `scale` is applied when its value is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ScalePolicy {
    /// Keep the scale on the fact but render the transformed text as-is.
    #[default]
    Record,
    /// Multiply by `10^scale` and apply `sign="-"`.
    Apply,
}

#[derive(Clone, Debug, Default)]
pub struct IxbrlConfig {
    pub scale: ScalePolicy,
    /// Fail instead of falling back to the raw text when a transform errors.
    pub strict_transforms: bool,
}

impl IxbrlConfig {
    pub fn from_env() -> Result<Self> {
        let scale = match std::env::var("IXBRL_SCALE") {
            Ok(v) => v
                .parse::<ScalePolicy>()
                .map_err(|_| anyhow!("IXBRL_SCALE must be 'record' or 'apply', got '{}'", v))?,
            Err(_) => ScalePolicy::default(),
        };

        let strict_transforms = match std::env::var("IXBRL_STRICT_TRANSFORMS") {
            Ok(v) => v.parse::<bool>().map_err(|_| {
                anyhow!("IXBRL_STRICT_TRANSFORMS must be 'true' or 'false', got '{}'", v)
            })?,
            Err(_) => false,
        };

        Ok(Self {
            scale,
            strict_transforms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_policy_parsing() {
        assert_eq!("apply".parse::<ScalePolicy>().unwrap(), ScalePolicy::Apply);
        assert_eq!("Record".parse::<ScalePolicy>().unwrap(), ScalePolicy::Record);
        assert!("double".parse::<ScalePolicy>().is_err());
        assert_eq!(ScalePolicy::Apply.to_string(), "apply");
    }

    #[test]
    fn test_defaults() {
        let config = IxbrlConfig::default();
        assert_eq!(config.scale, ScalePolicy::Record);
        assert!(!config.strict_transforms);
    }
}
