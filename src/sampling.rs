//! Sampling options and their three-layer resolution.
//!
//! Options can be left unset at every layer; a call resolves them by merging
//! library defaults, instance-level overrides, and call-level overrides,
//! field by field, call-level winning.

use serde::{Deserialize, Serialize};

/// Library defaults applied when neither the client nor the call sets a field.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f64 = 0.5;
pub const DEFAULT_TOP_P: f64 = 0.95;

/// Partially specified sampling options, every field optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_schema_constrained_tokens: Option<bool>,
}

impl SamplingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_output_tokens(mut self, n: u32) -> Self {
        self.max_output_tokens = Some(n);
        self
    }

    pub fn with_temperature(mut self, t: f64) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn with_top_p(mut self, p: f64) -> Self {
        self.top_p = Some(p);
        self
    }

    pub fn with_force_schema_constrained_tokens(mut self, force: bool) -> Self {
        self.force_schema_constrained_tokens = Some(force);
        self
    }

    /// Overlay `other` on top of `self`, field by field, `other` winning.
    fn overlaid(self, other: SamplingOptions) -> SamplingOptions {
        SamplingOptions {
            max_output_tokens: other.max_output_tokens.or(self.max_output_tokens),
            temperature: other.temperature.or(self.temperature),
            top_p: other.top_p.or(self.top_p),
            force_schema_constrained_tokens: other
                .force_schema_constrained_tokens
                .or(self.force_schema_constrained_tokens),
        }
    }
}

/// Fully resolved sampling options, ready for the adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSampling {
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub force_schema_constrained_tokens: bool,
}

/// Merge the three layers and validate the result.
///
/// Hard validation fails immediately, naming the field and the offending
/// value. A resolved `temperature` or `topP` of exactly 0 is bumped to the
/// smallest representable positive value: several backends treat literal 0
/// as "parameter unset" rather than "fully greedy".
pub fn resolve(
    instance: Option<&SamplingOptions>,
    call: Option<&SamplingOptions>,
) -> crate::Result<ResolvedSampling> {
    let merged = SamplingOptions::default()
        .overlaid(instance.copied().unwrap_or_default())
        .overlaid(call.copied().unwrap_or_default());

    let max_output_tokens = merged.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS);
    let temperature = merged.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    let top_p = merged.top_p.unwrap_or(DEFAULT_TOP_P);

    if max_output_tokens < 1 {
        return Err(crate::Error::InvalidInput(format!(
            "maxOutputTokens must be at least 1 (got: {})",
            max_output_tokens
        )));
    }
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(crate::Error::InvalidInput(format!(
            "temperature must be >= 0 (got: {})",
            temperature
        )));
    }
    if !top_p.is_finite() || !(0.0..=1.0).contains(&top_p) {
        return Err(crate::Error::InvalidInput(format!(
            "topP must be between 0 and 1 (got: {})",
            top_p
        )));
    }

    Ok(ResolvedSampling {
        max_output_tokens,
        temperature: bump_zero(temperature),
        top_p: bump_zero(top_p),
        force_schema_constrained_tokens: merged.force_schema_constrained_tokens.unwrap_or(false),
    })
}

fn bump_zero(v: f64) -> f64 {
    if v == 0.0 {
        f64::MIN_POSITIVE
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_nothing_set() {
        let resolved = resolve(None, None).unwrap();
        assert_eq!(resolved.max_output_tokens, 4096);
        assert_eq!(resolved.temperature, 0.5);
        assert_eq!(resolved.top_p, 0.95);
        assert!(!resolved.force_schema_constrained_tokens);
    }

    #[test]
    fn test_three_layer_merge_call_wins() {
        let instance = SamplingOptions::new().with_temperature(0.1);
        let call = SamplingOptions::new().with_max_output_tokens(1024);
        let resolved = resolve(Some(&instance), Some(&call)).unwrap();
        assert_eq!(resolved.max_output_tokens, 1024);
        assert_eq!(resolved.temperature, 0.1);
        assert_eq!(resolved.top_p, 0.95);
    }

    #[test]
    fn test_call_overrides_instance_on_same_field() {
        let instance = SamplingOptions::new().with_temperature(0.1);
        let call = SamplingOptions::new().with_temperature(0.9);
        let resolved = resolve(Some(&instance), Some(&call)).unwrap();
        assert_eq!(resolved.temperature, 0.9);
    }

    #[test]
    fn test_zero_max_output_tokens_rejected_with_exact_message() {
        let call = SamplingOptions::new().with_max_output_tokens(0);
        let err = resolve(None, Some(&call)).unwrap_err();
        assert!(err
            .to_string()
            .contains("maxOutputTokens must be at least 1 (got: 0)"));
    }

    #[test]
    fn test_zero_temperature_bumped_to_min_positive() {
        let call = SamplingOptions::new().with_temperature(0.0);
        let resolved = resolve(None, Some(&call)).unwrap();
        assert_eq!(resolved.temperature, f64::MIN_POSITIVE);
        assert!(resolved.temperature > 0.0);
    }

    #[test]
    fn test_zero_top_p_bumped_to_min_positive() {
        let call = SamplingOptions::new().with_top_p(0.0);
        let resolved = resolve(None, Some(&call)).unwrap();
        assert_eq!(resolved.top_p, f64::MIN_POSITIVE);
    }

    #[test]
    fn test_negative_temperature_rejected() {
        let call = SamplingOptions::new().with_temperature(-0.5);
        let err = resolve(None, Some(&call)).unwrap_err();
        assert!(err.to_string().contains("temperature"));
        assert!(err.to_string().contains("-0.5"));
    }

    #[test]
    fn test_top_p_above_one_rejected() {
        let call = SamplingOptions::new().with_top_p(1.5);
        let err = resolve(None, Some(&call)).unwrap_err();
        assert!(err.to_string().contains("topP"));
    }
}
