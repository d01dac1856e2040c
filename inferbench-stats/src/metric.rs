//! Metric Identity
//!
//! The grouping key describing *what* was measured. Two measurements with
//! equal identities (all five fields equal) are merged into one.

use std::fmt;

/// Immutable description of a measured quantity
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MetricIdentity {
    /// Usually the benchmark plugin name
    pub label: Option<String>,
    /// Phase name, e.g. `preprocessing` or `inferencing`
    pub sub_label: Option<String>,
    /// Free-text description of what is measured
    pub description: Option<String>,
    /// Backend or accelerator identifier
    pub device: Option<String>,
    /// Environment or host identifier
    pub env: Option<String>,
}

impl MetricIdentity {
    /// Create an identity with only a label set
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// Set the sub-label
    pub fn with_sub_label(mut self, sub_label: impl Into<String>) -> Self {
        self.sub_label = Some(sub_label.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the device
    pub fn with_device(mut self, device: Option<String>) -> Self {
        self.device = device;
        self
    }

    /// Set the environment
    pub fn with_env(mut self, env: Option<String>) -> Self {
        self.env = env;
        self
    }

    /// Short human-readable title.
    ///
    /// `"label: sub_label"` or `"label"` when a label is set, otherwise
    /// `"Metric for env on device"`, falling back to `"Metric"`.
    pub fn title(&self) -> String {
        if let Some(label) = &self.label {
            return match &self.sub_label {
                Some(sub) => format!("{}: {}", label, sub),
                None => label.clone(),
            };
        }

        match (&self.env, &self.device) {
            (Some(env), Some(device)) => format!("Metric for {} on {}", env, device),
            (Some(env), None) => format!("Metric for {}", env),
            _ => "Metric".to_string(),
        }
    }

    /// Multi-line summary: title followed by any set description, env and device
    pub fn summarize(&self) -> String {
        let mut out = self.title();
        if let Some(description) = &self.description {
            out.push_str(&format!("\n  {}", description));
        }
        if let Some(env) = &self.env {
            out.push_str(&format!("\n  env: {}", env));
        }
        if let Some(device) = &self.device {
            out.push_str(&format!("\n  device: {}", device));
        }
        out
    }
}

impl fmt::Display for MetricIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(
        label: Option<&str>,
        sub_label: Option<&str>,
        env: Option<&str>,
        device: Option<&str>,
    ) -> MetricIdentity {
        MetricIdentity {
            label: label.map(String::from),
            sub_label: sub_label.map(String::from),
            description: None,
            device: device.map(String::from),
            env: env.map(String::from),
        }
    }

    #[test]
    fn test_title() {
        let cases = [
            (metric(None, None, None, None), "Metric"),
            (metric(Some("Foo"), None, None, None), "Foo"),
            (metric(Some("Foo"), Some("Bar"), None, None), "Foo: Bar"),
            (metric(None, None, Some("MediaTek"), None), "Metric for MediaTek"),
            (
                metric(None, None, Some("MediaTek"), Some("tflite")),
                "Metric for MediaTek on tflite",
            ),
        ];

        for (identity, expected) in cases {
            assert_eq!(identity.title(), expected);
        }
    }

    #[test]
    fn test_equality_uses_all_fields() {
        let a = MetricIdentity::labeled("Whisper").with_sub_label("inferencing");
        let b = MetricIdentity::labeled("Whisper").with_sub_label("inferencing");
        let c = b.clone().with_env(Some("jetson".to_string()));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_summarize_lists_set_fields() {
        let identity = MetricIdentity::labeled("Basic")
            .with_sub_label("mul/sum")
            .with_description("matrix operations")
            .with_device(Some("cpu".to_string()));

        let summary = identity.summarize();
        assert!(summary.starts_with("Basic: mul/sum"));
        assert!(summary.contains("matrix operations"));
        assert!(summary.contains("device: cpu"));
        assert!(!summary.contains("env:"));
    }
}
