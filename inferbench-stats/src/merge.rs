//! Measurement Merging
//!
//! Combines measurements collected by independent runs into one measurement
//! per metric identity.

use crate::measurement::Measurement;
use crate::metric::MetricIdentity;
use std::collections::HashMap;

/// Merge measurements that share a [`MetricIdentity`].
///
/// Each group's normalized samples are concatenated in input order into a
/// single measurement with `per_run = 1`. Output follows first-seen identity
/// order. Units are taken from the first measurement in a group that has
/// them; metadata is dropped.
pub fn merge(measurements: &[Measurement]) -> Vec<Measurement> {
    let mut groups: Vec<(MetricIdentity, Vec<f64>, Option<String>)> = Vec::new();
    let mut index: HashMap<&MetricIdentity, usize> = HashMap::new();

    for m in measurements {
        let slot = *index.entry(m.metric()).or_insert_with(|| {
            groups.push((m.metric().clone(), Vec::new(), None));
            groups.len() - 1
        });

        let (_, samples, units) = &mut groups[slot];
        samples.extend(m.normalized_samples());
        if units.is_none() {
            *units = m.units().map(String::from);
        }
    }

    groups
        .into_iter()
        .map(|(metric, samples, units)| {
            let merged = Measurement::new(metric, samples);
            match units {
                Some(units) => merged.with_units(units),
                None => merged,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::num::NonZeroU32;

    fn phase(label: &str, sub_label: &str, samples: &[f64]) -> Measurement {
        Measurement::new(
            MetricIdentity::labeled(label).with_sub_label(sub_label),
            samples.to_vec(),
        )
        .with_units("s")
    }

    #[test]
    fn test_groups_by_identity() {
        let input = vec![
            phase("Whisper", "preprocessing", &[1.0, 2.0]),
            phase("Whisper", "inferencing", &[3.0]),
            phase("Whisper", "preprocessing", &[4.0]),
            phase("Basic", "inferencing", &[5.0, 6.0, 7.0]),
            phase("Whisper", "inferencing", &[8.0, 9.0]),
        ];

        let merged = merge(&input);
        assert_eq!(merged.len(), 3);

        assert_eq!(merged[0].title(), "Whisper: preprocessing");
        assert_eq!(merged[0].raw_samples(), &[1.0, 2.0, 4.0]);
        assert_eq!(merged[1].title(), "Whisper: inferencing");
        assert_eq!(merged[1].raw_samples(), &[3.0, 8.0, 9.0]);
        assert_eq!(merged[2].title(), "Basic: inferencing");
        assert_eq!(merged[2].len(), 3);
        assert!(merged.iter().all(|m| m.units() == Some("s")));
    }

    #[test]
    fn test_normalizes_per_run() {
        let m = phase("Basic", "mul/sum", &[10.0, 20.0]).with_per_run(NonZeroU32::new(2).unwrap());

        let merged = merge(&[m]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].raw_samples(), &[5.0, 10.0]);
        assert_eq!(merged[0].per_run().get(), 1);
    }

    #[test]
    fn test_drops_metadata() {
        let mut metadata = Map::new();
        metadata.insert("testing".to_string(), true.into());
        let m = phase("Basic", "bmm", &[1.0]).with_metadata(metadata);

        let merged = merge(&[m]);
        assert!(merged[0].metadata().is_none());
    }

    #[test]
    fn test_identities_differing_in_env_stay_apart() {
        let a = phase("Basic", "bmm", &[1.0]);
        let b = Measurement::new(
            MetricIdentity::labeled("Basic")
                .with_sub_label("bmm")
                .with_env(Some("edge".to_string())),
            vec![2.0],
        );

        let merged = merge(&[a, b]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge(&[]).is_empty());
    }

    #[test]
    fn test_sample_counts_are_summed() {
        let input: Vec<Measurement> = (0..5)
            .map(|i| phase("Basic", "bmm", &vec![1.0; i + 1]))
            .collect();

        let merged = merge(&input);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].len(), 1 + 2 + 3 + 4 + 5);
    }
}
