use crate::PaceError;

/// Value reported while the window has not yet filled.
pub const WARMUP_SENTINEL: f64 = 0.0;

pub const DEFAULT_WINDOW: usize = 20;

#[derive(Clone, Copy, Default)]
struct RollingState {
    sum: f64,
    undefined: usize,
}

/// Trailing simple moving average over the last `window` values.
///
/// Indices below `window - 1` hold [`WARMUP_SENTINEL`]. A window containing any
/// undefined value is itself undefined. Runs in O(n) regardless of `window`.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>, PaceError> {
    if window == 0 {
        return Err(PaceError::InvalidParameter(
            "smoothing window must be at least 1".into(),
        ));
    }

    let (_, out) = values.iter().enumerate().fold(
        (RollingState::default(), Vec::with_capacity(values.len())),
        |(mut state, mut out), (i, value)| {
            match value {
                Some(v) => state.sum += v,
                None => state.undefined += 1,
            }
            if i >= window {
                match values[i - window] {
                    Some(v) => state.sum -= v,
                    None => state.undefined -= 1,
                }
            }
            let smoothed = if i + 1 < window {
                Some(WARMUP_SENTINEL)
            } else if state.undefined > 0 {
                None
            } else {
                Some(state.sum / window as f64)
            };
            out.push(smoothed);
            (state, out)
        },
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
        (0..values.len())
            .map(|i| {
                if i + 1 < window {
                    return Some(WARMUP_SENTINEL);
                }
                let slice = &values[i + 1 - window..=i];
                let defined: Option<Vec<f64>> = slice.iter().copied().collect();
                defined.map(|v| v.iter().sum::<f64>() / window as f64)
            })
            .collect()
    }

    #[test]
    fn warmup_entries_hold_sentinel() {
        let values: Vec<Option<f64>> = (0..30).map(|i| Some(4.0 + i as f64 * 0.1)).collect();
        let smoothed = rolling_mean(&values, DEFAULT_WINDOW).unwrap();
        assert_eq!(smoothed.len(), values.len());
        assert!(smoothed[..19].iter().all(|v| *v == Some(WARMUP_SENTINEL)));
        assert!(smoothed[19].unwrap() > 0.0);
    }

    #[test]
    fn constant_input_is_preserved() {
        let values = vec![Some(5.25); 64];
        let smoothed = rolling_mean(&values, DEFAULT_WINDOW).unwrap();
        for v in &smoothed[19..] {
            assert!((v.unwrap() - 5.25).abs() < 1e-12);
        }
    }

    #[test]
    fn matches_window_mean() {
        let values: Vec<Option<f64>> = (0..100)
            .map(|i| Some(((i * 37) % 11) as f64 * 0.7 + 3.0))
            .collect();
        let fast = rolling_mean(&values, DEFAULT_WINDOW).unwrap();
        let slow = naive(&values, DEFAULT_WINDOW);
        for (a, b) in fast.iter().zip(slow.iter()) {
            assert!((a.unwrap() - b.unwrap()).abs() < 1e-9);
        }
        let expected: f64 = (40..60).map(|i| values[i].unwrap()).sum::<f64>() / 20.0;
        assert!((fast[59].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn undefined_values_poison_only_their_windows() {
        let mut values = vec![Some(6.0); 10];
        values[4] = None;
        let smoothed = rolling_mean(&values, 3).unwrap();
        assert_eq!(smoothed, naive(&values, 3));
        assert_eq!(smoothed[3], Some(6.0));
        assert_eq!(&smoothed[4..7], &[None, None, None]);
        assert_eq!(smoothed[7], Some(6.0));
    }

    #[test]
    fn short_and_degenerate_inputs() {
        assert!(rolling_mean(&[], DEFAULT_WINDOW).unwrap().is_empty());
        assert_eq!(
            rolling_mean(&[Some(1.0), Some(2.0)], DEFAULT_WINDOW).unwrap(),
            vec![Some(0.0), Some(0.0)]
        );
        assert_eq!(
            rolling_mean(&[Some(1.0), None], 1).unwrap(),
            vec![Some(1.0), None]
        );
        assert!(matches!(
            rolling_mean(&[Some(1.0)], 0),
            Err(PaceError::InvalidParameter(_))
        ));
    }
}
