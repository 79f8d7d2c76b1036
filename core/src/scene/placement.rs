//! Random placement of pulse copies into pulse-width-aligned slots.

use crate::prelude::{require_positive, StageError, StageResult};
use num_complex::Complex64;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A slot whose Bernoulli trial succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulsePlacement {
    pub slot: usize,
    /// First scene sample the pulse occupies.
    pub offset: usize,
}

/// Number of pulse-width slots spanning `duration`, `round(T / pw)`.
pub fn slot_count(duration: f64, pulse_width: f64) -> StageResult<usize> {
    require_positive("analysis duration", duration)?;
    require_positive("pulse width", pulse_width)?;
    Ok((duration / pulse_width).round() as usize)
}

/// Flips one fair coin per slot and adds `pulse` into `scene` at
/// `slot * pulse.len()` for every success. The slot layout is checked
/// against the scene length before any draw is made.
pub fn place_pulses<R: Rng>(
    scene: &mut [Complex64],
    pulse: &[Complex64],
    slots: usize,
    rng: &mut R,
) -> StageResult<Vec<PulsePlacement>> {
    if pulse.is_empty() {
        return Err(StageError::InvalidConfig("pulse has no samples".into()));
    }
    let overflow = || StageError::PlacementOverflow {
        slots,
        pulse_len: pulse.len(),
        scene_len: scene.len(),
    };
    let required = slots.checked_mul(pulse.len()).ok_or_else(overflow)?;
    if required > scene.len() {
        return Err(overflow());
    }

    let mut placements = Vec::new();
    for slot in 0..slots {
        if !rng.gen_bool(0.5) {
            continue;
        }
        let offset = slot * pulse.len();
        scene[offset..offset + pulse.len()]
            .iter_mut()
            .zip(pulse)
            .for_each(|(dst, &src)| *dst += src);
        placements.push(PulsePlacement { slot, offset });
    }
    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const SCENE_LEN: usize = 500_000;
    const PULSE_LEN: usize = 50_000;

    #[test]
    fn placements_stay_inside_scene_on_slot_boundaries() {
        let pulse = vec![Complex64::new(1.0, 0.0); PULSE_LEN];
        let mut accepted_any = false;
        let mut rejected_any = false;

        for seed in 0..8 {
            let mut scene = vec![Complex64::new(0.0, 0.0); SCENE_LEN];
            let mut rng = StdRng::seed_from_u64(seed);
            let placements = place_pulses(&mut scene, &pulse, 10, &mut rng).unwrap();

            accepted_any |= !placements.is_empty();
            rejected_any |= placements.len() < 10;
            for placement in &placements {
                assert_eq!(placement.offset % PULSE_LEN, 0);
                assert_eq!(placement.offset, placement.slot * PULSE_LEN);
                assert!(placement.offset + PULSE_LEN <= SCENE_LEN);
            }

            // exactly the accepted slots carry energy
            for slot in 0..10 {
                let occupied = placements.iter().any(|p| p.slot == slot);
                let start = slot * PULSE_LEN;
                let filled = scene[start..start + PULSE_LEN]
                    .iter()
                    .all(|v| *v == Complex64::new(1.0, 0.0));
                let empty = scene[start..start + PULSE_LEN]
                    .iter()
                    .all(|v| *v == Complex64::new(0.0, 0.0));
                assert!(if occupied { filled } else { empty });
            }
        }
        assert!(accepted_any && rejected_any);
    }

    #[test]
    fn same_seed_places_same_slots() {
        let pulse = vec![Complex64::new(0.5, -0.5); 16];
        let mut a = vec![Complex64::new(0.0, 0.0); 16 * 40];
        let mut b = a.clone();
        let first = place_pulses(&mut a, &pulse, 40, &mut StdRng::seed_from_u64(123)).unwrap();
        let second = place_pulses(&mut b, &pulse, 40, &mut StdRng::seed_from_u64(123)).unwrap();
        assert_eq!(first, second);
        assert_eq!(a, b);
    }

    #[test]
    fn overflowing_layout_is_rejected_without_touching_scene() {
        let pulse = vec![Complex64::new(1.0, 0.0); PULSE_LEN];
        let mut scene = vec![Complex64::new(0.0, 0.0); SCENE_LEN];
        let err = place_pulses(&mut scene, &pulse, 11, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(
            err,
            StageError::PlacementOverflow {
                slots: 11,
                pulse_len: PULSE_LEN,
                scene_len: SCENE_LEN,
            }
        );
        assert!(scene.iter().all(|v| v.norm() == 0.0));
    }

    #[test]
    fn slot_count_rounds_duration_over_width() {
        assert_eq!(slot_count(1e-3, 10e-6).unwrap(), 100);
        assert_eq!(slot_count(1e-4, 10e-6).unwrap(), 10);
        assert!(slot_count(1e-3, 0.0).is_err());
    }
}
