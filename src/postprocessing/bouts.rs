use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Maximal run of a constant value; `start` and `stop` are inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bout {
    pub start: usize,
    pub stop: usize,
    pub dur: usize,
    pub value: f64,
}

/// Run-length encode a sequence into bouts, in order
pub fn vect2bouts(v: &Array1<f64>) -> Vec<Bout> {
    let mut bouts: Vec<Bout> = Vec::new();
    for (i, &value) in v.iter().enumerate() {
        match bouts.last_mut() {
            Some(bout) if bout.value == value => {
                bout.stop = i;
                bout.dur += 1;
            }
            _ => bouts.push(Bout {
                start: i,
                stop: i,
                dur: 1,
                value,
            }),
        }
    }
    bouts
}

/// Fill every negative bout shorter than `min_gap_frames` with positives.
///
/// Edge bouts are treated like interior ones. Filling only removes negative
/// runs, so one pass is enough.
pub fn merge_short_gaps(decisions: &Array1<f64>, min_gap_frames: usize) -> Array1<f64> {
    let mut out = decisions.clone();
    for bout in vect2bouts(decisions) {
        if bout.value == 0.0 && bout.dur < min_gap_frames {
            out.slice_mut(ndarray::s![bout.start..=bout.stop]).fill(1.0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_vect2bouts() {
        let bouts = vect2bouts(&array![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(bouts.len(), 3);
        assert_eq!(bouts[0], Bout { start: 0, stop: 1, dur: 2, value: 0.0 });
        assert_eq!(bouts[1], Bout { start: 2, stop: 2, dur: 1, value: 1.0 });
        assert_eq!(bouts[2], Bout { start: 3, stop: 3, dur: 1, value: 0.0 });
        assert!(vect2bouts(&Array1::zeros(0)).is_empty());
    }

    #[test]
    fn test_merge_fills_short_gaps() {
        let v = array![1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0];
        assert_eq!(merge_short_gaps(&v, 3), Array1::<f64>::ones(9));
    }

    #[test]
    fn test_merge_keeps_long_gaps() {
        let v = array![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0];
        let out = merge_short_gaps(&v, 3);
        assert_eq!(out, array![1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_merge_fills_edge_bouts() {
        let v = array![0.0, 1.0, 1.0, 0.0, 0.0];
        assert_eq!(merge_short_gaps(&v, 3), Array1::<f64>::ones(5));
        // an all-negative sequence is one edge bout too
        assert_eq!(merge_short_gaps(&Array1::zeros(2), 3), Array1::<f64>::ones(2));
        assert_eq!(merge_short_gaps(&Array1::zeros(3), 3), Array1::<f64>::zeros(3));
    }

    #[test]
    fn test_merge_zero_gap_is_identity() {
        let v = array![0.0, 1.0, 0.0];
        assert_eq!(merge_short_gaps(&v, 0), v);
        assert_eq!(merge_short_gaps(&v, 1), v);
    }
}
