// tarmac_core/src/models/curve.rs

/// Engine torque as a function of RPM, built from three control points:
/// idle, peak and redline.
///
/// Keys are joined with cubic Hermite segments. Tangents are flat at local
/// extrema and one-sided at the ends, so the curve never overshoots its peak.
#[derive(Debug, Clone, PartialEq)]
pub struct TorqueCurve {
    keys: [(f64, f64); 3],
    tangents: [f64; 3],
    /// (min_rpm, torque_at_rpm, max_rpm, max_torque) the curve was built from.
    source: [f64; 4],
}

impl TorqueCurve {
    pub fn new(min_rpm: f64, torque_at_rpm: f64, max_rpm: f64, max_torque: f64) -> Self {
        let keys = [
            (min_rpm, max_torque / 2.0),
            (torque_at_rpm, max_torque),
            (max_rpm, max_torque / 1.5),
        ];

        let slope = |a: (f64, f64), b: (f64, f64)| {
            let dx = b.0 - a.0;
            if dx.abs() < f64::EPSILON {
                0.0
            } else {
                (b.1 - a.1) / dx
            }
        };

        let middle = {
            let (prev, key, next) = (keys[0], keys[1], keys[2]);
            let is_extremum = (key.1 - prev.1) * (next.1 - key.1) <= 0.0;
            if is_extremum {
                0.0
            } else {
                slope(prev, next)
            }
        };

        Self {
            keys,
            tangents: [slope(keys[0], keys[1]), middle, slope(keys[1], keys[2])],
            source: [min_rpm, torque_at_rpm, max_rpm, max_torque],
        }
    }

    /// True if the curve was built from exactly these parameters.
    pub fn matches(&self, min_rpm: f64, torque_at_rpm: f64, max_rpm: f64, max_torque: f64) -> bool {
        self.source == [min_rpm, torque_at_rpm, max_rpm, max_torque]
    }

    /// Torque [Nm] at `rpm`. Outside the key range the end values are held.
    pub fn evaluate(&self, rpm: f64) -> f64 {
        let [k0, k1, k2] = self.keys;
        if rpm.is_nan() || rpm <= k0.0 {
            return k0.1;
        }
        if rpm >= k2.0 {
            return k2.1;
        }

        let (a, b, ma, mb) = if rpm < k1.0 {
            (k0, k1, self.tangents[0], self.tangents[1])
        } else {
            (k1, k2, self.tangents[1], self.tangents[2])
        };

        let dx = b.0 - a.0;
        if dx <= f64::EPSILON {
            return b.1;
        }
        let t = (rpm - a.0) / dx;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * a.1 + h10 * dx * ma + h01 * b.1 + h11 * dx * mb
    }
}
