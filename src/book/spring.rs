/// Critically damped spring
///
/// Both the page turn and the front cover move on one of these. Integration
/// is semi-implicit Euler with the time step clamped, so a stalled frame
/// (window drag, breakpoint) cannot fling the page.

/// Longest time step integrated in one go, in seconds
pub const MAX_DT: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub stiffness: f32,
    pub damping: f32,
}

impl Spring {
    /// Spring with damping `2 * sqrt(k)`: fastest approach without overshoot
    pub fn critical(stiffness: f32) -> Self {
        Self {
            stiffness,
            damping: 2.0 * stiffness.sqrt(),
        }
    }

    /// Advance `value`/`velocity` toward `target` by `dt` seconds
    pub fn step(&self, value: &mut f32, velocity: &mut f32, target: f32, dt: f32) {
        let dt = dt.clamp(0.0, MAX_DT);
        let dx = *value - target;
        *velocity += (-self.stiffness * dx - self.damping * *velocity) * dt;
        *value += *velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_damping() {
        let spring = Spring::critical(12.0);
        assert!((spring.damping - 2.0 * 12f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_converges_without_overshoot() {
        let spring = Spring::critical(12.0);
        let (mut x, mut v) = (0.0, 0.0);
        for _ in 0..600 {
            spring.step(&mut x, &mut v, 1.0, 1.0 / 60.0);
            assert!(x <= 1.0 + 1e-3, "overshot to {}", x);
        }
        assert!((x - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let spring = Spring::critical(10.0);
        let (mut a, mut va) = (0.0, 0.0);
        let (mut b, mut vb) = (0.0, 0.0);

        spring.step(&mut a, &mut va, 1.0, 5.0);
        spring.step(&mut b, &mut vb, 1.0, MAX_DT);
        assert_eq!(a, b);
        assert_eq!(va, vb);
    }
}
