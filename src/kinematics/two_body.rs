// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Two-body decay momentum.

/// Momentum of either daughter when a parent of mass `m` decays to daughters
/// of masses `m1` and `m2`, in the parent rest frame:
///
/// `P(M, m1, m2) = sqrt((M² - (m1 + m2)²)(M² - (m1 - m2)²)) / 2M`
///
/// Negative daughter masses are treated as zero. Kinematically forbidden
/// configurations (including `m <= 0`) give 0.
///
/// # Examples
///
/// ```
/// use jigsaw_reco::kinematics::two_body_momentum;
///
/// // Massless daughters share the parent mass equally.
/// assert!((two_body_momentum(100.0, 0.0, 0.0) - 50.0).abs() < 1e-12);
/// assert_eq!(two_body_momentum(10.0, 6.0, 6.0), 0.0);
/// ```
pub fn two_body_momentum(m: f64, m1: f64, m2: f64) -> f64 {
    if m <= 0.0 {
        return 0.0;
    }
    let m1 = m1.max(0.0);
    let m2 = m2.max(0.0);
    let m_sq = m * m;
    let product = (m_sq - (m1 + m2) * (m1 + m2)) * (m_sq - (m1 - m2) * (m1 - m2));
    if product <= 0.0 {
        return 0.0;
    }
    product.sqrt() / (2.0 * m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_in_daughters() {
        let a = two_body_momentum(250.0, 80.4, 91.2);
        let b = two_body_momentum(250.0, 91.2, 80.4);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_decreases_with_daughter_mass() {
        let light = two_body_momentum(250.0, 10.0, 10.0);
        let heavy = two_body_momentum(250.0, 80.0, 80.0);
        assert!(light > heavy);
    }

    #[test]
    fn test_one_massless_daughter() {
        // P = (M² - m²) / 2M
        let p = two_body_momentum(100.0, 60.0, 0.0);
        assert!((p - (100.0 * 100.0 - 60.0 * 60.0) / 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_forbidden_and_degenerate() {
        assert_eq!(two_body_momentum(0.0, 0.0, 0.0), 0.0);
        assert_eq!(two_body_momentum(-5.0, 1.0, 1.0), 0.0);
        assert_eq!(two_body_momentum(5.0, 3.0, 3.0), 0.0);
        assert!((two_body_momentum(10.0, -3.0, 0.0) - 5.0).abs() < 1e-12);
    }
}
