/// Squared Euclidean distance, `sum((a_i - b_i)^2)`. No square root is taken,
/// so the value is what callers see as a score.
///
/// Both slices must have the same length; the caller checks dimensions once
/// per query rather than per row.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(squared_l2(&[1.0, 1.0], &[0.0, 0.0]), 2.0);
        assert_eq!(squared_l2(&[1.0, 1.0], &[10.0, 10.0]), 162.0);
        assert_eq!(squared_l2(&[], &[]), 0.0);
    }

    #[test]
    fn symmetric_and_zero_on_self() {
        let a = [0.3, -1.5, 2.25];
        let b = [1.0, 0.5, -0.75];
        assert_eq!(squared_l2(&a, &b), squared_l2(&b, &a));
        assert_eq!(squared_l2(&a, &a), 0.0);
    }
}
