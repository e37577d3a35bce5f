//! 2D vector maths and the handful of numeric helpers the bodies share.

/// An immutable 2D value type. Arithmetic always produces a new copy.
pub type Vector2 = glam::DVec2;

/// Divide a displacement by the canvas size, each axis independently.
///
/// The result is in "canvas fractions", so a particle one canvas-width away horizontally is as
/// far away as one that is a canvas-height away vertically. This is deliberately not a true
/// Euclidean normalisation.
#[must_use]
pub fn canvas_fraction(delta: Vector2, width: f64, height: f64) -> Vector2 {
    Vector2::new(delta.x / width, delta.y / height)
}

/// The sign of a distance, where zero counts as negative.
#[must_use]
pub fn sign(distance: f64) -> f64 {
    if distance > 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// A random float in `[min, max)`. Returns `min` for an empty range.
pub fn random_range<R: rand::Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..max)
}

/// A random integer in `[min, max]`, inclusive.
///
/// Inverted bounds are swapped rather than panicking. Spawning near a narrow cloud can produce
/// them.
pub fn random_int_range<R: rand::Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    let low = min.min(max);
    let high = min.max(max);
    rng.gen_range(low..=high)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_copies() {
        let a = Vector2::new(3.0, 4.0);
        let b = Vector2::new(1.0, 1.0);

        assert_eq!(a + b, Vector2::new(4.0, 5.0));
        assert_eq!(a - b, Vector2::new(2.0, 3.0));
        assert_eq!(a * 2.0, Vector2::new(6.0, 8.0));
        assert!((a.length_squared() - 25.0).abs() < f64::EPSILON);
        assert!((a.length() - 5.0).abs() < f64::EPSILON);
        assert!((a.distance(Vector2::ZERO) - 5.0).abs() < f64::EPSILON);
        assert_eq!(a, Vector2::new(3.0, 4.0));
    }

    #[test]
    fn fractions_are_per_axis() {
        let fraction = canvas_fraction(Vector2::new(50.0, 50.0), 100.0, 200.0);
        assert!((fraction.x - 0.5).abs() < f64::EPSILON);
        assert!((fraction.y - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_has_a_negative_sign() {
        assert!((sign(0.0) + 1.0).abs() < f64::EPSILON);
        assert!((sign(-0.0) + 1.0).abs() < f64::EPSILON);
        assert!((sign(0.1) - 1.0).abs() < f64::EPSILON);
        assert!((sign(-3.0) + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_length_propagates_nan() {
        let delta = Vector2::ZERO;
        let normalised = delta / delta.length();
        assert!(normalised.x.is_nan());
    }

    #[test]
    fn inverted_int_ranges_dont_panic() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let value = random_int_range(&mut rng, 100, 60);
            assert!((60..=100).contains(&value));
        }
        assert_eq!(random_int_range(&mut rng, 7, 7), 7);
    }

    #[test]
    fn empty_float_ranges_return_min() {
        let mut rng = rand::thread_rng();
        assert!((random_range(&mut rng, 2.0, 2.0) - 2.0).abs() < f64::EPSILON);
        let value = random_range(&mut rng, 0.1, 1.0);
        assert!((0.1..1.0).contains(&value));
    }
}
