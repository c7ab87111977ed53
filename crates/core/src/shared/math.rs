//! Math shared by the detector and mesh stages.

/// Logistic function mapping a network logit to a probability.
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(10.0) - 1.0).abs() < 0.001);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_sigmoid_is_symmetric() {
        assert_relative_eq!(sigmoid(2.5) + sigmoid(-2.5), 1.0, epsilon = 1e-6);
    }
}
