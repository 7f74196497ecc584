use proptest::prelude::*;
use rollwright::Roller;

mod custom_strategies;
use custom_strategies::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        max_shrink_iters: 1000,
        timeout: 3000,
        .. ProptestConfig::default()
    })]

    /// Every generated string should either return a valid result or raise a handled error
    #[test]
    fn test_any_valid_roll(expr in expr_strategy()) {
        let mut roller = Roller::default();
        match roller.parse(&expr, false) {
            Ok(ast) => {
                // If it parses, evaluation should either succeed or return a handled error
                match roller.roll(ast) {
                    Ok(result) => {
                        prop_assert!((result.total as f64).is_finite());
                    }
                    Err(e) => {
                        let err_msg = format!("{}", e);
                        prop_assert!(!err_msg.is_empty(), "Error should have a message");
                    }
                }
            }
            Err(e) => {
                // Parse errors are acceptable for generated strings
                let err_msg = format!("{}", e);
                prop_assert!(!err_msg.is_empty(), "Error should have a message");
            }
        }
    }

    /// Test that dice expressions with operations don't panic
    #[test]
    fn test_dice_with_operations_no_panic(expr in dice_with_ops_strategy()) {
        let mut roller = Roller::default();
        let _ = roller.roll(expr.as_str());
    }

    /// Test that set expressions don't panic
    #[test]
    fn test_sets_no_panic(expr in set_expr_strategy()) {
        let mut roller = Roller::default();
        let _ = roller.roll(expr.as_str());
    }

    /// Test that arithmetic expressions produce finite results
    #[test]
    fn test_arithmetic_finite(expr in arithmetic_strategy()) {
        let mut roller = Roller::default();
        if let Ok(result) = roller.roll(expr.as_str()) {
            prop_assert!((result.total as f64).is_finite(), "Result should be finite: {}", result.total);
        }
    }
}
