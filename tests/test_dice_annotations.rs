mod common;

use rand::{rngs::StdRng, SeedableRng};
use rollwright::{evaluate, ExprKind, RollContext, Roller};

use common::r;

// =============================================================================
// Annotation Grammar Integration
// =============================================================================

#[test]
fn test_multiple_annotations_preserve_dice_result() {
    let mut roller = Roller::default();
    let annotated = roller.parse("4d6kh3[str][fire]", false).expect("annotated expression parses");
    let baseline = roller.parse("4d6kh3", false).expect("baseline expression parses");

    let rng_seed = 0xFEED_BEEF_u64;
    let mut ctx = RollContext::default();
    let annotated_result = evaluate(&annotated, &mut StdRng::seed_from_u64(rng_seed), &mut ctx)
        .expect("annotated evaluation succeeds");
    ctx.reset();
    let baseline_result = evaluate(&baseline, &mut StdRng::seed_from_u64(rng_seed), &mut ctx)
        .expect("baseline evaluation succeeds");

    assert!(
        (annotated_result.total().unwrap() - baseline_result.total().unwrap()).abs() < 1e-9,
        "annotations should not change totals"
    );

    let ExprKind::Expression { roll, .. } = &annotated_result.kind else {
        panic!("expected an Expression root")
    };
    assert_eq!(roll.annotation.as_deref(), Some("[str][fire]"));
    assert!(matches!(roll.kind, ExprKind::Dice { .. }), "inner value should be dice");
}

#[test]
fn test_nested_annotations_structure() {
    let mut roller = Roller::default();
    let ast = roller.parse("((1 + 2)[inner])[outer]", false).expect("parse nested annotations");
    let result = roller.roll(ast).expect("evaluate nested annotations");

    assert_eq!(result.total, 3);

    let ExprKind::Expression { roll, .. } = &result.expr.kind else {
        panic!("expected an Expression root")
    };
    let ExprKind::Parenthetical { value: outer_inner } = &roll.kind else {
        panic!("expected an outer parenthetical")
    };
    assert_eq!(roll.annotation.as_deref(), Some("[outer]"));
    assert_eq!(outer_inner.annotation.as_deref(), Some("[inner]"));
    assert!(
        matches!(outer_inner.kind, ExprKind::Parenthetical { .. }),
        "expected a parenthetical wrapping the binary operation"
    );
}

#[test]
fn test_annotations_with_set_operations() {
    // Baseline sanity check that expression stays in expected range even with annotations
    for _ in 0..100 {
        let value = r("(1d4, 2, 6)kh2[advantage]");
        assert!(
            (8.0..=10.0).contains(&value),
            "unexpected total from annotated set: {}",
            value
        );
    }
}
