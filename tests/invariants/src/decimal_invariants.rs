//! Property-based tests for fixed-point decimal arithmetic.
//!
//! Properties tested:
//! 1. Addition and subtraction are exact inverses
//! 2. Multiplication is commutative and `one` is its identity
//! 3. Rounding moves a value by at most one half
//! 4. Halves round away from zero
//! 5. Ordering agrees with the sign of the difference
//! 6. A basis-point fraction of a non-negative amount never exceeds it

#[cfg(test)]
mod tests {
    use {proptest::prelude::*, stakeline_decimal::Dec};

    const SCALE: u64 = 10_000_000_000;

    fn build(negative: bool, integer: u64, fraction: u64) -> Dec {
        let sign = if negative { "-" } else { "" };
        format!("{sign}{integer}.{fraction:010}").parse().unwrap()
    }

    /// Decimals spanning twelve integer digits and the full fractional
    /// precision.
    fn arb_dec() -> impl Strategy<Value = Dec> {
        (any::<bool>(), 0..1_000_000_000_000u64, 0..SCALE)
            .prop_map(|(negative, integer, fraction)| build(negative, integer, fraction))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1. Exact addition
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn add_then_sub_is_identity(a in arb_dec(), b in arb_dec()) {
            let sum = &a + &b;
            prop_assert_eq!(&sum - &b, a.clone());
            prop_assert_eq!(&sum - &a, b);
        }

        #[test]
        fn negation_cancels(a in arb_dec()) {
            prop_assert!((&a + &(-&a)).is_zero());
            prop_assert_eq!(-(-a.clone()), a);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 2. Multiplication
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn mul_is_commutative(a in arb_dec(), b in arb_dec()) {
            prop_assert_eq!(&a * &b, &b * &a);
        }

        #[test]
        fn mul_by_one_is_identity(a in arb_dec()) {
            prop_assert_eq!(&a * &Dec::one(), a.clone());
            prop_assert!((&a * &Dec::zero()).is_zero());
        }

        /// Integer products carry no rounding.
        #[test]
        fn whole_number_products_are_exact(a in -1_000_000_000i64..1_000_000_000, b in -1_000_000i64..1_000_000) {
            prop_assert_eq!(
                Dec::from_int(a) * Dec::from_int(b),
                Dec::from_i128(i128::from(a) * i128::from(b))
            );
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 3. Rounding
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn round_moves_at_most_one_half(a in arb_dec()) {
            let rounded = a.round();
            let half: Dec = "0.5".parse().unwrap();
            prop_assert!((&rounded - &a).abs() <= half, "{} rounded to {}", a, rounded);
            prop_assert_eq!(rounded.round(), rounded.clone());
            prop_assert_eq!(
                rounded.round_to_i128().map(Dec::from_i128),
                Some(rounded)
            );
        }

        #[test]
        fn halves_round_away_from_zero(negative in any::<bool>(), integer in 0..1_000_000_000u64) {
            let value = build(negative, integer, SCALE / 2);
            let rounded = value.round();
            prop_assert!(rounded.abs() > value.abs());
            prop_assert_eq!(rounded.is_negative(), negative);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 4. Ordering and fractions
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn ordering_matches_difference_sign(a in arb_dec(), b in arb_dec()) {
            let diff = &b - &a;
            prop_assert_eq!(a < b, diff.is_positive());
            prop_assert_eq!(a == b, diff.is_zero());
            prop_assert_eq!(a > b, diff.is_negative());
        }

        #[test]
        fn bps_fraction_never_exceeds_amount(amount in 0..1_000_000_000_000i64, bps in 0..=10_000u64) {
            let whole = Dec::from_int(amount);
            let part = &whole * &Dec::from_bps(bps);
            prop_assert!(!part.is_negative());
            prop_assert!(part <= whole);
            prop_assert!(part.round() <= whole);
        }
    }
}
