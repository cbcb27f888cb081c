//! Property-based tests for the slashing engine.
//!
//! Properties tested:
//! 1. Slashing never drives a validator or an entry balance negative
//! 2. Tokens burned never exceed what the validator held
//! 3. Supply drops by exactly the burn plus the entry penalties
//! 4. Only entries created at or after the infraction height pay
//! 5. Mature entries never pay
//! 6. Repeated slashes of one entry are additive on its initial balance
//! 7. Slashing an absent validator changes nothing
//! 8. Repeated redelegation slashes keep the entry balance within
//!    `[0, initial_balance]` and never leave negative destination shares

#[cfg(test)]
mod tests {
    use {
        proptest::prelude::*,
        stakeline_decimal::Dec,
        stakeline_staking::{
            slash,
            slashing::{slash_redelegation, slash_unbonding_delegation},
            Address, BlockContext, ConsPubKey,
            Keeper, MemoryStore, StakingParams, StakingStore, UnbondingDelegation,
        },
    };

    const SUPPLY: i64 = 100_000_000;
    const START_TIME: i64 = 1_000;

    struct Scenario {
        keeper: Keeper<MemoryStore>,
        pubkey: ConsPubKey,
        operator: Address,
        delegator: Address,
    }

    impl Scenario {
        fn validator_tokens(&self) -> Dec {
            self.keeper
                .validator(&self.operator)
                .unwrap()
                .map(|v| v.tokens)
                .unwrap_or_default()
        }

        fn entry(&self) -> UnbondingDelegation {
            self.keeper
                .unbonding_delegation(&self.delegator, &self.operator)
                .unwrap()
                .unwrap()
        }

        fn supply(&self) -> Dec {
            self.keeper.pool().unwrap().total_supply()
        }
    }

    /// A bonded validator with `self_bond`, a delegator who bonded
    /// `delegated` at height 1, and an unbonding delegation of `unbonded`
    /// of those shares created at height 2, five seconds later.
    fn scenario(unbonding_time: i64, self_bond: i64, delegated: i64, unbonded: i64) -> Scenario {
        let params = StakingParams {
            unbonding_time,
            max_evidence_age: unbonding_time,
            ..Default::default()
        };
        let mut keeper = Keeper::new(MemoryStore::new(), params);
        let mut pool = keeper.pool().unwrap();
        pool.loose_tokens = Dec::from_int(SUPPLY);
        keeper.set_pool(&pool).unwrap();

        let genesis = BlockContext::new(1, START_TIME);
        let operator = Address::new_unique();
        let pubkey = ConsPubKey::new_unique();
        keeper
            .create_validator(&genesis, operator, pubkey, &Dec::from_int(self_bond))
            .unwrap();
        let delegator = Address::new_unique();
        keeper
            .delegate(&genesis, delegator, operator, &Dec::from_int(delegated))
            .unwrap();
        keeper
            .begin_unbonding(
                &BlockContext::new(2, START_TIME + 5),
                delegator,
                operator,
                &Dec::from_int(unbonded),
            )
            .unwrap();

        Scenario {
            keeper,
            pubkey,
            operator,
            delegator,
        }
    }

    /// `(self_bond, delegated, unbonded)` with `unbonded <= delegated`.
    fn arb_stakes() -> impl Strategy<Value = (i64, i64, i64)> {
        (1..1_000_000i64, 1..1_000_000i64)
            .prop_flat_map(|(self_bond, delegated)| (Just(self_bond), Just(delegated), 1..=delegated))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1-4. Bounds, conservation and height gating
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn slash_respects_bounds_and_conserves_supply(
            (self_bond, delegated, unbonded) in arb_stakes(),
            power in 0..4_000_000i64,
            bps in 0..=10_000u64,
            infraction_height in 1..=4i64,
        ) {
            let mut s = scenario(1_000, self_bond, delegated, unbonded);
            let ctx = BlockContext::new(4, START_TIME + 15);
            let fraction = Dec::from_bps(bps);
            let tokens_before = s.validator_tokens();
            let supply_before = s.supply();

            let outcome = slash(&mut s.keeper, &ctx, &s.pubkey, infraction_height, power, &fraction)
                .unwrap()
                .unwrap();

            // ── INVARIANT: nothing goes negative ──
            let tokens_after = s.validator_tokens();
            prop_assert!(!tokens_after.is_negative());
            let entry = s.entry();
            prop_assert!(!entry.balance.is_negative());
            prop_assert!(entry.balance <= entry.initial_balance);

            // ── INVARIANT: burn is bounded by what the validator held ──
            prop_assert!(outcome.tokens_burned <= tokens_before);
            prop_assert_eq!(&tokens_before - &outcome.tokens_burned, tokens_after.clone());
            prop_assert_eq!(outcome.validator_removed, tokens_after.is_zero());

            // ── INVARIANT: every burned token leaves the supply ──
            // A penalty that rounds to nothing leaves the entry and the
            // pool untouched.
            let entry_cut = if entry.balance < entry.initial_balance {
                outcome.unbonding_slashed.clone()
            } else {
                Dec::zero()
            };
            let burned = &outcome.tokens_burned + &entry_cut;
            prop_assert_eq!(s.supply(), &supply_before - &burned);

            // ── INVARIANT: the entry pays only if created at or after the
            //    infraction, and only when the infraction is in the past ──
            let eligible = infraction_height <= 2 && infraction_height < ctx.height;
            let initial = Dec::from_int(unbonded);
            if eligible {
                let penalty = &initial * &fraction;
                prop_assert_eq!(outcome.unbonding_slashed.clone(), penalty.clone());
                prop_assert_eq!(entry.balance, &initial - &penalty.round());
            } else {
                prop_assert!(outcome.unbonding_slashed.is_zero());
                prop_assert_eq!(entry.balance, initial);
            }

            let expected_burn = (&outcome.slash_amount - &outcome.unbonding_slashed)
                .min(tokens_before);
            prop_assert_eq!(outcome.tokens_burned, expected_burn);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 5. Maturity gating
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn mature_entries_are_never_slashed(
            unbonding_time in 1..100i64,
            elapsed in 6..200i64,
            bps in 10..=10_000u64,
        ) {
            let mut s = scenario(unbonding_time, 1_000, 500, 500);
            let min_time = START_TIME + 5 + unbonding_time;
            let ctx = BlockContext::new(10, START_TIME + elapsed);

            let outcome = slash(&mut s.keeper, &ctx, &s.pubkey, 2, 1_500, &Dec::from_bps(bps))
                .unwrap()
                .unwrap();

            let entry = s.entry();
            if min_time < ctx.time {
                prop_assert!(outcome.unbonding_slashed.is_zero());
                prop_assert_eq!(entry.balance, Dec::from_int(500));
            } else {
                prop_assert!(outcome.unbonding_slashed.is_positive());
                prop_assert!(entry.balance < Dec::from_int(500));
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 6. Additive proportionality
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn repeated_entry_slashes_are_additive(
            balance in 1..10_000_000i64,
            bps1 in 0..=10_000u64,
            bps2 in 0..=10_000u64,
        ) {
            let mut keeper = Keeper::new(MemoryStore::new(), StakingParams::default());
            let initial = Dec::from_int(balance);
            let entry = UnbondingDelegation {
                delegator: Address::new_unique(),
                validator: Address::new_unique(),
                creation_height: 5,
                min_time: START_TIME * 10,
                initial_balance: initial.clone(),
                balance: initial.clone(),
            };
            keeper.set_unbonding_delegation(&entry).unwrap();
            let ctx = BlockContext::new(10, START_TIME);
            let (f1, f2) = (Dec::from_bps(bps1), Dec::from_bps(bps2));

            let p1 = slash_unbonding_delegation(&mut keeper, &ctx, entry.clone(), 5, &f1).unwrap();
            let after_first = keeper
                .unbonding_delegation(&entry.delegator, &entry.validator)
                .unwrap()
                .unwrap();
            let p2 = slash_unbonding_delegation(&mut keeper, &ctx, after_first, 5, &f2).unwrap();
            let last = keeper
                .unbonding_delegation(&entry.delegator, &entry.validator)
                .unwrap()
                .unwrap();

            // Penalties are nominal and measured on the initial balance.
            prop_assert_eq!(p1, &initial * &f1);
            prop_assert_eq!(p2, &initial * &f2);

            let r1 = (&initial * &f1).round();
            let r2 = (&initial * &f2).round();
            let expected = (&initial - &r1 - &r2).max(Dec::zero());
            prop_assert_eq!(last.balance.clone(), expected);

            // At least as harsh as compounding, up to one unit of rounding.
            let compound = &initial * &(Dec::one() - &f1) * &(Dec::one() - &f2);
            prop_assert!(last.balance <= &compound + &Dec::one());
            prop_assert!(!last.balance.is_negative());
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 7. Absent validators
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn absent_validator_is_a_noop(
            power in 0..1_000_000i64,
            bps in 0..=10_000u64,
            infraction_height in 1..=4i64,
        ) {
            let mut s = scenario(1_000, 1_000, 100, 50);
            let before = s.keeper.store().clone();
            let ctx = BlockContext::new(4, START_TIME + 15);

            let result = slash(
                &mut s.keeper,
                &ctx,
                &ConsPubKey::new_unique(),
                infraction_height,
                power,
                &Dec::from_bps(bps),
            );

            prop_assert_eq!(result, Ok(None));
            prop_assert!(s.keeper.store() == &before);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 8. Repeated redelegation slashes
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn repeated_redelegation_slashes_stay_bounded(
            (self_bond, delegated, moved) in arb_stakes(),
            dst_bond in 1..1_000_000i64,
            fractions in prop::collection::vec(0..=10_000u64, 1..8),
        ) {
            let params = StakingParams {
                unbonding_time: 1_000,
                max_evidence_age: 1_000,
                ..Default::default()
            };
            let mut keeper = Keeper::new(MemoryStore::new(), params);
            let mut pool = keeper.pool().unwrap();
            pool.loose_tokens = Dec::from_int(SUPPLY);
            keeper.set_pool(&pool).unwrap();

            let genesis = BlockContext::new(1, START_TIME);
            let (src, dst) = (Address::new_unique(), Address::new_unique());
            keeper
                .create_validator(&genesis, src, ConsPubKey::new_unique(), &Dec::from_int(self_bond))
                .unwrap();
            keeper
                .create_validator(&genesis, dst, ConsPubKey::new_unique(), &Dec::from_int(dst_bond))
                .unwrap();
            let delegator = Address::new_unique();
            keeper
                .delegate(&genesis, delegator, src, &Dec::from_int(delegated))
                .unwrap();
            let created = keeper
                .begin_redelegation(
                    &BlockContext::new(2, START_TIME + 5),
                    delegator,
                    src,
                    dst,
                    &Dec::from_int(moved),
                )
                .unwrap();
            let initial = created.initial_balance.clone();

            let ctx = BlockContext::new(4, START_TIME + 15);
            let src_validator = keeper.validator(&src).unwrap().unwrap();
            for bps in fractions {
                let fraction = Dec::from_bps(bps);
                let entry = keeper.redelegation(&delegator, &src, &dst).unwrap().unwrap();
                let penalty =
                    slash_redelegation(&mut keeper, &ctx, &src_validator, entry, 2, &fraction).unwrap();
                prop_assert_eq!(penalty, &initial * &fraction);

                let entry = keeper.redelegation(&delegator, &src, &dst).unwrap().unwrap();
                prop_assert!(!entry.balance.is_negative());
                prop_assert!(entry.balance <= initial);
                prop_assert_eq!(entry.initial_balance.clone(), initial.clone());

                if let Some(delegation) = keeper.delegation(&delegator, &dst).unwrap() {
                    prop_assert!(delegation.shares.is_positive());
                    prop_assert!(delegation.shares <= entry.shares_dst);
                }
                let dst_validator = keeper.validator(&dst).unwrap().unwrap();
                prop_assert!(!dst_validator.tokens.is_negative());
                prop_assert!(!dst_validator.delegator_shares.is_negative());
                prop_assert!(!keeper.pool().unwrap().loose_tokens.is_negative());
            }
        }
    }
}
