use flexgemm_plan::{
    AlignmentMask, Direction, Extent2, Plan, ProblemDescriptor, RoutineFamily, RoutineId,
    aux_buffer_size, build_conv_plan, get_alignment, plan, select_backward, select_forward,
    select_unit_filter,
};
use proptest::prelude::*;

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Forward), Just(Direction::BackwardData)]
}

/// Modest generic convolutions: output extents follow the usual size formula.
fn conv_descriptor() -> impl Strategy<Value = ProblemDescriptor> {
    (
        1u32..=8,
        1u32..=64,
        1u32..=256,
        4u32..=64,
        prop_oneof![Just(1u32), Just(3), Just(5), Just(7)],
        0u32..=3,
        1u32..=2,
        1u32..=4,
        direction(),
    )
        .prop_map(|(batch, in_c, out_c, side, kernel, pad, stride, groups, dir)| {
            let pad = pad.min(kernel / 2);
            let span = side + 2 * pad;
            let out = if span >= kernel { (span - kernel) / stride + 1 } else { 1 };
            ProblemDescriptor::new(
                batch,
                in_c,
                out_c,
                Extent2::square(side),
                Extent2::square(kernel),
                Extent2::square(out),
            )
            .with_pad(Extent2::square(pad))
            .with_stride(Extent2::square(stride))
            .with_groups(groups)
            .with_direction(dir)
        })
}

// ── selectors ────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_selectors_stay_in_range(
        m in 1u32..=1 << 20,
        n in 1u32..=4096,
        k in 1u32..=8192,
        dir in direction(),
    ) {
        let uf = select_unit_filter(m, n, k, dir);
        prop_assert!(uf.id.get() <= RoutineFamily::UnitFilter.max_id());
        prop_assert!(uf.lanes.value() <= 2);
        prop_assert!(select_forward(n, k).get() <= RoutineFamily::Forward.max_id());
        prop_assert!(select_backward(n).get() <= RoutineFamily::Backward.max_id());
    }

    #[test]
    fn prop_selectors_are_deterministic(n in 1u32..=4096, k in 1u32..=8192) {
        prop_assert_eq!(select_forward(n, k), select_forward(n, k));
        prop_assert_eq!(select_backward(n), select_backward(n));
    }

    /// Narrow odd-tile widths take routine 1 whatever the depth; otherwise
    /// depths that are not a multiple of 8 take routine 0.
    #[test]
    fn prop_forward_override_order(n in 1u32..=4096, k in 1u32..=8192) {
        let narrow = n.div_ceil(16) % 2 == 1 && n <= 112;
        let id = select_forward(n, k);
        if narrow {
            prop_assert_eq!(id, RoutineId::new(1));
        } else if k % 8 != 0 {
            prop_assert_eq!(id, RoutineId::new(0));
        } else {
            prop_assert!(id.get() >= 2);
        }
    }

    /// Backward-data keeps the widest unit-filter routine only for `n % 4 == 0`.
    #[test]
    fn prop_unit_filter_backward_wide_needs_quad_channels(
        m in 1u32..=1 << 16,
        n in 1u32..=4096,
        k in 1u32..=4096,
    ) {
        let routine = select_unit_filter(m, n, k, Direction::BackwardData);
        if routine.id.get() == 3 {
            prop_assert_eq!(n % 4, 0);
        }
        if n % 2 != 0 && routine.id.get() != 0 {
            prop_assert_eq!(routine.id, RoutineId::new(1));
        }
    }

    #[test]
    fn prop_alignment_mask_set(id in 0u8..=4, dir in direction()) {
        let mask = get_alignment(RoutineId::new(id), dir);
        let narrow = match dir {
            Direction::Forward => id == 1 || id == 4,
            Direction::BackwardData => id == 0 || id == 3,
        };
        prop_assert_eq!(mask == AlignmentMask::Tile128, narrow);
    }
}

// ── plans ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every synthesized divisor in a plan reproduces integer division over its range.
    #[test]
    fn prop_plan_divisors_are_exact(desc in conv_descriptor()) {
        let plan = build_conv_plan(&desc).expect("plan");
        prop_assert_eq!(plan.amag.counterexample(plan.ldc, plan.ntidx), None);
        if let Some(cmag) = plan.cmag {
            prop_assert_eq!(cmag.counterexample(plan.output.width, plan.ldc), None);
        } else {
            prop_assert_eq!(plan.ldc, plan.output.width);
        }
    }

    #[test]
    fn prop_plan_invariants(desc in conv_descriptor()) {
        let plan = build_conv_plan(&desc).expect("plan");
        prop_assert!(plan.ntidx >= plan.m);
        prop_assert_eq!(plan.ntidx % (plan.alignment.mask() + 1), 0);
        prop_assert!(plan.pk >= plan.k && plan.pk % 8 == 0);
        prop_assert_eq!(plan.pad == 0, plan.scratch.padding == 0);
        prop_assert_eq!(desc.direction.is_forward(), plan.scratch.permutation == 0);
        prop_assert!(plan.scratch.index > 0);
        prop_assert_eq!(plan.aux_buffer_size(), aux_buffer_size(&desc).expect("aux size"));
        prop_assert_eq!(
            plan.aux_buffer_size(),
            plan.scratch.padding + plan.scratch.permutation + plan.scratch.index
        );
    }

    #[test]
    fn prop_scratch_monotone_in_batch(desc in conv_descriptor(), extra in 1u32..=8) {
        let small = build_conv_plan(&desc).expect("plan");
        let large = build_conv_plan(&ProblemDescriptor { batch: desc.batch + extra, ..desc })
            .expect("plan");
        prop_assert!(large.scratch.padding >= small.scratch.padding);
        prop_assert!(large.scratch.permutation >= small.scratch.permutation);
        prop_assert!(large.scratch.index >= small.scratch.index);
        prop_assert!(large.aux_buffer_size() >= small.aux_buffer_size());
    }

    #[test]
    fn prop_padding_monotone_in_input_channels(desc in conv_descriptor(), extra in 1u32..=32) {
        let small = build_conv_plan(&desc).expect("plan");
        let large =
            build_conv_plan(&ProblemDescriptor { in_channels: desc.in_channels + extra, ..desc })
                .expect("plan");
        prop_assert!(large.scratch.padding >= small.scratch.padding);
    }

    /// With the routine held fixed, more output channels never shrink the permutation buffer.
    #[test]
    fn prop_permutation_monotone_in_output_channels(desc in conv_descriptor(), extra in 1u32..=64) {
        let desc = desc.with_direction(Direction::BackwardData);
        let wider = ProblemDescriptor { out_channels: desc.out_channels + extra, ..desc };
        prop_assume!(select_backward(desc.out_channels) == select_backward(wider.out_channels));
        let small = build_conv_plan(&desc).expect("plan");
        let large = build_conv_plan(&wider).expect("plan");
        prop_assert!(large.scratch.permutation >= small.scratch.permutation);
    }

    #[test]
    fn prop_groups_scale_padding(desc in conv_descriptor(), g1 in 1u32..=4, g2 in 5u32..=8) {
        let one = build_conv_plan(&desc.with_groups(g1)).expect("plan");
        let two = build_conv_plan(&desc.with_groups(g2)).expect("plan");
        prop_assert_eq!(u64::from(g1) * two.scratch.padding, u64::from(g2) * one.scratch.padding);
        prop_assert_eq!(u64::from(g1) * two.scratch.permutation, u64::from(g2) * one.scratch.permutation);
        prop_assert_eq!(two.scratch.index, one.scratch.index);
    }

    /// Unit-filter plans: exact divisors and alignment for every image size.
    #[test]
    fn prop_unit_filter_plans(
        batch in 1u32..=8,
        in_c in 1u32..=512,
        out_c in 1u32..=512,
        width in 1u32..=64,
        height in 1u32..=64,
        dir in direction(),
    ) {
        let desc = ProblemDescriptor::new(
            batch,
            in_c,
            out_c,
            Extent2::new(width, height),
            Extent2::square(1),
            Extent2::new(width, height),
        )
        .with_direction(dir);
        let Plan::UnitFilter(plan) = plan(&desc).expect("plan") else {
            return Err(TestCaseError::fail("expected a unit-filter plan"));
        };
        prop_assert_eq!(plan.dimx, plan.m * batch);
        prop_assert!(plan.ntidx >= plan.dimx);
        prop_assert_eq!(plan.ntidx % (plan.alignment.mask() + 1), 0);
        prop_assert!(plan.sy <= plan.sx);
        prop_assert_eq!(plan.amag.counterexample(plan.m >> plan.sx, plan.ntidx >> plan.sx), None);
        prop_assert_eq!(plan.cmag.is_some(), plan.sx != plan.sy);
        if let Some(cmag) = plan.cmag {
            prop_assert_eq!(cmag.counterexample(plan.m >> plan.sy, plan.ntidx >> plan.sy), None);
        }
    }
}
