use brujula_core::aggregate::{consolidated, dimension_summary, NoData};
use brujula_core::scale::{filter, ScaleRegistry, Selection};
use brujula_core::{Dimension, Feature, FeatureTable, Variable};
use proptest::prelude::*;
use proptest::test_runner::Config;

const PREFIXES: [&str; 6] = ["DEPTO-", "DPTO-", "MUN-1", "MUN-2", "LOC-", "MAN-"];

fn arb_feature() -> impl Strategy<Value = Feature> {
    (
        0..PREFIXES.len(),
        0u32..1000,
        prop::collection::vec(prop::option::of(0u8..=4), 25),
        0usize..4,
    )
        .prop_map(|(prefix, n, scores, indicator)| {
            let mut f = Feature::new(format!("{}{n:03}", PREFIXES[prefix]), None);
            // 25 scores per feature, spread over the five dimensions of one indicator.
            let variables = Variable::all().skip(indicator * 25).take(25);
            for (v, s) in variables.zip(scores) {
                f = f.with_score(v, s);
            }
            f
        })
}

fn arb_table() -> impl Strategy<Value = FeatureTable> {
    prop::collection::vec(arb_feature(), 0..40).prop_map(FeatureTable::new)
}

fn cods(selection: &Selection<'_>) -> Vec<String> {
    selection.rows().iter().map(|f| f.cod().to_string()).collect()
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn filtering_twice_by_the_same_scale_is_idempotent(table in arb_table(), scale in 0usize..5) {
        let registry = ScaleRegistry::santa_maria();
        let option = &registry.options()[scale];
        let once = filter(&table, option, None);
        let twice = once.clone().scale(option);
        prop_assert_eq!(cods(&once), cods(&twice));
        prop_assert!(once.rows().iter().all(|f| option.matches(f.cod())));
    }

    #[test]
    fn summary_means_and_totals_are_bounded(table in arb_table(), scale in 0usize..5, dim in 0usize..5) {
        let registry = ScaleRegistry::santa_maria();
        let selection = filter(&table, &registry.options()[scale], None);
        match dimension_summary(&selection, Dimension::ALL[dim]) {
            Ok(summary) => {
                for (i, total) in summary.totals.iter().enumerate() {
                    let sum: f64 = summary.rows.iter().filter_map(|r| r.values[i]).sum();
                    prop_assert!((total - sum).abs() < 1e-9);
                    prop_assert!((0.0..=20.0).contains(total));
                }
                for row in &summary.rows {
                    for value in row.values.iter().flatten() {
                        prop_assert!((0.0..=4.0).contains(value));
                    }
                }
            }
            Err(NoData::EmptySelection) => {
                prop_assert!(selection.is_empty());
            }
            Err(reason) => {
                prop_assert_eq!(reason, NoData::NoScores);
            }
        }
    }

    #[test]
    fn consolidated_totals_are_bounded(table in arb_table(), scale in 0usize..5) {
        let registry = ScaleRegistry::santa_maria();
        let selection = filter(&table, &registry.options()[scale], None);
        if let Ok(summary) = consolidated(&selection) {
            prop_assert_eq!(summary.rows.len(), 5);
            for total in summary.totals {
                prop_assert!((0.0..=20.0).contains(&total));
            }
        }
    }
}

#[test]
fn every_variable_has_a_stable_label() {
    let all: Vec<Variable> = Variable::all().collect();
    assert_eq!(all.len(), 100);
    for v in all {
        assert!(!v.label().is_empty(), "{v}");
        assert_eq!(v.label(), Variable::parse(&v.code()).unwrap().label());
        assert_eq!(v.label(), v.item().label());
    }
}
