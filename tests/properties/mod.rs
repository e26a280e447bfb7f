//! Property tests for the resolver, the selection policy and pin memory.

use proptest::prelude::*;

use ineq_engine::config::VariableSpec;
use ineq_engine::memory::MAX_PINS;
use ineq_engine::models::facets::{AgeBand, Gender};
use ineq_engine::utils::test::TableBuilder;
use ineq_engine::{
    Domain, DomainConfig, FacetAxis, FacetSelection, FacetValue, MeasureKind, MeasureResolver,
    ObservationStore, SelectionChange, SelectionPolicy, SeriesMemory, Statistic,
};

const CODES: [i32; 6] = [0, 101, 147, 151, 615, 751];

fn maybe_mean() -> impl Strategy<Value = Option<f64>> {
    prop::option::weighted(0.8, 50_000.0..500_000.0f64)
}

/// Per municipality: optional woman and man means
fn gender_rows() -> impl Strategy<Value = Vec<(i32, Option<f64>, Option<f64>)>> {
    proptest::sample::subsequence(CODES.to_vec(), 1..=CODES.len()).prop_flat_map(|codes| {
        let n = codes.len();
        (
            Just(codes),
            prop::collection::vec(maybe_mean(), n),
            prop::collection::vec(maybe_mean(), n),
        )
            .prop_map(|(codes, women, men)| {
                codes
                    .into_iter()
                    .zip(women)
                    .zip(men)
                    .map(|((code, w), m)| (code, w, m))
                    .collect()
            })
    })
}

fn gender_store(rows: &[(i32, Option<f64>, Option<f64>)], age: AgeBand) -> ObservationStore {
    let mut women = TableBuilder::new("income")
        .statistic(Statistic::Mean)
        .facet(FacetValue::Age(age))
        .facet(FacetValue::Gender(Gender::Woman));
    let mut men = TableBuilder::new("income")
        .statistic(Statistic::Mean)
        .facet(FacetValue::Age(age))
        .facet(FacetValue::Gender(Gender::Man));
    for (code, w, m) in rows {
        if let Some(w) = w {
            women = women.row(*code, *w);
        }
        if let Some(m) = m {
            men = men.row(*code, *m);
        }
    }
    ObservationStore::from_batches([(Domain::Income, vec![women.build(), men.build()])])
        .expect("generated rows conform")
}

fn gender_config() -> DomainConfig {
    DomainConfig::builder(Domain::Income)
        .variable(VariableSpec::continuous("income"))
        .statistics(&[Statistic::Gini, Statistic::Mean])
        .differences(&[MeasureKind::GenderDifference])
        .difference_statistic(Statistic::Mean)
        .build()
        .expect("descriptor is valid")
}

fn selection_change(domain: Domain) -> impl Strategy<Value = SelectionChange> {
    let config = DomainConfig::builtin(domain);
    let variables: Vec<SelectionChange> = config
        .variables()
        .iter()
        .map(|v| SelectionChange::Variable(v.key.clone()))
        .collect();
    let measures: Vec<SelectionChange> = MeasureKind::ALL
        .into_iter()
        .map(SelectionChange::Measure)
        .collect();
    let facets: Vec<SelectionChange> = FacetAxis::ALL
        .into_iter()
        .flat_map(|axis| config.facet_values(axis))
        .map(SelectionChange::Facet)
        .collect();
    prop_oneof![
        proptest::sample::select(variables),
        proptest::sample::select(measures),
        proptest::sample::select(facets),
    ]
}

fn domain_changes() -> impl Strategy<Value = (Domain, Vec<SelectionChange>)> {
    proptest::sample::select(Domain::ALL.to_vec()).prop_flat_map(|domain| {
        (
            Just(domain),
            prop::collection::vec(selection_change(domain), 1..12),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: swapping the contrast groups negates every difference.
    #[test]
    fn property_swapped_contrast_negates_difference(
        rows in gender_rows(),
        age in proptest::sample::select(AgeBand::VALUES[..5].to_vec()),
    ) {
        let store = gender_store(&rows, age);
        let config = gender_config();
        let resolver = MeasureResolver::new(&store, &config);
        let facets = FacetSelection::default().with(FacetValue::Age(age));
        let contrast = config
            .contrast(MeasureKind::GenderDifference)
            .expect("gender difference has a contrast");

        for year in [Some(2018), None] {
            let forward = resolver.resolve_contrast(contrast, "income", year, &facets).unwrap();
            let backward = resolver
                .resolve_contrast(contrast.swapped(), "income", year, &facets)
                .unwrap();
            prop_assert_eq!(forward.points.len(), backward.points.len());
            for (f, b) in forward.points.iter().zip(&backward.points) {
                prop_assert_eq!(f.municipality_code, b.municipality_code);
                prop_assert_eq!(f.value, b.value.map(|v| -v));
            }
        }
    }

    /// PROPERTY: the join keeps exactly the codes with both groups present.
    #[test]
    fn property_difference_is_inner_join(rows in gender_rows()) {
        let store = gender_store(&rows, AgeBand::All);
        let config = gender_config();
        let resolver = MeasureResolver::new(&store, &config);
        let resolution = resolver
            .resolve(MeasureKind::GenderDifference, "income", Some(2018), &FacetSelection::default())
            .unwrap();

        let expected: Vec<(i32, f64)> = rows
            .iter()
            .filter_map(|(code, w, m)| Some((*code, m.as_ref()? - w.as_ref()?)))
            .collect();
        let actual: Vec<(i32, f64)> = resolution
            .points
            .iter()
            .filter_map(|p| Some((p.municipality_code, p.value?)))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    /// PROPERTY: repeated identical queries return identical rows.
    #[test]
    fn property_query_is_idempotent(
        rows in gender_rows(),
        gender in proptest::sample::select(Gender::VALUES.to_vec()),
        year in prop::option::of(2017..2020i32),
    ) {
        let store = gender_store(&rows, AgeBand::All);
        let facets = FacetSelection::default().with(FacetValue::Gender(gender));
        let first = store.query(Domain::Income, "income", year, &facets).unwrap();
        let second = store.query(Domain::Income, "income", year, &facets).unwrap();
        prop_assert_eq!(first, second);
    }

    /// PROPERTY: after any change sequence the selected values are offered
    /// and enabled, and a difference measure leaves its axis at `all`.
    #[test]
    fn property_normalized_selection_is_consistent((domain, changes) in domain_changes()) {
        let config = DomainConfig::builtin(domain);
        let policy = SelectionPolicy::new(&config);
        let mut state = policy.initial(2018).unwrap();

        for change in changes {
            let mut next = state.selection.clone();
            let field = next.apply(change);
            state = policy.normalize(&next, field).unwrap();

            let selection = &state.selection;
            prop_assert!(state.options.measure_enabled(selection.measure));
            for axis in FacetAxis::ALL {
                let value = selection.facets.get(axis);
                prop_assert!(state.options.facet_enabled(value), "{} disabled", value);
            }
            if let Some(axis) = selection.measure.difference_axis() {
                prop_assert!(selection.facets.get(axis).is_all());
            }
        }
    }

    /// PROPERTY: memory never exceeds the palette, pins stay distinct and
    /// pinning the newest name again changes nothing.
    #[test]
    fn property_memory_invariants(
        pins in prop::collection::vec(proptest::sample::select(vec!["A", "B", "C", "D", "E"]), 0..20)
    ) {
        let mut memory = SeriesMemory::new();
        for name in &pins {
            memory.pin(*name);
            prop_assert!(memory.len() <= MAX_PINS);

            let colors: Vec<_> = (0..memory.len()).filter_map(|i| memory.color_for(i)).collect();
            prop_assert_eq!(colors.len(), memory.len());
            for (i, c) in colors.iter().enumerate() {
                prop_assert!(!colors[i + 1..].contains(c));
            }

            let before = memory.clone();
            memory.pin(*name);
            prop_assert_eq!(&memory, &before);
        }
    }
}
