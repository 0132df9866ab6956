use bson::doc;
use proptest::prelude::*;
use std::sync::Arc;
use visa_navigator::visa::VisaListQuery;
use visa_navigator::{MemoryStore, VisaService};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().build().unwrap()
}

fn seeded(rt: &tokio::runtime::Runtime, rows: &[(String, String, i64)]) -> VisaService {
    let svc = VisaService::new(Arc::new(MemoryStore::new()));
    rt.block_on(async {
        for (country, visa_type, fee) in rows {
            svc.add_visa(doc! { "countryName": country, "visaType": visa_type, "fee": *fee })
                .await
                .unwrap();
        }
    });
    svc
}

fn sort_query(sort: &str) -> VisaListQuery {
    VisaListQuery { sort: Some(sort.to_string()), ..Default::default() }
}

proptest! {
    #[test]
    fn prop_fee_sort_is_monotonic(fees in proptest::collection::vec(-1000i64..1000, 0..40)) {
        let rt = runtime();
        let rows: Vec<_> = fees.iter().map(|f| ("X".to_string(), "Tourist".to_string(), *f)).collect();
        let svc = seeded(&rt, &rows);

        let asc = rt.block_on(svc.get_visas(&sort_query("asc"))).unwrap();
        let desc = rt.block_on(svc.get_visas(&sort_query("desc"))).unwrap();
        prop_assert_eq!(asc.len(), fees.len());
        for w in asc.windows(2) {
            prop_assert!(w[0].get_i64("fee").unwrap() <= w[1].get_i64("fee").unwrap());
        }
        for w in desc.windows(2) {
            prop_assert!(w[0].get_i64("fee").unwrap() >= w[1].get_i64("fee").unwrap());
        }
    }

    #[test]
    fn prop_latest_is_newest_eight(n in 0usize..25) {
        let rt = runtime();
        let rows: Vec<_> = (0..n).map(|i| (format!("C{i}"), "Work".to_string(), i as i64)).collect();
        let svc = seeded(&rt, &rows);

        let latest = rt.block_on(svc.latest_visas()).unwrap();
        prop_assert_eq!(latest.len(), n.min(8));
        let fees: Vec<i64> = latest.iter().map(|d| d.get_i64("fee").unwrap()).collect();
        let want: Vec<i64> = (0..n as i64).rev().take(8).collect();
        prop_assert_eq!(fees, want);
    }

    #[test]
    fn prop_filter_matches_type_and_substring(
        rows in proptest::collection::vec(
            ("[A-Za-z .]{1,12}", prop_oneof![Just("Tourist"), Just("Business"), Just("Student")], 0i64..500),
            0..30,
        ),
        visa_type in prop_oneof![Just(None), Just(Some("Tourist")), Just(Some("Student"))],
        search in proptest::option::of("[a-zA-Z.]{1,3}"),
    ) {
        let rt = runtime();
        let rows: Vec<_> = rows.into_iter().map(|(c, t, f)| (c, t.to_string(), f)).collect();
        let svc = seeded(&rt, &rows);
        let query = VisaListQuery {
            visa_type: visa_type.map(str::to_string),
            search: search.clone(),
            sort: None,
        };
        let hits = rt.block_on(svc.get_visas(&query)).unwrap();

        let expected = rows
            .iter()
            .filter(|(c, t, _)| {
                visa_type.is_none_or(|vt| t.as_str() == vt)
                    && search.as_ref().is_none_or(|s| c.to_lowercase().contains(&s.to_lowercase()))
            })
            .count();
        prop_assert_eq!(hits.len(), expected);
        for hit in &hits {
            if let Some(vt) = visa_type {
                prop_assert_eq!(hit.get_str("visaType").unwrap(), vt);
            }
        }
    }
}
