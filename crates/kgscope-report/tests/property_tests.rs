use kgscope_report::{Cell, Column, RunRecord, SummaryTable, DEFAULT_PATH_MARKER};
use proptest::prelude::*;
use serde_json::json;

fn record(run: usize, test_mrr: f64, runtime: f64, num_params: u64) -> RunRecord {
    let split = |mrr: f64| json!({"MRR": mrr, "H@1": mrr, "H@3": mrr, "H@10": mrr});
    RunRecord::from_documents(
        &format!("run-{run:03}"),
        json!({
            "model": "DistMult",
            "full_storage_path": "/x/dice-embeddings/Experiments/run",
            "embedding_dim": 32,
            "normalization": null,
            "num_epochs": 1,
            "batch_size": 1,
            "lr": 0.1,
            "callbacks": {},
            "scoring_technique": "KvsAll",
            "path_dataset_folder": "KGs/KINSHIP",
            "p": 0,
            "q": 1
        }),
        json!({"Runtime": runtime, "NumParam": num_params}),
        json!({"Train": split(0.5), "Val": split(0.5), "Test": split(test_mrr)}),
        DEFAULT_PATH_MARKER,
    )
    .unwrap()
}

fn numeric(column: Column, record: &RunRecord) -> f64 {
    match column.cell(record) {
        Cell::Float(v) => v,
        Cell::Int(v) => v as f64,
        Cell::Text(_) => unreachable!("numeric column"),
    }
}

fn arb_rows() -> impl Strategy<Value = Vec<(f64, f64, u64)>> {
    // coarse values so ties are common
    prop::collection::vec(
        (0u8..5, 0u8..5, 0u64..5).prop_map(|(m, r, p)| (m as f64 / 4.0, r as f64, p * 100)),
        0..20,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn sorted_table_is_non_increasing(
        rows in arb_rows(),
        column in prop::sample::select(vec![Column::TestMrr, Column::Runtime, Column::Params]),
    ) {
        let mut table = SummaryTable::new(
            rows.iter()
                .enumerate()
                .map(|(i, &(mrr, runtime, params))| record(i, mrr, runtime, params))
                .collect(),
        );
        table.sort_descending(column).unwrap();

        prop_assert_eq!(table.len(), rows.len());
        for pair in table.records().windows(2) {
            let (a, b) = (numeric(column, &pair[0]), numeric(column, &pair[1]));
            prop_assert!(a >= b, "{} before {}", a, b);
            if a == b {
                // stable: equal values keep run order
                prop_assert!(pair[0].run < pair[1].run);
            }
        }
    }

    #[test]
    fn csv_has_one_line_per_run(rows in arb_rows()) {
        let table = SummaryTable::new(
            rows.iter()
                .enumerate()
                .map(|(i, &(mrr, runtime, params))| record(i, mrr, runtime, params))
                .collect(),
        );
        let csv = table.to_csv_string().unwrap();
        prop_assert_eq!(csv.lines().count(), rows.len() + 1);
        prop_assert_eq!(table.to_latex().lines().count(), rows.len() + 6);
    }
}
