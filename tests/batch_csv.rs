// tests/batch_csv.rs
//
// End-to-end batch run over a CSV fixture with a static geocoder loaded from JSON.

use std::fs;
use std::sync::Arc;

use address_matcher::batch::run_batch;
use address_matcher::geocode::StaticGeocoder;
use address_matcher::{AddressMatcher, MatcherHandle, SimilarityEngine};

const FIXTURE: &str = r#"{
    "123 Main St, Springfield": [
        "Springfield, Illinois, United States",
        "123 Main St, Springfield, IL 62704, USA"
    ],
    "Rua Augusta 10, Lisboa": ["Rua Augusta 10, 1100-048 Lisboa, Portugal"],
    "korea": ["Korea", "Porto, Portugal"]
}"#;

#[tokio::test]
async fn batch_matches_rows_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = dir.path().join("geocoder.json");
    let input = dir.path().join("addresses.csv");
    let output = dir.path().join("result.csv");
    fs::write(&fixture, FIXTURE).unwrap();
    fs::write(
        &input,
        "address,note\n\
         \"123 Main St, Springfield\",a\n\
         \"Rua Augusta 10, Lisboa\",b\n\
         \"\",blank\n\
         KOREA,c\n\
         Unknown Place,d\n",
    )
    .unwrap();

    let geo = StaticGeocoder::from_json_file(&fixture).unwrap();
    let matcher = AddressMatcher::new(
        MatcherHandle::new(SimilarityEngine::default()),
        Arc::new(geo),
    );
    let summary = run_batch(&matcher, &input, &output).await.unwrap();
    assert_eq!(summary.rows, 5);
    assert_eq!(summary.blank, 1);
    assert_eq!(summary.matched, 3);
    assert_eq!(summary.failed, 0);

    let mut r = csv::Reader::from_path(&output).unwrap();
    let rows: Vec<Vec<String>> = r
        .records()
        .map(|rec| rec.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(rows.len(), 5);

    assert_eq!(rows[0][0], "123 Main St, Springfield");
    assert_eq!(rows[0][1], "123 Main St, Springfield, IL 62704, USA");
    assert_eq!(rows[1][1], "Rua Augusta 10, 1100-048 Lisboa, Portugal");
    assert_eq!(rows[2], ["", "", "0.000"]);
    // exact place name beats the unrelated city
    assert_eq!(rows[3][1], "Korea");
    assert_eq!(rows[3][2], "1.000");
    assert_eq!(rows[4][1], "");
}
