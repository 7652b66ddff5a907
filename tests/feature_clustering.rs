use std::fs;
use std::path::{Path, PathBuf};

use kira_binmatrix::AnalysisError;
use kira_binmatrix::cluster_features::{
    MAX_K, MIN_K, build_vector_matrix, cluster_features, cluster_features_from_list,
    cluster_features_seeded, write_bundle,
};
use kira_binmatrix::io::matrix_list::MatrixInput;
use tempfile::TempDir;

fn write_matrix(dir: &Path, name: &str, header: &str, rows: &[(String, Vec<f64>)]) -> PathBuf {
    let mut text = format!("{}\n", header);
    for (row, values) in rows {
        let cols: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        text.push_str(&format!("{}\t{}\n", row, cols.join("\t")));
    }
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

// Twelve features; matrix `scale` multiplies a ramp, so row sums are distinct.
fn ramp_rows(n: usize, scale: f64, offset: f64) -> Vec<(String, Vec<f64>)> {
    (0..n)
        .map(|i| {
            let v = i as f64 * scale + offset;
            (format!("gene{}", i), vec![v, v + 1.0, (i % 3) as f64])
        })
        .collect()
}

fn inputs(dir: &Path) -> Vec<MatrixInput> {
    let header = "-10:0\t0:10\t10:20";
    let a = write_matrix(dir, "a.matrix", header, &ramp_rows(12, 1.0, 0.0));
    let b = write_matrix(dir, "b.matrix", header, &ramp_rows(12, -2.0, 40.0));
    vec![
        MatrixInput {
            id: 1,
            name: "a".to_string(),
            path: a,
        },
        MatrixInput {
            id: 2,
            name: "b".to_string(),
            path: b,
        },
    ]
}

#[test]
fn vector_matrix_holds_row_sums_per_matrix() {
    let tmp = TempDir::new().unwrap();
    let vm = build_vector_matrix(&inputs(tmp.path())).unwrap();

    assert_eq!(vm.row_names.len(), 12);
    assert_eq!(vm.bins, vec!["-10:0", "0:10", "10:20"]);
    // gene4: a = 4 + 5 + 1, b = 32 + 33 + 1.
    assert_eq!(vm.values[4], vec![10.0, 66.0]);
    assert!(vm.values.iter().all(|row| row.len() == 2));
}

#[test]
fn runs_kmeans_for_every_k_in_range() {
    let tmp = TempDir::new().unwrap();
    let bundle = cluster_features(&inputs(tmp.path())).unwrap();

    let ks: Vec<usize> = bundle.kmeans_results.keys().copied().collect();
    assert_eq!(ks, (MIN_K..=MAX_K).collect::<Vec<_>>());
    for (k, entry) in &bundle.kmeans_results {
        assert_eq!(entry.centroids.len(), *k);
        assert_eq!(entry.labels.len(), 12);
        assert!(entry.labels.iter().all(|l| l < k));
        assert!(entry.centroids.iter().all(|c| c.len() == 2));
    }
    assert_eq!(bundle.vector_matrix.len(), 12);
}

#[test]
fn k_is_capped_by_feature_count() {
    let tmp = TempDir::new().unwrap();
    let header = "b0\tb1";
    let rows: Vec<(String, Vec<f64>)> = (0..4)
        .map(|i| (format!("r{}", i), vec![i as f64, (i * i) as f64]))
        .collect();
    let path = write_matrix(tmp.path(), "small.matrix", header, &rows);
    let bundle = cluster_features(&[MatrixInput {
        id: 1,
        name: "small".to_string(),
        path,
    }])
    .unwrap();

    assert_eq!(
        bundle.kmeans_results.keys().copied().collect::<Vec<_>>(),
        vec![2, 3, 4]
    );
}

#[test]
fn same_seed_gives_same_labels() {
    let tmp = TempDir::new().unwrap();
    let inputs = inputs(tmp.path());
    let a = cluster_features_seeded(&inputs, 7).unwrap();
    let b = cluster_features_seeded(&inputs, 7).unwrap();
    for k in MIN_K..=MAX_K {
        assert_eq!(a.kmeans_results[&k].labels, b.kmeans_results[&k].labels);
    }
}

#[test]
fn header_mismatch_names_offending_file() {
    let tmp = TempDir::new().unwrap();
    let mut list = inputs(tmp.path());
    let bad = write_matrix(tmp.path(), "bad.matrix", "x\ty\tz", &ramp_rows(12, 1.0, 0.0));
    list.push(MatrixInput {
        id: 3,
        name: "bad".to_string(),
        path: bad.clone(),
    });

    match cluster_features(&list).unwrap_err() {
        AnalysisError::HeaderMismatch { path } => assert_eq!(path, bad),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn row_mismatch_reports_row_and_names() {
    let tmp = TempDir::new().unwrap();
    let mut list = inputs(tmp.path());
    let mut rows = ramp_rows(12, 1.0, 0.0);
    rows[5].0 = "other".to_string();
    let bad = write_matrix(tmp.path(), "bad.matrix", "-10:0\t0:10\t10:20", &rows);
    list.push(MatrixInput {
        id: 3,
        name: "bad".to_string(),
        path: bad,
    });

    match cluster_features(&list).unwrap_err() {
        AnalysisError::RowMismatch {
            row,
            expected,
            found,
            ..
        } => {
            assert_eq!(row, 5);
            assert_eq!(expected, "gene5");
            assert_eq!(found, "other");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn list_file_drives_clustering_and_bundle_is_written() {
    let tmp = TempDir::new().unwrap();
    let inputs = inputs(tmp.path());
    let list = tmp.path().join("matrices.txt");
    let mut text = String::from("# id name path\n");
    for input in &inputs {
        text.push_str(&format!("{} {} {}\n", input.id, input.name, input.path.display()));
    }
    fs::write(&list, text).unwrap();

    let bundle = cluster_features_from_list(&list).unwrap();
    let out = tmp.path().join("nested").join("features.json");
    write_bundle(&out, &bundle).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    for key in ["kmeans_results", "vector_matrix", "bins", "row_names"] {
        assert!(raw.get(key).is_some(), "missing {}", key);
    }
    assert!(raw["kmeans_results"].get("2").is_some());
    assert!(raw["kmeans_results"]["10"]["labels"].is_array());
    assert_eq!(raw["row_names"][0], "gene0");
}
