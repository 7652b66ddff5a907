use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use kira_binmatrix::AnalysisError;
use kira_binmatrix::io::features::{Strand, read_feature_list};
use kira_binmatrix::io::matrix::{BinnedMatrix, read_header, read_matrix, write_matrix};
use kira_binmatrix::io::matrix_list::read_matrix_list;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn write_gz(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut enc = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
    enc.write_all(content.as_bytes()).unwrap();
    enc.finish().unwrap();
    path
}

#[test]
fn matrix_written_then_read_back() {
    let tmp = TempDir::new().unwrap();
    let m = BinnedMatrix {
        bins: vec!["-10:0".to_string(), "0:10".to_string()],
        row_names: vec!["x".to_string(), "y".to_string()],
        values: vec![vec![1.5, 0.0], vec![2.0, 3.25]],
    };
    let path = tmp.path().join("sub").join("m.matrix");
    write_matrix(&path, &m).unwrap();

    assert_eq!(read_matrix(&path).unwrap(), m);
    assert_eq!(read_header(&path).unwrap(), m.bins);
    assert_eq!(m.row_sums(), vec![1.5, 5.25]);
}

#[test]
fn gzipped_matrix_is_read_transparently() {
    let tmp = TempDir::new().unwrap();
    let path = write_gz(tmp.path(), "m.matrix.gz", "b0\tb1\nr1\t1\t2\n");
    let m = read_matrix(&path).unwrap();
    assert_eq!(m.row_names, vec!["r1"]);
    assert_eq!(m.values, vec![vec![1.0, 2.0]]);
}

#[test]
fn row_with_wrong_value_count_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = write(tmp.path(), "bad.matrix", "b0\tb1\tb2\nr1\t1\t2\n");
    let err = read_matrix(&path).unwrap_err();
    assert!(matches!(err, AnalysisError::InputFormat(_)));
    assert!(err.to_string().contains("r1"));
}

#[test]
fn non_numeric_value_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = write(tmp.path(), "bad.matrix", "b0\nr1\tNaNope\n");
    assert!(matches!(
        read_matrix(&path).unwrap_err(),
        AnalysisError::InputFormat(_)
    ));
}

#[test]
fn empty_matrix_file_has_no_header() {
    let tmp = TempDir::new().unwrap();
    let path = write(tmp.path(), "empty.matrix", "\n\n");
    assert!(matches!(
        read_matrix(&path).unwrap_err(),
        AnalysisError::InputFormat(_)
    ));
    assert!(matches!(
        read_header(&path).unwrap_err(),
        AnalysisError::InputFormat(_)
    ));
}

#[test]
fn missing_matrix_file_is_io_error() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(
        read_matrix(&tmp.path().join("nope.matrix")).unwrap_err(),
        AnalysisError::Io(_)
    ));
}

#[test]
fn matrix_list_parses_entries_and_skips_comments() {
    let tmp = TempDir::new().unwrap();
    let path = write(
        tmp.path(),
        "list.txt",
        "# id name path\n\n1 h3k4me3 /data/a.matrix\n2\tpolII\t/data/b.matrix\n",
    );
    let list = read_matrix_list(&path).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, 1);
    assert_eq!(list[1].name, "polII");
    assert_eq!(list[1].path, PathBuf::from("/data/b.matrix"));
}

#[test]
fn matrix_list_rejects_malformed_entries() {
    let tmp = TempDir::new().unwrap();
    let two_fields = write(tmp.path(), "two.txt", "1 only\n");
    assert!(matches!(
        read_matrix_list(&two_fields).unwrap_err(),
        AnalysisError::InputFormat(_)
    ));

    let bad_id = write(tmp.path(), "id.txt", "x name /a.matrix\n");
    assert!(matches!(
        read_matrix_list(&bad_id).unwrap_err(),
        AnalysisError::InputFormat(_)
    ));

    let empty = write(tmp.path(), "empty.txt", "# nothing\n");
    assert!(matches!(
        read_matrix_list(&empty).unwrap_err(),
        AnalysisError::InputFormat(_)
    ));
}

#[test]
fn bed_names_and_strands() {
    let tmp = TempDir::new().unwrap();
    let path = write_gz(
        tmp.path(),
        "features.bed.gz",
        "browser position chr1\ntrack name=x\nchr1\t10\t20\tgeneA\t0\t-\nchr2\t5\t15\nchr3\t0\t8\t.\t0\t+\n",
    );
    let features = read_feature_list(&path).unwrap();
    assert_eq!(features.len(), 3);
    assert_eq!(features[0].name, "geneA");
    assert_eq!(features[0].strand, Strand::Minus);
    assert_eq!(features[1].name, "chr2:5-15");
    assert_eq!(features[1].strand, Strand::Unknown);
    assert_eq!(features[2].name, "chr3:0-8");
    assert_eq!(features[2].strand, Strand::Plus);
}

#[test]
fn bed_with_bad_coordinates_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let reversed = write(tmp.path(), "rev.bed", "chr1\t20\t10\tx\n");
    assert!(matches!(
        read_feature_list(&reversed).unwrap_err(),
        AnalysisError::InputFormat(_)
    ));
    let short = write(tmp.path(), "short.bed", "chr1\t20\n");
    assert!(matches!(
        read_feature_list(&short).unwrap_err(),
        AnalysisError::InputFormat(_)
    ));
}
