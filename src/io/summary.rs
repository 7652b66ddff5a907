use crate::schema::v1::AnalysisArtifact;

pub fn format_summary(artifact: &AnalysisArtifact) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} v{}\n", artifact.tool, artifact.version));
    out.push_str(&format!(
        "Input: {} matrices, {} features, {} bins\n",
        artifact.matrix_ids.len(),
        artifact.row_names.len(),
        artifact.bins.len()
    ));

    for (name, r) in artifact
        .matrix_names
        .iter()
        .zip(&artifact.max_abs_correlation_values)
    {
        out.push_str(&format!("{}: max |r| = {:.3}\n", name, r));
    }

    let ks: Vec<String> = artifact.available_k().iter().map(|k| k.to_string()).collect();
    if ks.is_empty() {
        out.push_str("Clusters: none\n");
    } else {
        out.push_str(&format!("Clusters: k = {}\n", ks.join(", ")));
    }
    out.push_str(&format!(
        "Sort vector: {}\n",
        if artifact.sort_vector.is_some() {
            "user"
        } else {
            "identity"
        }
    ));
    out
}
