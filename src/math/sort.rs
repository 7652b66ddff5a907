// Stable ascending argsort; equal values keep their original index order.
// NaN sorts after every finite value.
pub fn argsort(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order
}

pub fn identity(n: usize) -> Vec<usize> {
    (0..n).collect()
}
