use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::error::AnalysisError;
use crate::math::sort;
use crate::pipeline::Stage;
use crate::schema::v1::USER_SORT_VECTOR_ID;

pub struct Stage6SortOrders;

impl Stage6SortOrders {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6SortOrders {
    fn name(&self) -> &'static str {
        "stage6_sort_orders"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        for (input, vector) in ctx.inputs.iter().zip(&ctx.vectors) {
            ctx.sort_orders.insert(input.id, sort::argsort(vector));
        }

        let user_order = match &ctx.sort_vector_text {
            Some(text) => {
                let values = parse_sort_vector(text, &ctx.row_names)?;
                let order = sort::argsort(&values);
                ctx.user_vector = Some(values);
                order
            }
            None => sort::identity(ctx.row_names.len()),
        };
        ctx.sort_orders.insert(USER_SORT_VECTOR_ID, user_order);

        info!(
            orders = ctx.sort_orders.len(),
            user_vector = ctx.user_vector.is_some(),
            "sort_orders_ready"
        );
        Ok(())
    }
}

// One value per line in feature order, optionally preceded by the feature
// name. Blank lines and `#` comments are skipped.
pub fn parse_sort_vector(text: &str, row_names: &[String]) -> Result<Vec<f64>, AnalysisError> {
    let mut values = Vec::with_capacity(row_names.len());
    for (line_no, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let (name, raw) = match fields.as_slice() {
            [value] => (None, *value),
            [name, value] => (Some(*name), *value),
            _ => {
                return Err(AnalysisError::InputFormat(format!(
                    "sort vector line {}: expected 'value' or 'name value'",
                    line_no + 1
                )));
            }
        };
        let value: f64 = raw.parse().map_err(|_| {
            AnalysisError::InputFormat(format!(
                "sort vector line {}: invalid value '{}'",
                line_no + 1,
                raw
            ))
        })?;
        if !value.is_finite() {
            return Err(AnalysisError::InputFormat(format!(
                "sort vector line {}: non-finite value '{}'",
                line_no + 1,
                raw
            )));
        }
        if let Some(name) = name {
            let row = values.len();
            if row_names.get(row).is_some_and(|expected| expected != name) {
                return Err(AnalysisError::InputFormat(format!(
                    "sort vector line {}: feature '{}' out of order, expected '{}'",
                    line_no + 1,
                    name,
                    row_names[row]
                )));
            }
        }
        values.push(value);
    }
    if values.len() != row_names.len() {
        return Err(AnalysisError::InputFormat(format!(
            "sort vector has {} values, matrices have {} rows",
            values.len(),
            row_names.len()
        )));
    }
    Ok(values)
}
