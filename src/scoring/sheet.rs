use std::collections::{BTreeMap, HashMap};

use tracing::{debug, instrument, warn};

use super::columns::ScoreColumn;
use super::errors::FormulaError;
use crate::models::{Game, ScoreType};

/// Per-column values keyed by column id
pub type ColumnValues = BTreeMap<String, f64>;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// A validated set of score columns with a fixed evaluation order.
///
/// Construction rejects duplicate ids, unparseable formulas, references
/// to unknown columns and reference cycles, so evaluation never has to.
#[derive(Debug, Clone)]
pub struct ScoreSheet {
    columns: Vec<ScoreColumn>,
    order: Vec<usize>,
}

impl ScoreSheet {
    #[instrument(skip_all, fields(columns = columns.len()))]
    pub fn new(columns: Vec<ScoreColumn>) -> Result<Self, FormulaError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if index.insert(column.id.as_str(), position).is_some() {
                return Err(FormulaError::DuplicateColumn {
                    column: column.id.clone(),
                });
            }
        }

        let mut edges: Vec<Vec<usize>> = Vec::with_capacity(columns.len());
        for column in &columns {
            let mut dependencies = Vec::new();
            if column.is_calculated() {
                for reference in column.expression()?.references() {
                    let target = index.get(reference).copied().ok_or_else(|| {
                        FormulaError::UnknownColumn {
                            column: column.id.clone(),
                            reference: reference.to_string(),
                        }
                    })?;
                    dependencies.push(target);
                }
            }
            edges.push(dependencies);
        }

        let order = topological_order(&columns, &edges)?;
        debug!(order = ?order, "Score sheet validated");

        Ok(Self { columns, order })
    }

    /// Columns of a game plus those of the selected extensions, in that order.
    /// Standard-scored games have an empty sheet.
    pub fn for_game(game: &Game, extension_ids: &[String]) -> Result<Self, FormulaError> {
        if game.score_type != ScoreType::Custom {
            return Self::new(Vec::new());
        }

        let mut columns = game.custom_columns.clone();
        for extension_id in extension_ids {
            match game.extension(extension_id) {
                Some(extension) => columns.extend(extension.custom_columns.iter().cloned()),
                None => debug!(
                    game_id = %game.id,
                    extension_id = %extension_id,
                    "Skipping unknown extension"
                ),
            }
        }

        Self::new(columns)
    }

    pub fn columns(&self) -> &[ScoreColumn] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Evaluates every column, failing on the first error.
    ///
    /// Input columns read from `inputs`; an input the player has not entered
    /// counts as zero.
    pub fn evaluate(&self, inputs: &ColumnValues) -> Result<ColumnValues, FormulaError> {
        let mut values = ColumnValues::new();
        for &position in &self.order {
            let column = &self.columns[position];
            let value = self.column_value(column, inputs, &|reference: &str| {
                values
                    .get(reference)
                    .copied()
                    .ok_or_else(|| FormulaError::UnknownColumn {
                        column: column.id.clone(),
                        reference: reference.to_string(),
                    })
            })?;
            values.insert(column.id.clone(), value);
        }
        Ok(values)
    }

    /// Evaluates every column independently of the others' failures.
    ///
    /// A failed column yields its error; columns depending on it fail with
    /// `DependencyFailed` while unrelated columns still get a value.
    pub fn evaluate_each(
        &self,
        inputs: &ColumnValues,
    ) -> BTreeMap<String, Result<f64, FormulaError>> {
        let mut results: BTreeMap<String, Result<f64, FormulaError>> = BTreeMap::new();
        for &position in &self.order {
            let column = &self.columns[position];
            let result = self.column_value(column, inputs, &|reference: &str| {
                match results.get(reference) {
                    Some(Ok(value)) => Ok(*value),
                    _ => Err(FormulaError::DependencyFailed {
                        column: column.id.clone(),
                        dependency: reference.to_string(),
                    }),
                }
            });
            if let Err(e) = &result {
                warn!(column = %column.id, error = %e, "Score column could not be computed");
            }
            results.insert(column.id.clone(), result);
        }
        results
    }

    /// Running total: every column's value times its modifier sign
    pub fn total(&self, values: &ColumnValues) -> f64 {
        self.columns
            .iter()
            .filter_map(|column| values.get(&column.id).map(|value| column.sign() * value))
            .sum()
    }

    /// Final score and breakdown for one player's entered values
    pub fn score_result(&self, inputs: &ColumnValues) -> Result<(f64, ColumnValues), FormulaError> {
        let values = self.evaluate(inputs)?;
        Ok((self.total(&values), values))
    }

    fn column_value<F>(
        &self,
        column: &ScoreColumn,
        inputs: &ColumnValues,
        lookup: &F,
    ) -> Result<f64, FormulaError>
    where
        F: Fn(&str) -> Result<f64, FormulaError>,
    {
        if column.is_calculated() {
            return column.expression()?.evaluate(&column.id, lookup);
        }

        let value = inputs.get(&column.id).copied().unwrap_or_default();
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite {
                column: column.id.clone(),
            })
        }
    }
}

/// Convenience wrapper: validate `columns` and evaluate them in one go
pub fn evaluate(columns: &[ScoreColumn], inputs: &ColumnValues) -> Result<ColumnValues, FormulaError> {
    ScoreSheet::new(columns.to_vec())?.evaluate(inputs)
}

/// Depth-first post-order over the dependency edges. Reaching a column that
/// is still in progress means a cycle; its path is reported by column id.
fn topological_order(columns: &[ScoreColumn], edges: &[Vec<usize>]) -> Result<Vec<usize>, FormulaError> {
    fn visit(
        node: usize,
        columns: &[ScoreColumn],
        edges: &[Vec<usize>],
        marks: &mut [Mark],
        stack: &mut Vec<usize>,
        order: &mut Vec<usize>,
    ) -> Result<(), FormulaError> {
        match marks[node] {
            Mark::Done => return Ok(()),
            Mark::InProgress => {
                let start = stack.iter().position(|&n| n == node).unwrap_or(0);
                let mut path: Vec<String> = stack[start..]
                    .iter()
                    .map(|&n| columns[n].id.clone())
                    .collect();
                path.push(columns[node].id.clone());
                warn!(path = ?path, "Cyclic score column reference");
                return Err(FormulaError::Cycle { path });
            }
            Mark::Unvisited => {}
        }

        marks[node] = Mark::InProgress;
        stack.push(node);
        for &dependency in &edges[node] {
            visit(dependency, columns, edges, marks, stack, order)?;
        }
        stack.pop();
        marks[node] = Mark::Done;
        order.push(node);
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; columns.len()];
    let mut stack = Vec::new();
    let mut order = Vec::with_capacity(columns.len());
    for node in 0..columns.len() {
        visit(node, columns, edges, &mut marks, &mut stack, &mut order)?;
    }
    Ok(order)
}
