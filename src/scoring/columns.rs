use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};

use super::errors::FormulaError;
use super::formula::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColumnType {
    Input,
    Calculated,
}

/// Sign a column contributes to the running total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Modifier {
    #[default]
    Add,
    Subtract,
}

impl Modifier {
    pub fn sign(self) -> f64 {
        match self {
            Modifier::Add => 1.0,
            Modifier::Subtract => -1.0,
        }
    }
}

/// One column of a custom score sheet.
///
/// The formula of a calculated column is parsed on first use and the
/// tree is kept with the column; `set_formula` drops it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreColumn {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<Modifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(skip)]
    compiled: OnceLock<Result<Expr, FormulaError>>,
}

impl ScoreColumn {
    pub fn input(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_type: ColumnType::Input,
            modifier: None,
            formula: None,
            compiled: OnceLock::new(),
        }
    }

    pub fn calculated(
        id: impl Into<String>,
        name: impl Into<String>,
        formula: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            column_type: ColumnType::Calculated,
            modifier: None,
            formula: Some(formula.into()),
            compiled: OnceLock::new(),
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn is_calculated(&self) -> bool {
        self.column_type == ColumnType::Calculated
    }

    pub fn formula(&self) -> Option<&str> {
        self.formula.as_deref()
    }

    pub fn set_formula(&mut self, formula: Option<String>) {
        self.formula = formula;
        self.compiled = OnceLock::new();
    }

    /// Sign applied when the column feeds the running total; unset means add
    pub fn sign(&self) -> f64 {
        self.modifier.unwrap_or_default().sign()
    }

    /// Parsed formula of a calculated column
    pub fn expression(&self) -> Result<&Expr, FormulaError> {
        self.compiled
            .get_or_init(|| self.compile())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn compile(&self) -> Result<Expr, FormulaError> {
        let source = self
            .formula
            .as_deref()
            .filter(|source| !source.trim().is_empty())
            .ok_or_else(|| FormulaError::MissingFormula {
                column: self.id.clone(),
            })?;

        Expr::parse(source).map_err(|source| FormulaError::Parse {
            column: self.id.clone(),
            source,
        })
    }
}

impl PartialEq for ScoreColumn {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.column_type == other.column_type
            && self.modifier == other.modifier
            && self.formula == other.formula
    }
}
