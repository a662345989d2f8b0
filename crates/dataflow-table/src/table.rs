//! The columnar `Table` value and its structural operations.
//!
//! A table is a row count plus a sequence of named, kinded columns. Tables
//! are immutable from the caller's perspective: every operation here
//! returns a new `Table`; operators never mutate their inputs.

use crate::error::{Result, TableError};
use crate::expr::{eval, Expr, EvalCtx};
use crate::value::{ElementKind, Value};
use std::collections::{HashMap, HashSet};

/// A single named column: its inferred kind, its values, and — for
/// categorical/enum-like columns — the closed domain of values it may
/// hold.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub kind: ElementKind,
    pub values: Vec<Value>,
    pub domain: Option<Vec<String>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let kind = infer_kind(&values);
        Self {
            name: name.into(),
            kind,
            values,
            domain: None,
        }
    }

    pub fn with_domain(mut self, domain: Vec<String>) -> Self {
        self.domain = Some(domain);
        self
    }
}

fn infer_kind(values: &[Value]) -> ElementKind {
    values
        .iter()
        .find(|v| !v.is_absent())
        .map(|v| v.kind())
        .unwrap_or(ElementKind::Unknown)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinHow {
    Inner,
    Left,
    Right,
    Outer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatJoin {
    Inner,
    Outer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupKeep {
    First,
    Last,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Sum,
    Mean,
    Max,
    Min,
    Count,
    First,
    Last,
}

impl AggFunc {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "sum" => AggFunc::Sum,
            "mean" | "avg" | "average" => AggFunc::Mean,
            "max" => AggFunc::Max,
            "min" => AggFunc::Min,
            "count" => AggFunc::Count,
            "first" => AggFunc::First,
            "last" => AggFunc::Last,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub enum FillStrategy {
    Drop,
    FillValue(Value),
    Ffill,
    Bfill,
    Mean,
    Median,
}

/// An ordered sequence of rows with a labeled, ordered column schema.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            row_count: 0,
        }
    }

    pub fn from_columns(columns: Vec<Column>) -> Self {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        Self { columns, row_count }
    }

    /// Builds a table from a column-name/kind schema and row-major data,
    /// useful for operators that assemble output row by row (profit_table,
    /// reconcile, melt, pivot).
    pub fn from_rows(schema: &[String], rows: Vec<Vec<Value>>) -> Self {
        let mut columns: Vec<Column> = schema
            .iter()
            .map(|name| Column::new(name.clone(), Vec::with_capacity(rows.len())))
            .collect();
        for row in &rows {
            for (i, v) in row.iter().enumerate() {
                if i < columns.len() {
                    columns[i].values.push(v.clone());
                }
            }
        }
        for c in &mut columns {
            c.kind = infer_kind(&c.values);
        }
        let row_count = rows.len();
        Self { columns, row_count }
    }

    pub fn num_rows(&self) -> usize {
        self.row_count
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn column_index_or_err(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| TableError::column_missing(name, &self.column_names()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn get(&self, row: usize, col: &str) -> Option<&Value> {
        self.column(col).and_then(|c| c.values.get(row))
    }

    pub fn row_vec(&self, row: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.values[row].clone()).collect()
    }

    /// Row as a name->value map, for expression evaluation.
    pub fn row_map(&self, row: usize) -> HashMap<String, Value> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.values[row].clone()))
            .collect()
    }

    pub fn push_column(&mut self, column: Column) {
        if self.columns.is_empty() {
            self.row_count = column.values.len();
        }
        self.columns.push(column);
    }

    // ---- projection -------------------------------------------------

    pub fn select(&self, names: &[String]) -> Result<Table> {
        let mut cols = Vec::with_capacity(names.len());
        for n in names {
            let idx = self.column_index_or_err(n)?;
            cols.push(self.columns[idx].clone());
        }
        Ok(Table::from_columns(cols))
    }

    pub fn drop_columns(&self, names: &[String]) -> Result<Table> {
        for n in names {
            self.column_index_or_err(n)?;
        }
        let set: HashSet<&String> = names.iter().collect();
        let cols = self
            .columns
            .iter()
            .filter(|c| !set.contains(&c.name))
            .cloned()
            .collect();
        Ok(Table::from_columns(cols))
    }

    pub fn rename(&self, pairs: &[(String, String)]) -> Result<Table> {
        let mut cols = self.columns.clone();
        for (from, to) in pairs {
            let idx = cols
                .iter()
                .position(|c| &c.name == from)
                .ok_or_else(|| TableError::column_missing(from.clone(), &self.column_names()))?;
            cols[idx].name = to.clone();
        }
        Ok(Table::from_columns(cols))
    }

    // ---- row operations ----------------------------------------------

    pub fn filter_indices(&self, keep: &[bool]) -> Table {
        let cols = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                values: c
                    .values
                    .iter()
                    .zip(keep.iter())
                    .filter(|(_, &k)| k)
                    .map(|(v, _)| v.clone())
                    .collect(),
                domain: c.domain.clone(),
            })
            .collect();
        Table::from_columns(cols)
    }

    pub fn filter_expr(&self, expr: &Expr, ambient: &HashMap<String, Value>) -> Result<Table> {
        let mut keep = Vec::with_capacity(self.row_count);
        for i in 0..self.row_count {
            let row = self.row_map(i);
            let ctx = EvalCtx { row: &row, ambient };
            let v = eval(expr, &ctx)?;
            keep.push(v.as_bool().unwrap_or(false));
        }
        Ok(self.filter_indices(&keep))
    }

    pub fn add_computed_column(
        &self,
        name: &str,
        expr: &Expr,
        ambient: &HashMap<String, Value>,
    ) -> Result<Table> {
        let mut values = Vec::with_capacity(self.row_count);
        for i in 0..self.row_count {
            let row = self.row_map(i);
            let ctx = EvalCtx { row: &row, ambient };
            values.push(eval(expr, &ctx)?);
        }
        let mut t = self.clone();
        if let Some(idx) = t.column_index(name) {
            t.columns[idx] = Column::new(name, values);
        } else {
            t.columns.push(Column::new(name, values));
        }
        Ok(t)
    }

    pub fn sort_by(&self, col: &str, ascending: bool) -> Result<Table> {
        let idx = self.column_index_or_err(col)?;
        let mut order: Vec<usize> = (0..self.row_count).collect();
        order.sort_by(|&a, &b| {
            let ord = self.columns[idx].values[a]
                .partial_cmp_value(&self.columns[idx].values[b])
                .unwrap_or(std::cmp::Ordering::Equal);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        Ok(self.reorder(&order))
    }

    /// Reorders rows by an arbitrary row-vs-row comparator. Used by
    /// preview's reconcile-specific "sort by descending |difference|" bias.
    pub fn sort_rows_by<F>(&self, mut cmp: F) -> Table
    where
        F: FnMut(&[Value], &[Value]) -> std::cmp::Ordering,
    {
        let mut order: Vec<usize> = (0..self.row_count).collect();
        let rows: Vec<Vec<Value>> = (0..self.row_count).map(|i| self.row_vec(i)).collect();
        order.sort_by(|&a, &b| cmp(&rows[a], &rows[b]));
        self.reorder(&order)
    }

    fn reorder(&self, order: &[usize]) -> Table {
        let cols = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                kind: c.kind,
                values: order.iter().map(|&i| c.values[i].clone()).collect(),
                domain: c.domain.clone(),
            })
            .collect();
        Table::from_columns(cols)
    }

    pub fn prefix(&self, n: usize) -> Table {
        let n = n.min(self.row_count);
        let order: Vec<usize> = (0..n).collect();
        self.reorder(&order)
    }

    pub fn rows_at(&self, indices: &[usize]) -> Table {
        self.reorder(indices)
    }

    // ---- coercion ------------------------------------------------------

    pub fn coerce_column(&self, col: &str, target: ElementKind) -> Result<Table> {
        let idx = self.column_index_or_err(col)?;
        let values: Vec<Value> = self.columns[idx]
            .values
            .iter()
            .map(|v| coerce_value(v, target))
            .collect();
        let mut t = self.clone();
        t.columns[idx] = Column {
            name: t.columns[idx].name.clone(),
            kind: target,
            values,
            domain: t.columns[idx].domain.clone(),
        };
        Ok(t)
    }

    // ---- dedup / fill ----------------------------------------------------

    pub fn deduplicate(&self, subset: Option<&[String]>, keep: DedupKeep) -> Result<Table> {
        let key_idx: Vec<usize> = match subset {
            Some(names) => {
                let mut idx = Vec::with_capacity(names.len());
                for n in names {
                    idx.push(self.column_index_or_err(n)?);
                }
                idx
            }
            None => (0..self.columns.len()).collect(),
        };

        let key_of = |row: usize| -> Vec<String> {
            key_idx
                .iter()
                .map(|&ci| self.columns[ci].values[row].normalized_key())
                .collect()
        };

        let mut counts: HashMap<Vec<String>, usize> = HashMap::new();
        for row in 0..self.row_count {
            *counts.entry(key_of(row)).or_insert(0) += 1;
        }

        let mut keep_mask = vec![false; self.row_count];
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        match keep {
            DedupKeep::First => {
                for row in 0..self.row_count {
                    let k = key_of(row);
                    if seen.insert(k) {
                        keep_mask[row] = true;
                    }
                }
            }
            DedupKeep::Last => {
                let mut last_idx: HashMap<Vec<String>, usize> = HashMap::new();
                for row in 0..self.row_count {
                    last_idx.insert(key_of(row), row);
                }
                for row in last_idx.values() {
                    keep_mask[*row] = true;
                }
            }
            DedupKeep::None => {
                for row in 0..self.row_count {
                    let k = key_of(row);
                    if counts.get(&k).copied().unwrap_or(0) <= 1 {
                        keep_mask[row] = true;
                    }
                }
            }
        }
        Ok(self.filter_indices(&keep_mask))
    }

    pub fn fill_na(&self, subset: Option<&[String]>, strategy: FillStrategy) -> Result<Table> {
        let target_idx: Vec<usize> = match subset {
            Some(names) => {
                let mut idx = Vec::with_capacity(names.len());
                for n in names {
                    idx.push(self.column_index_or_err(n)?);
                }
                idx
            }
            None => (0..self.columns.len()).collect(),
        };

        if matches!(strategy, FillStrategy::Drop) {
            let mut keep_mask = vec![true; self.row_count];
            for row in 0..self.row_count {
                for &ci in &target_idx {
                    if self.columns[ci].values[row].is_absent() {
                        keep_mask[row] = false;
                        break;
                    }
                }
            }
            return Ok(self.filter_indices(&keep_mask));
        }

        let mut t = self.clone();
        for &ci in &target_idx {
            fill_column(&mut t.columns[ci], &strategy);
        }
        Ok(t)
    }

    // ---- group / aggregate ------------------------------------------------

    pub fn group_aggregate(
        &self,
        keys: &[String],
        aggs: &[(String, AggFunc, String)],
    ) -> Result<Table> {
        let key_idx: Vec<usize> = keys
            .iter()
            .map(|n| self.column_index_or_err(n))
            .collect::<Result<_>>()?;
        for (src, _, _) in aggs {
            self.column_index_or_err(src)?;
        }

        let mut order: Vec<Vec<String>> = Vec::new();
        let mut groups: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
        for row in 0..self.row_count {
            let key: Vec<String> = key_idx
                .iter()
                .map(|&ci| self.columns[ci].values[row].normalized_key())
                .collect();
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(row);
        }

        let mut schema: Vec<String> = keys.to_vec();
        for (_, _, alias) in aggs {
            schema.push(alias.clone());
        }

        let mut out_rows = Vec::with_capacity(order.len());
        for key in &order {
            let rows = &groups[key];
            let first_row = rows[0];
            let mut out: Vec<Value> = key_idx
                .iter()
                .map(|&ci| self.columns[ci].values[first_row].clone())
                .collect();
            for (src, func, _) in aggs {
                let ci = self.column_index(src).unwrap();
                out.push(aggregate(&self.columns[ci].values, rows, *func));
            }
            out_rows.push(out);
        }

        Ok(Table::from_rows(&schema, out_rows))
    }

    // ---- pivot / melt --------------------------------------------------

    pub fn pivot(&self, index: &[String], columns: &str, values: &str, aggfunc: AggFunc) -> Result<Table> {
        let index_idx: Vec<usize> = index
            .iter()
            .map(|n| self.column_index_or_err(n))
            .collect::<Result<_>>()?;
        let columns_idx = self.column_index_or_err(columns)?;
        let values_idx = self.column_index_or_err(values)?;

        let mut index_order: Vec<Vec<String>> = Vec::new();
        let mut col_order: Vec<String> = Vec::new();
        let mut cells: HashMap<(Vec<String>, String), Vec<usize>> = HashMap::new();

        for row in 0..self.row_count {
            let idx_key: Vec<String> = index_idx
                .iter()
                .map(|&ci| self.columns[ci].values[row].normalized_key())
                .collect();
            let col_key = self.columns[columns_idx].values[row].display_text();
            if !index_order.contains(&idx_key) {
                index_order.push(idx_key.clone());
            }
            if !col_order.contains(&col_key) {
                col_order.push(col_key.clone());
            }
            cells.entry((idx_key, col_key)).or_default().push(row);
        }

        let mut schema: Vec<String> = index.to_vec();
        schema.extend(col_order.iter().cloned());

        let mut index_repr: HashMap<Vec<String>, Vec<Value>> = HashMap::new();
        for row in 0..self.row_count {
            let idx_key: Vec<String> = index_idx
                .iter()
                .map(|&ci| self.columns[ci].values[row].normalized_key())
                .collect();
            index_repr.entry(idx_key).or_insert_with(|| {
                index_idx.iter().map(|&ci| self.columns[ci].values[row].clone()).collect()
            });
        }

        let mut out_rows = Vec::with_capacity(index_order.len());
        for idx_key in &index_order {
            let mut out = index_repr[idx_key].clone();
            for col_key in &col_order {
                let cell = cells.get(&(idx_key.clone(), col_key.clone()));
                let v = match cell {
                    Some(rows) => aggregate(&self.columns[values_idx].values, rows, aggfunc),
                    None => Value::Absent,
                };
                out.push(v);
            }
            out_rows.push(out);
        }

        Ok(Table::from_rows(&schema, out_rows))
    }

    pub fn melt(
        &self,
        id_vars: &[String],
        value_vars: &[String],
        var_name: &str,
        value_name: &str,
    ) -> Result<Table> {
        for n in id_vars.iter().chain(value_vars.iter()) {
            self.column_index_or_err(n)?;
        }
        let mut schema: Vec<String> = id_vars.to_vec();
        schema.push(var_name.to_string());
        schema.push(value_name.to_string());

        let mut out_rows = Vec::with_capacity(self.row_count * value_vars.len());
        for row in 0..self.row_count {
            for vv in value_vars {
                let mut out: Vec<Value> = id_vars
                    .iter()
                    .map(|n| self.columns[self.column_index(n).unwrap()].values[row].clone())
                    .collect();
                out.push(Value::Text(vv.clone()));
                out.push(self.columns[self.column_index(vv).unwrap()].values[row].clone());
                out_rows.push(out);
            }
        }
        Ok(Table::from_rows(&schema, out_rows))
    }

    // ---- merge / concat -----------------------------------------------

    pub fn merge(&self, other: &Table, left_on: &[String], right_on: &[String], how: JoinHow) -> Result<Table> {
        if left_on.is_empty() || left_on.len() != right_on.len() {
            return Err(TableError::Invalid(
                "join key column count mismatch between left_on and right_on".into(),
            ));
        }
        let left_key_idx: Vec<usize> = left_on
            .iter()
            .map(|n| self.column_index_or_err(n))
            .collect::<Result<_>>()?;
        let right_key_idx: Vec<usize> = right_on
            .iter()
            .map(|n| other.column_index_or_err(n))
            .collect::<Result<_>>()?;

        let right_keep_idx: Vec<usize> = (0..other.columns.len())
            .filter(|i| !right_key_idx.contains(i))
            .collect();

        let left_names: Vec<String> = self.column_names();
        let mut out_names = left_names.clone();
        for &ri in &right_keep_idx {
            let base = other.columns[ri].name.clone();
            let name = if out_names.contains(&base) {
                format!("{}_right", base)
            } else {
                base
            };
            out_names.push(name);
        }

        let mut right_index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
        for rj in 0..other.row_count {
            let key: Vec<String> = right_key_idx
                .iter()
                .map(|&ci| other.columns[ci].values[rj].normalized_key())
                .collect();
            right_index.entry(key).or_default().push(rj);
        }

        let mut out_rows: Vec<Vec<Value>> = Vec::new();
        let mut matched_right: HashSet<usize> = HashSet::new();

        for li in 0..self.row_count {
            let key: Vec<String> = left_key_idx
                .iter()
                .map(|&ci| self.columns[ci].values[li].normalized_key())
                .collect();
            if let Some(matches) = right_index.get(&key) {
                for &rj in matches {
                    matched_right.insert(rj);
                    let mut row = self.row_vec(li);
                    for &ri in &right_keep_idx {
                        row.push(other.columns[ri].values[rj].clone());
                    }
                    out_rows.push(row);
                }
            } else if matches!(how, JoinHow::Left | JoinHow::Outer) {
                let mut row = self.row_vec(li);
                for _ in &right_keep_idx {
                    row.push(Value::Absent);
                }
                out_rows.push(row);
            }
        }

        if matches!(how, JoinHow::Right | JoinHow::Outer) {
            for rj in 0..other.row_count {
                if matched_right.contains(&rj) {
                    continue;
                }
                let mut row = vec![Value::Absent; self.columns.len()];
                for (k, &ci) in left_key_idx.iter().enumerate() {
                    row[ci] = other.columns[right_key_idx[k]].values[rj].clone();
                }
                for &ri in &right_keep_idx {
                    row.push(other.columns[ri].values[rj].clone());
                }
                out_rows.push(row);
            }
        }

        Ok(Table::from_rows(&out_names, out_rows))
    }

    pub fn concat(tables: &[&Table], join: ConcatJoin, _ignore_index: bool) -> Table {
        if tables.is_empty() {
            return Table::empty();
        }
        let schema: Vec<String> = match join {
            ConcatJoin::Outer => {
                let mut seen = Vec::new();
                for t in tables {
                    for n in t.column_names() {
                        if !seen.contains(&n) {
                            seen.push(n);
                        }
                    }
                }
                seen
            }
            ConcatJoin::Inner => {
                let mut common: Vec<String> = tables[0].column_names();
                for t in &tables[1..] {
                    let names = t.column_names();
                    common.retain(|c| names.contains(c));
                }
                common
            }
        };

        let mut out_rows = Vec::new();
        for t in tables {
            for row in 0..t.row_count {
                let mut out = Vec::with_capacity(schema.len());
                for name in &schema {
                    out.push(
                        t.column_index(name)
                            .map(|ci| t.columns[ci].values[row].clone())
                            .unwrap_or(Value::Absent),
                    );
                }
                out_rows.push(out);
            }
        }
        Table::from_rows(&schema, out_rows)
    }

    // ---- JSON projection -----------------------------------------------

    pub fn to_json_rows(&self) -> Vec<serde_json::Value> {
        (0..self.row_count)
            .map(|row| {
                let mut map = serde_json::Map::new();
                for c in &self.columns {
                    map.insert(c.name.clone(), c.values[row].to_json());
                }
                serde_json::Value::Object(map)
            })
            .collect()
    }
}

fn coerce_value(v: &Value, target: ElementKind) -> Value {
    if v.is_absent() {
        return Value::Absent;
    }
    match target {
        ElementKind::Integer => match v {
            Value::Integer(i) => Value::Integer(*i),
            Value::Real(r) if r.is_finite() => Value::Integer(*r as i64),
            Value::Boolean(b) => Value::Integer(if *b { 1 } else { 0 }),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64))
                .map(Value::Integer)
                .unwrap_or(Value::Absent),
            _ => Value::Absent,
        },
        ElementKind::Real => v
            .as_f64()
            .map(Value::Real)
            .unwrap_or(Value::Absent),
        ElementKind::Text => Value::Text(v.display_text()),
        ElementKind::Boolean => v.as_bool().map(Value::Boolean).unwrap_or(Value::Absent),
        ElementKind::Timestamp => match v {
            Value::Timestamp(ts) => Value::Timestamp(*ts),
            Value::Date(d) => Value::Timestamp(d.and_hms_opt(0, 0, 0).unwrap()),
            Value::Text(s) => crate::dates::parse_timestamp(s)
                .map(Value::Timestamp)
                .unwrap_or(Value::Absent),
            _ => Value::Absent,
        },
        ElementKind::Date => match v {
            Value::Date(d) => Value::Date(*d),
            Value::Timestamp(ts) => Value::Date(ts.date()),
            Value::Text(s) => crate::dates::parse_timestamp(s)
                .map(|ts| Value::Date(ts.date()))
                .unwrap_or(Value::Absent),
            _ => Value::Absent,
        },
        ElementKind::Unknown => v.clone(),
    }
}

fn aggregate(values: &[Value], rows: &[usize], func: AggFunc) -> Value {
    match func {
        AggFunc::Count => Value::Integer(rows.iter().filter(|&&r| !values[r].is_absent()).count() as i64),
        AggFunc::First => values[rows[0]].clone(),
        AggFunc::Last => values[rows[rows.len() - 1]].clone(),
        AggFunc::Sum => {
            let sum: f64 = rows.iter().filter_map(|&r| values[r].as_f64()).sum();
            Value::Real(sum)
        }
        AggFunc::Mean => {
            let nums: Vec<f64> = rows.iter().filter_map(|&r| values[r].as_f64()).collect();
            if nums.is_empty() {
                Value::Absent
            } else {
                Value::Real(nums.iter().sum::<f64>() / nums.len() as f64)
            }
        }
        AggFunc::Max => rows
            .iter()
            .filter(|&&r| !values[r].is_absent())
            .max_by(|&&a, &&b| {
                values[a]
                    .partial_cmp_value(&values[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|&r| values[r].clone())
            .unwrap_or(Value::Absent),
        AggFunc::Min => rows
            .iter()
            .filter(|&&r| !values[r].is_absent())
            .min_by(|&&a, &&b| {
                values[a]
                    .partial_cmp_value(&values[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|&r| values[r].clone())
            .unwrap_or(Value::Absent),
    }
}

fn fill_column(col: &mut Column, strategy: &FillStrategy) {
    match strategy {
        FillStrategy::Drop => {}
        FillStrategy::FillValue(v) => {
            if let Some(domain) = &mut col.domain {
                let text = v.display_text();
                if !domain.contains(&text) {
                    domain.push(text);
                }
            }
            for cell in col.values.iter_mut() {
                if cell.is_absent() {
                    *cell = v.clone();
                }
            }
        }
        FillStrategy::Ffill => {
            let mut last: Option<Value> = None;
            for cell in col.values.iter_mut() {
                if cell.is_absent() {
                    if let Some(l) = &last {
                        *cell = l.clone();
                    }
                } else {
                    last = Some(cell.clone());
                }
            }
        }
        FillStrategy::Bfill => {
            let mut next: Option<Value> = None;
            for cell in col.values.iter_mut().rev() {
                if cell.is_absent() {
                    if let Some(n) = &next {
                        *cell = n.clone();
                    }
                } else {
                    next = Some(cell.clone());
                }
            }
        }
        FillStrategy::Mean => {
            let nums: Vec<f64> = col.values.iter().filter_map(|v| v.as_f64()).collect();
            if nums.is_empty() {
                return;
            }
            let mean = nums.iter().sum::<f64>() / nums.len() as f64;
            for cell in col.values.iter_mut() {
                if cell.is_absent() {
                    *cell = Value::Real(mean);
                }
            }
        }
        FillStrategy::Median => {
            let mut nums: Vec<f64> = col.values.iter().filter_map(|v| v.as_f64()).collect();
            if nums.is_empty() {
                return;
            }
            nums.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let mid = nums.len() / 2;
            let median = if nums.len() % 2 == 0 {
                (nums[mid - 1] + nums[mid]) / 2.0
            } else {
                nums[mid]
            };
            for cell in col.values.iter_mut() {
                if cell.is_absent() {
                    *cell = Value::Real(median);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            Column::new("id", vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]),
            Column::new(
                "name",
                vec![
                    Value::Text("a".into()),
                    Value::Text("b".into()),
                    Value::Text("c".into()),
                ],
            ),
        ])
    }

    #[test]
    fn select_and_drop_roundtrip() {
        let t = sample();
        let s = t.select(&["id".to_string()]).unwrap();
        assert_eq!(s.column_names(), vec!["id"]);
        let d = t.drop_columns(&["id".to_string()]).unwrap();
        assert_eq!(d.column_names(), vec!["name"]);
    }

    #[test]
    fn sort_descending() {
        let t = sample();
        let s = t.sort_by("id", false).unwrap();
        let vals: Vec<i64> = s
            .column("id")
            .unwrap()
            .values
            .iter()
            .map(|v| v.as_f64().unwrap() as i64)
            .collect();
        assert_eq!(vals, vec![3, 2, 1]);
    }

    #[test]
    fn join_type_mismatch_normalizes_keys() {
        let left = Table::from_columns(vec![
            Column::new("id", vec![Value::Integer(1), Value::Integer(2)]),
            Column::new("name", vec![Value::Text("A".into()), Value::Text("B".into())]),
        ]);
        let right = Table::from_columns(vec![
            Column::new("id", vec![Value::Text("1".into()), Value::Text("2".into())]),
            Column::new("price", vec![Value::Real(10.0), Value::Real(20.0)]),
        ]);
        let joined = left
            .merge(&right, &["id".to_string()], &["id".to_string()], JoinHow::Inner)
            .unwrap();
        assert_eq!(joined.num_rows(), 2);
        assert!(!joined.has_column("price_right"));
        assert_eq!(joined.column_names(), vec!["id", "name", "price"]);
        assert_eq!(joined.get(0, "price").unwrap().as_f64(), Some(10.0));
    }

    #[test]
    fn group_aggregate_sum() {
        let t = Table::from_columns(vec![
            Column::new(
                "store",
                vec![Value::Text("A".into()), Value::Text("A".into()), Value::Text("B".into())],
            ),
            Column::new("amount", vec![Value::Integer(100), Value::Integer(50), Value::Integer(30)]),
        ]);
        let g = t
            .group_aggregate(
                &["store".to_string()],
                &[("amount".to_string(), AggFunc::Sum, "total".to_string())],
            )
            .unwrap();
        assert_eq!(g.num_rows(), 2);
        assert_eq!(g.get(0, "total").unwrap().as_f64(), Some(150.0));
        assert_eq!(g.get(1, "total").unwrap().as_f64(), Some(30.0));
    }

    #[test]
    fn fill_na_extends_categorical_domain() {
        let mut col = Column::new("status", vec![Value::Text("open".into()), Value::Absent]).with_domain(vec!["open".into(), "closed".into()]);
        fill_column(&mut col, &FillStrategy::FillValue(Value::Text("pending".into())));
        assert_eq!(col.domain.as_ref().unwrap(), &vec!["open".to_string(), "closed".to_string(), "pending".to_string()]);
        assert_eq!(col.values[1].display_text(), "pending");
    }

    #[test]
    fn dedup_none_drops_all_duplicates() {
        let t = Table::from_columns(vec![Column::new(
            "k",
            vec![Value::Integer(1), Value::Integer(1), Value::Integer(2)],
        )]);
        let d = t.deduplicate(None, DedupKeep::None).unwrap();
        assert_eq!(d.num_rows(), 1);
        assert_eq!(d.get(0, "k").unwrap().as_f64(), Some(2.0));
    }
}
