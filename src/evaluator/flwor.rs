use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    ast::{Direction, Expr, Flwor, LetBinding, OrderBy, OrderKey, Output, ReturnSpec},
    environment::Environment,
    evaluator::{EvalError, Evaluator, ops},
    value::{Closure, Function, Value},
};

impl Evaluator {
    /// Evaluates a FLWOR expression.
    ///
    /// Every combination of the `for` sources produces one row scope, with
    /// the last source varying fastest. `let` bindings are added in order,
    /// rows failing `where` are skipped, and the surviving rows are shaped by
    /// the output clause.
    pub(crate) fn eval_flwor(&self, flwor: &Flwor, env: &Environment) -> Result<Value, EvalError> {
        let mut sources = Vec::with_capacity(flwor.for_bindings.len());
        for binding in &flwor.for_bindings {
            let source = self.eval(&binding.source, env)?;
            let items = source
                .iter_items()
                .ok_or_else(|| EvalError::NotIterable(source.type_name().to_string()))?;
            sources.push(items);
        }
        debug!(
            sources = sources.len(),
            rows = sources.iter().map(Vec::len).product::<usize>(),
            "evaluating flwor"
        );

        let mut rows = Vec::new();
        let mut collected = match &flwor.output {
            Output::Collect(collectors) => vec![IndexMap::new(); collectors.len()],
            _ => Vec::new(),
        };

        let mut indices = vec![0usize; sources.len()];
        let mut exhausted = sources.iter().any(Vec::is_empty);

        while !exhausted {
            let mut scope = env.clone();
            for (binding, (items, &i)) in flwor.for_bindings.iter().zip(sources.iter().zip(&indices)) {
                scope = scope.bind(binding.name.as_str(), items[i].clone());
            }
            for binding in &flwor.let_bindings {
                let value = self.eval_let(binding, &scope)?;
                scope = scope.bind(binding.name.as_str(), value);
            }

            let keep = match &flwor.where_clause {
                Some(condition) => self.eval(condition, &scope)?.is_truthy(),
                None => true,
            };

            if keep {
                match &flwor.output {
                    Output::Return(spec) => rows.push(self.build_return(spec, &scope)?),
                    Output::Flatten(expr) => flatten_into(self.eval(expr, &scope)?, &mut rows),
                    Output::Collect(collectors) => {
                        let mut entries = Vec::with_capacity(collectors.len());
                        for collector in collectors {
                            let value = self.build_return(&collector.value, &scope)?;
                            let key = self.eval(&collector.key, &scope)?;
                            let with = self.eval(&collector.with, &scope)?;
                            entries.push((value, key, with));
                        }
                        for ((value, key, with), acc) in entries.into_iter().zip(collected.iter_mut()) {
                            let previous = acc.get(&key).cloned().unwrap_or(Value::None);
                            let folded = self.call_value(&with, vec![previous, value])?;
                            acc.insert(key, folded);
                        }
                    }
                }
            }

            exhausted = !advance(&mut indices, &sources);
        }

        match &flwor.output {
            Output::Collect(_) => {
                let mut dicts: Vec<Value> = collected.into_iter().map(Value::Dict).collect();
                if dicts.len() == 1 {
                    Ok(dicts.remove(0))
                } else {
                    Ok(Value::Tuple(dicts))
                }
            }
            Output::Return(spec) => {
                if rows.is_empty() {
                    return Ok(Value::Tuple(rows));
                }
                if let Some(order_by) = &flwor.order_by {
                    rows = sort_rows(rows, order_by, spec)?;
                }
                Ok(Value::Tuple(rows))
            }
            Output::Flatten(_) => Ok(Value::Tuple(rows)),
        }
    }

    /// A function literal bound by `let` can call itself through that name.
    fn eval_let(&self, binding: &LetBinding, scope: &Environment) -> Result<Value, EvalError> {
        match &binding.value {
            Expr::Function(def) => Ok(Value::Function(Function::Closure(Arc::new(Closure {
                params: def.params.clone(),
                body: Arc::clone(&def.body),
                env: scope.clone(),
                name: Some(binding.name.clone()),
            })))),
            other => self.eval(other, scope),
        }
    }

    fn build_return(&self, spec: &ReturnSpec, scope: &Environment) -> Result<Value, EvalError> {
        match spec {
            ReturnSpec::Positional(exprs) if exprs.len() == 1 => self.eval(&exprs[0], scope),
            ReturnSpec::Positional(exprs) => {
                let mut values = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    values.push(self.eval(expr, scope)?);
                }
                Ok(Value::Tuple(values))
            }
            ReturnSpec::Named(pairs) => {
                let mut map = IndexMap::with_capacity(pairs.len());
                for (name, expr) in pairs {
                    map.insert(Value::String(name.clone()), self.eval(expr, scope)?);
                }
                Ok(Value::Dict(map))
            }
        }
    }
}

/// Steps the odometer over the cartesian product, last position fastest.
/// Returns `false` once every combination has been produced.
fn advance(indices: &mut [usize], sources: &[Vec<Value>]) -> bool {
    for position in (0..indices.len()).rev() {
        indices[position] += 1;
        if indices[position] < sources[position].len() {
            return true;
        }
        indices[position] = 0;
    }
    false
}

/// Splices nested tuples into `out`. Lists are left intact.
fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Tuple(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        other => out.push(other),
    }
}

fn sort_rows(rows: Vec<Value>, order_by: &OrderBy, spec: &ReturnSpec) -> Result<Vec<Value>, EvalError> {
    let key = match (&order_by.key, spec.is_named()) {
        (OrderKey::Name(name), true) => Some(Value::String(name.clone())),
        (OrderKey::Position(position), false) => Some(Value::Integer(*position)),
        (OrderKey::Name(_), false) => {
            return Err(EvalError::Syntax(
                "ordering by a name requires named return values".into(),
            ));
        }
        (OrderKey::Position(_), true) => {
            return Err(EvalError::Syntax(
                "ordering by a position requires positional return values".into(),
            ));
        }
    };

    // A single positional return yields bare values, which sort by themselves.
    let key = match spec {
        ReturnSpec::Positional(exprs) if exprs.len() == 1 => None,
        _ => key,
    };

    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows {
        let sort_key = match &key {
            Some(key) => row.index(key)?,
            None => row.clone(),
        };
        keyed.push((sort_key, row));
    }

    let keyed = ops::try_sort_by(keyed, |(a, _), (b, _)| {
        let ordering = ops::order(a, b)?;
        Ok(match order_by.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        })
    })?;

    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_visits_product_in_order() {
        let sources = vec![
            vec![Value::Integer(1), Value::Integer(2)],
            vec![Value::Integer(10), Value::Integer(20), Value::Integer(30)],
        ];
        let mut indices = vec![0, 0];
        let mut seen = vec![indices.clone()];
        while advance(&mut indices, &sources) {
            seen.push(indices.clone());
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[1], vec![0, 1]);
        assert_eq!(seen[3], vec![1, 0]);
    }

    #[test]
    fn test_flatten_keeps_lists() {
        let nested = Value::Tuple(vec![
            Value::Integer(1),
            Value::Tuple(vec![Value::Integer(2), Value::Tuple(vec![Value::Integer(3)])]),
            Value::List(vec![Value::Integer(4)]),
        ]);
        let mut out = Vec::new();
        flatten_into(nested, &mut out);
        assert_eq!(
            out,
            vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::List(vec![Value::Integer(4)]),
            ]
        );
    }
}
