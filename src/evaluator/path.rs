use std::collections::VecDeque;

use tracing::trace;

use crate::{
    ast::Step,
    environment::Environment,
    evaluator::{EvalError, Evaluator},
    value::{Record, ResultSet, Value},
};

/// Where a pending path step resumes from.
enum Node {
    /// The query environment, for the first step
    Root,
    Value(Value),
}

impl Evaluator {
    /// Runs a path query breadth first.
    ///
    /// Each step reads an attribute of every candidate produced by the
    /// previous step. A candidate lacking the attribute is dropped. Collection
    /// attributes fan out into their elements (dictionaries into key/value
    /// records), and the step's predicate filters with the candidate bound to
    /// `self`. Results are deduplicated in discovery order.
    pub(crate) fn eval_path(&self, steps: &[Step], env: &Environment) -> Result<ResultSet, EvalError> {
        let mut results = ResultSet::new();
        let mut queue = VecDeque::from([(0usize, Node::Root)]);

        while let Some((index, node)) = queue.pop_front() {
            let Some(step) = steps.get(index) else {
                continue;
            };
            let attribute = match node {
                Node::Root => env.get(&step.name).cloned(),
                Node::Value(value) => value.get_field(&step.name),
            };
            let Some(attribute) = attribute else {
                trace!(step = %step.name, "candidate dropped, attribute missing");
                continue;
            };

            for candidate in expand(attribute) {
                if let Some(predicate) = &step.predicate {
                    let scoped = env.bind("self", candidate.clone());
                    if !self.eval(predicate, &scoped)?.is_truthy() {
                        continue;
                    }
                }
                if index + 1 == steps.len() {
                    results.insert(candidate);
                } else {
                    queue.push_back((index + 1, Node::Value(candidate)));
                }
            }
        }

        trace!(steps = steps.len(), found = results.len(), "path evaluated");
        Ok(results)
    }
}

/// Candidates contributed by one attribute value. Strings stay whole.
fn expand(value: Value) -> Vec<Value> {
    match value {
        Value::List(items) | Value::Tuple(items) => items,
        Value::Set(set) => set.into_iter().collect(),
        Value::Dict(map) => map
            .into_iter()
            .map(|(key, value)| Value::Record(Record::new().with("key", key).with("value", value)))
            .collect(),
        Value::Object(obj) => match obj.iter() {
            Some(items) => items,
            None => vec![Value::Object(obj)],
        },
        other => vec![other],
    }
}
