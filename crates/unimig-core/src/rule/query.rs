use serde_json::{Map, Value};

use crate::error::DomainError;

use super::AlertQuery;

const HIDE_FIELD: &str = "hide";
const TARGET_FIELD: &str = "target";
const TARGET_FULL_FIELD: &str = "targetFull";
const INSTANT_FIELD: &str = "instant";
const RANGE_FIELD: &str = "range";

/// Things worth reporting about a rewritten query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNote {
    /// A Prometheus query asked for both instant and range results and was
    /// turned into a range query.
    PrometheusBothToRange { ref_id: String },
    /// A Prometheus query had an `instant`/`range` flag that was not a bool.
    UnparsableFlag {
        ref_id: String,
        field: &'static str,
        raw: String,
    },
    /// The query looked like a 'Both' query but its datasource type was
    /// unreadable.
    UnknownDatasource { ref_id: String, reason: String },
}

enum Flag {
    Unset,
    Set(bool),
    Invalid(String),
}

fn read_flag(model: &Map<String, Value>, field: &str) -> Flag {
    match model.get(field) {
        None => Flag::Unset,
        Some(Value::Bool(b)) => Flag::Set(*b),
        Some(other) => Flag::Invalid(other.to_string()),
    }
}

fn datasource_type(model: &Map<String, Value>) -> Result<&str, String> {
    let ds = model
        .get("datasource")
        .ok_or_else(|| "missing datasource field".to_string())?;
    ds.get("type")
        .and_then(Value::as_str)
        .filter(|kind| !kind.is_empty())
        .ok_or_else(|| format!("missing type field '{ds}'"))
}

fn is_prometheus(model: &Map<String, Value>) -> bool {
    datasource_type(model).is_ok_and(|kind| kind == "prometheus")
}

/// Graphite keeps the fully expanded query in `targetFull`; referenced
/// sub-queries cannot be resolved at evaluation time, so use it as `target`.
fn fix_graphite_sub_queries(model: &mut Map<String, Value>) {
    if let Some(full) = model.remove(TARGET_FULL_FIELD) {
        model.insert(TARGET_FIELD.to_string(), full);
    }
}

fn fix_prometheus_both_type(
    ref_id: &str,
    model: &mut Map<String, Value>,
    notes: &mut Vec<QueryNote>,
) {
    let mut flags = [false; 2];
    for (slot, field) in flags.iter_mut().zip([INSTANT_FIELD, RANGE_FIELD]) {
        match read_flag(model, field) {
            Flag::Unset => {}
            Flag::Set(value) => *slot = value,
            Flag::Invalid(raw) => {
                if is_prometheus(model) {
                    notes.push(QueryNote::UnparsableFlag {
                        ref_id: ref_id.to_string(),
                        field,
                        raw,
                    });
                }
                return;
            }
        }
    }
    let [instant, range] = flags;
    if !instant || !range {
        return;
    }

    match datasource_type(model) {
        Ok("prometheus") => {
            model.insert(INSTANT_FIELD.to_string(), Value::Bool(false));
            notes.push(QueryNote::PrometheusBothToRange {
                ref_id: ref_id.to_string(),
            });
        }
        Ok(_) => {}
        Err(reason) => notes.push(QueryNote::UnknownDatasource {
            ref_id: ref_id.to_string(),
            reason,
        }),
    }
}

/// Rewrites one query model so unified alerting can evaluate it.
pub fn migrate_query_model(
    ref_id: &str,
    model: &Value,
    notes: &mut Vec<QueryNote>,
) -> Result<Value, DomainError> {
    let mut fixed = model
        .as_object()
        .cloned()
        .ok_or_else(|| DomainError::InvalidQuery(format!("model of {ref_id} is not an object")))?;

    fixed.remove(HIDE_FIELD);
    fix_graphite_sub_queries(&mut fixed);
    fix_prometheus_both_type(ref_id, &mut fixed, notes);

    Ok(Value::Object(fixed))
}

/// Rewrites every datasource query; expression queries pass through.
pub fn migrate_queries(
    data: Vec<AlertQuery>,
) -> Result<(Vec<AlertQuery>, Vec<QueryNote>), DomainError> {
    let mut notes = Vec::new();
    let mut result = Vec::with_capacity(data.len());
    for mut query in data {
        if !query.is_expression() {
            query.model = migrate_query_model(&query.ref_id, &query.model, &mut notes)?;
        }
        result.push(query);
    }
    Ok((result, notes))
}
