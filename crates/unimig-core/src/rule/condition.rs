use std::collections::HashMap;

use serde_json::{json, Value};

use crate::datasource::{Datasource, DatasourceRef};
use crate::error::DomainError;
use crate::legacy::Condition;

use super::{AlertQuery, RelativeTimeRange, EXPRESSION_DATASOURCE_UID};

/// A datasource query waiting for its datasource to be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedQuery {
    pub ref_id: String,
    pub range: RelativeTimeRange,
    pub datasource: DatasourceRef,
    model: Value,
}

impl PlannedQuery {
    pub fn resolve(self, datasource: &Datasource) -> AlertQuery {
        let mut model = self.model;
        if let Some(obj) = model.as_object_mut() {
            obj.insert("refId".to_string(), Value::String(self.ref_id.clone()));
            obj.entry("datasource")
                .or_insert_with(|| json!({"type": datasource.kind, "uid": datasource.uid}));
        }
        AlertQuery {
            ref_id: self.ref_id,
            query_type: String::new(),
            relative_time_range: self.range,
            datasource_uid: datasource.uid.clone(),
            model,
        }
    }
}

/// Queries to resolve plus the classic condition expression that ties them
/// together.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionPlan {
    pub queries: Vec<PlannedQuery>,
    pub condition: AlertQuery,
}

impl ConditionPlan {
    pub fn condition_ref_id(&self) -> &str {
        &self.condition.ref_id
    }
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`.
fn ref_id_for(mut index: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses `"5m"`, `"now-5m"` or `"now"` into seconds before now.
fn parse_relative(raw: &str) -> Result<i64, DomainError> {
    let trimmed = raw.trim();
    if trimmed == "now" {
        return Ok(0);
    }
    let span = trimmed.strip_prefix("now-").unwrap_or(trimmed);
    humantime::parse_duration(span)
        .map(|d| d.as_secs() as i64)
        .map_err(|e| DomainError::InvalidTimeRange(format!("{raw}: {e}")))
}

fn datasource_ref(condition: &Condition) -> DatasourceRef {
    let query = &condition.query;
    if query.datasource_id > 0 {
        return DatasourceRef::Id(query.datasource_id);
    }
    match query.model.get("datasource") {
        Some(Value::Object(ds)) => match ds.get("uid").and_then(Value::as_str) {
            Some(uid) if !uid.is_empty() => DatasourceRef::Uid(uid.to_string()),
            _ => DatasourceRef::Default,
        },
        Some(Value::String(name)) if !name.is_empty() => DatasourceRef::Name(name.clone()),
        _ => DatasourceRef::Default,
    }
}

/// Splits legacy conditions into one query per distinct
/// `(refId, from, to, datasource)` and a `classic_conditions` expression
/// evaluating all of them.
pub fn plan_conditions(conditions: &[Condition]) -> Result<ConditionPlan, DomainError> {
    if conditions.is_empty() {
        return Err(DomainError::NoConditions);
    }

    let mut queries: Vec<PlannedQuery> = Vec::new();
    let mut seen: HashMap<(String, RelativeTimeRange, DatasourceRef), String> = HashMap::new();
    let mut classic = Vec::with_capacity(conditions.len());

    for (i, condition) in conditions.iter().enumerate() {
        let query = &condition.query;
        let old_ref = query
            .ref_id()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| DomainError::InvalidCondition(format!("condition {i} has no query ref id")))?;
        let from = query
            .from()
            .ok_or_else(|| DomainError::InvalidCondition(format!("condition {i} has no time range")))?;
        let range = RelativeTimeRange {
            from: parse_relative(from)?,
            to: parse_relative(query.to().unwrap_or("now"))?,
        };
        let datasource = datasource_ref(condition);

        let key = (old_ref.to_string(), range, datasource.clone());
        let ref_id = match seen.get(&key) {
            Some(existing) => existing.clone(),
            None => {
                let ref_id = ref_id_for(queries.len());
                seen.insert(key, ref_id.clone());
                queries.push(PlannedQuery {
                    ref_id: ref_id.clone(),
                    range,
                    datasource,
                    model: if query.model.is_object() {
                        query.model.clone()
                    } else {
                        json!({})
                    },
                });
                ref_id
            }
        };

        classic.push(json!({
            "type": "query",
            "evaluator": condition.evaluator,
            "operator": condition.operator,
            "query": {"params": [ref_id]},
            "reducer": condition.reducer,
        }));
    }

    let condition_ref = ref_id_for(queries.len());
    let condition = AlertQuery {
        ref_id: condition_ref.clone(),
        query_type: String::new(),
        relative_time_range: RelativeTimeRange::default(),
        datasource_uid: EXPRESSION_DATASOURCE_UID.to_string(),
        model: json!({
            "refId": condition_ref,
            "type": "classic_conditions",
            "datasource": {"type": EXPRESSION_DATASOURCE_UID, "uid": EXPRESSION_DATASOURCE_UID},
            "conditions": classic,
        }),
    };

    Ok(ConditionPlan { queries, condition })
}
