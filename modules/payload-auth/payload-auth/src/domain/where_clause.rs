//! Where-clause translation: auth-framework predicates → store filters.

use payload_auth_sdk::{
    Condition, Connector, FieldValue, Operator, StoreOperator, StoreWhere, WhereClause,
};

use super::naming::FieldNaming;

/// Translates an ordered clause list into a store filter.
///
/// - no clauses → [`StoreWhere::All`]
/// - one clause → a bare field filter, without an `and` wrapper
/// - several → `and` (non-OR clauses) and `or` (OR clauses), order preserved
///
/// The single-clause shape is kept distinct from a one-element `and` group;
/// the store treats the two differently.
#[must_use]
pub fn convert_where(clauses: &[WhereClause], naming: &FieldNaming) -> StoreWhere {
    match clauses {
        [] => StoreWhere::All,
        [single] => convert_clause(single, naming),
        many => {
            let (or, and): (Vec<&WhereClause>, Vec<&WhereClause>) =
                many.iter().partition(|c| c.connector == Connector::Or);
            StoreWhere::Groups {
                and: and.into_iter().map(|c| convert_clause(c, naming)).collect(),
                or: or.into_iter().map(|c| convert_clause(c, naming)).collect(),
            }
        }
    }
}

fn convert_clause(clause: &WhereClause, naming: &FieldNaming) -> StoreWhere {
    StoreWhere::field(
        naming.store_field(&clause.field),
        convert_operator(clause.operator, &clause.value),
    )
}

/// Maps an auth operator and value onto the store's operator vocabulary.
#[must_use]
pub fn convert_operator(operator: Operator, value: &FieldValue) -> Condition {
    match operator {
        Operator::Eq => Condition::new(StoreOperator::Equals, value.to_json()),
        Operator::Ne => Condition::new(StoreOperator::NotEquals, value.to_json()),
        Operator::Gt => Condition::new(StoreOperator::GreaterThan, value.to_json()),
        Operator::Gte => Condition::new(StoreOperator::GreaterThanEqual, value.to_json()),
        Operator::Lt => Condition::new(StoreOperator::LessThan, value.to_json()),
        Operator::Lte => Condition::new(StoreOperator::LessThanEqual, value.to_json()),
        Operator::In => Condition::new(StoreOperator::In, value.to_json()),
        Operator::Contains => Condition::new(StoreOperator::Contains, value.to_json()),
        Operator::StartsWith => {
            Condition::new(StoreOperator::Like, format!("{}%", like_operand(value)))
        }
        Operator::EndsWith => {
            Condition::new(StoreOperator::Like, format!("%{}", like_operand(value)))
        }
    }
}

fn like_operand(value: &FieldValue) -> String {
    match value.to_json() {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Returns the ID when `filter` is exactly `{ id: { equals: <id> } }`.
///
/// Anything else (composite filters, other fields, other operators, non-scalar
/// values) is not a point lookup and yields `None`.
#[must_use]
pub fn extract_single_id(filter: &StoreWhere) -> Option<String> {
    let StoreWhere::Field { field, condition } = filter else {
        return None;
    };
    if field != "id" || condition.op != StoreOperator::Equals {
        return None;
    }
    match &condition.value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
