//! Relation expansion for reads that request a `join`.
//!
//! Each supported (model, relation) pair has one fixed fetch pattern. Pairs
//! outside the table are ignored. A failed lookup attaches `null` (to-one) or
//! an empty list (to-many); it never fails the enclosing read.

use payload_auth_sdk::{
    DocumentStore, FieldValue, FindQuery, IdType, Join, JoinOptions, Record, WhereClause,
};
use tracing::{debug, warn};

use super::naming::FieldNaming;
use super::transform::transform_output;
use super::where_clause::convert_where;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinPlan {
    /// Rows of `target` whose `foreign_key` points at this record.
    ToMany {
        target: &'static str,
        foreign_key: &'static str,
    },
    /// The `target` row referenced by this record's `local_key`.
    ToOne {
        target: &'static str,
        local_key: &'static str,
    },
}

fn plan_for(model: &str, relation: &str) -> Option<JoinPlan> {
    match (model, relation) {
        ("user", "account") => Some(JoinPlan::ToMany {
            target: "account",
            foreign_key: "userId",
        }),
        ("user", "session") => Some(JoinPlan::ToMany {
            target: "session",
            foreign_key: "userId",
        }),
        ("session" | "account", "user") => Some(JoinPlan::ToOne {
            target: "user",
            local_key: "userId",
        }),
        _ => None,
    }
}

pub struct JoinResolver<'a> {
    pub store: &'a dyn DocumentStore,
    pub naming: &'a FieldNaming,
    pub id_type: IdType,
    pub depth: u32,
}

impl JoinResolver<'_> {
    /// Attaches every requested relation of `model` onto `record`.
    pub async fn resolve(&self, model: &str, record: &mut Record, join: &Join) {
        for (relation, options) in join {
            let Some(plan) = plan_for(model, relation) else {
                debug!(model, relation = %relation, "no join pattern, skipping");
                continue;
            };
            let value = match plan {
                JoinPlan::ToMany {
                    target,
                    foreign_key,
                } => self.fetch_many(record, target, foreign_key, *options).await,
                JoinPlan::ToOne { target, local_key } => {
                    self.fetch_one(record, target, local_key).await
                }
            };
            record.insert(relation.clone(), value);
        }
    }

    async fn fetch_many(
        &self,
        record: &Record,
        target: &str,
        foreign_key: &str,
        options: JoinOptions,
    ) -> FieldValue {
        let Some(id) = record.get("id").and_then(FieldValue::as_str) else {
            return FieldValue::List(Vec::new());
        };
        let key = FieldValue::from_json(self.id_type.coerce(id).to_json());
        let filter = convert_where(&[WhereClause::eq(foreign_key, key)], self.naming);
        let collection = self.naming.collection_for(target);
        let query = FindQuery {
            filter,
            limit: options.limit,
            page: options.limit.map(|_| 1),
            sort: None,
            depth: self.depth,
        };

        match self.store.find(collection, query).await {
            Ok(result) => FieldValue::List(
                result
                    .docs
                    .into_iter()
                    .map(|doc| FieldValue::Map(transform_output(doc)))
                    .collect(),
            ),
            Err(e) => {
                warn!(collection, error = %e, "join lookup failed, attaching empty list");
                FieldValue::List(Vec::new())
            }
        }
    }

    async fn fetch_one(&self, record: &Record, target: &str, local_key: &str) -> FieldValue {
        // Unpopulated relations keep the store-side key (`user`, not `userId`).
        let Some(id) = record
            .get(local_key)
            .or_else(|| record.get(self.naming.store_field(local_key)))
            .and_then(reference_id)
        else {
            return FieldValue::Null;
        };
        let collection = self.naming.collection_for(target);

        match self
            .store
            .find_by_id(collection, &self.id_type.coerce(&id), self.depth)
            .await
        {
            Ok(doc) => FieldValue::Map(transform_output(doc)),
            Err(e) if e.is_not_found() => {
                debug!(collection, id = %id, "joined document missing, attaching null");
                FieldValue::Null
            }
            Err(e) => {
                warn!(collection, error = %e, "join lookup failed, attaching null");
                FieldValue::Null
            }
        }
    }
}

fn reference_id(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::String(s) => Some(s.clone()),
        FieldValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_table() {
        assert!(matches!(
            plan_for("user", "account"),
            Some(JoinPlan::ToMany { target: "account", .. })
        ));
        assert!(matches!(
            plan_for("user", "session"),
            Some(JoinPlan::ToMany { target: "session", .. })
        ));
        assert!(matches!(
            plan_for("session", "user"),
            Some(JoinPlan::ToOne { target: "user", .. })
        ));
        assert!(matches!(
            plan_for("account", "user"),
            Some(JoinPlan::ToOne { target: "user", .. })
        ));
        assert_eq!(plan_for("verification", "user"), None);
        assert_eq!(plan_for("user", "passkey"), None);
    }

    #[test]
    fn test_reference_id_accepts_scalars() {
        assert_eq!(reference_id(&FieldValue::from("7")), Some("7".to_owned()));
        assert_eq!(reference_id(&FieldValue::from(7)), Some("7".to_owned()));
        assert_eq!(reference_id(&FieldValue::Null), None);
        assert_eq!(reference_id(&FieldValue::Map(Record::new())), None);
    }
}
