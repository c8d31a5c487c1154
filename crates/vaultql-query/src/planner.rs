//! Query Planning
//!
//! Lays a query out as the engine's fixed stage order:
//! scope, flatten, filter, group, sort, limit, project.
//! Stages the query does not use are left out; the order never changes.

use crate::config::EngineConfig;
use crate::query::{Column, Condition, FlattenClause, Query, SortClause, SortKey, Source};
use std::fmt;

/// One pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    /// Keep records inside the `from` scope
    Scope(Source),

    /// Expand an array field into derived records
    Flatten(FlattenClause),

    /// Keep records satisfying every condition
    Filter(Vec<Condition>),

    /// Bucket records by a field
    Group { field: String },

    /// Order rows, or groups when grouped
    Sort(SortClause),

    /// Truncate rows, or groups when grouped
    Limit(usize),

    /// Assemble result entries or groups
    Project { columns: Option<Vec<Column>> },
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Scope(Source::Folder(path)) => write!(f, "Scope folder={}", path),
            PipelineStage::Scope(Source::Tag(tag)) => write!(f, "Scope tag={}", tag),
            PipelineStage::Flatten(clause) => {
                write!(f, "Flatten {} as {}", clause.field, clause.alias_name())
            }
            PipelineStage::Filter(conditions) => {
                let parts: Vec<String> = conditions
                    .iter()
                    .map(|c| format!("{} {} {}", c.field, c.operator, c.value))
                    .collect();
                write!(f, "Filter {}", parts.join(" AND "))
            }
            PipelineStage::Group { field } => write!(f, "Group by={}", field),
            PipelineStage::Sort(sort) => {
                let key = match &sort.key {
                    SortKey::Field(field) => field.as_str(),
                    SortKey::GroupSize => "group size",
                };
                write!(f, "Sort {} {:?}", key, sort.direction)
            }
            PipelineStage::Limit(count) => write!(f, "Limit {}", count),
            PipelineStage::Project { columns } => match columns {
                Some(columns) => {
                    let labels: Vec<String> = columns.iter().map(Column::label).collect();
                    write!(f, "Project [{}]", labels.join(", "))
                }
                None => write!(f, "Project *"),
            },
        }
    }
}

/// Ordered stages for one query
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    stages: Vec<PipelineStage>,
    grouped: bool,
}

impl ExecutionPlan {
    /// Stages in execution order
    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    /// True when the plan produces groups
    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    /// One line per stage
    pub fn explain(&self) -> String {
        self.stages
            .iter()
            .enumerate()
            .map(|(i, stage)| format!("{}. {}", i + 1, stage))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Query planner
#[derive(Debug, Clone, Default)]
pub struct QueryPlanner {
    config: EngineConfig,
}

impl QueryPlanner {
    /// Create a planner without a row ceiling
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a planner honouring the engine configuration
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Build the execution plan for a query
    pub fn plan(&self, query: &Query) -> ExecutionPlan {
        let mut stages = Vec::new();

        if let Some(source) = &query.from {
            stages.push(PipelineStage::Scope(source.clone()));
        }

        // Flatten runs before filtering so conditions can test the alias
        if let Some(flatten) = &query.flatten {
            stages.push(PipelineStage::Flatten(flatten.clone()));
        }

        if !query.conditions.is_empty() {
            stages.push(PipelineStage::Filter(query.conditions.clone()));
        }

        if let Some(field) = &query.group_by {
            stages.push(PipelineStage::Group {
                field: field.clone(),
            });
        }

        if let Some(sort) = &query.sort {
            stages.push(PipelineStage::Sort(sort.clone()));
        }

        let requested = query.limit.map(|n| n.get());
        if let Some(count) = self.config.effective_limit(requested) {
            stages.push(PipelineStage::Limit(count));
        }

        stages.push(PipelineStage::Project {
            columns: query.columns.clone(),
        });

        ExecutionPlan {
            stages,
            grouped: query.group_by.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Operator, SortDirection};

    fn stage_names(plan: &ExecutionPlan) -> Vec<&'static str> {
        plan.stages()
            .iter()
            .map(|s| match s {
                PipelineStage::Scope(_) => "scope",
                PipelineStage::Flatten(_) => "flatten",
                PipelineStage::Filter(_) => "filter",
                PipelineStage::Group { .. } => "group",
                PipelineStage::Sort(_) => "sort",
                PipelineStage::Limit(_) => "limit",
                PipelineStage::Project { .. } => "project",
            })
            .collect()
    }

    #[test]
    fn test_minimal_plan_only_projects() {
        let plan = QueryPlanner::new().plan(&Query::new());
        assert_eq!(stage_names(&plan), vec!["project"]);
        assert!(!plan.is_grouped());
    }

    #[test]
    fn test_full_plan_has_fixed_order() {
        let query = Query::new()
            .limit(3)
            .sort_by(SortKey::GroupSize, SortDirection::Desc)
            .group_by("category")
            .filter("status", Operator::Eq, "done")
            .flatten("tags", "tag")
            .from_folder("projects");

        let plan = QueryPlanner::new().plan(&query);
        assert_eq!(
            stage_names(&plan),
            vec!["scope", "flatten", "filter", "group", "sort", "limit", "project"]
        );
        assert!(plan.is_grouped());
    }

    #[test]
    fn test_max_limit_caps_plan() {
        let planner = QueryPlanner::with_config(&EngineConfig::new().max_limit(10));
        let plan = planner.plan(&Query::new().limit(50));
        assert!(plan.stages().contains(&PipelineStage::Limit(10)));

        let plan = planner.plan(&Query::new());
        assert!(plan.stages().contains(&PipelineStage::Limit(10)));
    }

    #[test]
    fn test_explain() {
        let query = Query::new()
            .from_tag("project")
            .filter("status", Operator::Eq, "done")
            .filter("priority", Operator::Gt, 1i64)
            .sort_by(SortKey::field("priority"), SortDirection::Desc);
        let explain = QueryPlanner::new().plan(&query).explain();
        assert_eq!(
            explain,
            "1. Scope tag=project\n\
             2. Filter status = done AND priority > 1\n\
             3. Sort priority Desc\n\
             4. Project *"
        );
    }
}
