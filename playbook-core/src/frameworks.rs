//! Built-in framework declarations.
//!
//! Each framework is a schema declaration only. Seed data lives in fixture
//! files loaded by the host.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::lang::label;
use crate::schema::{
    AggregateSpec, ChoiceOption, CollectionSchema, FieldDescriptor, Layout, MilestoneTrack,
    WidgetSchema,
};
use crate::{CoreError, CoreResult};

/// Registry of framework schemas keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    schemas: BTreeMap<String, Arc<WidgetSchema>>,
}

impl Catalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The eight built-in frameworks.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for schema in [
            five_dysfunctions(),
            gantt(),
            pestle(),
            raci(),
            swot(),
            porter_five_forces(),
            mckinsey_7s(),
            issue_tree(),
        ] {
            catalog
                .schemas
                .insert(schema.slug.clone(), Arc::new(schema));
        }
        catalog
    }

    /// Register a schema after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSchema`] if the declaration is inconsistent.
    pub fn register(&mut self, schema: WidgetSchema) -> CoreResult<()> {
        schema.validate()?;
        self.schemas.insert(schema.slug.clone(), Arc::new(schema));
        Ok(())
    }

    /// Look up a schema.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<Arc<WidgetSchema>> {
        self.schemas.get(slug).cloned()
    }

    /// Look up a schema, failing on unknown slugs.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownFramework`].
    pub fn require(&self, slug: &str) -> CoreResult<Arc<WidgetSchema>> {
        self.get(slug)
            .ok_or_else(|| CoreError::UnknownFramework(slug.to_string()))
    }

    /// Schemas in slug order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<WidgetSchema>> {
        self.schemas.values()
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn name_field() -> FieldDescriptor {
    FieldDescriptor::text("name", label("名称", "Name"))
        .localized()
        .required()
}

fn options(pairs: &[(&str, &str, &str)]) -> Vec<ChoiceOption> {
    pairs
        .iter()
        .map(|(value, zh, en)| ChoiceOption::new(value, label(zh, en)))
        .collect()
}

fn five_dysfunctions() -> WidgetSchema {
    WidgetSchema::new(
        "five-dysfunctions",
        label("团队协作的五大障碍", "The Five Dysfunctions of a Team"),
        Layout::Radar {
            collection: "dysfunctions".into(),
            label: "name".into(),
            value: "score".into(),
        },
    )
    .with_collection(
        CollectionSchema::new("dysfunctions", label("障碍", "Dysfunctions"), "dysfunction")
            .with_field(FieldDescriptor::text("name", label("障碍", "Dysfunction")).localized().required())
            .with_field(FieldDescriptor::text("description", label("描述", "Description")).localized())
            .with_field(FieldDescriptor::score("score", label("评分", "Score"), 1.0, 5.0))
            .with_field(FieldDescriptor::list("symptoms", label("症状", "Symptoms")).localized())
            .with_field(FieldDescriptor::list("solutions", label("解决方案", "Solutions")).localized()),
    )
    .with_aggregate(AggregateSpec::mean(
        "overall_score",
        label("总体评分", "Overall Score"),
        "dysfunctions",
        "score",
    ))
}

fn gantt() -> WidgetSchema {
    WidgetSchema::new(
        "gantt",
        label("甘特图", "Gantt Chart"),
        Layout::Timeline {
            tasks: "tasks".into(),
            label: "name".into(),
            start: "start_date".into(),
            end: "end_date".into(),
            progress: Some("progress".into()),
            dependencies: Some("dependencies".into()),
            milestones: Some(MilestoneTrack {
                collection: "milestones".into(),
                label: "name".into(),
                date: "date".into(),
                task: "task".into(),
            }),
        },
    )
    .with_collection(
        CollectionSchema::new("tasks", label("任务", "Tasks"), "task")
            .with_field(name_field())
            .with_field(FieldDescriptor::date("start_date", label("开始日期", "Start Date")))
            .with_field(FieldDescriptor::date("end_date", label("结束日期", "End Date")))
            .with_field(FieldDescriptor::percent("progress", label("进度", "Progress")))
            .with_field(FieldDescriptor::text("assignee", label("负责人", "Assignee")))
            .with_field(FieldDescriptor::references(
                "dependencies",
                label("依赖", "Dependencies"),
                "tasks",
            )),
    )
    .with_collection(
        CollectionSchema::new("milestones", label("里程碑", "Milestones"), "milestone")
            .with_field(name_field())
            .with_field(FieldDescriptor::date("date", label("日期", "Date")))
            .with_field(FieldDescriptor::reference("task", label("所属任务", "Task"), "tasks")),
    )
}

fn pestle() -> WidgetSchema {
    WidgetSchema::new(
        "pestle",
        label("PESTLE 分析", "PESTLE Analysis"),
        Layout::List {
            collection: "factors".into(),
            label: "title".into(),
            group: Some("category".into()),
            score: Some("impact".into()),
        },
    )
    .with_collection(
        CollectionSchema::new("factors", label("因素", "Factors"), "factor")
            .with_field(FieldDescriptor::choice(
                "category",
                label("类别", "Category"),
                options(&[
                    ("political", "政治", "Political"),
                    ("economic", "经济", "Economic"),
                    ("social", "社会", "Social"),
                    ("technological", "技术", "Technological"),
                    ("legal", "法律", "Legal"),
                    ("environmental", "环境", "Environmental"),
                ]),
            ))
            .with_field(FieldDescriptor::text("title", label("标题", "Title")).localized().required())
            .with_field(FieldDescriptor::text("description", label("描述", "Description")).localized())
            .with_field(FieldDescriptor::score("impact", label("影响程度", "Impact"), 1.0, 5.0))
            .with_field(FieldDescriptor::choice(
                "direction",
                label("方向", "Direction"),
                options(&[
                    ("opportunity", "机会", "Opportunity"),
                    ("threat", "威胁", "Threat"),
                    ("neutral", "中性", "Neutral"),
                ]),
            ))
            .with_field(FieldDescriptor::list("trends", label("趋势", "Trends")).localized()),
    )
}

fn raci() -> WidgetSchema {
    WidgetSchema::new(
        "raci",
        label("RACI 责任矩阵", "RACI Matrix"),
        Layout::Grid {
            rows: "activities".into(),
            row_label: "name".into(),
            columns: "roles".into(),
            column_label: "name".into(),
            cells: "assignments".into(),
            row_ref: "activity".into(),
            column_ref: "role".into(),
            code: "code".into(),
        },
    )
    .with_collection(
        CollectionSchema::new("roles", label("角色", "Roles"), "role")
            .with_field(name_field()),
    )
    .with_collection(
        CollectionSchema::new("activities", label("活动", "Activities"), "activity")
            .with_field(name_field())
            .with_field(FieldDescriptor::text("phase", label("阶段", "Phase")).localized()),
    )
    .with_collection(
        CollectionSchema::new("assignments", label("分配", "Assignments"), "assignment")
            .with_field(FieldDescriptor::reference("activity", label("活动", "Activity"), "activities"))
            .with_field(FieldDescriptor::reference("role", label("角色", "Role"), "roles"))
            .with_field(FieldDescriptor::choice(
                "code",
                label("职责", "Responsibility"),
                options(&[
                    ("R", "负责", "Responsible"),
                    ("A", "批准", "Accountable"),
                    ("C", "咨询", "Consulted"),
                    ("I", "知会", "Informed"),
                ]),
            )),
    )
}

fn swot() -> WidgetSchema {
    WidgetSchema::new(
        "swot",
        label("SWOT 分析", "SWOT Analysis"),
        Layout::Quadrants {
            collection: "entries".into(),
            label: "title".into(),
            quadrant: "quadrant".into(),
        },
    )
    .with_collection(
        CollectionSchema::new("entries", label("条目", "Entries"), "entry")
            .with_field(FieldDescriptor::choice(
                "quadrant",
                label("象限", "Quadrant"),
                options(&[
                    ("strength", "优势", "Strengths"),
                    ("weakness", "劣势", "Weaknesses"),
                    ("opportunity", "机会", "Opportunities"),
                    ("threat", "威胁", "Threats"),
                ]),
            ))
            .with_field(FieldDescriptor::text("title", label("标题", "Title")).localized().required())
            .with_field(FieldDescriptor::text("detail", label("说明", "Detail")).localized())
            .with_field(FieldDescriptor::score("weight", label("权重", "Weight"), 1.0, 5.0)),
    )
}

fn porter_five_forces() -> WidgetSchema {
    WidgetSchema::new(
        "porter-five-forces",
        label("波特五力模型", "Porter's Five Forces"),
        Layout::Radar {
            collection: "forces".into(),
            label: "name".into(),
            value: "intensity".into(),
        },
    )
    .with_collection(
        CollectionSchema::new("forces", label("竞争力量", "Forces"), "force")
            .with_field(FieldDescriptor::text("name", label("力量", "Force")).localized().required())
            .with_field(FieldDescriptor::score("intensity", label("强度", "Intensity"), 1.0, 5.0))
            .with_field(FieldDescriptor::list("factors", label("影响因素", "Factors")).localized()),
    )
    .with_aggregate(AggregateSpec::mean(
        "overall_intensity",
        label("总体竞争强度", "Overall Intensity"),
        "forces",
        "intensity",
    ))
}

fn mckinsey_7s() -> WidgetSchema {
    WidgetSchema::new(
        "mckinsey-7s",
        label("麦肯锡 7S 模型", "McKinsey 7S Framework"),
        Layout::List {
            collection: "elements".into(),
            label: "name".into(),
            group: Some("kind".into()),
            score: Some("alignment".into()),
        },
    )
    .with_collection(
        CollectionSchema::new("elements", label("要素", "Elements"), "element")
            .with_field(FieldDescriptor::text("name", label("要素", "Element")).localized().required())
            .with_field(FieldDescriptor::choice(
                "kind",
                label("类型", "Kind"),
                options(&[("hard", "硬要素", "Hard"), ("soft", "软要素", "Soft")]),
            ))
            .with_field(FieldDescriptor::score("alignment", label("协同度", "Alignment"), 1.0, 5.0))
            .with_field(FieldDescriptor::text("notes", label("备注", "Notes")).localized()),
    )
    .with_aggregate(AggregateSpec::mean(
        "overall_alignment",
        label("整体协同度", "Overall Alignment"),
        "elements",
        "alignment",
    ))
}

fn issue_tree() -> WidgetSchema {
    WidgetSchema::new(
        "issue-tree",
        label("议题树", "Issue Tree"),
        Layout::Tree {
            collection: "nodes".into(),
            label: "title".into(),
            parent: "parent".into(),
        },
    )
    .with_collection(
        CollectionSchema::new("nodes", label("节点", "Nodes"), "node")
            .with_field(FieldDescriptor::text("title", label("议题", "Issue")).localized().required())
            .with_field(FieldDescriptor::reference("parent", label("上级议题", "Parent"), "nodes"))
            .with_field(FieldDescriptor::text("hypothesis", label("假设", "Hypothesis")).localized())
            .with_field(FieldDescriptor::choice(
                "priority",
                label("优先级", "Priority"),
                options(&[
                    ("high", "高", "High"),
                    ("medium", "中", "Medium"),
                    ("low", "低", "Low"),
                ]),
            )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schemas_are_valid() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 8);
        for schema in catalog.iter() {
            schema
                .validate()
                .unwrap_or_else(|e| panic!("{} invalid: {e}", schema.slug));
        }
    }

    #[test]
    fn test_require_unknown_framework() {
        let catalog = Catalog::builtin();
        assert!(matches!(
            catalog.require("bcg-matrix"),
            Err(CoreError::UnknownFramework(_))
        ));
    }

    #[test]
    fn test_register_rejects_invalid_schema() {
        let mut catalog = Catalog::new();
        let schema = WidgetSchema::new(
            "empty",
            label("空", "Empty"),
            Layout::Tree {
                collection: "nodes".into(),
                label: "title".into(),
                parent: "parent".into(),
            },
        );
        assert!(catalog.register(schema).is_err());
        assert!(catalog.is_empty());
    }
}
