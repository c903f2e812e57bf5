/// One relation to expand, with the plan to apply to its results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    relation: String,
    nested: PopulationPlan,
}

impl PlanNode {
    #[must_use]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    #[must_use]
    pub const fn nested(&self) -> &PopulationPlan {
        &self.nested
    }
}

/// Caller-specified tree of relations to recursively expand.
///
/// Plans are ephemeral: built per call, never persisted. Self-referential
/// expansion is expressed by explicitly nesting the same relation name,
/// which keeps the traversal finite by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationPlan {
    nodes: Vec<PlanNode>,
}

impl PopulationPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expands `name` with no further nesting.
    #[must_use]
    pub fn relation(self, name: impl Into<String>) -> Self {
        self.relation_with(name, Self::new())
    }

    /// Expands `name`, applying `nested` to each of its results. Declaring
    /// the same relation twice merges the nested plans.
    #[must_use]
    pub fn relation_with(mut self, name: impl Into<String>, nested: Self) -> Self {
        self.insert_node(PlanNode {
            relation: name.into(),
            nested,
        });
        self
    }

    /// Builds a plan from dotted relation paths, merging shared prefixes:
    /// `["items", "sub_categories.items"]` expands `items` on the roots and
    /// `items` on every record of `sub_categories`.
    #[must_use]
    pub fn from_paths<'a, I>(paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut plan = Self::new();
        for path in paths {
            plan.insert_path(path);
        }
        plan
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    /// Longest chain of nested relations in the plan.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| 1 + node.nested.depth())
            .max()
            .unwrap_or(0)
    }

    fn insert_path(&mut self, path: &str) {
        let mut segments = path.split('.').filter(|segment| !segment.is_empty());
        let Some(head) = segments.next() else {
            return;
        };
        let rest: Vec<&str> = segments.collect();

        let index = match self.nodes.iter().position(|node| node.relation == head) {
            Some(index) => index,
            None => {
                self.nodes.push(PlanNode {
                    relation: head.to_string(),
                    nested: Self::new(),
                });
                self.nodes.len() - 1
            }
        };
        if !rest.is_empty() {
            self.nodes[index].nested.insert_path(&rest.join("."));
        }
    }

    fn insert_node(&mut self, node: PlanNode) {
        match self.nodes.iter_mut().find(|existing| existing.relation == node.relation) {
            Some(existing) => existing.nested.merge(node.nested),
            None => self.nodes.push(node),
        }
    }

    fn merge(&mut self, other: Self) {
        for node in other.nodes {
            self.insert_node(node);
        }
    }
}
