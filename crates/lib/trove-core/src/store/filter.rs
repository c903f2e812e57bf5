use serde_json::Value;

/// Predicate over one document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Field equals the given value.
    Eq(Value),
    /// Field is absent from the record.
    Absent,
    /// Field equals any of the given values. This is the batching primitive
    /// the population engine uses to issue one query per relation per plan
    /// node; callers only need equality and absence.
    AnyOf(Vec<Value>),
}

/// Conjunction of field predicates, compiled to a parameterized WHERE
/// clause by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, FilterClause)>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to equal `value`.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), FilterClause::Eq(value.into())));
        self
    }

    /// Requires `field` to be absent from the record.
    #[must_use]
    pub fn absent(mut self, field: impl Into<String>) -> Self {
        self.clauses.push((field.into(), FilterClause::Absent));
        self
    }

    /// Requires `field` to equal one of `values`.
    #[must_use]
    pub fn any_of(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.clauses.push((field.into(), FilterClause::AnyOf(values)));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    #[must_use]
    pub fn clauses(&self) -> &[(String, FilterClause)] {
        &self.clauses
    }

    /// Renders the WHERE body and its bind list. Parameters are named
    /// `w0`, `w1`, … in clause order; absence compiles to a `NONE`
    /// comparison and binds nothing.
    pub(crate) fn to_where(&self) -> (String, Vec<(String, Value)>) {
        let mut parts = Vec::with_capacity(self.clauses.len());
        let mut binds = Vec::new();
        for (index, (field, clause)) in self.clauses.iter().enumerate() {
            let param = format!("w{index}");
            match clause {
                FilterClause::Eq(value) => {
                    parts.push(format!("{field} = ${param}"));
                    binds.push((param, value.clone()));
                }
                FilterClause::Absent => parts.push(format!("{field} = NONE")),
                FilterClause::AnyOf(values) => {
                    parts.push(format!("{field} IN ${param}"));
                    binds.push((param, Value::Array(values.clone())));
                }
            }
        }
        (parts.join(" AND "), binds)
    }
}
