use sqlx::{Encode, PgPool, Postgres, QueryBuilder, Type};

/// Builds `UPDATE <table> SET ... WHERE ...` with bound parameters.
///
/// Columns passed to `set_opt` with `None` are left out of the statement entirely, so
/// unsupplied fields keep their stored value instead of being overwritten with NULL.
/// `scope` adds `AND`-joined equality filters; a statement without any scope is refused.
pub struct UpdateBuilder<'a> {
    qb: QueryBuilder<'a, Postgres>,
    assignments: usize,
    filters: Vec<Filter<'a>>,
}

type Filter<'a> = Box<dyn FnOnce(&mut QueryBuilder<'a, Postgres>) + Send + 'a>;

impl<'a> UpdateBuilder<'a> {
    pub fn new(table: &str) -> Self {
        Self {
            qb: QueryBuilder::new(format!("UPDATE {table} SET ")),
            assignments: 0,
            filters: Vec::new(),
        }
    }

    pub fn set<T>(mut self, column: &'static str, value: T) -> Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        if self.assignments > 0 {
            self.qb.push(", ");
        }
        self.qb.push(column).push(" = ").push_bind(value);
        self.assignments += 1;
        self
    }

    pub fn set_opt<T>(self, column: &'static str, value: Option<T>) -> Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn scope<T>(mut self, column: &'static str, value: T) -> Self
    where
        T: 'a + Encode<'a, Postgres> + Type<Postgres> + Send,
    {
        self.filters.push(Box::new(move |qb: &mut QueryBuilder<'a, Postgres>| {
            qb.push(column).push(" = ").push_bind(value);
        }));
        self
    }

    fn finish(mut self) -> anyhow::Result<QueryBuilder<'a, Postgres>> {
        anyhow::ensure!(self.assignments > 0, "update without assignments");
        anyhow::ensure!(!self.filters.is_empty(), "update without a scope");
        for (i, filter) in self.filters.into_iter().enumerate() {
            self.qb.push(if i == 0 { " WHERE " } else { " AND " });
            filter(&mut self.qb);
        }
        Ok(self.qb)
    }

    /// Final SQL text, placeholders included.
    pub fn sql(self) -> anyhow::Result<String> {
        Ok(self.finish()?.sql().to_string())
    }

    /// Runs the statement and returns the number of rows it touched.
    pub async fn execute(self, db: &PgPool) -> anyhow::Result<u64> {
        let mut qb = self.finish()?;
        let done = qb.build().execute(db).await?;
        Ok(done.rows_affected())
    }
}
