//! The query-builder seam.
//!
//! [`QueryBuilder`] is the contract the assembler renders against: a small
//! knex-like surface where every filter method has an AND and an OR variant
//! selected by [`Boolean`]. [`SeaQueryBuilder`] implements it on top of
//! `sea_query::SelectStatement`, so all values stay bound parameters.

use sea_orm::{
    Condition, DatabaseBackend, Statement,
    sea_query::{
        Alias, Asterisk, ColumnRef, Expr, IntoColumnRef, MysqlQueryBuilder, Order,
        PostgresQueryBuilder, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder, Value,
    },
};

use crate::filtering::{Boolean, Comparison, NullCheck, PageWindow, Scalar, SetTest};

/// Builder operations the assembler needs. Column arguments are always
/// table-qualified paths that already passed the column allow-list.
pub trait QueryBuilder {
    fn select_all(&mut self, table: &str);

    fn select(&mut self, columns: &[String]);

    /// `column IS [NOT] NULL`
    fn where_null(&mut self, boolean: Boolean, column: &str, check: NullCheck);

    /// `column <op> value`
    fn where_compare(&mut self, boolean: Boolean, column: &str, op: Comparison, value: &Scalar);

    /// `column [NOT] IN (values)` or `column [NOT] BETWEEN values[0] AND values[1]`
    fn where_set(&mut self, boolean: Boolean, column: &str, op: SetTest, values: &[Scalar]);

    /// Parenthesised group; conditions added inside `build` land in the group
    fn where_group(&mut self, boolean: Boolean, build: &mut dyn FnMut(&mut Self));

    /// `LEFT JOIN table ON first = second`
    fn left_join(&mut self, table: &str, first: &str, second: &str);

    fn order_by(&mut self, column: &str, direction: Order);

    /// Length-aware pagination window, 1-based page
    fn paginate(&mut self, per_page: u64, current_page: u64);
}

#[derive(Debug, Clone)]
enum Term {
    Expr(SimpleExpr),
    Group(Condition),
}

impl Term {
    fn add_to(self, condition: Condition) -> Condition {
        match self {
            Self::Expr(expr) => condition.add(expr),
            Self::Group(group) => condition.add(group),
        }
    }
}

/// Left-to-right AND/OR chain with SQL precedence: AND binds tighter, so the
/// chain is a disjunction of AND-runs.
#[derive(Debug, Clone, Default)]
struct ConditionChain {
    runs: Vec<Vec<Term>>,
}

impl ConditionChain {
    fn push(&mut self, boolean: Boolean, term: Term) {
        match self.runs.last_mut() {
            Some(run) if boolean == Boolean::And => run.push(term),
            _ => self.runs.push(vec![term]),
        }
    }

    fn conjoin(run: Vec<Term>) -> Condition {
        run.into_iter()
            .fold(Condition::all(), |all, term| term.add_to(all))
    }

    fn finish(self) -> Option<Condition> {
        if self.runs.len() <= 1 {
            return self.runs.into_iter().next().map(Self::conjoin);
        }
        let any = self.runs.into_iter().fold(Condition::any(), |any, mut run| {
            if run.len() == 1 {
                run.remove(0).add_to(any)
            } else {
                any.add(Self::conjoin(run))
            }
        });
        Some(any)
    }
}

fn column_ref(path: &str) -> ColumnRef {
    match path.split_once('.') {
        Some((table, column)) => (Alias::new(table), Alias::new(column)).into_column_ref(),
        None => Alias::new(path).into_column_ref(),
    }
}

fn value(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Bool(b) => (*b).into(),
        Scalar::Int(i) => (*i).into(),
        Scalar::Float(f) => (*f).into(),
        Scalar::Text(s) => s.clone().into(),
    }
}

/// [`QueryBuilder`] over a sea-query `SELECT`
#[derive(Debug, Clone)]
pub struct SeaQueryBuilder {
    statement: SelectStatement,
    conditions: ConditionChain,
    window: Option<PageWindow>,
}

impl SeaQueryBuilder {
    /// Start a `SELECT ... FROM table`
    #[must_use]
    pub fn new(table: &str) -> Self {
        let mut statement = Query::select();
        statement.from(Alias::new(table));
        Self {
            statement,
            conditions: ConditionChain::default(),
            window: None,
        }
    }

    /// The pagination window set by [`QueryBuilder::paginate`], if any
    #[must_use]
    pub fn window(&self) -> Option<PageWindow> {
        self.window
    }

    fn filtered(&self) -> SelectStatement {
        let mut statement = self.statement.clone();
        if let Some(condition) = self.conditions.clone().finish() {
            statement.cond_where(condition);
        }
        statement
    }

    /// The full statement, pagination window included
    #[must_use]
    pub fn statement(&self) -> SelectStatement {
        let mut statement = self.filtered();
        if let Some(window) = self.window {
            statement.limit(window.limit).offset(window.offset);
        }
        statement
    }

    /// `SELECT COUNT(*) AS total` over the filtered rows, ignoring the window
    #[must_use]
    pub fn count_statement(&self) -> SelectStatement {
        let mut count = Query::select();
        count
            .expr_as(Expr::cust("COUNT(*)"), Alias::new("total"))
            .from_subquery(self.filtered(), Alias::new("counted"));
        count
    }

    #[must_use]
    pub fn build(&self, backend: DatabaseBackend) -> Statement {
        backend.build(&self.statement())
    }

    /// SQL with values inlined, for logs and tests
    #[must_use]
    pub fn to_sql(&self, backend: DatabaseBackend) -> String {
        let statement = self.statement();
        match backend {
            DatabaseBackend::MySql => statement.to_string(MysqlQueryBuilder),
            DatabaseBackend::Postgres => statement.to_string(PostgresQueryBuilder),
            DatabaseBackend::Sqlite => statement.to_string(SqliteQueryBuilder),
        }
    }
}

impl QueryBuilder for SeaQueryBuilder {
    fn select_all(&mut self, table: &str) {
        self.statement.column((Alias::new(table), Asterisk));
    }

    fn select(&mut self, columns: &[String]) {
        self.statement.columns(columns.iter().map(|c| column_ref(c)));
    }

    fn where_null(&mut self, boolean: Boolean, column: &str, check: NullCheck) {
        let column = Expr::col(column_ref(column));
        let expr = match check {
            NullCheck::IsNull => column.is_null(),
            NullCheck::IsNotNull => column.is_not_null(),
        };
        self.conditions.push(boolean, Term::Expr(expr));
    }

    fn where_compare(&mut self, boolean: Boolean, column: &str, op: Comparison, scalar: &Scalar) {
        let column = Expr::col(column_ref(column));
        let expr = match op {
            Comparison::Eq => column.eq(value(scalar)),
            Comparison::NotEq => column.ne(value(scalar)),
            Comparison::Gt => column.gt(value(scalar)),
            Comparison::Gte => column.gte(value(scalar)),
            Comparison::Lt => column.lt(value(scalar)),
            Comparison::Lte => column.lte(value(scalar)),
            Comparison::Like => column.like(scalar.to_string()),
            Comparison::NotLike => column.not_like(scalar.to_string()),
        };
        self.conditions.push(boolean, Term::Expr(expr));
    }

    fn where_set(&mut self, boolean: Boolean, column: &str, op: SetTest, values: &[Scalar]) {
        let path = column;
        let column = Expr::col(column_ref(path));
        let expr = match (op, values) {
            (SetTest::In, _) => column.is_in(values.iter().map(value)),
            (SetTest::NotIn, _) => column.is_not_in(values.iter().map(value)),
            (SetTest::Between, [low, high]) => column.between(value(low), value(high)),
            (SetTest::NotBetween, [low, high]) => column.not_between(value(low), value(high)),
            (SetTest::Between | SetTest::NotBetween, _) => {
                tracing::warn!(
                    column = path,
                    op = op.symbol(),
                    bounds = values.len(),
                    "Dropping range predicate without exactly two bounds"
                );
                return;
            }
        };
        self.conditions.push(boolean, Term::Expr(expr));
    }

    fn where_group(&mut self, boolean: Boolean, build: &mut dyn FnMut(&mut Self)) {
        let outer = std::mem::take(&mut self.conditions);
        build(self);
        let inner = std::mem::replace(&mut self.conditions, outer);
        if let Some(condition) = inner.finish() {
            self.conditions.push(boolean, Term::Group(condition));
        }
    }

    fn left_join(&mut self, table: &str, first: &str, second: &str) {
        self.statement.left_join(
            Alias::new(table),
            Expr::col(column_ref(first)).equals(column_ref(second)),
        );
    }

    fn order_by(&mut self, column: &str, direction: Order) {
        self.statement.order_by(column_ref(column), direction);
    }

    fn paginate(&mut self, per_page: u64, current_page: u64) {
        self.window = Some(PageWindow::new(per_page, current_page));
    }
}
