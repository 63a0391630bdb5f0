use sqlchain_core::{
    op, raw, table, Builder, Column, Dialect, Executor, Grammar, JoinClause, JoinType,
    OrderDirection, ResultSet, Row, Value,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct User {
    id: i64,
    name: String,
}

// Prints every statement instead of talking to a database
struct PrintExecutor {
    dialect: Dialect,
}

impl Executor for PrintExecutor {
    async fn execute_query(&self, sql: &str, bindings: &[Value]) -> sqlchain_core::Result<ResultSet> {
        println!("QUERY: {}\n  bindings: {:?}", sql, bindings);

        let row: Row = if sql.contains(" as aggregate") {
            vec![Column::with_value("aggregate", 3)].into_iter().collect()
        } else {
            vec![Column::with_value("id", 1), Column::with_value("name", "Alice")]
                .into_iter()
                .collect()
        };
        Ok(vec![row].into())
    }

    async fn execute_non_query(&self, sql: &str, bindings: &[Value]) -> sqlchain_core::Result<u64> {
        println!("EXECUTE: {}\n  bindings: {:?}", sql, bindings);
        Ok(1)
    }

    fn grammar(&self) -> Grammar {
        Grammar::for_dialect(self.dialect)
    }
}

#[tokio::main]
async fn main() -> sqlchain_core::Result<()> {
    println!("=== Compiling queries ===");

    let mut query = table("users");
    query
        .select(("id", "name", "users.email as contact"))
        .where_("age", op::GT, 18)?
        .where_nested(|q| q.where_("role", op::EQ, "admin")?.or_where("karma", op::GTE, 100))?
        .where_in("country", vec!["NL", "BE"])
        .order_by("name", OrderDirection::Asc)
        .limit(10)
        .offset(20);
    println!("{}", query.to_sql());
    println!("bindings: {:?}\n", query.binding_values());

    let mut orders = table("orders");
    orders
        .select(("customer_id", "status"))
        .add_join(
            JoinClause::new(JoinType::Left, "customers")
                .on("orders.customer_id", op::EQ, "customers.id")
                .where_("customers.active", op::EQ, 1),
        )
        .where_between("created_at", "2024-01-01", "2024-12-31")
        .where_("placed_at", op::LT, raw("current_timestamp"))?
        .group_by(("customer_id", "status"))
        .having("count(*)", op::GT, 5)?
        .latest();
    let (sql, bindings) = orders.compile();
    println!("{}", sql);
    for (category, value) in bindings {
        println!("  {:?}: {}", category, value);
    }
    println!();

    let mut active = table("users");
    active
        .select("id")
        .where_exists(|q| {
            q.from("sessions")
                .where_raw("\"sessions\".\"user_id\" = \"users\".\"id\"")
                .where_year("started_at", op::EQ, 2024)
        })?
        .union_with(|q| Ok(q.from("admins").select("id")), true)?;
    println!("{}\n", active.to_sql());

    println!("=== Executing through a MySQL-flavoured executor ===");

    let db = PrintExecutor {
        dialect: "mysql".parse()?,
    };

    let mut users = Builder::with_connection(&db);
    users.from("users").where_("active", op::EQ, 1)?;

    let all: Vec<User> = users.get_as(&db).await?;
    println!("fetched: {:?}", all);

    let total = users.count(&db).await?;
    println!("count: {}", total);

    if let Some(row) = users.clone().find(&db, 1, ("id", "name")).await? {
        println!("found: {}", row.to_json());
    }

    let affected = users
        .insert(
            &db,
            vec![
                Column::with_value("name", "Bob"),
                Column::with_value("age", 30),
                Column::with_value("created_at", raw("now()")),
            ],
        )
        .await?;
    println!("inserted {} row(s)", affected);

    Ok(())
}
