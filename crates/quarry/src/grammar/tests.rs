use super::*;
use crate::qb::{Builder, Lock, without_expressions};
use crate::row::Row;
use crate::value::{Value, raw};
use std::sync::Arc;

fn mysql() -> Builder {
    Builder::with_grammar(Arc::new(MySqlGrammar::new()))
}

fn postgres() -> Builder {
    Builder::with_grammar(Arc::new(PostgresGrammar::new()))
}

fn sqlite() -> Builder {
    Builder::with_grammar(Arc::new(SqliteGrammar::new()))
}

fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

#[test]
fn test_split_alias_is_case_insensitive() {
    assert_eq!(split_alias("users AS u"), Some(("users", "u")));
    assert_eq!(split_alias("name as  n"), Some(("name", "n")));
    assert_eq!(split_alias("basket"), None);
}

#[test]
fn test_concatenate_skips_empty_segments() {
    assert_eq!(concatenate(["select *", "", "from t", ""]), "select * from t");
    assert_eq!(concatenate(Vec::<String>::new()), "");
}

#[test]
fn test_wrapping_per_dialect() {
    let generic = GenericGrammar::new();
    let mysql = MySqlGrammar::new();
    let postgres = PostgresGrammar::new();

    assert_eq!(generic.wrap_str("users.id"), "users.id");
    assert_eq!(mysql.wrap_str("users.id"), "`users`.`id`");
    assert_eq!(postgres.wrap_str("users.id"), "\"users\".\"id\"");
    assert_eq!(postgres.wrap_str("users.*"), "\"users\".*");
    assert_eq!(mysql.wrap_str("we`ird"), "`we``ird`");
    assert_eq!(postgres.wrap(&raw("count(*)")), "count(*)");
}

#[test]
fn test_wrapping_aliases() {
    let postgres = PostgresGrammar::with_table_prefix("app_");
    assert_eq!(postgres.wrap_str("name as n"), "\"name\" as \"n\"");
    assert_eq!(postgres.wrap_table_str("users as u"), "\"app_users\" as \"u\"");
    assert_eq!(
        postgres.wrap_prefixed(&Value::from("users as u"), true),
        "\"users\" as \"app_u\""
    );
}

#[test]
fn test_table_prefix_applies_to_tables_and_qualified_columns() {
    let grammar: Arc<dyn Grammar> = Arc::new(SqliteGrammar::with_table_prefix("app_"));
    let mut q = Builder::with_grammar(grammar);
    q.from("users")
        .select(["users.id", "name"])
        .join("posts", "users.id", "=", "posts.user_id");
    assert_eq!(
        q.to_sql(),
        "select \"app_users\".\"id\", \"name\" from \"app_users\" \
         inner join \"app_posts\" on \"app_users\".\"id\" = \"app_posts\".\"user_id\""
    );
}

#[test]
fn test_table_prefix_applies_once_to_schema_qualified_tables() {
    let grammar = PostgresGrammar::with_table_prefix("p_");
    assert_eq!(grammar.wrap_table_str("db.users"), "\"db\".\"p_users\"");
    assert_eq!(grammar.wrap_table_str("db.users as u"), "\"db\".\"p_users\" as \"u\"");
    assert_eq!(grammar.wrap_str("db.users.id"), "\"db\".\"p_users\".\"id\"");

    let mut q = Builder::with_grammar(Arc::new(grammar));
    q.from("db.users").select(["users.id"]);
    assert_eq!(q.to_sql(), "select \"p_users\".\"id\" from \"db\".\"p_users\"");
}

#[test]
fn test_mysql_select() {
    let mut q = mysql();
    q.from("users")
        .select(["id", "name"])
        .where_eq("status", "active")
        .order_by("name", "asc")
        .limit(10);
    assert_eq!(
        q.to_sql(),
        "select `id`, `name` from `users` where `status` = ? order by `name` asc limit 10"
    );
}

#[test]
fn test_mysql_json_selector() {
    let mut q = mysql();
    q.from("users").where_("meta->prefs->theme", "=", "dark");
    assert_eq!(
        q.to_sql(),
        "select * from `users` where json_unquote(json_extract(`meta`, '$.\"prefs\".\"theme\"')) = ?"
    );
}

#[test]
fn test_mysql_json_boolean_is_inlined() {
    let mut q = mysql();
    q.from("users").where_("options->enabled", "=", false);
    assert_eq!(
        q.to_sql(),
        "select * from `users` where json_unquote(json_extract(`options`, '$.\"enabled\"')) = false"
    );
    assert!(q.get_bindings().is_empty());
}

#[test]
fn test_mysql_unions_are_parenthesized() {
    let mut admins = mysql();
    admins.from("admins").where_eq("level", 3);

    let mut q = mysql();
    q.from("users").where_eq("active", true).union_all(admins);
    q.order_by("name", "asc").limit(5);

    let sql = q.to_sql();
    assert_eq!(
        sql,
        "(select * from `users` where `active` = ?) union all (select * from `admins` where `level` = ?) \
         order by `name` asc limit 5"
    );
    assert_eq!(placeholders(&sql), q.get_bindings().len());
}

#[test]
fn test_mysql_locks_and_random() {
    let mut q = mysql();
    q.from("users").in_random_order("42").lock_for_update();
    assert_eq!(q.to_sql(), "select * from `users` order by RAND(42) for update");

    q.shared_lock();
    assert_eq!(q.to_sql(), "select * from `users` order by RAND(42) lock in share mode");
}

#[test]
fn test_mysql_extra_operator() {
    let mut q = mysql();
    q.from("users").where_("name", "sounds like", "jon");
    assert_eq!(q.to_sql(), "select * from `users` where `name` sounds like ?");

    let mut generic = Builder::new();
    generic.from("users").where_("name", "sounds like", "jon");
    assert_eq!(generic.to_sql(), "select * from users where name = ?");
    assert_eq!(generic.get_bindings(), vec![Value::from("sounds like")]);
}

#[test]
fn test_mysql_delete() {
    let grammar = MySqlGrammar::new();

    let mut q = mysql();
    q.from("users").where_eq("id", 1).limit(1);
    assert_eq!(grammar.compile_delete(&q), "delete from `users` where `id` = ? limit 1");

    let mut joined = mysql();
    joined
        .from("users")
        .join_where("bans", "bans.user_id", "=", 7)
        .where_eq("users.active", false);
    assert_eq!(
        grammar.compile_delete(&joined),
        "delete `users` from `users` inner join `bans` on `bans`.`user_id` = ? where `users`.`active` = ?"
    );
    assert_eq!(
        grammar.prepare_bindings_for_delete(joined.get_raw_bindings()),
        vec![Value::from(7), Value::from(false)]
    );
}

#[test]
fn test_postgres_json_selector() {
    let grammar = PostgresGrammar::new();
    assert_eq!(grammar.wrap_str("meta->theme"), "\"meta\"->>'theme'");
    assert_eq!(grammar.wrap_str("meta->prefs->theme"), "\"meta\"->'prefs'->>'theme'");
}

#[test]
fn test_postgres_date_parts() {
    let mut q = postgres();
    q.from("orders")
        .where_date("created_at", "=", "2024-05-01")
        .where_month("created_at", ">", 6);
    assert_eq!(
        q.to_sql(),
        "select * from \"orders\" where \"created_at\"::date = ? \
         and extract(month from \"created_at\") > ?"
    );
}

#[test]
fn test_postgres_operators_and_locks() {
    let mut q = postgres();
    q.from("docs").where_("tags", "@>", "{a}").shared_lock();
    assert_eq!(q.to_sql(), "select * from \"docs\" where \"tags\" @> ? for share");

    q.lock(Lock::Update);
    assert_eq!(q.to_sql(), "select * from \"docs\" where \"tags\" @> ? for update");
}

#[test]
fn test_postgres_truncate() {
    let mut q = postgres();
    q.from("users");
    let statements = PostgresGrammar::new().compile_truncate(&q);
    assert_eq!(
        statements,
        vec![("truncate \"users\" restart identity".to_string(), Vec::new())]
    );
}

#[test]
fn test_sqlite_date_parts() {
    let mut q = sqlite();
    q.from("orders").where_year("created_at", "=", 2024).where_day("created_at", "<", 10);
    assert_eq!(
        q.to_sql(),
        "select * from \"orders\" where strftime('%Y', \"created_at\") = cast(? as text) \
         and strftime('%d', \"created_at\") < cast(? as text)"
    );
}

#[test]
fn test_sqlite_truncate_resets_sequence() {
    let mut q = sqlite();
    q.from("users");
    let statements = SqliteGrammar::with_table_prefix("app_").compile_truncate(&q);
    assert_eq!(
        statements,
        vec![
            (
                "delete from sqlite_sequence where name = ?".to_string(),
                vec![Value::from("app_users")]
            ),
            ("delete from \"app_users\"".to_string(), Vec::new()),
        ]
    );
}

#[test]
fn test_sqlite_ignores_locks() {
    let mut q = sqlite();
    q.from("users").lock_for_update();
    assert_eq!(q.to_sql(), "select * from \"users\"");
}

#[test]
fn test_compile_exists() {
    let mut q = postgres();
    q.from("users").where_eq("id", 1);
    assert_eq!(
        PostgresGrammar::new().compile_exists(&q),
        "select exists(select * from \"users\" where \"id\" = ?) as \"exists\""
    );
}

#[test]
fn test_compile_insert_uses_first_row_columns() {
    let mut q = postgres();
    q.from("users");
    let rows = vec![
        Row::new().with("email", "a@x").with("votes", 1),
        Row::new().with("votes", 2).with("email", "b@x"),
    ];
    assert_eq!(
        PostgresGrammar::new().compile_insert(&q, &rows),
        "insert into \"users\" (\"email\", \"votes\") values (?, ?), (?, ?)"
    );
    assert_eq!(
        PostgresGrammar::new().compile_insert(&q, &[]),
        "insert into \"users\" default values"
    );
}

#[test]
fn test_compile_insert_inlines_expressions() {
    let mut q = sqlite();
    q.from("events");
    let rows = vec![Row::new().with("name", "boot").with("at", raw("CURRENT_TIMESTAMP"))];
    assert_eq!(
        SqliteGrammar::new().compile_insert(&q, &rows),
        "insert into \"events\" (\"name\", \"at\") values (?, CURRENT_TIMESTAMP)"
    );
}

#[test]
fn test_compile_update_and_binding_order() {
    let grammar = PostgresGrammar::new();
    let mut q = postgres();
    q.from("users")
        .join_where("teams", "teams.id", "=", 4)
        .where_("votes", ">", 100);
    let values = Row::new().with("name", "x").with("votes", raw("\"votes\" + 1"));

    let sql = grammar.compile_update(&q, &values);
    assert_eq!(
        sql,
        "update \"users\" inner join \"teams\" on \"teams\".\"id\" = ? \
         set \"name\" = ?, \"votes\" = \"votes\" + 1 where \"votes\" > ?"
    );

    let bindings = without_expressions(grammar.prepare_bindings_for_update(q.get_raw_bindings(), &values));
    assert_eq!(bindings, vec![Value::from(4), Value::from("x"), Value::from(100)]);
    assert_eq!(placeholders(&sql), bindings.len());
}

#[test]
fn test_compile_delete_default() {
    let mut q = sqlite();
    q.from("users").where_eq("id", 3);
    let grammar = SqliteGrammar::new();
    assert_eq!(grammar.compile_delete(&q), "delete from \"users\" where \"id\" = ?");
    assert_eq!(
        grammar.prepare_bindings_for_delete(q.get_raw_bindings()),
        vec![Value::from(3)]
    );
}

#[test]
fn test_placeholders_match_bindings_across_dialects() {
    let grammars: Vec<Arc<dyn Grammar>> = vec![
        Arc::new(GenericGrammar::new()),
        Arc::new(MySqlGrammar::new()),
        Arc::new(PostgresGrammar::new()),
        Arc::new(SqliteGrammar::new()),
    ];
    for grammar in grammars {
        let mut q = Builder::with_grammar(grammar);
        q.from("users")
            .select_raw("? as tag", [Value::from("t")])
            .join_where("teams", "teams.id", "=", 2)
            .where_in("id", [1, 2, 3])
            .where_between("age", 18, 65)
            .where_date("created_at", ">", "2024-01-01")
            .where_nested(|nested| {
                nested.where_eq("a", 1).or_where_eq("b", 2);
            })
            .group_by(["status"])
            .having("total", ">", 5)
            .order_by_raw("field(id, ?)", [Value::from(9)])
            .union_with(false, |other| {
                other.from("admins").where_eq("level", 1);
            });

        let sql = q.to_sql();
        assert_eq!(placeholders(&sql), q.get_bindings().len(), "{sql}");
    }
}

#[test]
fn test_date_format() {
    assert_eq!(GenericGrammar::new().date_format(), "%Y-%m-%d %H:%M:%S");
}
