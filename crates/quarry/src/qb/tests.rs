//! Unit tests for the builder, compiled with the generic grammar.

use super::*;
use crate::error::BuildError;
use crate::value::{Value, raw};

fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

fn users() -> Builder {
    let mut q = Builder::new();
    q.from("users");
    q
}

#[test]
fn test_select_basic() {
    let q = users();
    assert_eq!(q.to_sql(), "select * from users");
    assert!(q.get_bindings().is_empty());
}

#[test]
fn test_select_where_in_and_eq() {
    let mut q = Builder::new();
    q.select(["id"]).where_in("id", [3]).where_eq("name", "x");

    assert_eq!(q.to_sql(), "select id where id in (?) and name = ?");
    assert_eq!(q.get_bindings(), vec![Value::from(3), Value::from("x")]);
}

#[test]
fn test_two_operand_where_is_equality() {
    let mut short = users();
    short.where_eq("name", "x");
    let mut long = users();
    long.where_("name", "=", "x");

    assert_eq!(short.to_sql(), long.to_sql());
    assert_eq!(short.get_bindings(), long.get_bindings());
}

#[test]
fn test_empty_value_becomes_null_check() {
    let mut null = users();
    null.where_("deleted_at", "=", "");
    let mut expected = users();
    expected.where_null("deleted_at");
    assert_eq!(null.to_sql(), expected.to_sql());
    assert_eq!(null.to_sql(), "select * from users where deleted_at is null");
    assert!(null.get_bindings().is_empty());

    let mut not_null = users();
    not_null.where_("deleted_at", "<>", "");
    let mut expected = users();
    expected.where_not_null("deleted_at");
    assert_eq!(not_null.to_sql(), expected.to_sql());

    let mut via_null = users();
    via_null.where_eq("deleted_at", Value::Null);
    assert_eq!(via_null.to_sql(), "select * from users where deleted_at is null");
}

#[test]
fn test_empty_value_with_comparison_operator_is_rejected() {
    let mut q = users();
    q.where_("age", ">", "");

    assert!(q.wheres().is_empty());
    assert_eq!(
        q.build_error(),
        Some(&BuildError::IllegalOperatorAndValue {
            operator: ">".to_string()
        })
    );
    let err = q.try_to_sql().unwrap_err();
    assert!(err.is_build_error());
}

#[test]
fn test_first_build_error_wins() {
    let mut q = users();
    q.where_("age", ">", "").add_bindings_named([Value::from(1)], "limit");
    assert!(matches!(
        q.build_error(),
        Some(BuildError::IllegalOperatorAndValue { .. })
    ));
}

#[test]
fn test_unknown_operator_is_taken_as_value() {
    let mut q = users();
    q.where_("name", "alice", "ignored");
    assert_eq!(q.to_sql(), "select * from users where name = ?");
    assert_eq!(q.get_bindings(), vec![Value::from("alice")]);
}

#[test]
fn test_json_boolean_is_inlined() {
    let mut q = users();
    q.where_("options->enabled", "=", true).where_("name", "=", "x");
    assert_eq!(
        q.to_sql(),
        "select * from users where options->enabled = true and name = ?"
    );
    assert_eq!(q.get_bindings(), vec![Value::from("x")]);
}

#[test]
fn test_raw_value_is_not_bound() {
    let mut q = users();
    q.where_("votes", ">", raw("100 + 1"));
    assert_eq!(q.to_sql(), "select * from users where votes > 100 + 1");
    assert!(q.get_bindings().is_empty());
}

#[test]
fn test_or_where() {
    let mut q = users();
    q.where_("votes", ">", 100).or_where("name", "=", "John");
    assert_eq!(q.to_sql(), "select * from users where votes > ? or name = ?");
    assert_eq!(q.get_bindings(), vec![Value::from(100), Value::from("John")]);
}

#[test]
fn test_where_in_variants() {
    let mut q = users();
    q.where_in("id", [Value::from(1), raw("2")]).or_where_not_in("status", ["a", "b"]);
    assert_eq!(
        q.to_sql(),
        "select * from users where id in (?, 2) or status not in (?, ?)"
    );
    assert_eq!(
        q.get_bindings(),
        vec![Value::from(1), Value::from("a"), Value::from("b")]
    );
}

#[test]
fn test_where_in_empty_list() {
    let mut q = users();
    q.where_in("id", Vec::<i32>::new());
    assert_eq!(q.to_sql(), "select * from users where 0 = 1");

    let mut q = users();
    q.where_not_in("id", Vec::<i32>::new());
    assert_eq!(q.to_sql(), "select * from users where 1 = 1");
}

#[test]
fn test_where_in_sub() {
    let mut q = users();
    q.where_eq("active", true).where_in_sub("id", |sub| {
        sub.select(["user_id"]).from("orders").where_("total", ">", 50);
    });
    assert_eq!(
        q.to_sql(),
        "select * from users where active = ? and id in (select user_id from orders where total > ?)"
    );
    assert_eq!(q.get_bindings(), vec![Value::from(true), Value::from(50)]);
}

#[test]
fn test_where_in_existing_query_keeps_its_state() {
    let mut sub = Builder::new();
    sub.select(["user_id"]).from("bans").where_eq("kind", "hard");

    let mut q = users();
    q.where_not_in_query("id", sub);
    assert_eq!(
        q.to_sql(),
        "select * from users where id not in (select user_id from bans where kind = ?)"
    );
    assert_eq!(q.get_bindings(), vec![Value::from("hard")]);
}

#[test]
fn test_where_null_variants() {
    let mut q = users();
    q.where_null("a").or_where_null("b").where_not_null("c").or_where_not_null("d");
    assert_eq!(
        q.to_sql(),
        "select * from users where a is null or b is null and c is not null or d is not null"
    );
}

#[test]
fn test_where_between() {
    let mut q = users();
    q.where_between("age", 18, 30).or_where_not_between("score", 1, 5);
    assert_eq!(
        q.to_sql(),
        "select * from users where age between ? and ? or score not between ? and ?"
    );
    assert_eq!(
        q.get_bindings(),
        vec![Value::from(18), Value::from(30), Value::from(1), Value::from(5)]
    );
}

#[test]
fn test_where_exists() {
    let mut q = users();
    q.where_exists(|sub| {
        sub.from("orders").where_column("orders.user_id", "=", "users.id");
    })
    .or_where_not_exists(|sub| {
        sub.from("bans").where_eq("reason", "spam");
    });
    assert_eq!(
        q.to_sql(),
        "select * from users where exists (select * from orders where orders.user_id = users.id) \
         or not exists (select * from bans where reason = ?)"
    );
    assert_eq!(q.get_bindings(), vec![Value::from("spam")]);
}

#[test]
fn test_where_column_unknown_operator_is_second_column() {
    let mut q = users();
    q.where_column("first_name", "last_name", "");
    assert_eq!(q.to_sql(), "select * from users where first_name = last_name");
}

#[test]
fn test_where_raw() {
    let mut q = users();
    q.where_eq("a", 1).or_where_raw("id = ? or email = ?", [Value::from(1), Value::from("x")]);
    assert_eq!(
        q.to_sql(),
        "select * from users where a = ? or id = ? or email = ?"
    );
    assert_eq!(q.get_bindings().len(), 3);
}

#[test]
fn test_where_query_compares_with_sub_select() {
    let mut q = users();
    q.where_query("votes", ">", |sub| {
        sub.select(["max"]).from("limits").where_eq("kind", "v");
    });
    assert_eq!(
        q.to_sql(),
        "select * from users where votes > (select max from limits where kind = ?)"
    );
    assert_eq!(q.get_bindings(), vec![Value::from("v")]);
}

#[test]
fn test_nested_where() {
    let mut q = users();
    q.where_eq("c", 0).or_where_nested(|nested| {
        nested.where_eq("a", 1).or_where_eq("b", 2);
    });
    assert_eq!(
        q.to_sql(),
        "select * from users where c = ? or (a = ? or b = ?)"
    );
    assert_eq!(
        q.get_bindings(),
        vec![Value::from(0), Value::from(1), Value::from(2)]
    );
}

#[test]
fn test_empty_nested_group_is_elided() {
    let mut q = users();
    q.where_nested(|_| {});
    assert!(q.wheres().is_empty());
    assert_eq!(q.to_sql(), "select * from users");

    let empty = q.new_query();
    q.add_nested_where_query(empty, Boolean::Or);
    assert!(q.wheres().is_empty());
}

#[test]
fn test_array_of_wheres_is_one_group() {
    let mut q = users();
    q.where_eq("z", 0).add_array_of_wheres(
        [WhereSpec::eq("a", 1), WhereSpec::new("b", ">", 2).or()],
        Boolean::Or,
        ArrayWhereMethod::Where,
    );
    assert_eq!(
        q.to_sql(),
        "select * from users where z = ? or (a = ? or b > ?)"
    );
    assert_eq!(
        q.get_bindings(),
        vec![Value::from(0), Value::from(1), Value::from(2)]
    );
}

#[test]
fn test_array_of_column_wheres() {
    let mut q = users();
    q.add_array_of_wheres(
        [WhereSpec::new("first_name", "=", "last_name")],
        Boolean::And,
        ArrayWhereMethod::Column,
    );
    assert_eq!(q.to_sql(), "select * from users where (first_name = last_name)");
    assert!(q.get_bindings().is_empty());
}

#[test]
fn test_date_parts() {
    let mut q = users();
    q.where_date("created_at", "=", "2024-01-01").where_year("created_at", ">", 2020);
    assert_eq!(
        q.to_sql(),
        "select * from users where date(created_at) = ? and year(created_at) > ?"
    );
    assert_eq!(
        q.get_bindings(),
        vec![Value::from("2024-01-01"), Value::from(2020)]
    );
}

#[test]
fn test_bindings_follow_clause_order_not_call_order() {
    let mut other = Builder::new();
    other.from("admins").where_eq("id", 9);

    let mut q = users();
    q.where_("votes", ">", 100)
        .join_where("contacts", "contacts.user_id", "=", 5)
        .select_raw("count(*) > ? as flag", [Value::from(1)])
        .group_by(["id"])
        .having("total", ">", 10)
        .order_by_raw("field(id, ?)", [Value::from(7)])
        .union(other);

    let sql = q.to_sql();
    assert_eq!(
        sql,
        "select count(*) > ? as flag from users inner join contacts on contacts.user_id = ? \
         where votes > ? group by id having total > ? order by field(id, ?) \
         union select * from admins where id = ?"
    );
    let bindings = q.get_bindings();
    assert_eq!(
        bindings,
        vec![
            Value::from(1),
            Value::from(5),
            Value::from(100),
            Value::from(10),
            Value::from(7),
            Value::from(9),
        ]
    );
    assert_eq!(placeholders(&sql), bindings.len());
}

#[test]
fn test_select_sub_keeps_first_column() {
    let mut q = users();
    q.select(["id"]).select_sub(
        |sub| {
            sub.from("orders").select(["total", "id"]).where_eq("status", "paid");
        },
        "last_total",
    );
    assert_eq!(
        q.to_sql(),
        "select id, (select total from orders where status = ?) as last_total from users"
    );
    assert_eq!(q.get_bindings(), vec![Value::from("paid")]);
}

#[test]
fn test_distinct_and_alias() {
    let mut q = users();
    q.select(["name as n"]).add_select(["email"]).distinct();
    assert_eq!(q.to_sql(), "select distinct name as n, email from users");
}

#[test]
fn test_joins() {
    let mut q = users();
    q.join("contacts", "users.id", "=", "contacts.user_id")
        .left_join("orders", "users.id", "=", "orders.user_id")
        .cross_join("sizes");
    assert_eq!(
        q.to_sql(),
        "select * from users inner join contacts on users.id = contacts.user_id \
         left join orders on users.id = orders.user_id cross join sizes"
    );
}

#[test]
fn test_join_with_conditions() {
    let mut q = users();
    q.join_with("contacts", JoinType::Right, |join| {
        join.on("users.id", "=", "contacts.user_id")
            .or_on("users.email", "=", "contacts.email")
            .where_("contacts.kind", "=", "home");
    })
    .where_eq("users.active", true);
    assert_eq!(
        q.to_sql(),
        "select * from users right join contacts on users.id = contacts.user_id \
         or users.email = contacts.email and contacts.kind = ? where users.active = ?"
    );
    assert_eq!(q.get_bindings(), vec![Value::from("home"), Value::from(true)]);
    assert_eq!(q.get_raw_bindings().get(BindingKind::Join), &[Value::from("home")]);
}

#[test]
fn test_group_by_and_having() {
    let mut q = users();
    q.select(["status"])
        .group_by(["status"])
        .having_raw("count(*) > ?", [Value::from(2)])
        .or_having("total", ">", 5);
    assert_eq!(
        q.to_sql(),
        "select status from users group by status having count(*) > ? or total > ?"
    );
    assert_eq!(q.get_bindings(), vec![Value::from(2), Value::from(5)]);
}

#[test]
fn test_order_direction_only_literal_asc() {
    let mut q = users();
    q.order_by("a", "asc").order_by("b", "ASC").order_by("c", "up");
    assert_eq!(q.to_sql(), "select * from users order by a asc, b desc, c desc");
}

#[test]
fn test_latest_oldest_and_random() {
    let mut q = users();
    q.latest("created_at").oldest("id").in_random_order("");
    assert_eq!(
        q.to_sql(),
        "select * from users order by created_at desc, id asc, RANDOM()"
    );
}

#[test]
fn test_limit_and_offset_clamping() {
    let mut q = users();
    q.limit(-5);
    assert_eq!(q.limit_value(), None);
    q.limit(10).limit(-5);
    assert_eq!(q.limit_value(), Some(10));

    q.offset(-5);
    assert_eq!(q.offset_value(), Some(0));
    assert_eq!(q.to_sql(), "select * from users limit 10 offset 0");
}

#[test]
fn test_for_page() {
    let mut q = users();
    q.for_page(3, 15);
    assert_eq!(q.to_sql(), "select * from users limit 15 offset 30");
}

#[test]
fn test_for_page_after_id() {
    let mut q = users();
    q.order_by("id", "desc")
        .order_by("name", "asc")
        .for_page_after_id(10, Some(Value::from(42)), "id");
    assert_eq!(
        q.to_sql(),
        "select * from users where id > ? order by name asc, id asc limit 10"
    );
    assert_eq!(q.get_bindings(), vec![Value::from(42)]);
}

#[test]
fn test_order_and_limit_route_to_union_once_a_union_exists() {
    let mut other = Builder::new();
    other.from("admins");

    let mut q = users();
    q.order_by("age", "desc").limit(5);
    q.union(other);
    q.order_by("name", "asc").limit(20).offset(40);

    assert_eq!(q.orders().len(), 1);
    assert_eq!(q.union_orders().len(), 1);
    assert_eq!(q.limit_value(), Some(5));
    assert_eq!(q.union_limit_value(), Some(20));
    assert_eq!(q.union_offset_value(), Some(40));
    assert_eq!(
        q.to_sql(),
        "select * from users order by age desc limit 5 \
         union select * from admins order by name asc limit 20 offset 40"
    );
}

#[test]
fn test_raw_union_order_binds_after_unioned_queries() {
    let mut admins = Builder::new();
    admins.from("admins").where_eq("level", 2);

    let mut q = users();
    q.where_eq("active", 1).union(admins);
    q.order_by_raw("field(id, ?)", [Value::from(9)]);

    let sql = q.to_sql();
    assert_eq!(
        sql,
        "select * from users where active = ? union select * from admins where level = ? \
         order by field(id, ?)"
    );
    assert_eq!(q.get_bindings(), vec![Value::from(1), Value::from(2), Value::from(9)]);
    assert_eq!(placeholders(&sql), q.get_bindings().len());
}

#[test]
fn test_union_added_after_raw_union_order_binds_before_it() {
    let mut q = users();
    q.where_eq("active", 1).union_with(false, |other| {
        other.from("admins").where_eq("level", 2);
    });
    q.order_by_raw("field(id, ?)", [Value::from(9)]);
    q.union_with(true, |other| {
        other.from("guests").where_eq("level", 3);
    });

    assert_eq!(
        q.to_sql(),
        "select * from users where active = ? union select * from admins where level = ? \
         union all select * from guests where level = ? order by field(id, ?)"
    );
    assert_eq!(
        q.get_bindings(),
        vec![Value::from(1), Value::from(2), Value::from(3), Value::from(9)]
    );
}

#[test]
fn test_union_all_with_closure() {
    let mut q = users();
    q.where_eq("a", 1).union_with(true, |other| {
        other.from("admins").where_eq("b", 2);
    });
    assert_eq!(
        q.to_sql(),
        "select * from users where a = ? union all select * from admins where b = ?"
    );
    assert_eq!(q.get_raw_bindings().get(BindingKind::Union), &[Value::from(2)]);
}

#[test]
fn test_set_aggregate_drops_orders_without_groups() {
    let mut q = users();
    q.order_by_raw("field(id, ?)", [Value::from(1)]).set_aggregate("count", ["*"]);
    assert_eq!(q.to_sql(), "select count(*) as aggregate from users");
    assert!(q.get_bindings().is_empty());

    let mut grouped = users();
    grouped.group_by(["status"]).order_by("status", "asc").set_aggregate("max", ["votes"]);
    assert_eq!(
        grouped.to_sql(),
        "select max(votes) as aggregate from users group by status order by status asc"
    );
}

#[test]
fn test_set_aggregate_keeps_union_orders_and_their_bindings() {
    let mut admins = Builder::new();
    admins.from("admins");

    let mut q = users();
    q.union(admins);
    q.order_by_raw("field(id, ?)", [Value::from(9)]).set_aggregate("count", ["*"]);

    let sql = q.to_sql();
    assert_eq!(
        sql,
        "select count(*) as aggregate from (select * from users union select * from admins \
         order by field(id, ?)) as temp_table"
    );
    assert_eq!(q.get_bindings(), vec![Value::from(9)]);
    assert_eq!(placeholders(&sql), q.get_bindings().len());
}

#[test]
fn test_distinct_aggregate() {
    let mut q = users();
    q.distinct().set_aggregate("count", ["email"]);
    assert_eq!(q.to_sql(), "select count(distinct email) as aggregate from users");
}

#[test]
fn test_union_aggregate_wraps_the_union() {
    let mut other = Builder::new();
    other.from("admins");
    let mut q = users();
    q.union(other).set_aggregate("count", ["*"]);
    assert_eq!(
        q.to_sql(),
        "select count(*) as aggregate from (select * from users union select * from admins) as temp_table"
    );
}

#[test]
fn test_lock() {
    let mut q = users();
    q.lock_for_update();
    assert_eq!(q.to_sql(), "select * from users");

    q.lock(Lock::Raw("for update nowait".into()));
    assert_eq!(q.to_sql(), "select * from users for update nowait");
}

#[test]
fn test_clean_single_field() {
    let mut other = Builder::new();
    other.from("admins");
    let mut q = users();
    q.union(other);
    q.limit(5).offset(10);

    q.clean("union_limit");
    assert_eq!(q.union_limit_value(), None);
    assert_eq!(q.union_offset_value(), Some(10));

    q.clean("no_such_field").clean("union_offset");
    assert_eq!(q.union_offset_value(), None);
    assert_eq!(q.table_name(), "users");
}

#[test]
fn test_clean_bindings_and_clear() {
    let mut q = users();
    q.select_raw("? as one", [Value::from(1)]).where_eq("a", 2);
    q.clean_bindings(&[BindingKind::Select]);
    assert_eq!(q.get_bindings(), vec![Value::from(2)]);

    q.clear();
    assert_eq!(q.to_sql(), "select *");
    assert!(q.get_raw_bindings().is_empty());
    assert!(!q.operators().is_empty());
}

#[test]
fn test_invalid_binding_kind_is_recorded() {
    let mut q = users();
    q.add_bindings_named([Value::from(1)], "limit");
    assert_eq!(
        q.build_error(),
        Some(&BuildError::InvalidBindingType("limit".to_string()))
    );
    assert!(q.get_bindings().is_empty());

    let mut ok = users();
    ok.add_bindings_named([Value::from(1)], "having");
    assert!(ok.validate().is_ok());
    assert_eq!(ok.get_raw_bindings().get(BindingKind::Having), &[Value::from(1)]);
}

#[test]
fn test_nested_errors_bubble_up() {
    let mut q = users();
    q.where_nested(|nested| {
        nested.where_("a", "<", "");
    });
    assert!(q.validate().is_err());
}

#[test]
fn test_prepare_value_and_operator() {
    let q = users();
    assert_eq!(
        q.prepare_value_and_operator(Value::Null, Value::from(5), true),
        Ok((Value::from(5), Value::from("=")))
    );
    assert_eq!(
        q.prepare_value_and_operator(Value::from(""), Value::from("!="), false),
        Ok((Value::from(""), Value::from("!=")))
    );
    assert!(q
        .prepare_value_and_operator(Value::from(""), Value::from("like"), false)
        .is_err());
}

#[test]
fn test_tap_and_merge_bindings() {
    let mut other = Builder::new();
    other.where_eq("x", 1).having("y", ">", 2);

    let mut q = users();
    q.tap(|b| {
        b.where_eq("z", 0);
    })
    .merge_bindings(&other);
    assert_eq!(
        q.get_bindings(),
        vec![Value::from(0), Value::from(1), Value::from(2)]
    );
}
