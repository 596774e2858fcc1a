//! Solve-and-decode tests for the Level-3 array operations and builtins.
//!
//! Most programs here run over arrays whose elements were dropped by
//! `select`/`reject`, so the compiled circuit has to respect nil conditions.

use stratum_compiler::level3::{ConstantValue, Instruction, TypeName};
use stratum_format::Program;
use stratum_kit::{compile, Assignment, EmbeddedSolver, Machine, Value};

fn solve_with(instructions: Vec<Instruction>, assignment: &Assignment, count: usize) -> Vec<Assignment> {
    let compiled = compile(Program::new(instructions)).unwrap();
    Machine::new(EmbeddedSolver::default())
        .run(&compiled, assignment, count)
        .unwrap()
}

fn solve(instructions: Vec<Instruction>, count: usize) -> Vec<Assignment> {
    solve_with(instructions, &Assignment::new(), count)
}

/// The only solution of a fully determined program.
fn solve_one(instructions: Vec<Instruction>) -> Assignment {
    let mut solutions = solve(instructions, 2);
    assert_eq!(solutions.len(), 1, "{solutions:?}");
    solutions.remove(0)
}

fn constant(values: &[i64]) -> Instruction {
    Instruction::Constant {
        value: ConstantValue::Array(values.iter().map(|&v| ConstantValue::Integer(v)).collect()),
    }
}

fn nested(rows: &[&[i64]]) -> Instruction {
    Instruction::Constant {
        value: ConstantValue::Array(
            rows.iter()
                .map(|row| {
                    ConstantValue::Array(row.iter().map(|&v| ConstantValue::Integer(v)).collect())
                })
                .collect(),
        ),
    }
}

fn integers(value: &Value) -> Vec<i64> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Integer(n) => *n,
                other => panic!("expected integer, got {other}"),
            })
            .collect(),
        other => panic!("expected array, got {other}"),
    }
}

/// `name(x) = x <op> bound`
fn compare(name: &str, op: Instruction, bound: i64) -> Vec<Instruction> {
    vec![
        Instruction::define(name, ["x"]),
        Instruction::push("x"),
        Instruction::integer(bound),
        op,
        Instruction::Return { width: 1 },
    ]
}

/// `name(x) = x != value`
fn differs(name: &str, value: i64) -> Vec<Instruction> {
    vec![
        Instruction::define(name, ["x"]),
        Instruction::push("x"),
        Instruction::integer(value),
        Instruction::Equal,
        Instruction::Not,
        Instruction::Return { width: 1 },
    ]
}

fn plus() -> Vec<Instruction> {
    vec![
        Instruction::define("plus", ["a", "b"]),
        Instruction::push("a"),
        Instruction::push("b"),
        Instruction::Add,
        Instruction::Return { width: 1 },
    ]
}

/// `xs.select(f)` left on the stack.
fn filtered(values: &[i64], predicate: &str) -> Vec<Instruction> {
    vec![
        constant(values),
        Instruction::pointer(predicate),
        Instruction::call("select", 2),
    ]
}

fn program(parts: impl IntoIterator<Item = Vec<Instruction>>) -> Vec<Instruction> {
    parts.into_iter().flatten().collect()
}

#[test]
fn test_reduce_skips_leading_dropped_elements() {
    let instructions = program([
        compare("big", Instruction::GreaterThan, 1),
        plus(),
        filtered(&[1, 2, 3], "big"),
        vec![
            Instruction::pointer("plus"),
            Instruction::call("reduce", 2),
            Instruction::pop("sum"),
            Instruction::variable("sum"),
        ],
    ]);
    assert_eq!(solve_one(instructions)["sum"], Value::Integer(5));
}

#[test]
fn test_reduce_seeds_from_first_present_element() {
    let instructions = program([
        compare("big", Instruction::GreaterThan, 2),
        plus(),
        filtered(&[1, 2, 3, 4], "big"),
        vec![
            Instruction::pointer("plus"),
            Instruction::call("reduce", 2),
            Instruction::pop("sum"),
            Instruction::variable("sum"),
        ],
    ]);
    assert_eq!(solve_one(instructions)["sum"], Value::Integer(7));
}

#[test]
fn test_reduce_with_initial_value() {
    let instructions = program([
        compare("big", Instruction::GreaterThan, 1),
        plus(),
        filtered(&[1, 2, 3], "big"),
        vec![
            Instruction::integer(10),
            Instruction::pointer("plus"),
            Instruction::call("reduce", 3),
            Instruction::pop("sum"),
            Instruction::variable("sum"),
        ],
    ]);
    assert_eq!(solve_one(instructions)["sum"], Value::Integer(15));
}

#[test]
fn test_reduce_over_pinned_symbolic_array() {
    let instructions = program([
        vec![
            Instruction::Typedef {
                name: TypeName::Integer,
                width: Some(5),
            },
            Instruction::Array {
                symbol: "xs".into(),
                width: 3,
            },
        ],
        compare("positive", Instruction::GreaterThan, 0),
        plus(),
        vec![
            Instruction::push("xs"),
            Instruction::pointer("positive"),
            Instruction::call("select", 2),
            Instruction::pointer("plus"),
            Instruction::call("reduce", 2),
            Instruction::pop("sum"),
            Instruction::variable("xs"),
            Instruction::variable("sum"),
        ],
    ]);
    let assignment: Assignment = serde_json::from_str(r#"{"xs": [-1, 4, 6]}"#).unwrap();
    let solutions = solve_with(instructions, &assignment, 2);
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0]["sum"], Value::Integer(10));
}

#[test]
fn test_map_keeps_dropped_positions_absent() {
    let instructions = program([
        compare("big", Instruction::GreaterThan, 1),
        vec![
            Instruction::define("double", ["x"]),
            Instruction::push("x"),
            Instruction::integer(2),
            Instruction::Multiply,
            Instruction::Return { width: 1 },
        ],
        filtered(&[1, 2, 3], "big"),
        vec![
            Instruction::pointer("double"),
            Instruction::call("map", 2),
            Instruction::pop("doubled"),
            Instruction::variable("doubled"),
        ],
    ]);
    assert_eq!(integers(&solve_one(instructions)["doubled"]), vec![4, 6]);
}

#[test]
fn test_reject_drops_matching_elements() {
    let instructions = program([
        compare("big", Instruction::GreaterThan, 1),
        vec![
            constant(&[1, 2, 3]),
            Instruction::pointer("big"),
            Instruction::call("reject", 2),
            Instruction::pop("small"),
            Instruction::variable("small"),
        ],
    ]);
    assert_eq!(integers(&solve_one(instructions)["small"]), vec![1]);
}

/// `name(w)` asserts `w[1] - w[0] == step`.
fn gap(name: &str, step: i64) -> Vec<Instruction> {
    vec![
        Instruction::define(name, ["w"]),
        Instruction::push("w"),
        Instruction::GetIndex { index: 1 },
        Instruction::push("w"),
        Instruction::GetIndex { index: 0 },
        Instruction::Subtract,
        Instruction::integer(step),
        Instruction::Equal,
        Instruction::Invariant,
        Instruction::Return { width: 0 },
    ]
}

fn each_cons_over_filtered(step: i64) -> Vec<Instruction> {
    program([
        differs("not_two", 2),
        gap("gap", step),
        filtered(&[1, 2, 3], "not_two"),
        vec![
            Instruction::pop("kept"),
            Instruction::push("kept"),
            Instruction::integer(2),
            Instruction::pointer("gap"),
            Instruction::call("eachCons", 3),
            Instruction::variable("kept"),
        ],
    ])
}

#[test]
fn test_each_cons_windows_run_over_present_elements() {
    let solution = solve_one(each_cons_over_filtered(2));
    assert_eq!(integers(&solution["kept"]), vec![1, 3]);
}

#[test]
fn test_each_cons_ignores_windows_through_dropped_elements() {
    // [1, 2] and [2, 3] would both step by one, but 2 is gone
    assert!(solve(each_cons_over_filtered(1), 2).is_empty());
}

#[test]
fn test_each_cons_constrains_symbolic_neighbours() {
    let instructions = program([
        vec![
            Instruction::define("rising", ["w"]),
            Instruction::push("w"),
            Instruction::GetIndex { index: 0 },
            Instruction::push("w"),
            Instruction::GetIndex { index: 1 },
            Instruction::LessThan,
            Instruction::Invariant,
            Instruction::Return { width: 0 },
            Instruction::Typedef {
                name: TypeName::Integer,
                width: Some(4),
            },
            Instruction::Array {
                symbol: "xs".into(),
                width: 3,
            },
            Instruction::push("xs"),
            Instruction::integer(2),
            Instruction::pointer("rising"),
            Instruction::call("eachCons", 3),
            Instruction::variable("xs"),
        ],
    ]);
    let assignment: Assignment = serde_json::from_str(r#"{"xs": [1, "unset", 3]}"#).unwrap();
    let solutions = solve_with(instructions, &assignment, 3);
    assert_eq!(solutions.len(), 1);
    assert_eq!(integers(&solutions[0]["xs"]), vec![1, 2, 3]);
}

fn each_slice_over_filtered(check: Vec<Instruction>) -> Vec<Instruction> {
    program([
        compare("big", Instruction::GreaterThan, 1),
        check,
        filtered(&[1, 5, 6, 7], "big"),
        vec![
            Instruction::pop("kept"),
            Instruction::push("kept"),
            Instruction::integer(2),
            Instruction::pointer("check"),
            Instruction::call("eachSlice", 3),
            Instruction::variable("kept"),
        ],
    ])
}

#[test]
fn test_each_slice_starts_at_first_present_element() {
    let check = vec![
        Instruction::define("check", ["s"]),
        Instruction::push("s"),
        Instruction::GetIndex { index: 0 },
        Instruction::integer(5),
        Instruction::GreaterEqual,
        Instruction::Invariant,
        Instruction::Return { width: 0 },
    ];
    let solution = solve_one(each_slice_over_filtered(check));
    assert_eq!(integers(&solution["kept"]), vec![5, 6, 7]);
}

#[test]
fn test_each_slice_last_slice_is_short() {
    // Slices are [5, 6] and [7]
    let check = vec![
        Instruction::define("check", ["s"]),
        Instruction::push("s"),
        Instruction::Width,
        Instruction::integer(2),
        Instruction::Equal,
        Instruction::Invariant,
        Instruction::Return { width: 0 },
    ];
    assert!(solve(each_slice_over_filtered(check), 2).is_empty());
}

fn each_combination_avoiding(total: i64) -> Vec<Instruction> {
    program([
        differs("not_two", 2),
        vec![
            Instruction::define("check", ["c"]),
            Instruction::push("c"),
            Instruction::GetIndex { index: 0 },
            Instruction::push("c"),
            Instruction::GetIndex { index: 1 },
            Instruction::Add,
            Instruction::integer(total),
            Instruction::Equal,
            Instruction::Not,
            Instruction::Invariant,
            Instruction::Return { width: 0 },
        ],
        filtered(&[1, 2, 3, 4], "not_two"),
        vec![
            Instruction::pop("kept"),
            Instruction::push("kept"),
            Instruction::integer(2),
            Instruction::pointer("check"),
            Instruction::call("eachCombination", 3),
            Instruction::variable("kept"),
        ],
    ])
}

#[test]
fn test_each_combination_pairs_present_elements() {
    // 1 + 2 == 3 only pairs a dropped element
    let solution = solve_one(each_combination_avoiding(3));
    assert_eq!(integers(&solution["kept"]), vec![1, 3, 4]);

    assert!(solve(each_combination_avoiding(7), 2).is_empty());
}

#[test]
fn test_bounds_reports_dropped_and_out_of_range_indices() {
    let check = |index: i64, name: &str| {
        vec![
            Instruction::push("kept"),
            Instruction::integer(index),
            Instruction::Bounds,
            Instruction::pop(name),
            Instruction::variable(name),
        ]
    };
    let instructions = program([
        differs("not_two", 2),
        filtered(&[1, 2, 3], "not_two"),
        vec![Instruction::pop("kept")],
        check(0, "first"),
        check(1, "dropped"),
        check(5, "past_end"),
        check(-1, "negative"),
    ]);
    let solution = solve_one(instructions);
    assert_eq!(solution["first"], Value::Boolean(false));
    assert_eq!(solution["dropped"], Value::Boolean(true));
    assert_eq!(solution["past_end"], Value::Boolean(true));
    assert_eq!(solution["negative"], Value::Boolean(true));
}

#[test]
fn test_bounds_with_symbolic_index() {
    let instructions = program([
        differs("not_two", 2),
        filtered(&[1, 2, 3], "not_two"),
        vec![
            Instruction::pop("kept"),
            Instruction::Integer {
                symbol: "i".into(),
                width: 4,
            },
            Instruction::push("kept"),
            Instruction::push("i"),
            Instruction::Bounds,
            Instruction::Not,
            Instruction::Invariant,
            Instruction::variable("i"),
        ],
    ]);
    let mut found: Vec<Value> = solve(instructions, 16)
        .into_iter()
        .map(|solution| solution["i"].clone())
        .collect();
    found.sort_by_key(|value| match value {
        Value::Integer(n) => *n,
        other => panic!("expected integer, got {other}"),
    });
    assert_eq!(found, vec![Value::Integer(0), Value::Integer(2)]);
}

#[test]
fn test_get_with_symbolic_index() {
    let instructions = vec![
        constant(&[4, 5, 6]),
        Instruction::pop("xs"),
        Instruction::Integer {
            symbol: "i".into(),
            width: 3,
        },
        Instruction::push("xs"),
        Instruction::push("i"),
        Instruction::Get,
        Instruction::integer(6),
        Instruction::Equal,
        Instruction::Invariant,
        Instruction::variable("i"),
    ];
    assert_eq!(solve_one(instructions)["i"], Value::Integer(2));
}

#[test]
fn test_get_nested_row_with_symbolic_index() {
    let instructions = vec![
        nested(&[&[1, 2], &[3]]),
        Instruction::pop("rows"),
        Instruction::Integer {
            symbol: "i".into(),
            width: 3,
        },
        Instruction::push("rows"),
        Instruction::push("i"),
        Instruction::Get,
        Instruction::pop("row"),
        Instruction::push("row"),
        Instruction::GetIndex { index: 0 },
        Instruction::integer(3),
        Instruction::Equal,
        Instruction::Invariant,
        Instruction::variable("i"),
        Instruction::variable("row"),
    ];
    let solution = solve_one(instructions);
    assert_eq!(solution["i"], Value::Integer(1));
    assert_eq!(integers(&solution["row"]), vec![3]);
}

#[test]
fn test_width_counts_present_elements() {
    let instructions = program([
        compare("big", Instruction::GreaterThan, 2),
        filtered(&[1, 2, 3, 4], "big"),
        vec![
            Instruction::Width,
            Instruction::pop("count"),
            Instruction::variable("count"),
        ],
    ]);
    assert_eq!(solve_one(instructions)["count"], Value::Integer(2));
}

#[test]
fn test_width_of_symbolic_filtered_array() {
    let instructions = program([
        compare("positive", Instruction::GreaterThan, 0),
        vec![
            Instruction::Typedef {
                name: TypeName::Integer,
                width: Some(4),
            },
            Instruction::Array {
                symbol: "xs".into(),
                width: 3,
            },
            Instruction::push("xs"),
            Instruction::pointer("positive"),
            Instruction::call("select", 2),
            Instruction::Width,
            Instruction::integer(3),
            Instruction::Equal,
            Instruction::Invariant,
            Instruction::variable("xs"),
        ],
    ]);
    let assignment: Assignment = serde_json::from_str(r#"{"xs": [1, "unset", 2]}"#).unwrap();
    let solutions = solve_with(instructions, &assignment, 10);
    // The middle element ranges over 1..=7
    assert_eq!(solutions.len(), 7);
    for solution in &solutions {
        assert!(integers(&solution["xs"]).iter().all(|&n| n > 0));
    }
}

#[test]
fn test_if_chooses_between_arrays() {
    let instructions = vec![
        Instruction::Boolean {
            symbol: "c".into(),
        },
        constant(&[3]),
        constant(&[1, 2]),
        Instruction::push("c"),
        Instruction::If,
        Instruction::pop("chosen"),
        Instruction::variable("c"),
        Instruction::variable("chosen"),
    ];
    let solutions = solve(instructions, 4);
    assert_eq!(solutions.len(), 2);
    for solution in &solutions {
        let expected = match solution["c"] {
            Value::Boolean(true) => vec![1, 2],
            Value::Boolean(false) => vec![3],
            ref other => panic!("expected boolean, got {other}"),
        };
        assert_eq!(integers(&solution["chosen"]), expected);
    }
}

#[test]
fn test_equal_compares_present_positions() {
    let compare_with = |values: &[i64], name: &str| {
        vec![
            Instruction::push("kept"),
            constant(values),
            Instruction::pointer("small"),
            Instruction::call("select", 2),
            Instruction::Equal,
            Instruction::pop(name),
            Instruction::variable(name),
        ]
    };
    let instructions = program([
        differs("not_two", 2),
        compare("small", Instruction::LessThan, 5),
        filtered(&[1, 2, 3], "not_two"),
        vec![Instruction::pop("kept")],
        // [1, _, 3] against [1, _, 3]
        compare_with(&[1, 9, 3], "same"),
        // [1, _, 3] against [1, 2, 3]
        compare_with(&[1, 2, 3], "extra"),
        // [1, _, 3] against [1, _, 4]
        compare_with(&[1, 9, 4], "different"),
    ]);
    let solution = solve_one(instructions);
    assert_eq!(solution["same"], Value::Boolean(true));
    assert_eq!(solution["extra"], Value::Boolean(false));
    assert_eq!(solution["different"], Value::Boolean(false));
}

#[test]
fn test_transpose_leaves_holes_for_short_rows() {
    let instructions = vec![
        nested(&[&[1, 2], &[3]]),
        Instruction::call("transpose", 1),
        Instruction::pop("columns"),
        Instruction::push("columns"),
        Instruction::GetIndex { index: 0 },
        Instruction::pop("first"),
        Instruction::push("columns"),
        Instruction::GetIndex { index: 1 },
        Instruction::pop("second"),
        Instruction::variable("first"),
        Instruction::variable("second"),
    ];
    let solution = solve_one(instructions);
    assert_eq!(integers(&solution["first"]), vec![1, 3]);
    assert_eq!(integers(&solution["second"]), vec![2]);
}

#[test]
fn test_reverse_keeps_dropped_elements_absent() {
    let instructions = program([
        differs("not_one", 1),
        filtered(&[1, 2, 3], "not_one"),
        vec![
            Instruction::call("reverse", 1),
            Instruction::pop("reversed"),
            Instruction::variable("reversed"),
        ],
    ]);
    assert_eq!(integers(&solve_one(instructions)["reversed"]), vec![3, 2]);
}

#[test]
fn test_push_element_appends_present_element() {
    let instructions = program([
        compare("big", Instruction::GreaterThan, 1),
        filtered(&[1, 2], "big"),
        vec![
            Instruction::integer(7),
            Instruction::call("pushElement", 2),
            Instruction::pop("extended"),
            Instruction::variable("extended"),
        ],
    ]);
    assert_eq!(integers(&solve_one(instructions)["extended"]), vec![2, 7]);
}

#[test]
fn test_enumeration_counts_each_decoded_document_once() {
    // Every value of x up to 5 decodes to the same empty array
    let instructions = program([
        compare("big", Instruction::GreaterThan, 5),
        vec![
            Instruction::Typedef {
                name: TypeName::Integer,
                width: Some(4),
            },
            Instruction::Array {
                symbol: "xs".into(),
                width: 1,
            },
            Instruction::push("xs"),
            Instruction::pointer("big"),
            Instruction::call("select", 2),
            Instruction::pop("kept"),
            Instruction::variable("kept"),
        ],
    ]);
    let mut found: Vec<Vec<i64>> = solve(instructions, 20)
        .iter()
        .map(|solution| integers(&solution["kept"]))
        .collect();
    found.sort();
    assert_eq!(found, vec![vec![], vec![6], vec![7]]);
}
