//! Parser robustness properties.
//!
//! Arbitrary text must yield `Ok` or a `ParseError`, never a panic, and
//! generated well-formed programs must always parse.

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

use l3_parse::parse_program;
use proptest::prelude::*;

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![
        (0..4u8).prop_map(|n| format!("%v{n}")),
        (-100i64..100).prop_map(|n| n.to_string()),
    ]
}

fn instruction() -> impl Strategy<Value = String> {
    let op = prop_oneof![
        Just("+"),
        Just("-"),
        Just("*"),
        Just("&"),
        Just("<<"),
        Just(">>"),
        Just("<"),
        Just("<="),
        Just("="),
        Just(">="),
        Just(">"),
    ];
    prop_oneof![
        (0..4u8, operand()).prop_map(|(d, s)| format!("%v{d} <- {s}")),
        (0..4u8, operand(), op, operand()).prop_map(|(d, l, op, r)| format!("%v{d} <- {l} {op} {r}")),
        (0..4u8, 0..4u8).prop_map(|(d, a)| format!("%v{d} <- load %v{a}")),
        (0..4u8, operand()).prop_map(|(a, s)| format!("store %v{a} <- {s}")),
        operand().prop_map(|s| format!("call print({s})")),
        (0..4u8, prop::collection::vec(operand(), 0..8))
            .prop_map(|(d, args)| format!("%v{d} <- call @main({})", args.join(", "))),
        operand().prop_map(|c| format!("br {c} :end")),
    ]
}

proptest! {
    #[test]
    fn prop_arbitrary_text_never_panics(source in "\\PC{0,200}") {
        let _ = parse_program(&source);
    }

    #[test]
    fn prop_token_soup_never_panics(
        words in prop::collection::vec(
            prop_oneof![
                Just("define"), Just("@main"), Just("("), Just(")"), Just("{"),
                Just("}"), Just("%a"), Just("<-"), Just("return"), Just("br"),
                Just(":l"), Just("call"), Just("-"), Just("7"), Just(","),
                Just("store"), Just("load"), Just("+"),
            ],
            0..40,
        )
    ) {
        let _ = parse_program(&words.join(" "));
    }

    #[test]
    fn prop_well_formed_programs_parse(body in prop::collection::vec(instruction(), 0..30)) {
        let source = format!(
            "define @main (%v0, %v1, %v2, %v3) {{\n{}\n:end\nreturn %v0\n}}",
            body.join("\n")
        );
        let program = parse_program(&source).unwrap();
        prop_assert_eq!(program.functions.len(), 1);
        prop_assert_eq!(program.functions[0].params.len(), 4);
    }
}
