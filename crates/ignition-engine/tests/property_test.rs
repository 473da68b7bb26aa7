// Property-based tests for the resolve/compile/run pipeline
//
// Programs are generated as source text, so every property also exercises
// the scanner and parser.

use ignition_engine::resolver::ConstantValue;
use ignition_engine::{Engine, EngineConfig, Value, compile_source};
use proptest::prelude::*;

fn run(source: &str) -> Engine {
    let mut engine = Engine::new();
    engine.execute(source).expect("program should run");
    engine
}

fn name() -> impl Strategy<Value = String> {
    "[a-e]"
}

fn float_literal() -> impl Strategy<Value = f64> {
    (0u32..10_000, 1u32..100).prop_map(|(whole, frac)| whole as f64 + frac as f64 / 100.0)
}

// ============================================================================
// Slots
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn redeclaration_reuses_slot(names in prop::collection::vec(name(), 1..20)) {
        let source: String = names
            .iter()
            .enumerate()
            .map(|(i, n)| format!("var {} = {};", n, i))
            .collect();
        let engine = run(&source);

        let mut distinct = names.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(engine.globals().count(), distinct.len());

        // The last write to each name wins
        for n in &distinct {
            let last = names.iter().rposition(|m| m == n).unwrap() as i64;
            prop_assert_eq!(engine.get_value(n).unwrap(), &Value::Integer(last));
        }
    }

    #[test]
    fn inner_names_never_leak(depth in 1usize..6) {
        let mut source = String::new();
        for level in 0..depth {
            source.push_str(&format!("{{ var v{} = {};", level, level));
        }
        source.push_str(&"}".repeat(depth));
        let engine = run(&source);

        prop_assert_eq!(engine.globals().count(), 0);
        for level in 0..depth {
            let missing = format!("v{}", level);
            prop_assert!(engine.get_value(&missing).is_err());
        }
    }
}

// ============================================================================
// Constants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn floats_hoisted_once_per_occurrence_in_order(
        values in prop::collection::vec(float_literal(), 1..12),
        split in 0usize..12,
    ) {
        // Half the literals go into a nested block
        let split = split.min(values.len());
        let mut source = String::new();
        for (i, v) in values[..split].iter().enumerate() {
            source.push_str(&format!("var g{} = {:?};", i, v));
        }
        source.push('{');
        for (i, v) in values[split..].iter().enumerate() {
            source.push_str(&format!("var l{} = {:?};", i, v));
        }
        source.push('}');

        let compilation = compile_source(&source, &EngineConfig::default()).unwrap();
        let pool: Vec<_> = compilation.scopes.constants().iter().map(|c| c.value).collect();
        let expected: Vec<_> = values.iter().map(|&v| ConstantValue::Float(v)).collect();
        prop_assert_eq!(pool, expected);
    }

    #[test]
    fn small_integers_never_enter_the_pool(n in -2_147_483_647i64..=2_147_483_647) {
        // Negative literals are written as `0 - n`
        let source = if n < 0 {
            format!("var a = 0 - {};", -n)
        } else {
            format!("var a = {};", n)
        };
        let compilation = compile_source(&source, &EngineConfig::default()).unwrap();
        prop_assert!(compilation.scopes.constants().is_empty());
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn integer_arithmetic_widens_to_float(
        a in 0i64..1000,
        b in 1i64..1000,
        op in prop::sample::select(vec!['+', '-', '*', '/']),
    ) {
        let source = format!("var a = {}; var b = {}; var c = a {} b;", a, b, op);
        let engine = run(&source);

        let (x, y) = (a as f64, b as f64);
        let expected = match op {
            '+' => x + y,
            '-' => x - y,
            '*' => x * y,
            _ => x / y,
        };
        prop_assert_eq!(engine.get_value("c").unwrap(), &Value::Float(expected));
    }

    #[test]
    fn nested_reads_match_global_reads(a in 0i64..1000, b in 0i64..1000) {
        let flat = run(&format!("var a = {}; var b = {}; var c = a * b + a;", a, b));
        let nested = run(&format!(
            "var a = {}; var c = 0; {{ var b = {}; {{ var t = a * b + a; }} }} var c = a * {} + a;",
            a, b, b
        ));
        prop_assert_eq!(flat.get_value("c").unwrap(), nested.get_value("c").unwrap());
    }
}
