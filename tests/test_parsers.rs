use benchtrail::exceptions::BenchError;
use benchtrail::parsers::{parse_cargo_output, parse_custom_output, parse_output};

const CARGO_OUTPUT: &str = "\
running 3 tests
test tests::unit ... ignored
test frame processing/whole ... bench:   8,459,380 ns/iter (+/- 9,153)
test frame processing/decode ... bench:         812.25 ns/iter (+/- 3.5)

test result: ok. 0 passed; 0 failed; 1 ignored; 0 measured; 0 filtered out
";

#[test]
fn test_cargo_bench_lines_are_parsed() {
    let benches = parse_cargo_output(CARGO_OUTPUT).unwrap();

    assert_eq!(benches.len(), 2);
    assert_eq!(benches[0].name, "frame processing/whole");
    assert_eq!(benches[0].value, 8_459_380.0);
    assert_eq!(benches[0].unit, "ns/iter");
    assert_eq!(benches[0].variability, Some(9_153.0));
    assert_eq!(benches[0].range(), Some("± 9153"));

    assert_eq!(benches[1].name, "frame processing/decode");
    assert_eq!(benches[1].value, 812.25);
    assert_eq!(benches[1].variability(), 3.5);
}

#[test]
fn test_cargo_output_without_results_is_invalid_input() {
    let err = parse_cargo_output("running 0 tests\n").unwrap_err();
    assert!(matches!(err, BenchError::InvalidInput(_)));
    assert_eq!(err.exit_code(), 64);
}

#[test]
fn test_custom_json_measurements() {
    // GIVEN custom tool output mixing explicit and range-only variability
    let output = r#"[
        {"name": "throughput", "value": 1200, "unit": "req/s", "variability": 15},
        {"name": "memory", "value": 52.5, "unit": "MiB", "range": "± 1.5", "extra": "peak"}
    ]"#;

    // WHEN parsed
    let benches = parse_custom_output(output).unwrap();

    // THEN every measurement carries both forms of its variability
    assert_eq!(benches[0].variability, Some(15.0));
    assert_eq!(benches[0].range(), Some("± 15"));
    assert_eq!(benches[1].variability, Some(1.5));
    assert_eq!(benches[1].range(), Some("± 1.5"));
    assert_eq!(benches[1].extra["extra"], "peak");
}

#[test]
fn test_custom_json_errors() {
    assert!(matches!(
        parse_custom_output("[]"),
        Err(BenchError::InvalidInput(_))
    ));
    assert!(matches!(
        parse_custom_output("{\"name\": \"a\"}"),
        Err(BenchError::InvalidInput(_))
    ));
}

#[test]
fn test_dispatch_by_tool() {
    assert_eq!(parse_output("cargo", CARGO_OUTPUT).unwrap().len(), 2);
    assert_eq!(
        parse_output(
            "customSmallerIsBetter",
            r#"[{"name": "a", "value": 1, "unit": "ms"}]"#
        )
        .unwrap()
        .len(),
        1
    );

    let err = parse_output("pytest", "").unwrap_err();
    assert!(err.to_string().contains("Unsupported tool 'pytest'"));
}
