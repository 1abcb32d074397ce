use benchtrail::logging::init_logging;

#[test]
fn test_init_logging_installs_once() {
    // GIVEN no subscriber yet
    // WHEN logging is initialized twice
    let first = init_logging(2).unwrap();
    let second = init_logging(0).unwrap();

    // THEN only the first call installs a subscriber
    assert!(first);
    assert!(!second);
    tracing::debug!("debug output reaches the installed subscriber");
}
