#[test]
fn masonry_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/masonry_error_pass.rs");
}
