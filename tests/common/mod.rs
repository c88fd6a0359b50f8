pub fn run_pipeline(src: &str) -> plover::Compilation {
    plover::compile(src, "test").unwrap()
}
