use std::io::Write;

use goldenfile::Mint;

fn lowering_test(source: &str, module_name: &str, goldenfile: &str) {
    let mut mint = Mint::new("tests/goldenfiles/ir");
    let mut goldenfile = mint.new_goldenfile(goldenfile).unwrap();

    let program = plover::parse(source).unwrap();
    let analysis = plover::analyze(&program).unwrap();
    let module = plover::lower(&analysis.program, module_name).unwrap();

    write!(goldenfile, "{module}").unwrap()
}

#[test]
fn minimal() {
    lowering_test(include_str!("testfiles/minimal.plv"), "minimal", "minimal.golden");
}

#[test]
fn max() {
    lowering_test(include_str!("testfiles/max.plv"), "max", "max.golden");
}

#[test]
fn printf() {
    lowering_test(include_str!("testfiles/printf.plv"), "printf", "printf.golden");
}
