//! Parse/render stability tests using datatest-stable.
//!
//! Each test case is a markup file in `tests/roundtrip-cases/`. For every
//! flavor the test verifies:
//!
//! - render(parse(render(parse(markup)))) == render(parse(markup))
//! - codify gives the same statements for both parses

use std::path::Path;
use trellis::{Flavor, codify, parse_markup};

fn run_roundtrip_test(path: &Path) -> datatest_stable::Result<()> {
    facet_testhelpers::setup();

    let markup = std::fs::read_to_string(path)?;

    for flavor in [Flavor::Html, Flavor::Xhtml, Flavor::Xml] {
        let first = parse_markup(flavor, markup.trim());
        let rendered = first.render();

        let second = parse_markup(flavor, &rendered);
        let rerendered = second.render();

        if rendered != rerendered {
            return Err(format!(
                "Render not stable for {flavor:?}!\nInput: {markup}\nFirst: {rendered}\nSecond: {rerendered}"
            )
            .into());
        }

        let first_code = codify(&first);
        let second_code = codify(&second);
        if first_code != second_code {
            return Err(format!(
                "Codify not stable for {flavor:?}!\nFirst:\n{first_code}\nSecond:\n{second_code}"
            )
            .into());
        }
    }

    Ok(())
}

datatest_stable::harness! {
    { test = run_roundtrip_test, root = "tests/roundtrip-cases", pattern = r".*\.html$" },
}
