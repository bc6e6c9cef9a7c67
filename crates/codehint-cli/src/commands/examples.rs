//! Examples command - list or print the built-in snippets.

use crate::snippets::{self, EXAMPLES};

pub(crate) fn run(index: Option<usize>) -> miette::Result<()> {
    let Some(number) = index else {
        println!("Example snippets:");
        for (i, example) in EXAMPLES.iter().enumerate() {
            println!("  {}. {}", i + 1, example.title);
        }
        println!();
        println!("Try one with:");
        println!("  codehint hint --example 4 --lines 5");
        return Ok(());
    };

    let example = snippets::get(number).ok_or_else(|| {
        miette::miette!(
            "No example {}. Pick a number from 1 to {}",
            number,
            EXAMPLES.len()
        )
    })?;

    println!("# {}", example.title);
    for (i, line) in example.code.lines().enumerate() {
        println!("{:>3} | {}", i + 1, line);
    }

    Ok(())
}
