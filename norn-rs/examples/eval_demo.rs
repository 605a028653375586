//! Evaluate a few list expressions against one session environment.
//!
//! Run with: cargo run --example eval_demo

use norn::{parse, recipients, Environment};

fn main() {
    let env = Environment::new();

    for input in [
        "cats = bombay@mit.edu, tuxedo@mit.edu",
        "dogs = corgi@mit.edu",
        "pets = cats, dogs",
        "pets ! dogs",
        "cats = cats * bombay@mit.edu",
        "ghosts", // never defined: empty
    ] {
        let expr = match parse(input) {
            Ok(e) => e,
            Err(e) => {
                eprintln!("{input}: {e}");
                continue;
            }
        };
        match recipients(&expr, &env) {
            Ok(set) => {
                let addrs: Vec<&str> = set.iter().map(|r| r.as_str()).collect();
                println!("{input}\n  => {{{}}}", addrs.join(", "));
            }
            Err(e) => println!("{input}\n  => {e}"),
        }
    }
}
