#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![forbid(unsafe_code)]

use rollwright::roll;

use std::io::{self, Write};

fn main() {
    tracing_subscriber::fmt::init();
    println!("rollwright REPL. Type a dice expression and press Enter. Ctrl-C to exit.");

    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match roll(trimmed) {
                    Ok(result) => {
                        println!("{}", result.result);
                        if let Some(comment) = &result.comment {
                            println!("  ({comment})");
                        }
                    }
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(error) => {
                eprintln!("Error reading input: {error}");
                break;
            }
        }
    }
}
