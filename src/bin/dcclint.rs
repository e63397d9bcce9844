//! Inspect schema files: parse, preprocess, and print each message's
//! layout report (field kinds, bounds, bit widths, size budget).
//!
//! Usage:
//!   dcclint FILE.dccl [FILE.dccl ...]
//!   dcclint < file.dccl
//!
//! Options:
//!   --short, -s  One summary line per message instead of the full report

use dccl_codec::{parse, Message};
use std::io::Read;

fn print_short(msg: &Message) {
    println!(
        "{}: size {}/{}B | fields: {}",
        msg.name(),
        msg.used_bytes_total(),
        msg.requested_bytes_total(),
        msg.layout().len()
    );
}

fn report(messages: &[Message], short: bool) {
    for msg in messages {
        if short {
            print_short(msg);
        } else {
            print!("{}", msg);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let short = if let Some(pos) = args.iter().position(|a| a == "--short" || a == "-s") {
        args.remove(pos);
        true
    } else {
        false
    };

    let mut has_error = false;
    if args.is_empty() {
        let mut src = String::new();
        std::io::stdin().read_to_string(&mut src)?;
        match parse(&src) {
            Ok(messages) => report(&messages, short),
            Err(e) => {
                eprintln!("<stdin>: {}", e);
                has_error = true;
            }
        }
    } else {
        for path in &args {
            match dccl_codec::parse_file(path) {
                Ok(messages) => report(&messages, short),
                Err(e) => {
                    eprintln!("{}: {}", path, e);
                    has_error = true;
                }
            }
        }
    }

    if has_error {
        std::process::exit(1);
    }
    Ok(())
}
