//! Convert indented TLV text back into exact binary bytes.
//!
//! Usage:
//!   tlvundump [-h] [-v] [tlvfile ...]
//!
//! Reads stdin when no files are given and writes binary TLV to stdout.
//! Each completed top-level element is written as soon as its boundary is
//! seen; a fatal parse error aborts with status 2, keeping whatever was
//! already emitted.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use tlvtext::{convert_stream, UndumpError};

const USAGE: &str = "\
Usage:
  tlvundump [-h] [tlvfile ...]
    -h       This help message
    -v       Package version
";

fn take_flag(args: &mut Vec<String>, short: &str, long: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == short || a == long) {
        args.remove(pos);
        true
    } else {
        false
    }
}

fn run<R: BufRead, W: Write>(input: R, name: &str, out: &mut W) {
    if let Err(e) = convert_stream(input, name, out) {
        let _ = out.flush();
        match e {
            UndumpError::Io(e) => {
                eprintln!("{}: {}", name, e);
                std::process::exit(1);
            }
            // Format, indentation and encoding errors already carry
            // file:line in their display form.
            other => {
                eprintln!("{}", other);
                std::process::exit(2);
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if take_flag(&mut args, "-h", "--help") {
        print!("{}", USAGE);
        return Ok(());
    }
    if take_flag(&mut args, "-v", "--version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if let Some(bad) = args.iter().find(|a| a.starts_with('-')) {
        anyhow::bail!("unknown parameter '{}', try -h", bad);
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.is_empty() {
        let stdin = io::stdin();
        run(stdin.lock(), "<stdin>", &mut out);
    } else {
        for name in &args {
            match File::open(name) {
                Ok(f) => run(BufReader::new(f), name, &mut out),
                Err(_) => eprintln!("{}: unable to open file", name),
            }
        }
    }

    out.flush()?;
    Ok(())
}
