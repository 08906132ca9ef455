//! Dump binary TLV streams as indented text.
//!
//! Usage:
//!   tlvdump [OPTIONS] [tlvfile ...]
//!
//! Reads stdin when no files are given. A truncated or malformed input is
//! reported and skipped; remaining files are still processed.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tlvtext::{DecodeError, DescriptorSet, DumpError, DumpOptions, Dumper};

const USAGE: &str = "\
Usage:
  tlvdump [OPTIONS] [tlvfile ...]
    -h, --help       This help message
    -x, --offset     Display the stream offset for every TLV
    -w, --wrap       Wrap raw payloads at 64 hex characters
    -y, --len        Show content length
    -z, --dec        Convert payloads of at most 8 bytes to decimal
    -a, --annotate   Annotate elements known to the descriptor file
    -s, --strict     Strict types - do not expand TLVs with unknown types
    -d, --depth=NUM  Max depth of nested elements (0 = unlimited)
    -H, --header=NUM Constant header length to skip and echo as hex
    --desc=FILE      Tag descriptor file (required by -a and -s)
";

fn take_flag(args: &mut Vec<String>, short: &str, long: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == short || a == long) {
        args.remove(pos);
        true
    } else {
        false
    }
}

/// Accept `--name=value` or `-n value`.
fn take_value(args: &mut Vec<String>, prefix: &str, short: &str) -> Option<String> {
    if let Some(pos) = args.iter().position(|a| a.starts_with(prefix)) {
        let arg = args.remove(pos);
        return Some(arg[prefix.len()..].to_string());
    }
    if let Some(pos) = args.iter().position(|a| a == short) {
        args.remove(pos);
        if pos < args.len() {
            return Some(args.remove(pos));
        }
        return Some(String::new());
    }
    None
}

fn parse_num(value: Option<String>, what: &str) -> anyhow::Result<usize> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| anyhow::anyhow!("{} expects a number, got '{}'", what, v)),
        None => Ok(0),
    }
}

fn dump_one<R: Read, W: Write>(dumper: &Dumper, input: &mut R, out: &mut W, name: &str) {
    if let Err(e) = dumper.dump_stream(input, out) {
        match e {
            DumpError::Decode(DecodeError::Truncated { consumed }) => {
                eprintln!("{}: failed to parse {} bytes", name, consumed);
            }
            other => eprintln!("{}: {}", name, other),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if take_flag(&mut args, "-h", "--help") {
        print!("{}", USAGE);
        return Ok(());
    }

    let opts = DumpOptions {
        print_offset: take_flag(&mut args, "-x", "--offset"),
        wrap: take_flag(&mut args, "-w", "--wrap"),
        print_len: take_flag(&mut args, "-y", "--len"),
        convert: take_flag(&mut args, "-z", "--dec"),
        annotate: take_flag(&mut args, "-a", "--annotate"),
        strict: take_flag(&mut args, "-s", "--strict"),
        max_depth: parse_num(take_value(&mut args, "--depth=", "-d"), "--depth")?,
        header_len: parse_num(take_value(&mut args, "--header=", "-H"), "--header")?,
    };
    let desc_path = take_value(&mut args, "--desc=", "--desc");

    if let Some(bad) = args.iter().find(|a| a.starts_with('-')) {
        anyhow::bail!("unknown parameter '{}', try -h", bad);
    }

    let descriptors = match &desc_path {
        Some(p) => Some(
            DescriptorSet::load(Path::new(p))
                .map_err(|e| anyhow::anyhow!("{}: unable to read descriptor file: {}", p, e))?,
        ),
        None => None,
    };
    if (opts.annotate || opts.strict) && descriptors.is_none() {
        anyhow::bail!("--annotate and --strict require --desc=FILE");
    }

    let dumper = Dumper::new(opts, descriptors.as_ref());
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.is_empty() {
        let stdin = io::stdin();
        dump_one(&dumper, &mut stdin.lock(), &mut out, "<stdin>");
    } else {
        for name in &args {
            match File::open(name) {
                Ok(mut f) => dump_one(&dumper, &mut f, &mut out, name),
                Err(_) => eprintln!("{}: unable to open file", name),
            }
        }
    }

    out.flush()?;
    Ok(())
}
