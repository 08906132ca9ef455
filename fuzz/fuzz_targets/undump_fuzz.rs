//! Undump fuzz target: feed arbitrary bytes through the text tokenizer,
//! tree builder and binary encoder. The pipeline must not panic; it should
//! produce bytes or a positioned UndumpError.
//! Build with: cargo fuzz run undump_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let mut out = Vec::new();
    let _ = tlvtext::convert_stream(data, "<fuzz>", &mut out);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run undump_fuzz");
}
