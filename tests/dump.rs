//! Binary-to-text tests: header decoding, nested detection, annotation,
//! offsets, wrapping, depth limiting and strict-type behaviour.

use tlvtext::{DecodeError, DescriptorSet, DumpError, DumpOptions, Dumper};

fn dump_with(
    opts: DumpOptions,
    desc: Option<&DescriptorSet>,
    bytes: &[u8],
) -> Result<String, DumpError> {
    let mut out = Vec::new();
    let dumper = Dumper::new(opts, desc);
    dumper.dump_stream(&mut &bytes[..], &mut out)?;
    Ok(String::from_utf8(out).expect("utf8 output"))
}

fn dump(bytes: &[u8]) -> String {
    dump_with(DumpOptions::default(), None, bytes).expect("dump")
}

// ==================== Basic rendering ====================

#[test]
fn opaque_payload_renders_as_hex() {
    let bytes = [0x1f, 0x0a, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
    assert_eq!(dump(&bytes), "TLV[0x1f]: 0102030405060708090a\n");
}

#[test]
fn flags_render_in_brackets() {
    assert_eq!(dump(&[0x21, 0x01, 0xaa]), "TLV[0x01,F]: aa\n");
    assert_eq!(dump(&[0x41, 0x01, 0xaa]), "TLV[0x01,N]: aa\n");
    assert_eq!(dump(&[0x61, 0x01, 0xaa]), "TLV[0x01,F,N]: aa\n");
}

#[test]
fn tlv16_header_recovers_wide_tag() {
    let bytes = [0x81, 0x23, 0x00, 0x02, 0xaa, 0xbb];
    assert_eq!(dump(&bytes), "TLV[0x123]: aabb\n");
}

#[test]
fn empty_input_dumps_nothing() {
    assert_eq!(dump(&[]), "");
}

// ==================== Nested expansion ====================

#[test]
fn valid_tlv_sequence_payload_expands_as_children() {
    let bytes = [0x1f, 0x07, 0x01, 0x02, 0xff, 0xee, 0x02, 0x01, 0x41];
    assert_eq!(
        dump(&bytes),
        "TLV[0x1f]: \n    TLV[0x01]: ffee\n    TLV[0x02]: 41\n"
    );
}

#[test]
fn partial_tlv_lookalike_payload_stays_raw() {
    // payload starts like a TLV8 header but over-runs its region
    let bytes = [0x01, 0x02, 0x01, 0x02];
    assert_eq!(dump(&bytes), "TLV[0x01]: 0102\n");
}

#[test]
fn empty_payload_renders_as_composite_with_no_children() {
    assert_eq!(dump(&[0x05, 0x00]), "TLV[0x05]: \n");
}

#[test]
fn max_depth_downgrades_deeper_levels_to_raw() {
    // three structurally valid levels: 01 > 02 > 03
    let bytes = [0x01, 0x04, 0x02, 0x02, 0x03, 0x00];
    assert_eq!(
        dump(&bytes),
        "TLV[0x01]: \n    TLV[0x02]: \n        TLV[0x03]: \n"
    );

    let opts = DumpOptions {
        max_depth: 2,
        ..Default::default()
    };
    assert_eq!(
        dump_with(opts, None, &bytes).expect("dump"),
        "TLV[0x01]: \n    TLV[0x02]: 0300\n"
    );

    let opts = DumpOptions {
        max_depth: 1,
        ..Default::default()
    };
    assert_eq!(
        dump_with(opts, None, &bytes).expect("dump"),
        "TLV[0x01]: 02020300\n"
    );
}

// ==================== Optional prefixes and suffixes ====================

#[test]
fn offsets_accumulate_across_top_level_elements() {
    let bytes = [0x01, 0x01, 0xaa, 0x02, 0x01, 0xbb];
    let opts = DumpOptions {
        print_offset: true,
        ..Default::default()
    };
    assert_eq!(
        dump_with(opts, None, &bytes).expect("dump"),
        "   0:TLV[0x01]: aa\n   3:TLV[0x02]: bb\n"
    );
}

#[test]
fn child_offsets_count_from_parent_payload() {
    let bytes = [0x1f, 0x04, 0x01, 0x02, 0xff, 0xee];
    let opts = DumpOptions {
        print_offset: true,
        ..Default::default()
    };
    assert_eq!(
        dump_with(opts, None, &bytes).expect("dump"),
        "   0:TLV[0x1f]: \n   2:    TLV[0x01]: ffee\n"
    );
}

#[test]
fn length_note_follows_the_tag() {
    let bytes = [0x01, 0x02, 0xff, 0xee];
    let opts = DumpOptions {
        print_len: true,
        ..Default::default()
    };
    assert_eq!(
        dump_with(opts, None, &bytes).expect("dump"),
        "TLV[0x01]: (len = 2) ffee\n"
    );
}

#[test]
fn short_payloads_convert_to_decimal() {
    let opts = DumpOptions {
        convert: true,
        ..Default::default()
    };
    let text = dump_with(opts.clone(), None, &[0x01, 0x02, 0x01, 0x02]).expect("dump");
    assert_eq!(text, "TLV[0x01]: 0102 (dec = 258)\n");

    // nine bytes: too long for the decimal note
    let bytes = [0x01, 0x09, 0xff, 1, 2, 3, 4, 5, 6, 7, 8];
    let text = dump_with(opts, None, &bytes).expect("dump");
    assert!(!text.contains("dec"));
}

#[test]
fn wrapped_hex_aligns_under_the_prefix() {
    let mut bytes = vec![0x01, 40];
    bytes.extend(std::iter::repeat(0xab).take(40));
    let opts = DumpOptions {
        wrap: true,
        ..Default::default()
    };
    let expected = format!(
        "TLV[0x01]: {}\n{}{}\n",
        "ab".repeat(32),
        " ".repeat("TLV[0x01]: ".len()),
        "ab".repeat(8)
    );
    assert_eq!(dump_with(opts, None, &bytes).expect("dump"), expected);
}

#[test]
fn constant_header_prefix_is_echoed_as_hex() {
    let bytes = [0xde, 0xad, 0xbe, 0x01, 0x01, 0xaa];
    let opts = DumpOptions {
        header_len: 3,
        ..Default::default()
    };
    assert_eq!(
        dump_with(opts, None, &bytes).expect("dump"),
        "deadbe\nTLV[0x01]: aa\n"
    );
}

// ==================== Annotation and strict types ====================

#[test]
fn annotation_lines_precede_known_tags() {
    let desc = DescriptorSet::parse("1f Root element\n1f.01 Child element\n").expect("desc");
    let bytes = [0x1f, 0x04, 0x01, 0x02, 0xff, 0xee];
    let opts = DumpOptions {
        annotate: true,
        ..Default::default()
    };
    assert_eq!(
        dump_with(opts, Some(&desc), &bytes).expect("dump"),
        "# Root element\nTLV[0x1f]: \n    # Child element\n    TLV[0x01]: ffee\n"
    );
}

#[test]
fn descriptor_file_loads_from_disk() {
    use std::io::Write as _;
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "# test descriptors").expect("write");
    writeln!(file, "1f Root element").expect("write");
    writeln!(file, "1f.01 Child element").expect("write");
    let desc = DescriptorSet::load(file.path()).expect("load");

    let bytes = [0x1f, 0x04, 0x01, 0x02, 0xff, 0xee];
    let opts = DumpOptions {
        annotate: true,
        ..Default::default()
    };
    assert_eq!(
        dump_with(opts, Some(&desc), &bytes).expect("dump"),
        "# Root element\nTLV[0x1f]: \n    # Child element\n    TLV[0x01]: ffee\n"
    );
}

#[test]
fn strict_mode_rejects_unknown_nested_tags() {
    let desc = DescriptorSet::parse("1f Root element\n").expect("desc");
    let bytes = [0x1f, 0x04, 0x01, 0x02, 0xff, 0xee];
    let opts = DumpOptions {
        strict: true,
        ..Default::default()
    };
    let err = dump_with(opts, Some(&desc), &bytes).unwrap_err();
    assert!(matches!(
        err,
        DumpError::Decode(DecodeError::UnknownTag { tag: 0x01 })
    ));
}

#[test]
fn strict_mode_falls_back_to_top_level_descriptors() {
    // 0x01 is not in 0x1f's child set but resolves at the top level
    let desc = DescriptorSet::parse("1f Root element\n01 Number\n").expect("desc");
    let bytes = [0x1f, 0x04, 0x01, 0x02, 0xff, 0xee];
    let opts = DumpOptions {
        strict: true,
        ..Default::default()
    };
    assert_eq!(
        dump_with(opts, Some(&desc), &bytes).expect("dump"),
        "TLV[0x1f]: \n    TLV[0x01]: ffee\n"
    );
}

// ==================== Stream errors ====================

#[test]
fn truncated_payload_reports_consumed_bytes() {
    let mut out = Vec::new();
    let dumper = Dumper::new(DumpOptions::default(), None);
    let e = dumper
        .dump_stream(&mut &[0x01u8, 0x05, 0xaa][..], &mut out)
        .unwrap_err();
    assert!(matches!(
        e,
        DumpError::Decode(DecodeError::Truncated { consumed: 3 })
    ));
}

#[test]
fn truncated_header_reports_consumed_bytes() {
    let mut out = Vec::new();
    let dumper = Dumper::new(DumpOptions::default(), None);
    // TLV16 marker but only one header byte present
    let e = dumper
        .dump_stream(&mut &[0x81u8][..], &mut out)
        .unwrap_err();
    assert!(matches!(
        e,
        DumpError::Decode(DecodeError::Truncated { consumed: 1 })
    ));
}

#[test]
fn elements_before_a_truncation_stay_written() {
    let mut out = Vec::new();
    let dumper = Dumper::new(DumpOptions::default(), None);
    let bytes = [0x01, 0x01, 0xaa, 0x02, 0x05, 0x00];
    let e = dumper.dump_stream(&mut &bytes[..], &mut out).unwrap_err();
    assert!(matches!(e, DumpError::Decode(DecodeError::Truncated { .. })));
    assert_eq!(String::from_utf8(out).expect("utf8"), "TLV[0x01]: aa\n");
}
