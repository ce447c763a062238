use revive_core::progress::{parse_progress_line, ProgressParser};

// ---------------------------------------------------------------------------
// parse_progress_line
// ---------------------------------------------------------------------------

#[test]
fn test_comma_and_period_separators_agree() {
    for (comma, period) in [("12,34%", "12.34%"), ("0,00%", "0.00%"), ("99,99%", "99.99%")] {
        assert_eq!(parse_progress_line(comma), parse_progress_line(period));
        assert!(parse_progress_line(comma).is_some(), "got none for {comma}");
    }
}

#[test]
fn test_fraction_is_truncated() {
    assert_eq!(parse_progress_line("12,99%"), Some(12));
    assert_eq!(parse_progress_line("7.5%"), Some(7));
}

#[test]
fn test_trailing_text_after_marker_is_ignored() {
    assert_eq!(parse_progress_line("45,00% done"), Some(45));
}

#[test]
fn test_number_must_touch_marker() {
    assert_eq!(parse_progress_line("tile 3 of 8: 62.5%"), Some(62));
    assert_eq!(parse_progress_line("62.5 %"), None);
}

#[test]
fn test_line_without_marker_yields_nothing() {
    assert_eq!(parse_progress_line("[0 NVIDIA GeForce] queueC=2[8]"), None);
    assert_eq!(parse_progress_line(""), None);
}

#[test]
fn test_malformed_numbers_yield_nothing() {
    assert_eq!(parse_progress_line("%"), None);
    assert_eq!(parse_progress_line("abc%"), None);
    assert_eq!(parse_progress_line("1,2,3%"), None);
    assert_eq!(parse_progress_line("1.2.3%"), None);
    assert_eq!(parse_progress_line("..%"), None);
    assert_eq!(parse_progress_line("1-2%"), None);
}

#[test]
fn test_values_are_clamped() {
    assert_eq!(parse_progress_line("250,0%"), Some(100));
    assert_eq!(parse_progress_line("-5%"), Some(0));
    assert_eq!(parse_progress_line("100,00%"), Some(100));
}

#[test]
fn test_huge_numbers_do_not_panic() {
    let line = format!("{}%", "9".repeat(400));
    assert_eq!(parse_progress_line(&line), Some(100));
}

#[test]
fn test_multibyte_prefix_is_handled() {
    assert_eq!(parse_progress_line("progreso ✓ 33,3%"), Some(33));
}

// ---------------------------------------------------------------------------
// ProgressParser
// ---------------------------------------------------------------------------

#[test]
fn test_parser_drops_regressions() {
    let mut parser = ProgressParser::new();
    let emitted: Vec<u8> = ["10,00%", "noise", "30,00%", "20,00%", "30,00%", "55.5%"]
        .iter()
        .filter_map(|line| parser.feed(line))
        .collect();
    assert_eq!(emitted, vec![10, 30, 55]);
    assert_eq!(parser.last(), Some(55));
}

#[test]
fn test_parser_first_zero_is_emitted() {
    let mut parser = ProgressParser::new();
    assert_eq!(parser.feed("0,00%"), Some(0));
    assert_eq!(parser.feed("0,00%"), None);
}
