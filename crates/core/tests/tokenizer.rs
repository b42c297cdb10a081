//! Tokenizer behavior: mnemonic recognition, field data scanning, and
//! graceful handling of malformed input.

use zpl_labelkit_core::{Token, tokenize};

fn names<'a>(toks: &[Token<'a>]) -> Vec<&'a str> {
    toks.iter().map(|t| t.name).collect()
}

#[test]
fn basic_label_commands() {
    let toks = tokenize("^XA^FO50,50^ADN,30,30^FDHello^FS^XZ");
    assert_eq!(names(&toks), ["XA", "FO", "A", "FD", "XZ"]);
    assert_eq!(toks[1].params, "50,50");
    assert_eq!(toks[2].params, "DN,30,30");
    assert_eq!(toks[3].params, "Hello");
    assert_eq!(toks[0].params, "");
}

#[test]
fn field_data_keeps_sigils_verbatim() {
    let toks = tokenize("^XA^FDPrice ^ 5 ~ok^FS^XZ");
    assert_eq!(names(&toks), ["XA", "FD", "XZ"]);
    assert_eq!(toks[1].params, "Price ^ 5 ~ok");
}

#[test]
fn only_caret_fs_closes_field_data() {
    let toks = tokenize("^FDa~FSb^FS^FVc^FS");
    assert_eq!(names(&toks), ["FD", "FV", "FS"]);
    assert_eq!(toks[0].params, "a~FSb");
    assert_eq!(toks[1].params, "c");
}

#[test]
fn field_data_is_not_trimmed() {
    let toks = tokenize("^FD  padded  ^FS");
    assert_eq!(toks[0].params, "  padded  ");
}

#[test]
fn non_field_params_are_trimmed() {
    let toks = tokenize("^FO 10 , 20 \n^XZ");
    assert_eq!(toks[0].params, "10 , 20");
}

#[test]
fn unterminated_field_data_runs_to_end() {
    let toks = tokenize("^XA^FDno terminator ^XZ");
    assert_eq!(names(&toks), ["XA", "FD"]);
    assert_eq!(toks[1].params, "no terminator ^XZ");
    assert_eq!(toks[1].end, "^XA^FDno terminator ^XZ".len());
}

#[test]
fn leading_garbage_is_skipped() {
    let toks = tokenize("garbage text\n^XA^XZ");
    assert_eq!(names(&toks), ["XA", "XZ"]);
}

#[test]
fn empty_mnemonic_is_skipped() {
    let toks = tokenize("^^XA^ ^XZ");
    assert_eq!(names(&toks), ["XA", "XZ"]);
}

#[test]
fn input_without_sigils_yields_nothing() {
    assert!(tokenize("hello world").is_empty());
    assert!(tokenize("").is_empty());
}

#[test]
fn control_commands_are_tokens() {
    let toks = tokenize("~JA^XA~HS^XZ");
    assert_eq!(names(&toks), ["JA", "XA", "HS", "XZ"]);
}

#[test]
fn multibyte_text_is_not_split() {
    let toks = tokenize("^XA^FDGrüße – 日本^FS^FO1,2^XZ");
    assert_eq!(toks[1].params, "Grüße – 日本");
    assert_eq!(toks[2].params, "1,2");
}

#[test]
fn single_char_mnemonic_before_sigil() {
    let toks = tokenize("^A^FO1,1");
    assert_eq!(names(&toks), ["A", "FO"]);
    assert_eq!(toks[0].params, "");
}

#[test]
fn tokens_serialize_name_and_params() {
    let toks = tokenize("^FO1,2");
    let json = serde_json::to_value(&toks).unwrap();
    assert_eq!(json, serde_json::json!([{ "name": "FO", "params": "1,2" }]));
}
