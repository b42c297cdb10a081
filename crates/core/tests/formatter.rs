//! Formatter: pretty-printing and minification of label markup.

mod common;

use zpl_labelkit_core::{minify, pretty_print, tokenize};

#[test]
fn pretty_one_command_per_line() {
    let out = pretty_print("^XA^FO50,50^ADN,30,30^FDHello^FS^XZ");
    assert_eq!(out, "^XA\n^FO50,50\n^ADN,30,30\n^FDHello^FS\n^XZ");
}

#[test]
fn pretty_normalizes_spacing() {
    let out = pretty_print("^XA\n^FO 50 ,  50\n^XZ");
    assert_eq!(out, "^XA\n^FO50,50\n^XZ");
}

#[test]
fn minify_strips_whitespace_outside_field_data() {
    let out = minify("^XA\n  ^FO 50 , 50\n  ^FD  Hello   World ^FS\n^XZ\n");
    assert_eq!(out, "^XA^FO50,50^FD  Hello   World ^FS^XZ");
}

#[test]
fn field_data_with_sigils_survives() {
    let src = "^XA^FDA^B~C^FS^XZ";
    assert_eq!(minify(src), src);
    assert_eq!(pretty_print(src), "^XA\n^FDA^B~C^FS\n^XZ");
}

#[test]
fn unterminated_field_data_takes_rest() {
    let out = minify("^XA^FDdangling ^XZ");
    assert_eq!(out, "^XA^FDdangling ^XZ");
}

#[test]
fn headerless_input_degrades() {
    assert_eq!(pretty_print("no commands here"), "");
    assert_eq!(minify("junk ^XA ^XZ"), "^XA^XZ");
}

#[test]
fn crlf_input_is_normalized() {
    assert_eq!(pretty_print("^XA\r\n^FO1,2\r\n^XZ\r\n"), "^XA\n^FO1,2\n^XZ");
}

#[test]
fn control_commands_keep_their_sigil() {
    assert_eq!(minify("~JA ^XA ^XZ"), "~JA^XA^XZ");
}

#[test]
fn field_data_payloads_preserved_for_samples() {
    for name in ["shipping.zpl", "multiline.zpl", "continuous.zpl"] {
        let src = common::sample(name);
        let original: Vec<String> = tokenize(&src)
            .iter()
            .filter(|t| t.is_field_data())
            .map(|t| t.params.to_string())
            .collect();
        for formatted in [pretty_print(&src), minify(&src)] {
            let after: Vec<String> = tokenize(&formatted)
                .iter()
                .filter(|t| t.is_field_data())
                .map(|t| t.params.to_string())
                .collect();
            assert_eq!(after, original, "{name}");
        }
    }
}

#[test]
fn minify_is_stable() {
    let once = minify(&common::sample("shipping.zpl"));
    assert_eq!(minify(&once), once);
}
