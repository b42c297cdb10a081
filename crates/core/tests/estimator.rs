//! Height estimator: cursor tracking, text measurement, barcodes, boxes
//! and reconciliation with explicit `^LL`.

mod common;

use zpl_labelkit_core::{
    EstimatorConfig, estimate_detailed, estimate_height_dots, estimate_tokens, tokenize,
};

fn est(markup: &str) -> u32 {
    estimate_height_dots(markup, &EstimatorConfig::default())
}

#[test]
fn single_line_text() {
    assert_eq!(est("^XA^FO50,50^ADN,30,30^FDHello^FS^XZ"), 80);
}

#[test]
fn default_font_used_without_a() {
    assert_eq!(est("^XA^FO0,10^FDHi^FS^XZ"), 40);
}

#[test]
fn escaped_line_breaks_add_gaps() {
    // 3 lines * 30 + 2 gaps * 2
    assert_eq!(est("^XA^FO0,0^FDa\\&b\\&c^FS^XZ"), 94);
}

#[test]
fn real_newlines_count_as_lines() {
    assert_eq!(est("^XA^FO0,0^FDa\r\nb^FS^XZ"), 62);
}

#[test]
fn barcode_with_orientation_uses_second_field() {
    assert_eq!(est("^XA^FO10,200^BCN,100,Y,N,N^FD12345^FS^XZ"), 300);
}

#[test]
fn barcode_without_orientation_uses_first_field() {
    assert_eq!(est("^XA^FO0,200^BC80^XZ"), 280);
}

#[test]
fn barcode_falls_back_to_default_height() {
    assert_eq!(est("^XA^FO0,200^BCN^XZ"), 300);
}

#[test]
fn barcode_defaults_command_leaves_height_alone() {
    assert_eq!(est("^XA^BY2,3,50^FO0,200^BCN^FD123^FS^XZ"), 300);
    assert_eq!(est("^XA^BY2,3,250^FO0,200^BC,80^XZ"), 280);
}

#[test]
fn graphic_box_height() {
    assert_eq!(est("^XA^FO20,400^GB300,120,3^FS^XZ"), 520);
}

#[test]
fn label_home_shifts_everything() {
    assert_eq!(est("^XA^LH0,100^FO0,50^GB10,10^FS^XZ"), 160);
}

#[test]
fn cf_uses_first_numeric_field() {
    assert_eq!(est("^XA^CF0,40^FO0,100^FDx^FS^XZ"), 100);
    assert_eq!(est("^XA^CFD,44^FO0,0^FDx^FS^XZ"), 44);
    assert_eq!(est("^XA^CFD^FO0,0^FDx^FS^XZ"), 30);
}

#[test]
fn explicit_length_wins_when_larger() {
    assert_eq!(est("^XA^LL1000^FO0,0^FDx^FS^XZ"), 1000);
}

#[test]
fn structural_wins_when_larger() {
    let detail = estimate_detailed("^XA^LL10^FO0,100^FDx^FS^XZ", &EstimatorConfig::default());
    assert_eq!(detail.structural, 130);
    assert_eq!(detail.explicit, Some(10));
    assert_eq!(detail.dots, 130);
}

#[test]
fn largest_explicit_length_is_kept() {
    let detail = estimate_detailed("^XA^LL500^LL300^XZ", &EstimatorConfig::default());
    assert_eq!(detail.explicit, Some(500));
    assert_eq!(detail.dots, 500);
}

#[test]
fn result_is_at_least_explicit_and_structural() {
    let docs = [
        "^XA^FO0,0^FDa^FS^XZ",
        "^XA^LL900^FO0,1000^GB1,1^FS^XZ",
        "^XA^LL50^XZ",
        "^XA^FO5,5^BCN,,Y^FD1^FS^LL2^XZ",
    ];
    for doc in docs {
        let d = estimate_detailed(doc, &EstimatorConfig::default());
        assert!(d.dots >= d.structural, "{doc}");
        assert!(d.dots >= d.explicit.unwrap_or(0), "{doc}");
    }
}

#[test]
fn unknown_commands_are_ignored() {
    assert_eq!(est("^XA^ZZ999^FX comment ^XZ"), 0);
}

#[test]
fn configurable_approximations() {
    let cfg = EstimatorConfig {
        default_font_height: 20,
        default_line_gap: 5,
        default_barcode_height: 50,
    };
    assert_eq!(estimate_height_dots("^FO0,0^FDa\\&b^FS", &cfg), 45);
    assert_eq!(estimate_height_dots("^FO0,0^BCN", &cfg), 50);
}

#[test]
fn tokens_and_markup_entry_points_agree() {
    let markup = common::sample("shipping.zpl");
    let toks = tokenize(&markup);
    let cfg = EstimatorConfig::default();
    assert_eq!(estimate_tokens(&toks, &cfg), estimate_height_dots(&markup, &cfg));
}

#[test]
fn sample_files_estimate_without_panicking() {
    for name in ["shipping.zpl", "multiline.zpl", "continuous.zpl"] {
        let markup = common::sample(name);
        assert!(est(&markup) > 0, "{name}");
    }
}
