//! Default Typst report template.
//!
//! Built-in Typst report markup with `{{PLACEHOLDER}}` substitution. Custom
//! templates may use any subset of the same placeholders.

/// Every placeholder [`super::resolve`] understands.
pub const PLACEHOLDERS: &[&str] = &[
    "{{TITLE}}",
    "{{GENERATED_AT}}",
    "{{PARAMETERS_TABLE}}",
    "{{SUMMARY_TABLE}}",
    "{{INDICATORS_TABLE}}",
    "{{BALANCE_CHART_SVG}}",
    "{{DRAWDOWN_CHART_SVG}}",
    "{{MONTHLY_RETURNS}}",
    "{{LEDGER_TABLE}}",
];

const TEMPLATE: &str = r#"#set document(title: "{{TITLE}}")
#set page(
  paper: "a4",
  margin: (x: 1.8cm, y: 2cm),
  numbering: "1 / 1",
)
#set text(size: 9pt)
#set table(stroke: 0.5pt + luma(180), inset: 5pt)
#show heading.where(level: 1): set text(size: 18pt)

= {{TITLE}}

_Generated {{GENERATED_AT}}_

== Parameters

{{PARAMETERS_TABLE}}

== Summary

{{SUMMARY_TABLE}}

== Indicators

{{INDICATORS_TABLE}}

== Balance

{{BALANCE_CHART_SVG}}

== Drawdown

{{DRAWDOWN_CHART_SVG}}

== Monthly Returns

{{MONTHLY_RETURNS}}

#pagebreak()

== Ledger

{{LEDGER_TABLE}}
"#;

pub fn template() -> &'static str {
    TEMPLATE
}
