//! Server-rendered form and result table.

use std::fmt::Write as _;

use kgscope_infer::LinkPrediction;

/// Values echoed back into the form after a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub random: bool,
}

const DESCRIPTION: [&str; 3] = [
    "Enter a triple to compute its score,",
    "Enter a subject and predicate pair to obtain the most likely entities, or",
    "Check the random examples box and click submit.",
];

/// Full page: form, then (after a submission) the triple and its table.
pub fn page(
    title: &str,
    form: &FormValues,
    triple: Option<&str>,
    results: &[LinkPrediction],
) -> String {
    let title = escape(title);
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>body{{font-family:sans-serif;max-width:48em;margin:2em auto}}\
         table{{border-collapse:collapse}}td,th{{border:1px solid #ccc;padding:.25em .75em}}\
         td.score{{text-align:right}}</style>\n</head>\n<body>\n<h1>{title}</h1>\n<ol>\n"
    );
    for line in DESCRIPTION {
        let _ = writeln!(out, "<li>{line}</li>");
    }
    out.push_str("</ol>\n<form method=\"post\" action=\"/predict\">\n");
    text_input(&mut out, "subject", "Subject", &form.subject);
    text_input(&mut out, "predicate", "Predicate", &form.predicate);
    text_input(&mut out, "object", "Object", &form.object);
    let _ = writeln!(
        out,
        "<p><label><input type=\"checkbox\" name=\"random\" value=\"on\"{}> Random examples</label></p>",
        if form.random { " checked" } else { "" }
    );
    out.push_str("<p><button type=\"submit\">Submit</button></p>\n</form>\n");

    if let Some(triple) = triple {
        let _ = writeln!(
            out,
            "<h2>Input Triple</h2>\n<p id=\"triple\">{}</p>",
            escape(triple)
        );
        out.push_str("<h2>Outputs</h2>\n");
        out.push_str(&results_table(results));
    }
    out.push_str("</body>\n</html>\n");
    out
}

/// Entity/score table; scores shown with 3 decimals.
pub fn results_table(results: &[LinkPrediction]) -> String {
    let mut out = String::from("<table id=\"results\">\n<tr><th>Entity</th><th>Score</th></tr>\n");
    for row in results {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td class=\"score\">{:.3}</td></tr>",
            escape(&row.entity),
            row.display_score()
        );
    }
    out.push_str("</table>\n");
    out
}

fn text_input(out: &mut String, name: &str, label: &str, value: &str) {
    let _ = writeln!(
        out,
        "<p><label>{label}<br><input type=\"text\" name=\"{name}\" value=\"{}\" size=\"60\"></label></p>",
        escape(value)
    );
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
