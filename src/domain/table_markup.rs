// Table region markup: flattening server fragments into matrices and back
//
// Wire grammar for a region fragment:
//
//   fragment := (junk | row)*
//   row      := "<tr" attrs ">" (junk | cell)* "</tr>"
//   cell     := "<th" attrs ">" raw "</th>" | "<td" attrs ">" raw "</td>"
//
// Tag names are case-insensitive. Cell bodies are kept verbatim.
use super::error::SnapshotResult;
use super::matrix::Matrix;
use regex::Regex;
use std::sync::LazyLock;

static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr\s*>").expect("row pattern"));

static CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<t[hd]\b[^>]*>(.*?)</t[hd]\s*>").expect("cell pattern")
});

/// Flatten a region fragment into a rectangular matrix of raw cell strings.
///
/// No rows yields the empty matrix. Every row must have as many cells as the
/// first one, otherwise `SnapshotError::RaggedMarkup` is returned.
pub fn flatten(markup: &str) -> SnapshotResult<Matrix> {
    let rows: Vec<Vec<String>> = ROW
        .captures_iter(markup)
        .map(|row| {
            CELL.captures_iter(&row[1])
                .map(|cell| cell[1].to_string())
                .collect()
        })
        .collect();

    if rows.is_empty() {
        return Ok(Matrix::empty());
    }
    Matrix::from_rows(&rows)
}

pub fn render_header_cells(matrix: &Matrix) -> String {
    render(matrix, "th")
}

pub fn render_data_cells(matrix: &Matrix) -> String {
    render(matrix, "td")
}

fn render(matrix: &Matrix, tag: &str) -> String {
    let mut out = String::new();
    for row in matrix.iter_rows() {
        out.push_str("<tr>");
        for cell in row {
            out.push('<');
            out.push_str(tag);
            out.push('>');
            out.push_str(cell);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        out.push_str("</tr>");
    }
    out
}
