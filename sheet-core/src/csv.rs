//! Minimal reader/writer for the comma-delimited row format shared by the
//! character store and the reference catalogs.
//!
//! The format predates this crate: rows produced by a stock CSV writer with
//! minimal quoting. A field containing a comma, a double quote, or a line
//! break is wrapped in double quotes; embedded quotes are doubled. Quoted
//! fields may span lines (spell descriptions do).

/// Parse a whole document into rows of fields.
///
/// Never fails: a dangling quote simply terminates the final field at end
/// of input. Empty lines produce no row.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' => {
                in_quotes = true;
                field_started = true;
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                field_started = true;
            }
            '\r' => {}
            '\n' => {
                if field_started || !field.is_empty() || !fields.is_empty() {
                    fields.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut fields));
                }
                field_started = false;
            }
            _ => {
                field.push(ch);
                field_started = true;
            }
        }
    }
    if field_started || !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        rows.push(fields);
    }
    rows
}

/// Encode one row with minimal quoting. No trailing newline.
pub fn write_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let field = field.as_ref();
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out
}

/// A header-addressed table, for catalogs shaped like `Name,Level,...`.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse a document whose first row is the header row.
    pub fn parse(text: &str) -> Table {
        let mut rows = parse_rows(text);
        if rows.is_empty() {
            return Table::default();
        }
        let headers = rows.remove(0);
        Table { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |fields| Record {
            headers: &self.headers,
            fields,
        })
    }
}

/// One data row of a [`Table`], with fields addressed by header name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    headers: &'a [String],
    fields: &'a [String],
}

impl Record<'_> {
    /// Field under the given header, or `None` if the header is unknown or
    /// the row is short.
    pub fn get(&self, header: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == header)?;
        self.fields.get(idx).map(String::as_str)
    }

    /// Like [`Record::get`], defaulting to the empty string.
    pub fn get_or_empty(&self, header: &str) -> &str {
        self.get(header).unwrap_or("")
    }

    /// All `(header, field)` pairs present in this row.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .zip(self.fields.iter())
            .map(|(h, f)| (h.as_str(), f.as_str()))
    }
}
