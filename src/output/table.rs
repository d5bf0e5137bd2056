#![forbid(unsafe_code)]

use std::io;

use unicode_width::UnicodeWidthStr as _;

#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cols: impl IntoIterator<Item = impl Into<String>>) {
        self.rows.push(cols.into_iter().map(Into::into).collect());
    }

    pub fn write_csv_to(&self, out: impl io::Write) -> io::Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| visible_width(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i >= widths.len() {
                    widths.push(0);
                }
                widths[i] = widths[i].max(visible_width(cell));
            }
        }

        writeln!(&mut out, "{}", format_row(&self.headers, &widths))?;
        for row in &self.rows {
            writeln!(&mut out, "{}", format_row(row, &widths))?;
        }
        Ok(())
    }
}

/// Terminal columns taken by `s`; wide glyphs (emoji, CJK) count as two.
pub(crate) fn visible_width(s: &str) -> usize {
    s.width()
}

fn format_row(row: &[String], widths: &[usize]) -> String {
    let mut out = String::new();
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(cell);
        // No trailing padding on the last column.
        if i + 1 == row.len() {
            break;
        }
        let w = widths
            .get(i)
            .copied()
            .unwrap_or_else(|| visible_width(cell));
        let pad = w.saturating_sub(visible_width(cell));
        out.extend(std::iter::repeat_n(' ', pad));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(t: &Table) -> String {
        let mut buf = Vec::new();
        t.write_to(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn aligns_columns() {
        let mut t = Table::new(["ID", "TASK", "PRIORITY"]);
        t.row(["1", "Buy milk", "Medium"]);
        t.row(["12", "Pay rent", "High"]);
        assert_eq!(
            render(&t),
            "ID  TASK      PRIORITY\n1   Buy milk  Medium\n12  Pay rent  High\n"
        );
    }

    #[test]
    fn emoji_take_two_columns() {
        assert_eq!(visible_width("✅ 1"), 4);
        assert_eq!(visible_width("⏳"), 2);
        let mut t = Table::new(["ID", "X"]);
        t.row(["✅ 1", "a"]);
        assert_eq!(render(&t), "ID    X\n✅ 1  a\n");
    }

    #[test]
    fn wide_descriptions_stay_aligned() {
        assert_eq!(visible_width("牛乳"), 4);
        let mut t = Table::new(["ID", "TASK", "PRIORITY"]);
        t.row(["1", "買牛乳", "High"]);
        t.row(["2", "Buy milk", "Low"]);
        assert_eq!(
            render(&t),
            "ID  TASK      PRIORITY\n1   買牛乳    High\n2   Buy milk  Low\n"
        );
    }

    #[test]
    fn csv_quotes_fields() {
        let mut t = Table::new(["id", "task"]);
        t.row(["1", "milk, eggs"]);
        let mut buf = Vec::new();
        t.write_csv_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "id,task\n1,\"milk, eggs\"\n");
    }
}
