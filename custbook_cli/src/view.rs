use std::fmt;

use custbook::domain::{customer::Customer, Entity};

const COLUMNS: [&str; 5] = ["ID", "Name", "Surname", "Email", "Phone"];

/// 操作結果の通知
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toast {
    Saved,
    Deleted,
    Error,
}

impl Toast {
    pub fn is_ok(self) -> bool {
        !matches!(self, Toast::Error)
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (class, message) = match self {
            Toast::Saved => ("ok", "Saved"),
            Toast::Deleted => ("ok", "Deleted"),
            Toast::Error => ("err", "Error"),
        };
        write!(f, "[{}] {}", class, message)
    }
}

fn cells(customer: &Customer) -> [String; 5] {
    [
        customer.id().to_string(),
        customer.name().to_owned(),
        customer.surname().to_owned(),
        customer.email().to_owned(),
        customer.phone().to_owned(),
    ]
}

/// 顧客一覧を列幅を揃えた表にする
pub fn render_table(customers: &[Customer]) -> String {
    let rows: Vec<[String; 5]> = customers.iter().map(cells).collect();
    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut table = line(COLUMNS.iter().copied(), &widths);
    for row in &rows {
        table.push_str(&line(row.iter().map(String::as_str), &widths));
    }
    if rows.is_empty() {
        table.push_str("(no customers)\n");
    }
    table
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize; 5]) -> String {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    format!("{}\n", line.trim_end())
}
