//! 顧客一覧のCSV表現
//!
//! 引用符やエスケープには対応しない。値はカンマと改行で単純に分割する。

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::customer::{Customer, CustomerError, CustomerForm, CustomerId};
use crate::domain::Entity;

pub const HEADER: &str = "id,name,surname,email,phone";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CsvError {
    #[error("Invalid customer id {0:?}")]
    InvalidId(String),
    #[error(transparent)]
    InvalidCustomer(#[from] CustomerError),
}

/// ヘッダ名をキーとした1行分の値
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record(HashMap<String, String>);

impl Record {
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or_default()
    }
}

/// 先頭行をヘッダとして残りの行をレコードに変換する
pub fn parse(text: &str) -> Vec<Record> {
    // 値の前後の空白は保持し、空白だけの行のみ読み飛ばす
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header: Vec<&str> = match lines.next() {
        Some(line) => line.split(',').collect(),
        None => return Vec::new(),
    };
    lines
        .map(|line| {
            let cells: Vec<&str> = line.split(',').collect();
            Record(
                header
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let value = cells.get(i).copied().unwrap_or_default();
                        ((*name).to_owned(), value.to_owned())
                    })
                    .collect(),
            )
        })
        .collect()
}

pub fn parse_customers(text: &str) -> Result<Vec<Customer>, CsvError> {
    parse(text).iter().map(Customer::try_from).collect()
}

/// ヘッダ行に続けて1顧客1行で書き出す
pub fn write<'a>(customers: impl IntoIterator<Item = &'a Customer>) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for customer in customers {
        csv.push_str(&line(customer));
        csv.push('\n');
    }
    csv
}

fn line(customer: &Customer) -> String {
    [
        customer.id().to_string().as_str(),
        customer.name(),
        customer.surname(),
        customer.email(),
        customer.phone(),
    ]
    .join(",")
}

impl TryFrom<&Record> for Customer {
    type Error = CsvError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let id = record.get("id");
        let id = id
            .parse::<CustomerId>()
            .map_err(|_| CsvError::InvalidId(id.to_owned()))?;
        let form = CustomerForm::new(
            record.get("name"),
            record.get("surname"),
            record.get("email"),
            record.get("phone"),
        );
        Ok(Customer::create(id, form)?)
    }
}
