use std::str::FromStr;

use async_trait::async_trait;
use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::domain::{DataAccessError, Entity, Id};

/// 顧客リポジトリ
#[async_trait]
pub trait CustomerRepository {
    /// 顧客を全件取得する
    async fn find_all(&self) -> Result<Vec<Customer>, DataAccessError>;
    /// 顧客をIDで検索する
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, DataAccessError>;
    /// 顧客を登録し、採番された顧客を返す
    async fn create(&mut self, form: CustomerForm) -> Result<Customer, DataAccessError>;
    /// 顧客を上書きする
    async fn update(&mut self, id: CustomerId, form: CustomerForm)
        -> Result<bool, DataAccessError>;
    /// 顧客を削除する
    async fn delete(&mut self, id: CustomerId) -> Result<bool, DataAccessError>;
}

/// 顧客ID
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Deref,
    Default,
)]
pub struct CustomerId(u64);

impl Id for CustomerId {
    type Inner = u64;
}

impl FromStr for CustomerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(CustomerId)
    }
}

/// 顧客フォーム
///
/// `application/x-www-form-urlencoded` で送受信される入力値。
/// IDはURLに含めるためフォームには持たない。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
}

impl CustomerForm {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// CSVで表現できない文字が含まれていないか検証する
    pub fn validate(&self) -> Result<(), CustomerError> {
        let fields = [
            ("name", &self.name),
            ("surname", &self.surname),
            ("email", &self.email),
            ("phone", &self.phone),
        ];
        match fields
            .into_iter()
            .find(|(_, value)| value.contains([',', '\r', '\n']))
        {
            Some((field, _)) => Err(CustomerError::InvalidField { field }),
            None => Ok(()),
        }
    }
}

/// 顧客エンティティ
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    surname: String,
    email: String,
    phone: String,
}

impl Customer {
    pub fn create(id: CustomerId, form: CustomerForm) -> Result<Self, CustomerError> {
        form.validate()?;
        let CustomerForm {
            name,
            surname,
            email,
            phone,
        } = form;
        Ok(Self {
            id,
            name,
            surname,
            email,
            phone,
        })
    }

    /// IDを残して全項目を置き換える
    pub fn change(&mut self, form: CustomerForm) -> Result<(), CustomerError> {
        *self = Self::create(self.id, form)?;
        Ok(())
    }

    /// 編集フォームに表示する値を取り出す
    pub fn form(&self) -> CustomerForm {
        CustomerForm {
            name: self.name.clone(),
            surname: self.surname.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    const ENTITY_NAME: &'static str = "customer";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// 顧客エラー
#[derive(Error, Display, Debug, PartialEq, Eq)]
pub enum CustomerError {
    /// 区切り文字を含む項目
    #[display(fmt = "Field {} cannot contain commas or line breaks", field)]
    InvalidField { field: &'static str },
}
