pub mod customer;

use std::{
    error::Error,
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub trait Id:
    Copy
    + Eq
    + Deref<Target = Self::Inner>
    + From<Self::Inner>
    + Display
    + Debug
    + Serialize
    + for<'de> Deserialize<'de>
{
    type Inner: FromStr;
}

pub trait Entity: Debug + Clone {
    type Id: Id;

    const ENTITY_NAME: &'static str;

    fn id(&self) -> Self::Id;
}

pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("Connection error: {0}")]
    ConnectionError(BoxError),
    #[error("Query error: {0}")]
    QueryError(BoxError),
    #[error("Data read error: {0}")]
    ReadError(BoxError),
    #[error("Data write error: {0}")]
    WriteError(BoxError),
    #[error("Client side error: {0}")]
    ClientSideError(BoxError),
}
