//! コマンド定義と各操作の実行

use std::io::{self, BufRead, Write};

use clap::{Args, Parser, Subcommand};
use custbook::domain::customer::{CustomerForm, CustomerId, CustomerRepository};
use custbook::domain::Entity;
use tracing::{error, info};

use crate::view::{render_table, Toast};

/// Manage the customer list served at /api/customers.
#[derive(Parser, Debug)]
#[command(name = "custbook", version, long_about = None)]
pub(crate) struct Cli {
    /// Base URL of the backend (defaults to client.url in custbook.toml).
    #[arg(long, env = "CUSTBOOK_URL", global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Show every customer.
    List,
    /// Show a single customer.
    Show { id: CustomerId },
    /// Create a customer.
    Add(FormArgs),
    /// Edit a customer; fields not given keep the values shown in the list.
    Edit {
        id: CustomerId,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Delete a customer.
    Delete {
        id: CustomerId,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct FormArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub surname: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
}

impl FormArgs {
    /// 指定された項目だけを上書きする
    pub fn apply(self, form: &mut CustomerForm) {
        let fields = [
            (self.name, &mut form.name),
            (self.surname, &mut form.surname),
            (self.email, &mut form.email),
            (self.phone, &mut form.phone),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }

    pub fn into_form(self) -> CustomerForm {
        let mut form = CustomerForm::default();
        self.apply(&mut form);
        form
    }
}

/// 端末上の利用者1人分の操作
///
/// 各操作は結果を通知し、一覧を取得し直して表示する。
pub(crate) struct Session<R, W> {
    repository: R,
    out: W,
}

impl<R, W> Session<R, W>
where
    R: CustomerRepository,
    W: Write,
{
    pub fn new(repository: R, out: W) -> Self {
        Self { repository, out }
    }

    pub async fn run(
        &mut self,
        command: Command,
        confirm: impl FnOnce() -> bool,
    ) -> io::Result<bool> {
        match command {
            Command::List => self.list().await,
            Command::Show { id } => self.show(id).await,
            Command::Add(form) => self.add(form.into_form()).await,
            Command::Edit { id, form } => self.edit(id, form).await,
            Command::Delete { id, yes } => {
                if yes || confirm() {
                    self.delete(id).await
                } else {
                    Ok(true)
                }
            }
        }
    }

    /// 一覧を取得して表示する。取得できなければ `false`
    pub async fn list(&mut self) -> io::Result<bool> {
        match self.repository.find_all().await {
            Ok(customers) => {
                write!(self.out, "{}", render_table(&customers))?;
                Ok(true)
            }
            Err(e) => {
                error!("一覧取得エラー: {}", e);
                writeln!(self.out, "{}", Toast::Error)?;
                Ok(false)
            }
        }
    }

    pub async fn show(&mut self, id: CustomerId) -> io::Result<bool> {
        match self.repository.find_by_id(id).await {
            Ok(Some(customer)) => {
                write!(self.out, "{}", render_table(&[customer]))?;
                Ok(true)
            }
            Ok(None) => {
                writeln!(self.out, "{}: no such customer", Toast::Error)?;
                Ok(false)
            }
            Err(e) => {
                error!("顧客取得エラー: {}", e);
                writeln!(self.out, "{}", Toast::Error)?;
                Ok(false)
            }
        }
    }

    pub async fn add(&mut self, form: CustomerForm) -> io::Result<bool> {
        let toast = match self.repository.create(form).await {
            Ok(customer) => {
                info!("顧客を登録: {}", customer.id());
                Toast::Saved
            }
            Err(e) => {
                error!("登録エラー: {}", e);
                Toast::Error
            }
        };
        self.refresh(toast).await
    }

    /// 一覧に表示されている行からフォームを埋めて送信する
    pub async fn edit(&mut self, id: CustomerId, overrides: FormArgs) -> io::Result<bool> {
        let row = match self.repository.find_all().await {
            Ok(customers) => customers.into_iter().find(|c| c.id() == id),
            Err(e) => {
                error!("一覧取得エラー: {}", e);
                return self.refresh(Toast::Error).await;
            }
        };
        let Some(row) = row else {
            writeln!(self.out, "no such customer: {}", id)?;
            return self.refresh(Toast::Error).await;
        };
        let mut form = row.form();
        overrides.apply(&mut form);
        let toast = match self.repository.update(id, form).await {
            Ok(true) => Toast::Saved,
            Ok(false) => Toast::Error,
            Err(e) => {
                error!("更新エラー: {}", e);
                Toast::Error
            }
        };
        self.refresh(toast).await
    }

    pub async fn delete(&mut self, id: CustomerId) -> io::Result<bool> {
        let toast = match self.repository.delete(id).await {
            Ok(true) => Toast::Deleted,
            Ok(false) => Toast::Error,
            Err(e) => {
                error!("削除エラー: {}", e);
                Toast::Error
            }
        };
        self.refresh(toast).await
    }

    async fn refresh(&mut self, toast: Toast) -> io::Result<bool> {
        writeln!(self.out, "{}", toast)?;
        Ok(self.list().await? && toast.is_ok())
    }
}

/// 削除前に端末で確認する
pub(crate) fn confirm_delete(mut input: impl BufRead, mut out: impl Write) -> bool {
    if write!(out, "Delete this customer? [y/N] ")
        .and_then(|_| out.flush())
        .is_err()
    {
        return false;
    }
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"),
        Err(_) => false,
    }
}
