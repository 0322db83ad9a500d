use std::{path::PathBuf, process};
#[macro_use]
extern crate log;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

mod features;
use features::{
    Account, AccountChanges, AccountNumber, NewAccount, Store, Transaction, TransactionType,
};

/// Keeps bank account records in a JSON file
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Cli {
    /// File holding every account record
    #[clap(short, long, default_value = "data.json")]
    database: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open an account with a zero balance
    Create {
        #[clap(long)]
        name: String,
        #[clap(long)]
        age: u32,
        #[clap(long)]
        email: String,
        /// Four digit PIN
        #[clap(long)]
        pin: u32,
    },
    /// Add money to an account
    Deposit(TransactionArgs),
    /// Take money out of an account
    Withdraw(TransactionArgs),
    /// Show an account
    Details(Credentials),
    /// Change the name, email or PIN of an account
    Update {
        #[clap(flatten)]
        credentials: Credentials,
        /// Left unchanged when empty
        #[clap(long)]
        name: Option<String>,
        /// Left unchanged when empty
        #[clap(long)]
        email: Option<String>,
        #[clap(long)]
        new_pin: Option<u32>,
    },
    /// Remove an account
    Delete(Credentials),
}

#[derive(Args, Debug)]
struct Credentials {
    #[clap(long = "account")]
    account_number: String,
    #[clap(long)]
    pin: u32,
}

impl Credentials {
    fn find(self, store: &Store) -> anyhow::Result<Account> {
        let number = AccountNumber::from(self.account_number);
        Ok(Account::find_by_credentials(&number, self.pin, store)?)
    }
}

#[derive(Args, Debug)]
struct TransactionArgs {
    #[clap(flatten)]
    credentials: Credentials,
    #[clap(long, allow_hyphen_values = true)]
    amount: i64,
}

impl TransactionArgs {
    fn into_transaction(self, transaction_type: TransactionType) -> Transaction {
        Transaction::new(
            transaction_type,
            AccountNumber::from(self.credentials.account_number),
            self.credentials.pin,
            self.amount,
        )
    }
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("❌ {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut store = Store::open(&cli.database);
    if let Some(e) = store.load_error() {
        eprintln!("❌ Error: {e}");
    }

    let (message, account) = match cli.command {
        Command::Create {
            name,
            age,
            email,
            pin,
        } => {
            let details = NewAccount {
                name,
                age,
                email,
                pin,
            };
            (
                "Account Created Successfully!",
                Account::create(details, &mut store)?,
            )
        }
        Command::Deposit(args) => (
            "Deposit Successful",
            args.into_transaction(TransactionType::Deposit)
                .record(&mut store)?,
        ),
        Command::Withdraw(args) => (
            "Withdrawal Successful",
            args.into_transaction(TransactionType::Withdrawal)
                .record(&mut store)?,
        ),
        Command::Details(credentials) => ("Account Details", credentials.find(&store)?),
        Command::Update {
            credentials,
            name,
            email,
            new_pin,
        } => {
            let changes = AccountChanges {
                name,
                email,
                pin: new_pin,
            };
            (
                "Account Updated",
                credentials
                    .find(&store)?
                    .update_details(changes, &mut store)?,
            )
        }
        Command::Delete(credentials) => {
            credentials.find(&store)?.delete(&mut store)?;
            eprintln!("✅ Account deleted successfully");
            return Ok(());
        }
    };

    eprintln!("✅ {message}");
    let rendered = serde_json::to_string_pretty(&account).context("Unable to render account")?;
    println!("{rendered}");
    Ok(())
}
