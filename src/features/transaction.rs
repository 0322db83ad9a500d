use super::account::{Account, AccountNumber, AccountResult, ValidationError};
use super::store::Store;
use std::fmt;

/// Upper bound for a single deposit or withdrawal
const MAX_AMOUNT: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    /// Increases the balance by the amount
    Deposit,

    /// Decreases the balance by the amount.
    /// Fails without touching the balance when the balance is smaller than the amount
    Withdrawal,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Deposit => f.write_str("Deposit"),
            TransactionType::Withdrawal => f.write_str("Withdraw"),
        }
    }
}

/// Amount of a single transaction, always within 1..=10000
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Amount(u64);

impl Amount {
    pub(crate) fn new(kind: TransactionType, amount: i64) -> Result<Self, ValidationError> {
        u64::try_from(amount)
            .ok()
            .filter(|amount| (1..=MAX_AMOUNT).contains(amount))
            .map(Self)
            .ok_or(ValidationError::AmountOutOfRange { kind, amount })
    }

    pub(crate) fn value(self) -> u64 {
        self.0
    }
}

/// A deposit or withdrawal against the account identified by its credentials
#[derive(Debug, Clone)]
pub struct Transaction {
    transaction_type: TransactionType,
    account_number: AccountNumber,
    pin: u32,
    amount: i64,
}

impl Transaction {
    pub fn new(
        transaction_type: TransactionType,
        account_number: AccountNumber,
        pin: u32,
        amount: i64,
    ) -> Self {
        Self {
            transaction_type,
            account_number,
            pin,
            amount,
        }
    }

    /// Applies the transaction and returns the account with its new balance.
    /// The account lookup happens before the amount is validated.
    pub(crate) fn record(self, store: &mut Store) -> AccountResult<Account> {
        use TransactionType::*;

        let account = Account::find_by_credentials(&self.account_number, self.pin, store)?;
        let amount = Amount::new(self.transaction_type, self.amount)?;

        let account = match self.transaction_type {
            Deposit => account.deposit(amount, store)?,
            Withdrawal => account.withdraw(amount, store)?,
        };
        info!(
            "{} of {} on account {}, balance now {}",
            self.transaction_type,
            amount.value(),
            account.number(),
            account.balance()
        );
        Ok(account)
    }
}
