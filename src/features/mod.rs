mod account;
mod store;
mod transaction;

pub use self::{
    account::{Account, AccountChanges, AccountNumber, NewAccount},
    store::Store,
    transaction::{Transaction, TransactionType},
};
