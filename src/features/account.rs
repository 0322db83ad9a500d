use super::store::{PersistenceError, Store};
use super::transaction::{Amount, TransactionType};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const MINIMUM_AGE: u32 = 18;

/// Symbols an account number may contain, exactly one per number
const SYMBOLS: [char; 8] = ['£', '$', '%', '^', '&', '*', '@', '!'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Account cannot be created (age {0} is below 18)")]
    Underage(u32),

    #[error("Account cannot be created (PIN {0} is not 4 digits)")]
    InvalidPin(u32),

    #[error("{kind} must be between 1 and 10000 (got {amount})")]
    AmountOutOfRange { kind: TransactionType, amount: i64 },
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A wrong PIN is reported the same way as a missing account
    #[error("Account not found")]
    NotFound,

    #[error("Insufficient balance: cannot withdraw {requested}, only {available} available")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("Balance {available} cannot take a deposit of {requested}")]
    BalanceOverflow { requested: u64, available: u64 },

    #[error("Unable to save accounts - {0}")]
    Persistence(#[from] PersistenceError),
}

pub(crate) type AccountResult<T> = Result<T, AccountError>;

/// Seven character code identifying an account. Never changes once generated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Three uppercase letters, three digits and one symbol in random order
    pub(crate) fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut code: Vec<char> = Vec::with_capacity(7);
        code.extend((0..3).map(|_| char::from(rng.gen_range(b'A'..=b'Z'))));
        code.extend((0..3).map(|_| char::from(rng.gen_range(b'0'..=b'9'))));
        code.extend(SYMBOLS.choose(rng));
        code.shuffle(rng);
        Self(code.into_iter().collect())
    }
}

impl From<String> for AccountNumber {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored as any integer so files holding PINs of other widths still load.
/// Only new PINs are held to four digits.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Pin(i64);

impl Pin {
    pub(crate) fn new(code: u32) -> Result<Self, ValidationError> {
        if (1000..=9999).contains(&code) {
            Ok(Self(i64::from(code)))
        } else {
            Err(ValidationError::InvalidPin(code))
        }
    }

    fn matches(self, code: u32) -> bool {
        self.0 == i64::from(code)
    }
}

/// Input for opening an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub age: u32,
    pub email: String,
    pub pin: u32,
}

/// Fields to overwrite on an existing account. `None`, an empty string or a
/// PIN of 0 keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub pin: Option<u32>,
}

/// Account record, stored as one object of the backing file's array
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    name: String,
    age: u32,
    email: String,

    /// Required alongside the account number for every operation after creation
    pin: Pin,

    #[serde(rename = "Account.No")]
    number: AccountNumber,

    #[serde(rename = "Balance")]
    balance: u64,
}

impl Account {
    pub(crate) fn create(details: NewAccount, store: &mut Store) -> AccountResult<Self> {
        if details.age < MINIMUM_AGE {
            return Err(ValidationError::Underage(details.age).into());
        }
        let pin = Pin::new(details.pin)?;

        let mut rng = rand::thread_rng();
        let number = loop {
            let candidate = AccountNumber::generate(&mut rng);
            if !store.contains(&candidate) {
                break candidate;
            }
            debug!("account number {candidate} already taken, generating another");
        };

        let account = Self {
            name: details.name,
            age: details.age,
            email: details.email,
            pin,
            number,
            balance: 0,
        };
        store.insert(account.clone())?;
        info!("created account {}", account.number);
        Ok(account)
    }

    pub(crate) fn find_by_credentials(
        number: &AccountNumber,
        pin: u32,
        store: &Store,
    ) -> AccountResult<Self> {
        store
            .accounts()
            .iter()
            .find(|account| &account.number == number && account.pin.matches(pin))
            .cloned()
            .ok_or(AccountError::NotFound)
    }

    /// Writes `self` over the stored record `current`
    fn update(self, current: &Self, store: &mut Store) -> AccountResult<Self> {
        store.replace(current, self.clone())?;
        Ok(self)
    }

    pub(crate) fn deposit(self, amount: Amount, store: &mut Store) -> AccountResult<Self> {
        let balance = self
            .balance
            .checked_add(amount.value())
            .ok_or(AccountError::BalanceOverflow {
                requested: amount.value(),
                available: self.balance,
            })?;

        Self {
            balance,
            ..self.clone()
        }
        .update(&self, store)
    }

    pub(crate) fn withdraw(self, amount: Amount, store: &mut Store) -> AccountResult<Self> {
        if self.balance < amount.value() {
            return Err(AccountError::InsufficientFunds {
                requested: amount.value(),
                available: self.balance,
            });
        }

        Self {
            balance: self.balance - amount.value(),
            ..self.clone()
        }
        .update(&self, store)
    }

    pub(crate) fn update_details(
        self,
        changes: AccountChanges,
        store: &mut Store,
    ) -> AccountResult<Self> {
        let pin = match changes.pin {
            Some(0) | None => self.pin,
            Some(code) => Pin::new(code)?,
        };
        let current = self.clone();

        let account = Self {
            name: changes
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or(self.name),
            email: changes
                .email
                .filter(|email| !email.is_empty())
                .unwrap_or(self.email),
            pin,
            ..self
        }
        .update(&current, store)?;
        info!("updated details of account {}", account.number);
        Ok(account)
    }

    pub(crate) fn delete(self, store: &mut Store) -> AccountResult<Self> {
        store.remove(&self)?;
        info!("deleted account {}", self.number);
        Ok(self)
    }

    pub fn number(&self) -> &AccountNumber {
        &self.number
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }
}
