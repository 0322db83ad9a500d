use super::account::{Account, AccountNumber};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("unable to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("malformed accounts in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unable to serialize accounts for {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unable to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Every account record, mirrored to a single JSON file after each change.
///
/// The file is rewritten as a whole. It is written before the in-memory
/// collection is replaced, so a failed write leaves both sides as they were.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    accounts: Vec<Account>,
    load_error: Option<PersistenceError>,
}

impl Store {
    /// Loads the backing file. A missing file gives an empty store; an
    /// unreadable one also does, and the failure is kept in [`Store::load_error`].
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (accounts, load_error) = match read_accounts(&path) {
            Ok(accounts) => {
                debug!("loaded {} accounts from {}", accounts.len(), path.display());
                (accounts, None)
            }
            Err(e) => {
                warn!("{e}; starting without accounts");
                (Vec::new(), Some(e))
            }
        };

        Self {
            path,
            accounts,
            load_error,
        }
    }

    pub fn load_error(&self) -> Option<&PersistenceError> {
        self.load_error.as_ref()
    }

    pub(crate) fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub(crate) fn contains(&self, number: &AccountNumber) -> bool {
        self.accounts.iter().any(|account| account.number() == number)
    }

    pub(crate) fn insert(&mut self, account: Account) -> Result<(), PersistenceError> {
        let mut accounts = self.accounts.clone();
        accounts.push(account);
        self.commit(accounts)
    }

    /// Swaps the first stored record equal to `current` for `account`.
    /// Account numbers are not unique in files written by older versions,
    /// so records sharing a number with `current` are left alone.
    pub(crate) fn replace(
        &mut self,
        current: &Account,
        account: Account,
    ) -> Result<(), PersistenceError> {
        let mut accounts = self.accounts.clone();
        match accounts.iter_mut().find(|existing| **existing == *current) {
            Some(existing) => *existing = account,
            None => {
                debug!("account {} is no longer stored", current.number());
                return Ok(());
            }
        }
        self.commit(accounts)
    }

    /// Drops the first stored record equal to `account`
    pub(crate) fn remove(&mut self, account: &Account) -> Result<(), PersistenceError> {
        let mut accounts = self.accounts.clone();
        match accounts.iter().position(|existing| existing == account) {
            Some(index) => {
                accounts.remove(index);
            }
            None => {
                debug!("account {} is no longer stored", account.number());
                return Ok(());
            }
        }
        self.commit(accounts)
    }

    fn commit(&mut self, accounts: Vec<Account>) -> Result<(), PersistenceError> {
        write_accounts(&self.path, &accounts)?;
        debug!("saved {} accounts to {}", accounts.len(), self.path.display());
        self.accounts = accounts;
        Ok(())
    }
}

fn read_accounts(path: &Path) -> Result<Vec<Account>, PersistenceError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&contents).map_err(|source| PersistenceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_accounts(path: &Path, accounts: &[Account]) -> Result<(), PersistenceError> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    accounts
        .serialize(&mut serializer)
        .map_err(|source| PersistenceError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

    fs::write(path, buf).map_err(|source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::account::NewAccount;
    use crate::features::testing::ScratchFile;
    use crate::features::{Transaction, TransactionType};

    fn create(store: &mut Store, name: &str, pin: u32) -> Account {
        Account::create(
            NewAccount {
                name: name.into(),
                age: 25,
                email: format!("{name}@x.com"),
                pin,
            },
            store,
        )
        .unwrap()
    }

    #[test]
    fn missing_file_opens_empty_without_error() {
        let file = ScratchFile::new();

        let store = Store::open(file.path());

        assert!(store.accounts().is_empty());
        assert!(store.load_error().is_none());
    }

    #[test]
    fn malformed_file_opens_empty_and_reports_parse_error() {
        let file = ScratchFile::new();
        fs::write(file.path(), "{ not json").unwrap();

        let store = Store::open(file.path());

        assert!(store.accounts().is_empty());
        assert!(matches!(
            store.load_error(),
            Some(PersistenceError::Parse { .. })
        ));
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "{ not json");
    }

    #[test]
    fn reopening_reproduces_the_same_records() {
        let file = ScratchFile::new();
        let mut store = Store::open(file.path());
        let alice = create(&mut store, "alice", 1234);
        create(&mut store, "bob", 5678);
        Transaction::new(TransactionType::Deposit, alice.number().clone(), 1234, 250)
            .record(&mut store)
            .unwrap();

        let reopened = Store::open(file.path());

        assert!(reopened.load_error().is_none());
        assert_eq!(reopened.accounts(), store.accounts());
        assert_eq!(reopened.accounts()[0].balance(), 250);
    }

    #[test]
    fn file_is_a_four_space_indented_array() {
        let file = ScratchFile::new();
        let mut store = Store::open(file.path());
        create(&mut store, "alice", 1234);

        let contents = fs::read_to_string(file.path()).unwrap();

        assert!(contents.starts_with("[\n    {\n        \"name\": \"alice\","));
        assert!(contents.contains("\n        \"Account.No\": "));
        assert!(contents.contains("\n        \"Balance\": 0\n"));
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let dir = ScratchFile::new();
        let mut store = Store::open(dir.path().join("missing-dir").join("data.json"));

        let result = Account::create(
            NewAccount {
                name: "alice".into(),
                age: 25,
                email: "alice@x.com".into(),
                pin: 1234,
            },
            &mut store,
        );

        assert!(result.is_err());
        assert!(store.accounts().is_empty());
    }

    #[test]
    fn remove_only_drops_the_matching_record() {
        let file = ScratchFile::new();
        let mut store = Store::open(file.path());
        let alice = create(&mut store, "alice", 1234);
        let bob = create(&mut store, "bob", 5678);

        store.remove(&alice).unwrap();

        assert_eq!(store.accounts(), &[bob]);
        assert_eq!(Store::open(file.path()).accounts(), store.accounts());
    }

    #[test]
    fn directory_as_database_opens_empty_and_reports_read_error() {
        let dir = ScratchFile::new();
        fs::create_dir(dir.path()).unwrap();

        let store = Store::open(dir.path());

        assert!(store.accounts().is_empty());
        assert!(matches!(
            store.load_error(),
            Some(PersistenceError::Read { .. })
        ));
    }

    const SHARED_NUMBER: &str = r#"[
    {"name": "A", "age": 30, "email": "a@x.com", "pin": 1111, "Account.No": "ABC123!", "Balance": 10},
    {"name": "B", "age": 40, "email": "b@x.com", "pin": 2222, "Account.No": "ABC123!", "Balance": 999}
]"#;

    fn find(store: &Store, pin: u32) -> Account {
        Account::find_by_credentials(&"ABC123!".to_string().into(), pin, store).unwrap()
    }

    #[test]
    fn deposit_touches_only_the_holder_of_the_given_pin() {
        let file = ScratchFile::new();
        fs::write(file.path(), SHARED_NUMBER).unwrap();
        let mut store = Store::open(file.path());
        assert_eq!(store.accounts().len(), 2);

        Transaction::new(TransactionType::Deposit, "ABC123!".to_string().into(), 1111, 5)
            .record(&mut store)
            .unwrap();

        let reopened = Store::open(file.path());
        assert_eq!(reopened.accounts().len(), 2);
        assert_eq!(find(&reopened, 1111).balance(), 15);
        assert_eq!(find(&reopened, 2222).balance(), 999);
    }

    #[test]
    fn delete_keeps_other_records_sharing_the_number() {
        let file = ScratchFile::new();
        fs::write(file.path(), SHARED_NUMBER).unwrap();
        let mut store = Store::open(file.path());

        find(&store, 1111).delete(&mut store).unwrap();

        let reopened = Store::open(file.path());
        assert_eq!(reopened.accounts().len(), 1);
        assert_eq!(find(&reopened, 2222).balance(), 999);
    }

    #[test]
    fn wide_pins_from_older_files_still_load() {
        let file = ScratchFile::new();
        fs::write(
            file.path(),
            r#"[{"name": "A", "age": 30, "email": "a@x.com", "pin": 123456, "Account.No": "ABC123!", "Balance": 7}]"#,
        )
        .unwrap();

        let store = Store::open(file.path());

        assert!(store.load_error().is_none());
        assert_eq!(find(&store, 123456).balance(), 7);
    }
}
