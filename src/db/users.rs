//! User persistence: the account table plus its unique username/email indexes.
//!
//! Uniqueness checks run inside the same write transaction as the insert, so
//! redb's single writer settles concurrent registrations.

use redb::{Database, ReadableTable};

use crate::db::{decode, encode, next_id, tables};
use crate::error::{AppError, Result};
use crate::models::UserRow;

/// Insert a new user, rejecting duplicate usernames or emails
pub fn create_user(db: &Database, row: UserRow) -> Result<(u64, UserRow)> {
    let write_txn = db.begin_write()?;
    let id = {
        let mut usernames = write_txn.open_table(tables::USERNAMES)?;
        let mut emails = write_txn.open_table(tables::EMAILS)?;

        if usernames.get(row.username.as_str())?.is_some()
            || emails.get(row.email.as_str())?.is_some()
        {
            tracing::info!("Registration rejected: username or email already exists");
            return Err(AppError::UserAlreadyExists);
        }

        let id = next_id(&write_txn, tables::SEQ_USERS)?;

        let mut users = write_txn.open_table(tables::USERS)?;
        let bytes = encode(&row)?;
        users.insert(id, bytes.as_slice())?;
        usernames.insert(row.username.as_str(), id)?;
        emails.insert(row.email.as_str(), id)?;
        id
    };
    write_txn.commit()?;

    tracing::info!("New user registered: {}", id);
    Ok((id, row))
}

/// Look a user up by normalized email
pub fn find_by_email(db: &Database, email: &str) -> Result<Option<(u64, UserRow)>> {
    let read_txn = db.begin_read()?;
    let emails = read_txn.open_table(tables::EMAILS)?;
    let Some(id) = emails.get(email)?.map(|g| g.value()) else {
        return Ok(None);
    };

    let users = read_txn.open_table(tables::USERS)?;
    let row = users
        .get(id)?
        .map(|g| decode::<UserRow>(g.value()))
        .transpose()?;
    Ok(row.map(|r| (id, r)))
}

pub fn get_user(db: &Database, id: u64) -> Result<UserRow> {
    let read_txn = db.begin_read()?;
    let users = read_txn.open_table(tables::USERS)?;
    users
        .get(id)?
        .map(|g| decode(g.value()))
        .transpose()?
        .ok_or(AppError::UserNotFound)
}

/// Rename a user. The new name may not belong to anyone else; keeping one's own name is a no-op.
pub fn update_username(db: &Database, id: u64, username: &str) -> Result<UserRow> {
    let write_txn = db.begin_write()?;
    let row = {
        let mut users = write_txn.open_table(tables::USERS)?;
        let mut row: UserRow = users
            .get(id)?
            .map(|g| decode(g.value()))
            .transpose()?
            .ok_or(AppError::UserNotFound)?;

        let mut usernames = write_txn.open_table(tables::USERNAMES)?;
        match usernames.get(username)?.map(|g| g.value()) {
            Some(owner) if owner != id => {
                tracing::info!("Username change rejected for user {}: name taken", id);
                return Err(AppError::UsernameTaken);
            }
            Some(_) => return Ok(row),
            None => {}
        }

        usernames.remove(row.username.as_str())?;
        usernames.insert(username, id)?;

        row.username = username.to_string();
        let bytes = encode(&row)?;
        users.insert(id, bytes.as_slice())?;
        row
    };
    write_txn.commit()?;

    tracing::info!("User {} changed username", id);
    Ok(row)
}

pub fn update_password_hash(db: &Database, id: u64, password_hash: String) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut users = write_txn.open_table(tables::USERS)?;
        let mut row: UserRow = users
            .get(id)?
            .map(|g| decode(g.value()))
            .transpose()?
            .ok_or(AppError::UserNotFound)?;

        row.password_hash = password_hash;
        let bytes = encode(&row)?;
        users.insert(id, bytes.as_slice())?;
    }
    write_txn.commit()?;

    tracing::info!("User {} changed password", id);
    Ok(())
}
