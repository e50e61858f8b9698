//! User-approval workflow over the `users` collection.
//!
//! Users are ordinary records looked up by their `username` field. New
//! accounts start unapproved and become usable only after an approver flips
//! the flag.

use crate::{
    document::{CollectionKind, Document},
    error::Result,
    identity::{generate_id, Stamper},
    record::Record,
    Error,
};
use serde_json::{Map, Value};

/// Find a user by username.
pub fn find_user<'a>(doc: &'a Document, username: &str) -> Option<&'a Record> {
    doc.users.iter().find(|u| u.field_str("username") == username)
}

/// Register a pending account request.
///
/// The record is stamped as a fresh write and given a `USR-` id if the
/// payload carried none. `approved` defaults to `false` when absent so a
/// request can never grant itself access.
pub fn request_access(doc: &mut Document, user: Map<String, Value>, stamper: &Stamper) -> String {
    let mut record = Record::from_payload(user);
    if record.id.is_empty() {
        record.id = generate_id(CollectionKind::Users.id_prefix());
    }
    if record.field("approved").is_none() {
        record.set_field("approved", Value::Bool(false));
    }
    let record = stamper.stamp(record, false);
    let id = record.id.clone();
    doc.users.push(record);
    id
}

/// Approve a pending user, recording who approved them.
pub fn approve_user(doc: &mut Document, username: &str, stamper: &Stamper) -> Result<()> {
    let idx = doc
        .users
        .iter()
        .position(|u| u.field_str("username") == username)
        .ok_or_else(|| Error::UnknownUser(username.to_string()))?;

    let mut user = doc.users[idx].clone();
    user.set_field("approved", Value::Bool(true));
    user.set_field("approved_by", Value::String(stamper.actor().to_string()));
    doc.users[idx] = stamper.stamp(user, true);
    Ok(())
}

/// Check a login attempt against the users collection.
///
/// Distinguishes an unknown username, a wrong password, and an account
/// still waiting for approval.
pub fn verify_login<'a>(doc: &'a Document, username: &str, password: &str) -> Result<&'a Record> {
    let user = find_user(doc, username).ok_or_else(|| Error::UnknownUser(username.to_string()))?;
    if user.field_str("password") != password {
        return Err(Error::InvalidCredentials);
    }
    if !user.field_bool("approved") {
        return Err(Error::AccountPending);
    }
    Ok(user)
}
