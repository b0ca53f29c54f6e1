//! Integration tests for the KeySeal vault module, on SQLite.

use keyseal::config::Settings;
use keyseal::crypto::kdf::MIN_PBKDF2_ITERATIONS;
use keyseal::crypto::{CipherMode, Envelope, KdfAlgorithm, KeyDerivationService, SymmetricEnvelope};
use keyseal::errors::KeySealError;
use keyseal::vault::{
    register_user, EntryUpdate, IdentityStorage, NewEntry, SqliteStorage, VaultCryptoService,
    VaultSession, VaultStorage,
};
use tempfile::TempDir;
use zeroize::Zeroizing;

/// Helper: a database path inside a fresh temp dir.
fn db_path() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("data").join("vault.db");
    (dir, path)
}

fn service() -> VaultCryptoService {
    let kdf = KeyDerivationService::new(KdfAlgorithm::Pbkdf2Sha256 {
        iterations: MIN_PBKDF2_ITERATIONS,
    })
    .unwrap();
    VaultCryptoService::new(kdf, SymmetricEnvelope::authenticated(), 32).unwrap()
}

fn entry(site: &str, secret: &str) -> NewEntry {
    NewEntry {
        site: site.into(),
        account: "me@example.com".into(),
        secret: Zeroizing::new(secret.into()),
        category: Some("Work".into()),
        ..NewEntry::default()
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[test]
fn register_then_authenticate_against_stored_hash() {
    let (_dir, path) = db_path();
    let svc = service();
    let mut store = SqliteStorage::open(&path).unwrap();
    register_user(&mut store, &svc, "alice", "correct-horse").unwrap();

    let creds = store.fetch_credentials("alice").unwrap();
    assert!(svc
        .authenticate("correct-horse", &creds.salt, &creds.auth_hash)
        .unwrap());
    assert!(!svc
        .authenticate("wrong-pw", &creds.salt, &creds.auth_hash)
        .unwrap());
}

#[test]
fn stored_hash_is_not_the_encryption_key() {
    let (_dir, path) = db_path();
    let svc = service();
    let mut store = SqliteStorage::open(&path).unwrap();
    register_user(&mut store, &svc, "alice", "correct-horse").unwrap();

    let creds = store.fetch_credentials("alice").unwrap();
    let key = svc.encryption_key("correct-horse", &creds.salt).unwrap();
    assert_ne!(key.as_bytes(), creds.auth_hash.as_slice());
}

#[test]
fn users_are_isolated() {
    let (_dir, path) = db_path();
    let svc = service();
    let mut store = SqliteStorage::open(&path).unwrap();
    register_user(&mut store, &svc, "alice", "alice-pw").unwrap();
    register_user(&mut store, &svc, "bob", "bob-pw-123").unwrap();

    let mut alice = VaultSession::login(store, "alice", "alice-pw").unwrap();
    let id = alice.add_entry(entry("a.example", "alice-secret")).unwrap();

    let bob = VaultSession::login(alice.into_storage(), "bob", "bob-pw-123").unwrap();
    assert!(bob.list_metadata().unwrap().is_empty());
    assert!(matches!(
        bob.get_secret(id),
        Err(KeySealError::EntryNotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// Entries across reopen
// ---------------------------------------------------------------------------

#[test]
fn entries_survive_reopen() {
    let (_dir, path) = db_path();
    let svc = service();
    let id = {
        let mut store = SqliteStorage::open(&path).unwrap();
        register_user(&mut store, &svc, "alice", "master-pw").unwrap();
        let mut s = VaultSession::login(store, "alice", "master-pw").unwrap();
        s.add_entry(entry("example.org", "hunter2")).unwrap()
    };

    let store = SqliteStorage::open(&path).unwrap();
    let s = VaultSession::login(store, "alice", "master-pw").unwrap();
    assert_eq!(s.get_secret(id).unwrap().as_str(), "hunter2");
    assert_eq!(s.list_metadata().unwrap()[0].category, "Work");
}

#[test]
fn corrupt_entry_is_reported_alone() {
    let (_dir, path) = db_path();
    let svc = service();
    let mut store = SqliteStorage::open(&path).unwrap();
    register_user(&mut store, &svc, "alice", "master-pw").unwrap();

    let mut s = VaultSession::login(store, "alice", "master-pw").unwrap();
    let good = s.add_entry(entry("good.example", "fine")).unwrap();
    let bad = s.add_entry(entry("bad.example", "doomed")).unwrap();

    let mut store = s.into_storage();
    let mut row = store.fetch("alice", bad).unwrap();
    row.envelope = Envelope::from_bytes(vec![0u8; 5]);
    store.update("alice", &row).unwrap();

    let s = VaultSession::login(store, "alice", "master-pw").unwrap();
    let listed = s.list_entries().unwrap();
    assert_eq!(listed.len(), 2);
    for e in &listed {
        if e.metadata.id == good {
            assert_eq!(e.secret.as_ref().unwrap().as_str(), "fine");
        } else {
            let err = e.secret.as_ref().err().unwrap();
            assert!(matches!(err, KeySealError::MalformedEnvelope(_)));
            assert_eq!(err.user_message(), "could not decrypt");
        }
    }
}

#[test]
fn update_reseals_with_fresh_nonce() {
    let (_dir, path) = db_path();
    let svc = service();
    let mut store = SqliteStorage::open(&path).unwrap();
    register_user(&mut store, &svc, "alice", "master-pw").unwrap();

    let mut s = VaultSession::login(store, "alice", "master-pw").unwrap();
    let id = s.add_entry(entry("x.example", "same")).unwrap();
    let before = s.storage().fetch("alice", id).unwrap().envelope;

    s.update_entry(
        id,
        EntryUpdate {
            secret: Some(Zeroizing::new("same".into())),
            ..EntryUpdate::default()
        },
    )
    .unwrap();
    let after = s.storage().fetch("alice", id).unwrap().envelope;
    assert_ne!(before, after);
    assert_eq!(s.get_secret(id).unwrap().as_str(), "same");
}

// ---------------------------------------------------------------------------
// Password change
// ---------------------------------------------------------------------------

#[test]
fn change_password_persists() {
    let (_dir, path) = db_path();
    let svc = service();
    let mut store = SqliteStorage::open(&path).unwrap();
    register_user(&mut store, &svc, "alice", "old-master").unwrap();

    let mut s = VaultSession::login(store, "alice", "old-master").unwrap();
    let a = s.add_entry(entry("a.example", "alpha")).unwrap();
    let b = s.add_entry(entry("b.example", "bravo")).unwrap();
    s.change_password("old-master", "new-master").unwrap();
    drop(s);

    let store = SqliteStorage::open(&path).unwrap();
    assert!(matches!(
        VaultSession::login(store, "alice", "old-master"),
        Err(KeySealError::InvalidCredentials)
    ));

    let store = SqliteStorage::open(&path).unwrap();
    let s = VaultSession::login(store, "alice", "new-master").unwrap();
    assert_eq!(s.get_secret(a).unwrap().as_str(), "alpha");
    assert_eq!(s.get_secret(b).unwrap().as_str(), "bravo");
}

#[test]
fn change_password_aborts_on_unreadable_entry() {
    let (_dir, path) = db_path();
    let svc = service();
    let mut store = SqliteStorage::open(&path).unwrap();
    register_user(&mut store, &svc, "alice", "old-master").unwrap();

    let mut s = VaultSession::login(store, "alice", "old-master").unwrap();
    let ok = s.add_entry(entry("a.example", "alpha")).unwrap();
    let broken = s.add_entry(entry("b.example", "bravo")).unwrap();

    let mut store = s.into_storage();
    let mut row = store.fetch("alice", broken).unwrap();
    let mut bytes = row.envelope.into_bytes();
    bytes[0] ^= 0xFF;
    row.envelope = Envelope::from_bytes(bytes);
    store.update("alice", &row).unwrap();

    let mut s = VaultSession::login(store, "alice", "old-master").unwrap();
    assert!(s.change_password("old-master", "new-master").is_err());

    // Old password and old entries still work.
    let s = VaultSession::login(s.into_storage(), "alice", "old-master").unwrap();
    assert_eq!(s.get_secret(ok).unwrap().as_str(), "alpha");
}

// ---------------------------------------------------------------------------
// Settings changes after registration
// ---------------------------------------------------------------------------

#[test]
fn retuned_settings_do_not_lock_out_existing_users() {
    let (_dir, path) = db_path();
    let original = Settings {
        kdf_iterations: MIN_PBKDF2_ITERATIONS,
        ..Settings::default()
    };
    let id = {
        let mut store = SqliteStorage::open(&path).unwrap();
        register_user(&mut store, &original.vault_service().unwrap(), "alice", "master-pw")
            .unwrap();
        let mut s = VaultSession::login(store, "alice", "master-pw").unwrap();
        s.add_entry(entry("example.org", "hunter2")).unwrap()
    };

    let retuned = Settings {
        kdf_iterations: MIN_PBKDF2_ITERATIONS * 2,
        key_length: 16,
        cipher_mode: CipherMode::UnauthenticatedAesCbc,
        ..Settings::default()
    };
    let mut store = SqliteStorage::open(&path).unwrap();
    register_user(&mut store, &retuned.vault_service().unwrap(), "bob", "bob-master")
        .unwrap();

    let mut s = VaultSession::login(store, "alice", "master-pw").unwrap();
    assert_eq!(s.get_secret(id).unwrap().as_str(), "hunter2");
    let added = s.add_entry(entry("new.example", "fresh")).unwrap();
    assert_eq!(s.get_secret(added).unwrap().as_str(), "fresh");
    assert_eq!(
        s.storage().fetch_credentials("alice").unwrap().params,
        original.vault_service().unwrap().params()
    );

    let bob = VaultSession::login(s.into_storage(), "bob", "bob-master").unwrap();
    assert_eq!(
        bob.storage().fetch_credentials("bob").unwrap().params.cipher_mode,
        CipherMode::UnauthenticatedAesCbc
    );
}
