//! Clone tests against a local repository created on the fly; they need the `git2` feature.
#![cfg(feature = "git2")]

use std::{
    cell::RefCell,
    fs,
    io::{self, Write},
    path::Path,
    rc::Rc,
};

use git2::{Repository, Signature};
use git_transfer_auth::{
    AuthError, CredentialNegotiator, ProgressReporter, TransferConfig,
    remote::{Git2Backend, clone, clone_with},
};
use tempfile::tempdir;

/// Write sink whose contents stay readable after the reporter is moved away.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn make_source(dir: &Path) -> Repository {
    let repo = Repository::init(dir).expect("init source repository");
    fs::write(dir.join("README.md"), "hello\n").unwrap();
    {
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial commit", &tree, &[])
            .unwrap();
    }
    repo
}

#[test]
fn clone_local_repository() {
    let src = tempdir().unwrap();
    make_source(src.path());
    let dst = tempdir().unwrap();
    let target = dst.path().join("clone");

    let repo = clone(src.path().to_str().unwrap(), &target, &TransferConfig::default()).unwrap();
    assert!(repo.head().is_ok());
    assert_eq!(fs::read_to_string(target.join("README.md")).unwrap(), "hello\n");
}

#[test]
fn clone_prints_banner_when_progress_enabled() {
    let src = tempdir().unwrap();
    make_source(src.path());
    let dst = tempdir().unwrap();
    let target = dst.path().join("clone");

    let config = TransferConfig {
        show_progress: true,
        ..TransferConfig::default()
    };
    let buf = SharedBuf::default();
    let negotiator = CredentialNegotiator::new(Git2Backend);
    clone_with(
        src.path().to_str().unwrap(),
        &target,
        &config,
        &negotiator,
        ProgressReporter::new(buf.clone()),
    )
    .unwrap();

    let out = String::from_utf8(buf.0.borrow().clone()).unwrap();
    let banner = format!("cloning into '{}'...\n", target.display());
    assert!(out.starts_with(&banner), "unexpected output: {out:?}");
    assert!(out.matches("done.\n").count() <= 1);
}

#[test]
fn clone_without_progress_is_silent() {
    let src = tempdir().unwrap();
    make_source(src.path());
    let dst = tempdir().unwrap();

    let buf = SharedBuf::default();
    let negotiator = CredentialNegotiator::new(Git2Backend);
    clone_with(
        src.path().to_str().unwrap(),
        &dst.path().join("clone"),
        &TransferConfig::default(),
        &negotiator,
        ProgressReporter::new(buf.clone()),
    )
    .unwrap();
    assert!(buf.0.borrow().is_empty());
}

#[test]
fn clone_missing_source_is_transport_error() {
    let dst = tempdir().unwrap();
    let missing = dst.path().join("does-not-exist");
    let err = clone(
        missing.to_str().unwrap(),
        &dst.path().join("clone"),
        &TransferConfig::default(),
    )
    .err().expect("clone of missing source should fail");
    assert!(matches!(err, AuthError::TransportError { .. }));
    assert!(err.to_string().starts_with("Error "));
}
