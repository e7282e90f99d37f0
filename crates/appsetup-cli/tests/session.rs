//! Integration tests for the menu session.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use appsetup_cli::menu::{Mode, SessionOptions, run_session};
use appsetup_core::error::{Result, SetupError};
use appsetup_core::host::{
    CommandOutput, CommandRunner, CommandSpec, DownloadProgress, Host, HttpSource, Prompter,
};
use appsetup_core::{Config, Operation, Outcome};
use serde_json::Value;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingRunner {
    calls: RefCell<Vec<String>>,
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.display());
        Ok(CommandOutput::default())
    }

    fn is_available(&self, _program: &str) -> bool {
        true
    }
}

struct OfflineHttp;

impl HttpSource for OfflineHttp {
    fn get_json(&self, _url: &str) -> Result<Value> {
        Err(SetupError::Network("offline".to_string()))
    }

    fn download(
        &self,
        url: &str,
        _dest: &Path,
        _on_progress: &dyn Fn(DownloadProgress),
    ) -> Result<u64> {
        Err(SetupError::Network(format!("offline: {url}")))
    }
}

#[derive(Default)]
struct Script {
    inputs: RefCell<VecDeque<String>>,
    confirmations: RefCell<VecDeque<bool>>,
    notices: RefCell<Vec<String>>,
    asked: RefCell<usize>,
}

impl Script {
    fn inputs(answers: &[&str]) -> Self {
        let script = Self::default();
        script
            .inputs
            .borrow_mut()
            .extend(answers.iter().map(|a| (*a).to_string()));
        script
    }

    fn with_confirmation(self, answer: bool) -> Self {
        self.confirmations.borrow_mut().push_back(answer);
        self
    }

    fn menus_shown(&self) -> usize {
        self.notices
            .borrow()
            .iter()
            .filter(|n| n.starts_with("What do you want to do?"))
            .count()
    }
}

impl Prompter for Script {
    fn select(&self, prompt: &str, _items: &[String]) -> Result<usize> {
        Err(SetupError::Prompt(format!("unexpected selection: {prompt}")))
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        *self.asked.borrow_mut() += 1;
        self.confirmations
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| SetupError::Prompt(format!("unexpected confirmation: {prompt}")))
    }

    fn input(&self, prompt: &str) -> Result<String> {
        *self.asked.borrow_mut() += 1;
        self.inputs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| SetupError::Prompt(format!("unexpected input: {prompt}")))
    }

    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }
}

fn sandbox(version_id: &str) -> (TempDir, Config) {
    let root = tempfile::tempdir().unwrap();
    let os_release = root.path().join("os-release");
    fs::write(&os_release, format!("ID=ubuntu\nVERSION_ID=\"{version_id}\"\n")).unwrap();

    let mut config = Config::default();
    config.paths.install_dir = root.path().join("opt/cursor");
    config.paths.desktop_file = root.path().join("applications/cursor.desktop");
    config.environment.os_release = os_release;
    (root, config)
}

fn menu() -> SessionOptions {
    SessionOptions {
        mode: Mode::Menu,
        assume_yes: false,
    }
}

#[test]
fn wrong_release_aborts_before_any_side_effect() {
    let (_root, config) = sandbox("22.04");
    let runner = RecordingRunner::default();
    let prompter = Script::inputs(&["1"]);
    let host = Host::new(&runner, &OfflineHttp, &prompter);

    let err = run_session(&config, &host, menu()).unwrap_err();

    assert!(matches!(err, SetupError::UnsupportedOs { .. }));
    assert!(runner.calls.borrow().is_empty());
    assert_eq!(*prompter.asked.borrow(), 0);
    assert!(!config.paths.install_dir.exists());
}

#[test]
fn install_on_installed_target_shows_menu_again() {
    let (_root, config) = sandbox("24.04");
    fs::create_dir_all(&config.paths.install_dir).unwrap();
    let runner = RecordingRunner::default();
    let prompter = Script::inputs(&["1", "4"]).with_confirmation(false);
    let host = Host::new(&runner, &OfflineHttp, &prompter);

    let result = run_session(&config, &host, menu()).unwrap();

    assert_eq!(result.operation, Operation::Uninstall);
    assert_eq!(result.outcome, Outcome::Declined);
    assert_eq!(result.exit_code(), 0);
    assert_eq!(prompter.menus_shown(), 2);
    assert!(
        prompter
            .notices
            .borrow()
            .iter()
            .any(|n| n.contains("already installed"))
    );
    assert!(config.paths.install_dir.is_dir());
    assert!(runner.calls.borrow().is_empty());
}

#[test]
fn direct_install_on_installed_target_fails() {
    let (_root, config) = sandbox("24.04");
    fs::create_dir_all(&config.paths.install_dir).unwrap();
    let runner = RecordingRunner::default();
    let prompter = Script::default();
    let host = Host::new(&runner, &OfflineHttp, &prompter);

    let options = SessionOptions {
        mode: Mode::Direct(Operation::Install),
        assume_yes: false,
    };
    let result = run_session(&config, &host, options).unwrap();

    assert_eq!(result.outcome, Outcome::AlreadyInstalled);
    assert_eq!(result.exit_code(), 1);
    assert_eq!(prompter.menus_shown(), 0);
}

#[test]
fn invalid_menu_choice_is_asked_again() {
    let (_root, config) = sandbox("24.04");
    let runner = RecordingRunner::default();
    let prompter = Script::inputs(&["9", "update", " 3 "]);
    let host = Host::new(&runner, &OfflineHttp, &prompter);

    let result = run_session(&config, &host, menu()).unwrap();

    assert_eq!(result.operation, Operation::RestoreIcons);
    assert_eq!(result.outcome, Outcome::NotInstalled);
    assert_eq!(result.exit_code(), 1);
    assert_eq!(
        prompter
            .notices
            .borrow()
            .iter()
            .filter(|n| n.contains("is not a valid choice"))
            .count(),
        2
    );
}

#[test]
fn empty_menu_answer_ends_session() {
    let (_root, config) = sandbox("24.04");
    let runner = RecordingRunner::default();
    let prompter = Script::inputs(&[""]);
    let host = Host::new(&runner, &OfflineHttp, &prompter);

    assert!(matches!(
        run_session(&config, &host, menu()),
        Err(SetupError::Aborted)
    ));
}

#[test]
fn assume_yes_uninstalls_without_asking() {
    let (_root, config) = sandbox("24.04");
    fs::create_dir_all(&config.paths.install_dir).unwrap();
    fs::create_dir_all(config.paths.desktop_file.parent().unwrap()).unwrap();
    fs::write(&config.paths.desktop_file, "[Desktop Entry]\n").unwrap();

    let runner = RecordingRunner::default();
    let prompter = Script::default();
    let host = Host::new(&runner, &OfflineHttp, &prompter);

    let options = SessionOptions {
        mode: Mode::Direct(Operation::Uninstall),
        assume_yes: true,
    };
    let result = run_session(&config, &host, options).unwrap();

    assert_eq!(result.outcome, Outcome::Completed);
    assert_eq!(*prompter.asked.borrow(), 0);
    assert!(!config.paths.install_dir.exists());
    assert!(!config.paths.desktop_file.exists());

    let again = run_session(&config, &host, options).unwrap();
    assert_eq!(again.outcome, Outcome::NotInstalled);
    assert_eq!(again.exit_code(), 0);
}
