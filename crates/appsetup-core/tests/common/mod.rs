//! Scripted collaborators shared by the workflow tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use appsetup_core::Config;
use appsetup_core::config::IconChoice;
use appsetup_core::deploy::EXTRACT_FLAG;
use appsetup_core::error::{Result, SetupError};
use appsetup_core::host::{
    CommandOutput, CommandRunner, CommandSpec, DownloadProgress, HttpSource, Prompter,
};
use serde_json::{Value, json};
use tempfile::TempDir;

pub const API_URL: &str = "https://api.test/download";

/// A configuration rooted in a scratch directory.
pub struct Sandbox {
    pub root: TempDir,
    pub config: Config,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let os_release = root.path().join("os-release");
        fs::write(&os_release, "ID=ubuntu\nVERSION_ID=\"24.04\"\n").expect("os-release");

        let mut config = Config::default();
        config.paths.install_dir = root.path().join("opt").join("cursor");
        config.paths.desktop_file = root.path().join("applications").join("cursor.desktop");
        config.environment.os_release = os_release;
        config.download.api_url = API_URL.to_string();
        config.icons = vec![
            IconChoice {
                key: "classic".to_string(),
                label: "Classic icon".to_string(),
                url: "https://icons.test/classic.png".to_string(),
                file_name: "cursor-classic.png".to_string(),
            },
            IconChoice {
                key: "modern".to_string(),
                label: "Modern icon".to_string(),
                url: "https://icons.test/modern.png".to_string(),
                file_name: "cursor-modern.png".to_string(),
            },
        ];
        config.validate().expect("sandbox config is valid");

        Self { root, config }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    pub fn install_dir(&self) -> &Path {
        &self.config.paths.install_dir
    }

    pub fn desktop_file(&self) -> &Path {
        &self.config.paths.desktop_file
    }
}

/// Records every command and fakes the ones the workflows depend on.
///
/// Running an artifact with the extraction flag produces a small tree with
/// `AppRun`, `chrome-sandbox` and a resource file whose contents come from
/// the artifact itself, so tests can tell builds apart.
pub struct FakeRunner {
    available: RefCell<HashSet<String>>,
    pub calls: RefCell<Vec<String>>,
    pub fail_extraction: Cell<bool>,
}

impl FakeRunner {
    pub fn with_everything() -> Self {
        Self::with_programs(&["figlet", "update-desktop-database"])
    }

    pub fn with_programs(programs: &[&str]) -> Self {
        Self {
            available: RefCell::new(programs.iter().map(|p| (*p).to_string()).collect()),
            calls: RefCell::new(Vec::new()),
            fail_extraction: Cell::new(false),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.calls.borrow().iter().any(|call| call.starts_with(prefix))
    }

    fn extract(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if self.fail_extraction.get() {
            return Err(SetupError::Command {
                program: spec.program_name(),
                status: "exit status: 1".to_string(),
                stderr: "corrupt image".to_string(),
            });
        }
        let cwd = spec.cwd.clone().expect("extraction runs in a workdir");
        let payload = fs::read(&spec.program)?;
        let root = cwd.join("squashfs-root");
        fs::create_dir_all(root.join("resources"))?;
        fs::write(root.join("AppRun"), "#!/bin/sh\n")?;
        fs::write(root.join("chrome-sandbox"), "sandbox")?;
        fs::write(root.join("resources").join("app.bin"), payload)?;
        Ok(CommandOutput::default())
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.display());

        if spec.args.iter().any(|arg| arg == EXTRACT_FLAG) {
            return self.extract(spec);
        }
        if spec.program == "apt-get" && spec.args.first().is_some_and(|a| a == "install") {
            let mut available = self.available.borrow_mut();
            for package in spec.args.iter().skip(2) {
                let program = match package.to_string_lossy().as_ref() {
                    "desktop-file-utils" => "update-desktop-database".to_string(),
                    other => other.to_string(),
                };
                available.insert(program);
            }
        }
        Ok(CommandOutput::default())
    }

    fn is_available(&self, program: &str) -> bool {
        self.available.borrow().contains(program)
    }
}

/// Serves a download API document and a set of files from memory.
pub struct FakeHttp {
    api: RefCell<Option<Value>>,
    failures_left: Cell<usize>,
    broken_downloads: RefCell<HashMap<String, usize>>,
    files: RefCell<HashMap<String, Vec<u8>>>,
    pub downloads: RefCell<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        let http = Self {
            api: RefCell::new(None),
            failures_left: Cell::new(0),
            broken_downloads: RefCell::new(HashMap::new()),
            files: RefCell::new(HashMap::new()),
            downloads: RefCell::new(Vec::new()),
        };
        http.serve("https://icons.test/classic.png", b"classic-png");
        http.serve("https://icons.test/modern.png", b"modern-png");
        http
    }

    /// Publishes a build: the API points at it and its bytes are served.
    pub fn publish(&self, version: &str, contents: &[u8]) {
        let url = format!("https://dl.test/production/Cursor-{version}-x86_64.AppImage");
        self.serve(&url, contents);
        *self.api.borrow_mut() = Some(json!({ "version": version, "downloadUrl": url }));
    }

    /// Makes the API unreachable.
    pub fn go_offline(&self) {
        *self.api.borrow_mut() = None;
    }

    /// Fails the next `count` API requests.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.set(count);
    }

    /// Fails the next `count` downloads of `url`.
    pub fn break_download(&self, url: &str, count: usize) {
        self.broken_downloads.borrow_mut().insert(url.to_string(), count);
    }

    pub fn serve(&self, url: &str, contents: &[u8]) {
        self.files.borrow_mut().insert(url.to_string(), contents.to_vec());
    }
}

impl HttpSource for FakeHttp {
    fn get_json(&self, url: &str) -> Result<Value> {
        assert_eq!(url, API_URL);
        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(SetupError::Network("timed out".to_string()));
        }
        self.api
            .borrow()
            .clone()
            .ok_or_else(|| SetupError::Network("connection refused".to_string()))
    }

    fn download(
        &self,
        url: &str,
        dest: &Path,
        on_progress: &dyn Fn(DownloadProgress),
    ) -> Result<u64> {
        if let Some(left) = self.broken_downloads.borrow_mut().get_mut(url)
            && *left > 0
        {
            *left -= 1;
            return Err(SetupError::Network(format!("503 for {url}")));
        }
        let contents = self
            .files
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| SetupError::Network(format!("404 for {url}")))?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, &contents)?;
        let len = contents.len() as u64;
        on_progress(DownloadProgress::new(len, len));
        self.downloads.borrow_mut().push(url.to_string());
        Ok(len)
    }
}

/// Replays prepared answers and fails once a script runs dry.
#[derive(Default)]
pub struct ScriptedPrompter {
    selections: RefCell<VecDeque<usize>>,
    confirmations: RefCell<VecDeque<bool>>,
    inputs: RefCell<VecDeque<String>>,
    pub notices: RefCell<Vec<String>>,
    pub questions: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choose(self, index: usize) -> Self {
        self.selections.borrow_mut().push_back(index);
        self
    }

    pub fn answer(self, answer: bool) -> Self {
        self.confirmations.borrow_mut().push_back(answer);
        self
    }

    pub fn enter(self, answer: &str) -> Self {
        self.inputs.borrow_mut().push_back(answer.to_string());
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.selections.borrow().is_empty()
            && self.confirmations.borrow().is_empty()
            && self.inputs.borrow().is_empty()
    }

    fn exhausted(prompt: &str) -> SetupError {
        SetupError::Prompt(format!("no scripted answer for: {prompt}"))
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize> {
        self.questions.borrow_mut().push(prompt.to_string());
        let index = self
            .selections
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Self::exhausted(prompt))?;
        assert!(index < items.len(), "selection {index} out of range for {prompt}");
        Ok(index)
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        self.questions.borrow_mut().push(prompt.to_string());
        self.confirmations
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Self::exhausted(prompt))
    }

    fn input(&self, prompt: &str) -> Result<String> {
        self.questions.borrow_mut().push(prompt.to_string());
        self.inputs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Self::exhausted(prompt))
    }

    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }
}
