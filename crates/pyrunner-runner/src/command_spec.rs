use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

/// `CREATE_NO_WINDOW` process creation flag.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

// ============================================================================
// CommandSpec - Launch parameters for one child process
// ============================================================================

/// Launch parameters for one interpreter process.
///
/// Every spawn in this crate is built from a `CommandSpec`.
/// Each argument reaches the child as one discrete element, so values with
/// embedded spaces or quote characters arrive unchanged and nothing is ever
/// interpreted by a shell.
///
/// # Example
///
/// ```rust
/// use pyrunner_runner::CommandSpec;
/// use std::ffi::OsString;
///
/// let cmd = CommandSpec::new("/usr/bin/python3")
///     .arg("-u")
///     .arg("script.py")
///     .arg("Second \"quoted\" example")
///     .cwd("/path/to/scripts");
///
/// assert_eq!(cmd.program, OsString::from("/usr/bin/python3"));
/// assert_eq!(cmd.args.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Interpreter (or other executable) to launch
    pub program: OsString,
    /// argv after the program, one element per argument
    pub args: Vec<OsString>,
    /// Child working directory; `None` inherits ours
    pub cwd: Option<PathBuf>,
    /// Variables added to the inherited environment
    pub env: Option<HashMap<OsString, OsString>>,
}

impl CommandSpec {
    /// Launch `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: None,
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments to the command, preserving their order.
    ///
    /// ```rust
    /// use pyrunner_runner::CommandSpec;
    ///
    /// let cmd = CommandSpec::new("python3").args(["-m", "venv", ".venv"]);
    /// assert_eq!(cmd.args.len(), 3);
    /// ```
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the child in `cwd`.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add or override one environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Program name for messages and logs.
    #[must_use]
    pub fn program_display(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Convert this `CommandSpec` into a `std::process::Command`.
    ///
    /// The resulting `Command` uses argv-style argument passing. On Windows the
    /// child is created without a console window.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        if let Some(ref env) = self.env {
            for (key, value) in env {
                cmd.env(key, value);
            }
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd
    }
}
